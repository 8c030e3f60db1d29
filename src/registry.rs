// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表模块
//!
//! 按 HTTP 方法保存路由，每个方法内部保持注册顺序。查找时线性扫描，返回第一个匹配的路由。
//!
//! 先注册的宽泛模板会永久遮蔽后注册的窄模板，例如 `/users/{id}` 先于 `/users/me` 注册时，
//! `/users/me` 永远不会被命中。注册时不做冲突检测。
//!
//! 路由表在启动时构建完毕，服务期间只读，可被并发请求无锁读取。

use std::collections::HashMap;

use log::debug;

use crate::exception::{ConfigurationError, RouteNotFound};
use crate::handler::{Handler, HandlerEntry};
use crate::param::HttpRequestMethod;

#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: HashMap<HttpRequestMethod, Vec<HandlerEntry>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 校验模板与处理器形态，成功后追加到该方法的路由列表末尾。
    pub fn register(
        &mut self,
        method: HttpRequestMethod,
        template: &str,
        handler: Handler,
    ) -> Result<&mut Self, ConfigurationError> {
        debug!("[RouteRegistry#register] Method: '{}' | Path: '{}' | Handler: {:?}", method, template, handler);
        let entry = HandlerEntry::new(method, template, handler)?;
        Ok(self.add(entry))
    }

    /// 追加一条已校验的路由。
    pub fn add(&mut self, entry: HandlerEntry) -> &mut Self {
        self.routes.entry(entry.method()).or_default().push(entry);
        self
    }

    pub fn get(&mut self, template: &str, handler: Handler) -> Result<&mut Self, ConfigurationError> {
        self.register(HttpRequestMethod::Get, template, handler)
    }

    pub fn post(&mut self, template: &str, handler: Handler) -> Result<&mut Self, ConfigurationError> {
        self.register(HttpRequestMethod::Post, template, handler)
    }

    pub fn put(&mut self, template: &str, handler: Handler) -> Result<&mut Self, ConfigurationError> {
        self.register(HttpRequestMethod::Put, template, handler)
    }

    pub fn patch(&mut self, template: &str, handler: Handler) -> Result<&mut Self, ConfigurationError> {
        self.register(HttpRequestMethod::Patch, template, handler)
    }

    pub fn delete(&mut self, template: &str, handler: Handler) -> Result<&mut Self, ConfigurationError> {
        self.register(HttpRequestMethod::Delete, template, handler)
    }

    /// 按注册顺序返回第一个接受 `path` 的路由。
    pub fn lookup(
        &self,
        method: HttpRequestMethod,
        path: &str,
    ) -> Result<&HandlerEntry, RouteNotFound> {
        self.routes
            .get(&method)
            .and_then(|entries| entries.iter().find(|entry| entry.pattern().matches(path)))
            .ok_or_else(|| RouteNotFound {
                method,
                path: path.to_string(),
            })
    }

    /// 路由总数。
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 遍历全部路由，方法按 [`HttpRequestMethod::ALL`] 排列，同一方法内保持注册顺序。
    pub fn routes(&self) -> impl Iterator<Item = &HandlerEntry> {
        HttpRequestMethod::ALL
            .iter()
            .filter_map(move |method| self.routes.get(method))
            .flatten()
    }
}
