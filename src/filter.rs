// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 过滤器链模块
//!
//! 前置过滤器依次执行，任何一个返回 `false` 都会立刻终止：剩余的前置过滤器、处理器和后置过滤器全部跳过。
//! 过滤器在返回 `false` 之前写出的内容会保留，不做回滚。
//!
//! 后置过滤器在处理器写出响应之后依次执行，返回 `false` 只会跳过其余的后置过滤器。

use std::sync::Arc;

use crate::request::Request;
use crate::response::ResponseSink;

pub type Filter = Arc<dyn Fn(&mut dyn ResponseSink, &Request) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct FilterChain {
    pre: Vec<Filter>,
    post: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pre_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut dyn ResponseSink, &Request) -> bool + Send + Sync + 'static,
    {
        self.pre.push(Arc::new(filter));
        self
    }

    pub fn add_post_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut dyn ResponseSink, &Request) -> bool + Send + Sync + 'static,
    {
        self.post.push(Arc::new(filter));
        self
    }

    /// 执行前置过滤器，返回是否继续处理请求。
    pub fn run_pre(&self, sink: &mut dyn ResponseSink, request: &Request) -> bool {
        execute(&self.pre, sink, request)
    }

    pub fn run_post(&self, sink: &mut dyn ResponseSink, request: &Request) -> bool {
        execute(&self.post, sink, request)
    }

    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    pub fn post_len(&self) -> usize {
        self.post.len()
    }
}

fn execute(filters: &[Filter], sink: &mut dyn ResponseSink, request: &Request) -> bool {
    for filter in filters {
        if !filter(&mut *sink, request) {
            return false;
        }
    }
    true
}
