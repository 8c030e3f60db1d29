// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 分发器模块
//!
//! 宿主服务器调用的唯一入口。每个请求按以下顺序单遍执行，遇到终止条件立即结束：
//!
//! ```text
//! 路由查找 ──未命中──▶ 写出 404，结束
//!    │
//! 前置过滤器 ──任一返回 false──▶ 结束（核心不再写出任何内容）
//!    │
//! 绑定（路径变量总是提取；请求体仅在需要时读取）──失败──▶ 结束，不写出响应
//!    │
//! 调用处理器，得到 Envelope
//!    │
//! 写出 Envelope（序列化或流拷贝失败只记录日志）
//!    │
//! 后置过滤器
//! ```
//!
//! 绑定失败时请求不会得到任何响应，客户端只能观察到连接关闭或超时；写出失败时头部可能已经发出。
//! 这两处都是已知缺口，分发器只记录 `warn` 日志，不会替处理器补写 400 或 500。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{Level, Log, Metadata, Record};

use crate::binder;
use crate::filter::FilterChain;
use crate::handler::RequestContext;
use crate::logging::NoopLogger;
use crate::registry::RouteRegistry;
use crate::request::Request;
use crate::response::ResponseSink;

const LOG_TARGET: &str = "routecore::dispatcher";

/// 一次分发的结果，仅供宿主记录，不影响已经写出的内容。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 没有匹配的路由，已写出 404。
    NotFound,
    /// 某个前置过滤器返回了 `false`。
    Rejected,
    /// 请求体读取或反序列化失败，未写出响应。
    BindFailed,
    /// 处理器已被调用，`write_failed` 表示写出阶段是否出错。
    Completed { write_failed: bool },
}

pub struct Dispatcher {
    routes: RouteRegistry,
    filters: FilterChain,
    logger: Arc<dyn Log>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new(routes: RouteRegistry, filters: FilterChain) -> Self {
        Self {
            routes,
            filters,
            logger: Arc::new(NoopLogger),
            next_id: AtomicU64::new(0),
        }
    }

    /// 替换诊断日志的输出目标。
    pub fn with_logger(mut self, logger: Arc<dyn Log>) -> Self {
        self.logger = logger;
        self
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// 使用分发器自己分配的请求 ID 处理请求。
    pub fn handle(&self, request: Request, sink: &mut dyn ResponseSink) -> Outcome {
        let id = u128::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handle_with_id(id, request, sink)
    }

    /// 处理请求，诊断日志以宿主分配的 `[ID{id}]` 开头。
    pub fn handle_with_id(
        &self,
        id: u128,
        mut request: Request,
        sink: &mut dyn ResponseSink,
    ) -> Outcome {
        let method = request.method();

        let entry = match self.routes.lookup(method, request.path()) {
            Ok(entry) => entry,
            Err(e) => {
                self.emit(id, Level::Debug, format_args!("{}，返回404", e));
                sink.set_status(404);
                return Outcome::NotFound;
            }
        };
        self.emit(
            id,
            Level::Debug,
            format_args!(
                "路由匹配成功：{} {} -> {}",
                method,
                request.path(),
                entry.pattern().template()
            ),
        );

        if !self.filters.run_pre(sink, &request) {
            self.emit(
                id,
                Level::Debug,
                format_args!("前置过滤器拒绝了请求：{} {}", method, request.path()),
            );
            return Outcome::Rejected;
        }

        let path_variables = binder::extract_path_variables(entry.pattern(), request.path());

        let raw = if entry.requires_body() {
            match binder::read_body(&mut request) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    self.bind_failed(id, &request, &e);
                    return Outcome::BindFailed;
                }
            }
        } else {
            None
        };

        let envelope = {
            let mut ctx = RequestContext {
                response: &mut *sink,
                request: &request,
                path_variables,
            };
            match entry.invoke(&mut ctx, raw.as_deref()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    self.bind_failed(id, &request, &e);
                    return Outcome::BindFailed;
                }
            }
        };

        let status = envelope.status();
        let write_failed = match envelope.write(sink) {
            Ok(()) => false,
            Err(e) => {
                // 已知缺口：状态码和头部可能已经发出
                self.emit(
                    id,
                    Level::Warn,
                    format_args!(
                        "写出响应失败：{} {}，状态码{}：{}",
                        method,
                        request.path(),
                        status,
                        e
                    ),
                );
                true
            }
        };

        self.filters.run_post(sink, &request);
        Outcome::Completed { write_failed }
    }

    fn bind_failed(&self, id: u128, request: &Request, error: &dyn fmt::Display) {
        // 已知缺口：不向客户端写出任何响应
        self.emit(
            id,
            Level::Warn,
            format_args!(
                "请求绑定失败，未写出响应：{} {}：{}",
                request.method(),
                request.path(),
                error
            ),
        );
    }

    fn emit(&self, id: u128, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(LOG_TARGET).build();
        if !self.logger.enabled(&metadata) {
            return;
        }
        self.logger.log(
            &Record::builder()
                .metadata(metadata)
                .args(format_args!("[ID{}]{}", id, args))
                .module_path_static(Some(module_path!()))
                .file_static(Some(file!()))
                .line(Some(line!()))
                .build(),
        );
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("pre_filters", &self.filters.pre_len())
            .field("post_filters", &self.filters.post_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::handler::Handler;
    use crate::param::HttpRequestMethod;
    use crate::response::BufferedResponse;
    use serde_derive::Deserialize;

    #[derive(Deserialize)]
    struct Rename {
        name: String,
    }

    fn dispatcher() -> Dispatcher {
        let mut routes = RouteRegistry::new();
        routes
            .get(
                "/pets/{id}",
                Handler::context_only(|ctx| {
                    let id = ctx.path_variable("id").unwrap_or_default().to_string();
                    Envelope::text(200, id)
                }),
            )
            .unwrap()
            .put(
                "/pets/{id}",
                Handler::with_body(|ctx, body: Rename| {
                    let id = ctx.path_variable("id").unwrap_or_default();
                    Envelope::text(200, format!("{}={}", id, body.name))
                }),
            )
            .unwrap();
        Dispatcher::new(routes, FilterChain::new())
    }

    #[test]
    fn test_route_miss_writes_404() {
        let mut sink = BufferedResponse::new();
        let outcome = dispatcher().handle(Request::new(HttpRequestMethod::Get, "/cats/1"), &mut sink);
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(sink.status(), Some(404));
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_path_variables_reach_handler() {
        let mut sink = BufferedResponse::new();
        let outcome = dispatcher().handle(Request::new(HttpRequestMethod::Get, "/pets/42"), &mut sink);
        assert_eq!(outcome, Outcome::Completed { write_failed: false });
        assert_eq!(sink.body(), b"42");
    }

    #[test]
    fn test_body_is_bound() {
        let mut sink = BufferedResponse::new();
        let request = Request::new(HttpRequestMethod::Put, "/pets/7").with_body(r#"{"name":"rex"}"#);
        dispatcher().handle(request, &mut sink);
        assert_eq!(sink.body(), b"7=rex");
    }

    #[test]
    fn test_bind_failure_writes_nothing() {
        let mut sink = BufferedResponse::new();
        let request = Request::new(HttpRequestMethod::Put, "/pets/7").with_body("{");
        let outcome = dispatcher().handle(request, &mut sink);
        assert_eq!(outcome, Outcome::BindFailed);
        assert!(sink.is_untouched());
    }
}
