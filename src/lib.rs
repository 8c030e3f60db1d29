// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # routecore
//!
//! 最小化的 HTTP 路由与分发核心：路径模板编译、路由表、处理器校验、过滤器链、请求绑定、
//! 响应信封以及把它们串起来的分发器。[`server`] 模块提供一个基于 Tokio 的薄宿主。

pub mod binder;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod exception;
pub mod filter;
pub mod handler;
pub mod logging;
pub mod param;
pub mod pattern;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;

pub use codec::{Format, Json, Xml};
pub use config::Config;
pub use dispatcher::{Dispatcher, Outcome};
pub use envelope::{Envelope, ErrorResponse};
pub use exception::{BindError, CodecError, ConfigurationError, Exception, RouteNotFound, WriteError};
pub use filter::FilterChain;
pub use handler::{Handler, HandlerEntry, RequestContext};
pub use logging::{GlobalLogger, NoopLogger};
pub use param::{HttpRequestMethod, HttpVersion};
pub use pattern::{is_valid_path, PathVariable, RoutePattern};
pub use registry::RouteRegistry;
pub use request::Request;
pub use response::{BufferedResponse, ResponseSink};
pub use server::Server;
