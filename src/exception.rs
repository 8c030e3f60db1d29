// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了路由与分发核心在各阶段可能产生的错误。
//!
//! ## 分类
//! - **配置错误**（[`ConfigurationError`]）：在注册路由时发现，必须在启动阶段终止，不会进入请求处理。
//! - **路由未命中**（[`RouteNotFound`]）：可恢复，由分发器映射为 `404`。
//! - **绑定错误**（[`BindError`]）：读取或反序列化请求体失败。
//! - **写出错误**（[`WriteError`]）：序列化或流拷贝失败，只记录日志，不向调用方传播。
//! - **协议错误**（[`Exception`]）：宿主服务器解析原始报文时的失败。

use std::io;

use thiserror::Error;

use crate::param::HttpRequestMethod;

/// 注册阶段的致命配置错误。
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// 路径模板不符合语法，例如空字符串、缺少前导 `/` 或出现 `{}`。
    #[error("path '{path}' didn't match the route template grammar")]
    InvalidPath { path: String },
    /// 处理器形态与 HTTP 方法的语义不一致。
    #[error("handler for '{method}' must be {expected} but was {found}")]
    BodyRequirementMismatch {
        method: HttpRequestMethod,
        expected: &'static str,
        found: &'static str,
    },
    /// 模板合法但无法编译为匹配器。
    #[error("couldn't compile matcher for '{template}': {message}")]
    PatternCompile { template: String, message: String },
}

/// 没有任何已注册的路由接受该请求。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route does not exist => method: '{method}' | path: '{path}'")]
pub struct RouteNotFound {
    pub method: HttpRequestMethod,
    pub path: String,
}

/// 编解码失败。
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(String),
    #[error("xml: {0}")]
    Xml(String),
    #[error("body is not valid UTF-8")]
    Utf8,
}

/// 请求体绑定失败。
///
/// 当前分发器遇到该错误时不会写出任何响应。
#[derive(Debug, Error)]
pub enum BindError {
    #[error("couldn't read request body: {0}")]
    Read(#[from] io::Error),
    #[error("couldn't decode body as '{content_type}': {source}")]
    Decode {
        content_type: String,
        #[source]
        source: CodecError,
    },
}

/// 响应写出失败。此时状态行和部分头部可能已经发出。
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("marshal => {0}")]
    Marshal(#[from] CodecError),
    #[error("write => {0}")]
    Io(#[from] io::Error),
}

/// 宿主服务器解析原始请求时抛出的异常。
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum Exception {
    /// 请求字节流无法解析为合法的 UTF-8 字符串。
    #[error("Request bytes can't be parsed in UTF-8")]
    RequestIsNotUtf8,
    /// 请求行缺少方法、路径或版本。
    #[error("Malformed request line")]
    MalformedRequestLine,
    /// 使用了不支持的 HTTP 方法。这类方法不可能注册路由，按路由未命中回写 `404`。
    #[error("Unsupported request method")]
    UnSupportedRequestMethod,
    /// 使用了不支持的 HTTP 协议版本。
    #[error("Unsupported HTTP version")]
    UnsupportedHttpVersion,
    /// 请求体超过配置上限。对应 `413`。
    #[error("Request body too large")]
    BodyTooLarge,
}

impl Exception {
    /// 宿主应当回写的状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            Exception::UnSupportedRequestMethod => 404,
            Exception::BodyTooLarge => 413,
            _ => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Exception::UnSupportedRequestMethod.status_code(), 404);
        assert_eq!(Exception::BodyTooLarge.status_code(), 413);
        assert_eq!(Exception::MalformedRequestLine.status_code(), 400);
        assert_eq!(Exception::UnsupportedHttpVersion.status_code(), 400);
        assert_eq!(Exception::RequestIsNotUtf8.status_code(), 400);
    }
}
