// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理器绑定与校验模块
//!
//! 处理器只有两种形态，在注册时显式选择：
//! - **仅上下文**（[`Handler::context_only`]）：`Fn(&mut RequestContext) -> Envelope`；
//! - **上下文加请求体**（[`Handler::with_body`]）：`Fn(&mut RequestContext, T) -> Envelope`，
//!   `T` 是一个具体的可反序列化类型，每个请求都会新建一个实例。
//!
//! 第一个参数必然是请求上下文、返回值必然是 [`Envelope`]，这两点由类型系统保证。
//! 形态与 HTTP 方法的匹配在注册时由 [`validate`] 检查：POST、PUT、PATCH、DELETE 必须带请求体，
//! 其余方法不得带请求体。不匹配时返回 [`ConfigurationError`]，不会拖到请求处理阶段。

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::binder::DecoderTable;
use crate::envelope::Envelope;
use crate::exception::{BindError, ConfigurationError};
use crate::param::HttpRequestMethod;
use crate::pattern::RoutePattern;
use crate::request::Request;
use crate::response::ResponseSink;

const CONTEXT_ONLY: &str = "context-only";
const CONTEXT_PLUS_BODY: &str = "context-plus-body";

/// 单个请求的上下文，只属于处理该请求的任务。
pub struct RequestContext<'a> {
    pub response: &'a mut dyn ResponseSink,
    pub request: &'a Request,
    pub path_variables: HashMap<String, String>,
}

impl RequestContext<'_> {
    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.path_variables.get(name).map(String::as_str)
    }
}

pub type ContextFn = dyn Fn(&mut RequestContext<'_>) -> Envelope + Send + Sync;

/// 带请求体的处理器，擦除了具体的请求体类型。
pub trait BodyHandler: Send + Sync {
    /// 声明的请求体类型名，仅用于诊断。
    fn body_type(&self) -> &'static str;

    /// 按请求的 `Content-Type` 反序列化 `raw`，然后调用处理器。
    fn invoke(&self, ctx: &mut RequestContext<'_>, raw: &[u8]) -> Result<Envelope, BindError>;
}

struct TypedBodyHandler<T, F> {
    decoders: DecoderTable<T>,
    handler: F,
}

impl<T, F> BodyHandler for TypedBodyHandler<T, F>
where
    T: DeserializeOwned + 'static,
    F: Fn(&mut RequestContext<'_>, T) -> Envelope + Send + Sync,
{
    fn body_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn invoke(&self, ctx: &mut RequestContext<'_>, raw: &[u8]) -> Result<Envelope, BindError> {
        let body = self.decoders.decode(ctx.request.content_type(), raw)?;
        Ok((self.handler)(ctx, body))
    }
}

#[derive(Clone)]
pub enum Handler {
    ContextOnly(Arc<ContextFn>),
    WithBody(Arc<dyn BodyHandler>),
}

impl Handler {
    pub fn context_only<F>(handler: F) -> Self
    where
        F: Fn(&mut RequestContext<'_>) -> Envelope + Send + Sync + 'static,
    {
        Handler::ContextOnly(Arc::new(handler))
    }

    /// 使用标准解码表（XML 或 JSON）绑定请求体。
    pub fn with_body<T, F>(handler: F) -> Self
    where
        T: DeserializeOwned + 'static,
        F: Fn(&mut RequestContext<'_>, T) -> Envelope + Send + Sync + 'static,
    {
        Self::with_body_using(DecoderTable::standard(), handler)
    }

    /// 使用自定义解码表绑定请求体。
    pub fn with_body_using<T, F>(decoders: DecoderTable<T>, handler: F) -> Self
    where
        T: DeserializeOwned + 'static,
        F: Fn(&mut RequestContext<'_>, T) -> Envelope + Send + Sync + 'static,
    {
        Handler::WithBody(Arc::new(TypedBodyHandler { decoders, handler }))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Handler::ContextOnly(_) => CONTEXT_ONLY,
            Handler::WithBody(_) => CONTEXT_PLUS_BODY,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::ContextOnly(_) => f.write_str("Handler::ContextOnly"),
            Handler::WithBody(h) => write!(f, "Handler::WithBody<{}>", h.body_type()),
        }
    }
}

/// 处理器是否需要请求体，以及请求体的类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRequirement {
    pub present: bool,
    pub body_type: Option<&'static str>,
}

/// 检查处理器形态是否符合方法语义，返回推导出的请求体需求。
pub fn validate(
    method: HttpRequestMethod,
    handler: &Handler,
) -> Result<BodyRequirement, ConfigurationError> {
    let requirement = match handler {
        Handler::ContextOnly(_) => BodyRequirement {
            present: false,
            body_type: None,
        },
        Handler::WithBody(h) => BodyRequirement {
            present: true,
            body_type: Some(h.body_type()),
        },
    };

    if requirement.present != method.is_bodyable() {
        return Err(ConfigurationError::BodyRequirementMismatch {
            method,
            expected: if method.is_bodyable() {
                CONTEXT_PLUS_BODY
            } else {
                CONTEXT_ONLY
            },
            found: handler.shape(),
        });
    }
    Ok(requirement)
}

/// 一条已校验、已编译的路由。
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    method: HttpRequestMethod,
    pattern: RoutePattern,
    body: BodyRequirement,
    handler: Handler,
}

impl HandlerEntry {
    pub fn new(
        method: HttpRequestMethod,
        template: &str,
        handler: Handler,
    ) -> Result<Self, ConfigurationError> {
        let pattern = RoutePattern::compile(template)?;
        let body = validate(method, &handler)?;
        Ok(Self {
            method,
            pattern,
            body,
            handler,
        })
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn body_requirement(&self) -> BodyRequirement {
        self.body
    }

    pub fn requires_body(&self) -> bool {
        self.body.present
    }

    /// 调用处理器。只有带请求体的处理器会用到 `raw`，缺失时按空字节处理。
    pub fn invoke(
        &self,
        ctx: &mut RequestContext<'_>,
        raw: Option<&[u8]>,
    ) -> Result<Envelope, BindError> {
        match &self.handler {
            Handler::ContextOnly(handler) => Ok(handler(ctx)),
            Handler::WithBody(handler) => handler.invoke(ctx, raw.unwrap_or_default()),
        }
    }
}
