// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应信封模块
//!
//! 处理器返回一个 [`Envelope`]，由分发器在写出阶段消费一次。每种信封都知道如何把自己写进
//! [`ResponseSink`]：先设置状态码，再设置 `Content-Type`，再应用调用方提供的自定义头部，最后输出正文。
//!
//! | 构造函数 | 正文 |
//! |---|---|
//! | [`Envelope::json`] / [`Envelope::xml`] / [`Envelope::marshalled`] | 序列化对象图 |
//! | [`Envelope::json_error`] / [`Envelope::xml_error`] | 结构化错误体 |
//! | [`Envelope::text`] | 字面字符串 |
//! | [`Envelope::file`] | 完整拷贝字节流 |
//! | [`Envelope::no_content`] | 无正文，`204` |
//!
//! 序列化或流拷贝失败时，状态码与头部可能已经写出，[`Envelope::write`] 以 [`WriteError`] 报告，
//! 由分发器记录日志后吞掉。

use std::fmt;
use std::io::{self, Read};

use chrono::{SecondsFormat, Utc};
use serde_derive::{Deserialize, Serialize};

use crate::codec::{Format, Json, Xml};
use crate::exception::{CodecError, WriteError};
use crate::param::CONTENT_TYPE_TEXT;
use crate::request::Request;
use crate::response::{ResponseSink, SinkWriter};

type Marshal = Box<dyn FnOnce() -> Result<Vec<u8>, CodecError> + Send>;

/// 处理器在错误路径上显式构造的错误体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// RFC 3339 时间戳
    pub date: String,
    pub message: String,
    pub method: String,
    pub path: String,
}

impl ErrorResponse {
    pub fn new(request: &Request, message: &str) -> Self {
        Self {
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message: message.to_string(),
            method: request.method().to_string(),
            path: request.path().to_string(),
        }
    }
}

enum Body {
    Marshalled {
        content_type: &'static str,
        marshal: Marshal,
    },
    Text(String),
    Stream {
        content_type: String,
        content_disposition: String,
        content_length: u64,
        reader: Box<dyn Read + Send>,
    },
    NoContent,
}

/// 一个完整的 HTTP 响应（状态码、头部、正文生成策略）。
pub struct Envelope {
    status: u16,
    headers: Vec<(String, String)>,
    body: Body,
}

impl Envelope {
    fn from_body(status: u16, body: Body) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// 用任意 [`Format`] 序列化 `body`。序列化推迟到写出阶段进行。
    pub fn marshalled<F, T>(status: u16, body: T) -> Self
    where
        F: Format + 'static,
        T: serde::Serialize + Send + 'static,
    {
        Self::from_body(
            status,
            Body::Marshalled {
                content_type: F::CONTENT_TYPE,
                marshal: Box::new(move || F::encode(&body)),
            },
        )
    }

    pub fn json<T: serde::Serialize + Send + 'static>(status: u16, body: T) -> Self {
        Self::marshalled::<Json, T>(status, body)
    }

    pub fn xml<T: serde::Serialize + Send + 'static>(status: u16, body: T) -> Self {
        Self::marshalled::<Xml, T>(status, body)
    }

    pub fn json_error(status: u16, request: &Request, message: &str) -> Self {
        Self::json(status, ErrorResponse::new(request, message))
    }

    pub fn xml_error(status: u16, request: &Request, message: &str) -> Self {
        Self::xml(status, ErrorResponse::new(request, message))
    }

    /// `text/plain` 响应。
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::from_body(status, Body::Text(body.into()))
    }

    /// 文件或任意字节流。`content_length` 为 0 时不发送 `Content-Length`。
    pub fn file<R: Read + Send + 'static>(
        status: u16,
        content_type: &str,
        content_disposition: &str,
        content_length: u64,
        reader: R,
    ) -> Self {
        Self::from_body(
            status,
            Body::Stream {
                content_type: content_type.to_string(),
                content_disposition: content_disposition.to_string(),
                content_length,
                reader: Box::new(reader),
            },
        )
    }

    pub fn no_content() -> Self {
        Self::from_body(204, Body::NoContent)
    }

    /// 追加一个自定义头部，在 `Content-Type` 之后应用。
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        match &self.body {
            Body::Marshalled { content_type, .. } => Some(*content_type),
            Body::Text(_) => Some(CONTENT_TYPE_TEXT),
            Body::Stream { content_type, .. } => Some(content_type.as_str()),
            Body::NoContent => None,
        }
    }

    /// 把信封写入响应出口，消费自身。
    pub fn write(self, sink: &mut dyn ResponseSink) -> Result<(), WriteError> {
        sink.set_status(self.status);
        if let Some(content_type) = self.content_type() {
            sink.set_header("Content-Type", content_type);
        }
        if let Body::Stream {
            content_disposition,
            content_length,
            ..
        } = &self.body
        {
            if *content_length > 0 {
                sink.set_header("Content-Length", &content_length.to_string());
            }
            sink.set_header("Content-Disposition", content_disposition);
        }
        for (name, value) in &self.headers {
            sink.set_header(name, value);
        }

        match self.body {
            Body::Marshalled { marshal, .. } => {
                let raw = marshal()?;
                sink.write_body(&raw)?;
            }
            Body::Text(text) => sink.write_body(text.as_bytes())?,
            Body::Stream { mut reader, .. } => {
                io::copy(&mut reader, &mut SinkWriter::new(sink))?;
            }
            Body::NoContent => {}
        }
        Ok(())
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("status", &self.status)
            .field("content_type", &self.content_type())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
