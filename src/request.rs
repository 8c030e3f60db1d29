// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求模块
//!
//! [`Request`] 是分发核心看到的抽象请求：方法、路径、头部以及一个请求体读取器。
//! 它既可以在代码中直接构造，也可以由宿主服务器从原始字节解析而来：
//! 1. 请求行（Request-Line）的解析（方法、路径、查询串、版本）。
//! 2. 头部（Headers）的提取，字段名大小写不敏感。
//! 3. 头部之后的剩余字节作为请求体。

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;
use log::error;

use crate::{exception::Exception, param::*};

/// 一个完整的 HTTP 请求。
///
/// 请求体只能读取一次，读取后即被消费。
pub struct Request {
    method: HttpRequestMethod,
    path: String,
    query: Option<String>,
    version: HttpVersion,
    /// 字段名统一保存为小写
    headers: HashMap<String, String>,
    body: Box<dyn Read + Send>,
}

impl Request {
    pub fn new(method: HttpRequestMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: None,
            version: HttpVersion::V1_1,
            headers: HashMap::new(),
            body: Box::new(io::empty()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Box::new(Cursor::new(body.into()));
        self
    }

    /// 使用任意读取器作为请求体，读取失败会在绑定阶段表现为 `BindError`。
    pub fn with_body_reader<R: Read + Send + 'static>(mut self, reader: R) -> Self {
        self.body = Box::new(reader);
        self
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的完整报文（头部与请求体）。
    /// * `id` - 请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match find_head_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + 4..]),
            None => (buffer, &buffer[buffer.len()..]),
        };

        let head = match std::str::from_utf8(head) {
            Ok(s) => s,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head.split(CRLF);
        let request_line = lines.next().unwrap_or("");

        // 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let parts: Vec<&str> = request_line.split(' ').collect();
        if parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequestLine);
        }

        let method: HttpRequestMethod = match parts[0].parse() {
            Ok(m) => m,
            Err(_) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version = match parts[2].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 只有路径部分参与路由匹配
        let (path, query) = match parts[1].split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (parts[1].to_string(), None),
        };

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        Ok(Self {
            method,
            path,
            query,
            version,
            headers,
            body: Box::new(Cursor::new(Bytes::copy_from_slice(body))),
        })
    }

    /// 读取全部请求体。
    pub fn read_body(&mut self) -> io::Result<Vec<u8>> {
        let mut raw = Vec::new();
        self.body.read_to_end(&mut raw)?;
        Ok(raw)
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 请求路径，不含查询串
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 按字段名（大小写不敏感）查询头部。
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// 原样返回 `Content-Type` 头部的值。
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// 返回头部结束标记 `\r\n\r\n` 的起始位置。
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}
