// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应输出模块
//!
//! [`ResponseSink`] 是分发核心写响应的唯一出口：状态码、头部、正文写入器。
//! 第一次写正文即视为头部已发出，之后再设置状态码或头部都不会生效。
//!
//! [`BufferedResponse`] 是内存实现，宿主服务器用它收集响应后再序列化为 HTTP/1.1 报文。

use std::io::{self, Write};

use bytes::{Bytes, BytesMut};
use chrono::prelude::*;

use crate::param::*;

pub trait ResponseSink {
    fn set_status(&mut self, code: u16);

    /// 已设置的状态码，未设置时为 `None`。
    fn status(&self) -> Option<u16>;

    fn set_header(&mut self, name: &str, value: &str);

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// 把 [`ResponseSink`] 适配为 `std::io::Write`，用于流拷贝。
pub struct SinkWriter<'a> {
    sink: &'a mut dyn ResponseSink,
}

impl<'a> SinkWriter<'a> {
    pub fn new(sink: &'a mut dyn ResponseSink) -> Self {
        Self { sink }
    }
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write_body(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BufferedResponse {
    version: HttpVersion,
    status_code: Option<u16>,
    headers: Vec<(String, String)>,
    content: BytesMut,
    headers_sent: bool,
    date: DateTime<Utc>,
    server_name: String,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: None,
            headers: Vec::new(),
            content: BytesMut::new(),
            headers_sent: false,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
        }
    }

    /// 构造一个只有状态码的响应，宿主用于协议层错误。
    pub fn from_status_code(code: u16) -> Self {
        let mut response = Self::new();
        response.set_status(code);
        response
    }

    /// 核心是否什么都没有写。
    pub fn is_untouched(&self) -> bool {
        self.status_code.is_none() && self.headers.is_empty() && self.content.is_empty()
    }

    pub fn status_code(&self) -> u16 {
        self.status_code.unwrap_or(200)
    }

    pub fn information(&self) -> &str {
        reason_phrase(self.status_code())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.content
    }

    pub fn into_body(self) -> Bytes {
        self.content.freeze()
    }

    /// 序列化为完整的 HTTP/1.1 报文。
    ///
    /// 未设置状态码时按 `200` 处理；调用方未提供的 `Content-Length` 会自动补上。
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{} {} {}{}",
            self.version,
            self.status_code(),
            self.information(),
            CRLF
        );
        for (name, value) in &self.headers {
            header.push_str(&[name.as_str(), ": ", value, CRLF].concat());
        }
        if allows_content_length(self.status_code()) && self.header("Content-Length").is_none() {
            header.push_str(&format!("Content-Length: {}{}", self.content.len(), CRLF));
        }
        header.push_str(&["Date: ", &format_date(&self.date), CRLF].concat());
        header.push_str(&["Server: ", &self.server_name, CRLF].concat());
        header.push_str(CRLF);

        [header.as_bytes(), &self.content[..]].concat()
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, code: u16) {
        if !self.headers_sent {
            self.status_code = Some(code);
        }
    }

    fn status(&self) -> Option<u16> {
        self.status_code
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if self.headers_sent {
            return;
        }
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.headers_sent = true;
        self.content.extend_from_slice(chunk);
        Ok(())
    }
}

/// 1xx 与 204 响应不得携带 `Content-Length`。
fn allows_content_length(code: u16) -> bool {
    !(100..200).contains(&code) && code != 204
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_new() {
        let response = BufferedResponse::new();
        assert!(response.is_untouched());
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.information(), "OK");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut response = BufferedResponse::new();
        response.set_header("Content-Type", "text/plain");
        response.set_header("content-type", "application/json");
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_headers_frozen_after_body() {
        let mut response = BufferedResponse::new();
        response.set_status(201);
        response.write_body(b"abc").unwrap();
        response.set_status(500);
        response.set_header("X-Late", "1");
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.header("X-Late"), None);
        assert_eq!(response.body(), b"abc");
    }

    #[test]
    fn test_response_as_bytes_basic() {
        let mut response = BufferedResponse::new();
        response.set_status(404);
        let bytes = response.as_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.contains("Server: routecore\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_as_bytes_with_body() {
        let mut response = BufferedResponse::new();
        response.set_header("Content-Type", "text/plain");
        response.write_body(b"hello").unwrap();
        let text = String::from_utf8(response.as_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_explicit_content_length_not_duplicated() {
        let mut response = BufferedResponse::new();
        response.set_header("Content-Length", "3");
        response.write_body(b"abc").unwrap();
        let text = String::from_utf8(response.as_bytes()).unwrap();
        assert_eq!(text.matches("Content-Length").count(), 1);
    }

    #[test]
    fn test_no_content_length_on_204_and_1xx() {
        for code in [204, 100] {
            let response = BufferedResponse::from_status_code(code);
            let text = String::from_utf8(response.as_bytes()).unwrap();
            assert!(!text.contains("Content-Length"), "{}", text);
            assert!(text.ends_with("\r\n\r\n"));
        }
        let text = String::from_utf8(BufferedResponse::from_status_code(404).as_bytes()).unwrap();
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn test_sink_writer() {
        let mut response = BufferedResponse::new();
        {
            let mut writer = SinkWriter::new(&mut response);
            io::copy(&mut &b"streamed"[..], &mut writer).unwrap();
        }
        assert_eq!(response.body(), b"streamed");
    }
}
