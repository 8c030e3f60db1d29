// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 编解码模块
//!
//! [`Format`] 描述一种报文格式：它的 `Content-Type`、如何把对象图序列化为字节、
//! 以及如何从字节还原为对象。响应信封用它来序列化，请求绑定器用它来反序列化。
//! 新增格式只需实现该 trait，不必改动分发逻辑。

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::exception::CodecError;
use crate::param::{CONTENT_TYPE_JSON, CONTENT_TYPE_XML};

pub trait Format {
    const CONTENT_TYPE: &'static str;

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, CodecError>;
}

/// `application/json`，基于 `serde_json`。
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Format for Json {
    const CONTENT_TYPE: &'static str = CONTENT_TYPE_JSON;

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Json(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(raw).map_err(|e| CodecError::Json(e.to_string()))
    }
}

/// `application/xml`，基于 `quick-xml`。根元素名取自类型名。
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

impl Format for Xml {
    const CONTENT_TYPE: &'static str = CONTENT_TYPE_XML;

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        quick_xml::se::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Xml(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, CodecError> {
        let text = std::str::from_utf8(raw).map_err(|_| CodecError::Utf8)?;
        quick_xml::de::from_str(text).map_err(|e| CodecError::Xml(e.to_string()))
    }
}
