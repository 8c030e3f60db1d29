// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求绑定模块
//!
//! 每个请求都会提取路径变量；只有声明了请求体的处理器才会读取并反序列化请求体。
//!
//! 反序列化策略由 [`DecoderTable`] 按 `Content-Type` 精确匹配选择，未命中（包括缺失或未知的类型）
//! 时回退到默认格式。标准表把 `application/xml` 映射到 XML，其余一律按 JSON 处理。

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::codec::{Format, Json, Xml};
use crate::exception::{BindError, CodecError};
use crate::pattern::RoutePattern;
use crate::request::Request;

/// 按位置提取路径变量的值。
///
/// 以 `/` 切分具体路径后在 `position + 1` 处取值，`+1` 跳过绝对路径切分产生的前导空串。
/// 匹配器已经保证具体路径与模板的段结构一致。
pub fn extract_path_variables(pattern: &RoutePattern, path: &str) -> HashMap<String, String> {
    let parts: Vec<&str> = path.split('/').collect();
    pattern
        .variables()
        .iter()
        .filter_map(|variable| {
            parts
                .get(variable.position + 1)
                .map(|value| (variable.name.clone(), value.to_string()))
        })
        .collect()
}

/// 读取完整的请求体。
pub fn read_body(request: &mut Request) -> Result<Vec<u8>, BindError> {
    Ok(request.read_body()?)
}

pub type DecodeFn<T> = fn(&[u8]) -> Result<T, CodecError>;

/// `Content-Type` 到反序列化函数的映射。
pub struct DecoderTable<T> {
    decoders: HashMap<String, DecodeFn<T>>,
    fallback: DecodeFn<T>,
}

impl<T: DeserializeOwned> DecoderTable<T> {
    /// `application/xml` 走 XML，其余走 JSON。
    pub fn standard() -> Self {
        Self::with_fallback::<Json>().with_format::<Xml>()
    }

    /// 只有一个兜底格式的空表。
    pub fn with_fallback<F: Format>() -> Self {
        Self {
            decoders: HashMap::new(),
            fallback: F::decode::<T>,
        }
    }

    pub fn with_format<F: Format>(self) -> Self {
        self.with_decoder(F::CONTENT_TYPE, F::decode::<T>)
    }

    pub fn with_decoder(mut self, content_type: &str, decode: DecodeFn<T>) -> Self {
        self.decoders.insert(content_type.to_string(), decode);
        self
    }

    /// 选择解码函数并把原始字节还原为一个新的 `T`。
    pub fn decode(&self, content_type: Option<&str>, raw: &[u8]) -> Result<T, BindError> {
        let decode = content_type
            .and_then(|ct| self.decoders.get(ct))
            .copied()
            .unwrap_or(self.fallback);
        decode(raw).map_err(|source| BindError::Decode {
            content_type: content_type.unwrap_or_default().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::HttpRequestMethod;
    use serde_derive::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Pet {
        name: String,
    }

    #[test]
    fn test_extract_path_variables() {
        let pattern = RoutePattern::compile("/a/{mo-ck1}/bbb/{m-o-ck2}/a-b-c1/{mock3}").unwrap();

        let actual = extract_path_variables(&pattern, "/a/111111/bbb/222222/a-b-c1/333333");

        assert_eq!(actual.len(), 3);
        assert_eq!(actual["mo-ck1"], "111111");
        assert_eq!(actual["m-o-ck2"], "222222");
        assert_eq!(actual["mock3"], "333333");
    }

    #[test]
    fn test_extract_path_variables_none() {
        let pattern = RoutePattern::compile("/a/bbb").unwrap();

        let actual = extract_path_variables(&pattern, "/a/bbb");

        assert!(actual.is_empty());
    }

    #[test]
    fn test_decode_json_by_default() {
        let table = DecoderTable::<Pet>::standard();
        for content_type in [None, Some("application/json"), Some("text/whatever")] {
            let pet = table.decode(content_type, br#"{"name":"rex"}"#).unwrap();
            assert_eq!(pet, Pet { name: "rex".to_string() });
        }
    }

    #[test]
    fn test_decode_xml_only_on_exact_content_type() {
        let table = DecoderTable::<Pet>::standard();
        let xml = b"<Pet><name>rex</name></Pet>";

        let pet = table.decode(Some("application/xml"), xml).unwrap();
        assert_eq!(pet, Pet { name: "rex".to_string() });

        // 带参数的类型不是精确匹配，回退到 JSON
        let result = table.decode(Some("application/xml; charset=utf-8"), xml);
        assert!(matches!(
            result,
            Err(BindError::Decode { source: CodecError::Json(_), .. })
        ));
    }

    #[test]
    fn test_custom_decoder() {
        fn shout(raw: &[u8]) -> Result<Pet, CodecError> {
            let name = std::str::from_utf8(raw).map_err(|_| CodecError::Utf8)?;
            Ok(Pet { name: name.to_uppercase() })
        }
        let table = DecoderTable::<Pet>::standard().with_decoder("text/plain", shout);

        let pet = table.decode(Some("text/plain"), b"rex").unwrap();

        assert_eq!(pet, Pet { name: "REX".to_string() });
    }

    #[test]
    fn test_decode_error_reports_content_type() {
        let table = DecoderTable::<Pet>::standard();

        match table.decode(Some("application/json"), b"not json") {
            Err(BindError::Decode { content_type, .. }) => assert_eq!(content_type, "application/json"),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_body() {
        let mut request = Request::new(HttpRequestMethod::Post, "/").with_body("abc");
        assert_eq!(read_body(&mut request).unwrap(), b"abc".to_vec());
    }
}
