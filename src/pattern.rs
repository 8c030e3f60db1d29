// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径模板编译模块
//!
//! 将形如 `/users/{user-id}/posts` 的路由模板编译为两部分：
//! 1. 一个整串锚定的正则匹配器，变量段被替换为通用的 token 模式；
//! 2. 按从左到右顺序排列的 [`PathVariable`] 列表，记录每个变量段的下标和名字。
//!
//! ## 模板语法
//! - 根路径为 `/`；
//! - 其余路径由一个或多个 `/` 分隔的段组成，每段为 `[a-z0-9]+(-?[a-z0-9]+)*`，
//!   或者用 `{}` 包裹的同样字面量表示变量。

use lazy_static::lazy_static;
use regex::Regex;

use crate::exception::ConfigurationError;

/// 变量段在实际请求中可以匹配的字符。
pub const VARIABLE_TOKEN: &str = "[a-zA-Z0-9_-]+";

const SEGMENT: &str = "[a-z0-9]+(-?[a-z0-9]+)*";

lazy_static! {
    static ref TEMPLATE_GRAMMAR: Regex = Regex::new(&format!(
        r"^(/((\{{{seg}\}})|({seg})))+$",
        seg = SEGMENT
    ))
    .unwrap();
}

/// 模板中的一个变量段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathVariable {
    /// 从零开始的段下标，不计入以 `/` 切分产生的前导空串。
    pub position: usize,
    /// 去掉花括号后的变量名。
    pub name: String,
}

/// 编译后的路由模板。构建后不可变，可在线程间无锁共享。
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    matcher: Regex,
    variables: Vec<PathVariable>,
}

impl RoutePattern {
    /// 校验并编译路由模板。
    pub fn compile(template: &str) -> Result<Self, ConfigurationError> {
        if !is_valid_path(template) {
            return Err(ConfigurationError::InvalidPath {
                path: template.to_string(),
            });
        }

        let variables = extract_variable_names(template);
        let matcher = to_matcher(template)?;

        // 每个变量段恰好对应一个捕获组
        if matcher.captures_len() - 1 != variables.len() {
            return Err(ConfigurationError::PatternCompile {
                template: template.to_string(),
                message: format!(
                    "{} capture groups for {} variables",
                    matcher.captures_len() - 1,
                    variables.len()
                ),
            });
        }

        Ok(Self {
            template: template.to_string(),
            matcher,
            variables,
        })
    }

    /// 具体路径是否与模板形状完全一致。
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn variables(&self) -> &[PathVariable] {
        &self.variables
    }
}

/// 判断模板是否合法。
///
/// 合法示例：`/`、`/path1`、`/path1/pa-th-2/3`、`/path1/{pa-th-2}/3`。
pub fn is_valid_path(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    TEMPLATE_GRAMMAR.is_match(path)
}

/// 从左到右扫描模板，收集所有变量段。
///
/// 第一个 `/` 之前的内容不算作段；未经校验的输入不会出错，只是结果没有意义。
pub fn extract_variable_names(path: &str) -> Vec<PathVariable> {
    path.split('/')
        .skip(1)
        .enumerate()
        .filter(|(_, part)| part.starts_with('{'))
        .map(|(position, part)| PathVariable {
            position,
            name: part.trim_start_matches('{').trim_end_matches('}').to_string(),
        })
        .collect()
}

/// 构建整串锚定的匹配器，变量段替换为捕获组。
fn to_matcher(path: &str) -> Result<Regex, ConfigurationError> {
    let mut pattern = String::with_capacity(path.len() * 2 + 2);
    pattern.push('^');
    // 根路径切分后只剩一个空段，恰好生成 `^/$`
    for segment in path.split('/').skip(1) {
        pattern.push('/');
        if segment.starts_with('{') {
            pattern.push('(');
            pattern.push_str(VARIABLE_TOKEN);
            pattern.push(')');
        } else {
            // 已通过语法校验，字面段只含 [a-z0-9-]
            pattern.push_str(segment);
        }
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| ConfigurationError::PatternCompile {
        template: path.to_string(),
        message: e.to_string(),
    })
}
