// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 配置模块
//!
//! 宿主服务器的运行参数，从 TOML 文件载入。路由表与过滤器链在代码中构建，不经过配置文件。

use std::fs::File;
use std::io::{self, prelude::*};
use std::net::Ipv4Addr;

use log::{error, warn};
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    port: u16,
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_max_body_size")]
    max_body_size: usize,
    #[serde(default = "default_read_timeout_ms")]
    read_timeout_ms: u64,
}

fn default_max_body_size() -> usize {
    1048576 // 1MB
}

fn default_read_timeout_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            local: true,
            worker_threads: num_cpus::get(),
            max_body_size: default_max_body_size(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }

    /// 从 TOML 文件载入配置。
    ///
    /// 文件无法读取时返回错误；内容无法解析时记录日志并使用默认配置。
    pub fn from_toml(filename: &str) -> io::Result<Self> {
        let mut file = File::open(filename)?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)?;
        Ok(Self::from_toml_str(&str_val))
    }

    pub fn from_toml_str(str_val: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(str_val) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.max_body_size == 0 {
            warn!("max_body_size被设置为0，所有带请求体的请求都将被拒绝。");
        }
        raw_config
    }

    /// 监听地址：`local` 为真时只监听回环地址。
    pub fn address(&self) -> Ipv4Addr {
        match self.local {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn with_read_timeout_ms(mut self, read_timeout_ms: u64) -> Self {
        self.read_timeout_ms = read_timeout_ms;
        self
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 8080\nlocal = false\nworker_threads = 3\nmax_body_size = 64\nread_timeout_ms = 250"
        )
        .unwrap();

        let config = Config::from_toml(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.port(), 8080);
        assert!(!config.local());
        assert_eq!(config.address(), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.worker_threads(), 3);
        assert_eq!(config.max_body_size(), 64);
        assert_eq!(config.read_timeout_ms(), 250);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let config = Config::from_toml_str("port = 9000\nlocal = true");
        assert_eq!(config.worker_threads(), num_cpus::get());
        assert_eq!(config.max_body_size(), 1048576);
        assert_eq!(config.read_timeout_ms(), 5000);
        assert_eq!(config.address(), Ipv4Addr::new(127, 0, 0, 1));
    }

    #[test]
    fn test_unparseable_falls_back_to_default() {
        let config = Config::from_toml_str("port = \"not a number\"");
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_toml("/nonexistent/development.toml").is_err());
    }
}
