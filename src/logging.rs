// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 日志能力
//!
//! 分发器不直接依赖全局日志宏，而是持有一个注入的 [`log::Log`] 实现。
//! 默认使用 [`NoopLogger`]；宿主可以注入 [`GlobalLogger`]，把记录转发给进程级别安装的后端（如 log4rs）。

use log::{Log, Metadata, Record};

/// 丢弃所有记录。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Log for NoopLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        false
    }

    fn log(&self, _record: &Record<'_>) {}

    fn flush(&self) {}
}

/// 转发给 `log::logger()` 返回的全局日志器。
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            log::logger().log(record);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}
