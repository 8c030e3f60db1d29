// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 宿主服务器
//!
//! 基于 Tokio 的最小 HTTP/1.1 宿主，负责监听、读取报文并把请求交给 [`Dispatcher`]。
//! 每个连接只处理一个请求，响应后关闭。
//!
//! 分发器是同步的，处理器可以执行阻塞 I/O，因此每个请求都在 Tokio 的阻塞线程池上执行。

use std::net::SocketAddrV4;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::timeout,
};

use crate::config::Config;
use crate::dispatcher::{Dispatcher, Outcome};
use crate::exception::Exception;
use crate::param::CONTENT_TYPE_TEXT;
use crate::request::{find_head_end, Request};
use crate::response::{BufferedResponse, ResponseSink};

/// 请求头部的长度上限。
const MAX_HEAD_SIZE: usize = 8192;

const READ_CHUNK_SIZE: usize = 1024;

pub struct Server {
    dispatcher: Arc<Dispatcher>,
    config: Arc<Config>,
}

impl Server {
    pub fn new(dispatcher: Dispatcher, config: Config) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
        }
    }

    /// 按配置绑定监听地址。
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let socket = SocketAddrV4::new(self.config.address(), self.config.port());
        let listener = TcpListener::bind(socket).await?;
        info!("服务端将在{}上监听Socket连接", socket);
        Ok(listener)
    }

    /// 主事件循环：持续接收新连接，每个连接一个任务。
    pub async fn serve(&self, listener: TcpListener) {
        let mut id: u128 = 0;
        loop {
            let (mut stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("接收TCP连接时遇到错误：{}", e);
                    continue;
                }
            };
            debug!("[ID{}]TCP连接已建立：{}", id, addr);

            let dispatcher = Arc::clone(&self.dispatcher);
            let config = Arc::clone(&self.config);
            tokio::spawn(async move {
                handle_connection(&mut stream, id, dispatcher, config).await;
            });
            id += 1;
        }
    }
}

/// 读取完整报文：先读到头部结束标记，再按 `Content-Length` 读取请求体。
async fn read_request(
    stream: &mut TcpStream,
    id: u128,
    config: &Config,
) -> Result<Option<Request>, Exception> {
    let read_timeout = Duration::from_millis(config.read_timeout_ms());
    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    let head_end = loop {
        if let Some(end) = find_head_end(&buffer) {
            break end;
        }
        if buffer.len() > MAX_HEAD_SIZE {
            warn!("[ID{}]请求头部超过{}字节", id, MAX_HEAD_SIZE);
            return Err(Exception::MalformedRequestLine);
        }
        match timeout(read_timeout, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                if !buffer.is_empty() {
                    warn!("[ID{}]客户端在发送完头部前关闭了连接", id);
                }
                return Ok(None);
            }
            Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return Ok(None);
            }
            Err(_) => {
                warn!("[ID{}]读取请求头部超时", id);
                return Ok(None);
            }
        }
    };
    debug!("[ID{}]HTTP请求头部接收完毕", id);

    let body_start = head_end + 4;
    let request = Request::try_from(&buffer[..body_start], id)?;

    let content_length = request.content_length().unwrap_or(0);
    if content_length > config.max_body_size() {
        warn!(
            "[ID{}]请求体长度{}超过上限{}",
            id,
            content_length,
            config.max_body_size()
        );
        return Err(Exception::BodyTooLarge);
    }

    while buffer.len() < body_start + content_length {
        match timeout(read_timeout, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => {
                error!("[ID{}]读取请求体时遇到错误: {}", id, e);
                break;
            }
            Err(_) => {
                warn!("[ID{}]读取请求体超时", id);
                break;
            }
        }
    }
    let body_end = buffer.len().min(body_start + content_length);
    let body = Bytes::copy_from_slice(&buffer[body_start..body_end]);

    Ok(Some(request.with_body(body)))
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期：读取解析请求、交给分发器、发送响应。
async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    dispatcher: Arc<Dispatcher>,
    config: Arc<Config>,
) {
    let start_time = Instant::now();

    let request = match read_request(stream, id, &config).await {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {:?}", id, e);
            let mut response = BufferedResponse::from_status_code(e.status_code());
            response.set_header("Content-Type", CONTENT_TYPE_TEXT);
            response.set_header("Connection", "close");
            let _ = response.write_body(e.to_string().as_bytes());
            send(stream, id, &response).await;
            return;
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    let version = request.version();
    let method = request.method();
    let path = request.path().to_string();
    let user_agent = request.user_agent().to_string();

    let result = tokio::task::spawn_blocking(move || {
        let mut response = BufferedResponse::new();
        response.set_header("Connection", "close");
        let outcome = dispatcher.handle_with_id(id, request, &mut response);
        (outcome, response)
    })
    .await;

    let (outcome, response) = match result {
        Ok(done) => done,
        Err(e) => {
            error!("[ID{}]处理请求时发生未知异常: {}", id, e);
            let mut response = BufferedResponse::from_status_code(500);
            response.set_header("Connection", "close");
            send(stream, id, &response).await;
            return;
        }
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    if outcome == Outcome::BindFailed {
        warn!("[ID{}]请求体绑定失败，关闭连接且不返回响应", id);
        let _ = stream.shutdown().await;
        return;
    }

    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, ",
        id,
        version,
        path,
        method,
        response.status_code(),
        response.information(),
        user_agent,
    );

    send(stream, id, &response).await;
}

async fn send(stream: &mut TcpStream, id: u128, response: &BufferedResponse) {
    let response_bytes = response.as_bytes();
    debug!("[ID{}]发送全量响应，长度: {}", id, response_bytes.len());
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}
