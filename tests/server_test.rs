// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::net::SocketAddr;
use std::time::Duration;

use serde_derive::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use routecore::{Config, Dispatcher, Envelope, FilterChain, Handler, RouteRegistry, Server};

#[derive(Serialize, Deserialize)]
struct Note {
    text: String,
}

async fn start_server() -> SocketAddr {
    let mut routes = RouteRegistry::new();
    routes
        .get("/", Handler::context_only(|_ctx| Envelope::text(200, "root")))
        .unwrap()
        .get(
            "/notes/{id}",
            Handler::context_only(|ctx| {
                let id = ctx.path_variable("id").unwrap_or_default();
                Envelope::json(200, Note { text: format!("note {}", id) })
            }),
        )
        .unwrap()
        .post("/notes", Handler::with_body(|_ctx, note: Note| Envelope::json(201, note)))
        .unwrap();
    let config = Config::new()
        .with_max_body_size(64)
        .with_read_timeout_ms(500);
    let server = Server::new(Dispatcher::new(routes, FilterChain::new()), config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { server.serve(listener).await });
    addr
}

async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn test_get_text() {
    let addr = start_server().await;
    let response = roundtrip(addr, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.contains("Server: routecore\r\n"));
    assert!(response.ends_with("\r\n\r\nroot"));
}

#[tokio::test]
async fn test_path_variable_and_query() {
    let addr = start_server().await;
    let response = roundtrip(addr, "GET /notes/42?verbose=1 HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with(r#"{"text":"note 42"}"#));
}

#[tokio::test]
async fn test_post_with_body() {
    let addr = start_server().await;
    let body = r#"{"text":"hi"}"#;
    let raw = format!(
        "POST /notes HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = roundtrip(addr, &raw).await;
    assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
    assert!(response.ends_with(body));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let addr = start_server().await;
    let response = roundtrip(addr, "DELETE /notes/1 HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_malformed_and_unsupported_requests() {
    let addr = start_server().await;
    let response = roundtrip(addr, "GARBAGE\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    let response = roundtrip(addr, "GET / HTTP/2.0\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_unroutable_methods_are_404() {
    let addr = start_server().await;
    // 只注册了 GET /，其他方法都按路由未命中处理
    for method in ["HEAD", "OPTIONS", "TRACE"] {
        let raw = format!("{} / HTTP/1.1\r\n\r\n", method);
        let response = roundtrip(addr, &raw).await;
        assert!(
            response.starts_with("HTTP/1.1 404 Not Found\r\n"),
            "{} => {}",
            method,
            response
        );
    }
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let addr = start_server().await;
    let response = roundtrip(addr, "POST /notes HTTP/1.1\r\nContent-Length: 1000\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 413 Content Too Large\r\n"));
}

#[tokio::test]
async fn test_bind_failure_closes_without_response() {
    let addr = start_server().await;
    let response = roundtrip(addr, "POST /notes HTTP/1.1\r\nContent-Length: 3\r\n\r\n{{{").await;
    assert!(response.is_empty());
}
