// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 演示服务器
//!
//! 初始化日志与配置，注册一组演示路由后启动宿主服务器。

use std::process;
use std::sync::Arc;

use log::{error, info, warn};
use serde_derive::{Deserialize, Serialize};
use tokio::runtime::Builder;

use routecore::{
    Config, ConfigurationError, Dispatcher, Envelope, FilterChain, GlobalLogger, Handler,
    ResponseSink, RouteRegistry, Server,
};

#[derive(Serialize)]
struct Greeting {
    message: String,
}

#[derive(Serialize, Deserialize)]
struct Echo {
    text: String,
}

fn routes() -> Result<RouteRegistry, ConfigurationError> {
    let mut routes = RouteRegistry::new();
    routes
        .get("/", Handler::context_only(|_ctx| Envelope::text(200, "routecore")))?
        .get(
            "/hello/{name}",
            Handler::context_only(|ctx| {
                let name = ctx.path_variable("name").unwrap_or_default();
                Envelope::json(
                    200,
                    Greeting {
                        message: format!("hello, {}", name),
                    },
                )
            }),
        )?
        .get(
            "/admin/stats",
            Handler::context_only(|ctx| Envelope::xml_error(501, ctx.request, "not implemented")),
        )?
        .post("/echo", Handler::with_body(|_ctx, body: Echo| Envelope::json(200, body)))?;
    Ok(routes)
}

fn filters() -> FilterChain {
    let mut filters = FilterChain::new();
    filters
        .add_pre_filter(|sink, request| {
            if request.path().starts_with("/admin") && request.header("authorization").is_none() {
                sink.set_status(401);
                return false;
            }
            true
        })
        .add_post_filter(|sink, request| {
            info!("{} {} -> {:?}", request.method(), request.path(), sink.status());
            true
        });
    filters
}

fn main() {
    // 1. 初始化日志系统
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 载入配置
    let config = match Config::from_toml("config/development.toml") {
        Ok(config) => {
            info!("配置文件已载入");
            config
        }
        Err(e) => {
            warn!("无法读取配置文件，使用默认配置：{}", e);
            Config::new()
        }
    };

    // 3. 注册路由，配置错误在启动阶段终止
    let routes = match routes() {
        Ok(routes) => routes,
        Err(e) => {
            error!("路由注册失败：{}", e);
            process::exit(1);
        }
    };
    for entry in routes.routes() {
        info!("已注册路由：{} {}", entry.method(), entry.pattern().template());
    }
    let dispatcher = Dispatcher::new(routes, filters()).with_logger(Arc::new(GlobalLogger));

    // 4. 按配置的工作线程数构建运行时
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            process::exit(1);
        }
    };

    let server = Server::new(dispatcher, config);
    runtime.block_on(async move {
        let listener = match server.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口，错误：{}", e);
                process::exit(1);
            }
        };
        server.serve(listener).await;
    });
}
