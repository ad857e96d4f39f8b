// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由调试控制台
//!
//! 载入配置与路由规则后，在标准输入上提供交互式指令：
//! - `route <uri>`：解析请求目标，输出路由结果以及由结果重建的 URL
//! - `help`：显示帮助
//! - `stop`：退出

use inframe::{Config, Request, RouteOutcome, Router};

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    // 1. 日志系统
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 配置
    let config = match Config::from_toml("config/development.toml") {
        Ok(config) => config,
        Err(e) => {
            warn!("{}，将使用默认配置", e);
            Config::new()
        }
    };
    info!("配置文件已载入");

    let router = match Router::new(config.router().clone()) {
        Ok(router) => router,
        Err(e) => {
            error!("无法构建路由器：{}", e);
            return;
        }
    };
    if let Ok(database) = config.database() {
        info!("数据库方言：{}，DSN：{}", database.dialect, database.dialect.build_dsn(database));
    }

    // 3. 控制台
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = input.trim();
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };
        match cmd {
            "" => continue,
            "stop" => {
                println!("控制台已退出");
                break;
            }
            "help" => {
                println!("== Inframe Help ==");
                println!("route <uri> - 解析请求目标并输出路由结果");
                println!("stop        - 退出控制台");
                println!("help        - 显示此帮助信息");
                println!("==================");
            }
            "route" => route(&router, arg),
            _ => {
                println!("无效的命令：{}", cmd);
            }
        }
    }
}

fn route(router: &Router, uri: &str) {
    let request = Request::from_uri(uri);
    let outcome = router.dispatch(&request);
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("无法序列化路由结果：{}", e),
    }
    if let RouteOutcome::Dispatch(packet) = &outcome {
        match router.build(packet) {
            Some(url) => println!("url: {}", url),
            None => println!("url: (无法表达)"),
        }
    }
}
