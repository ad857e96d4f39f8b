// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在路由解析、配置加载与数据库访问过程中可能出现的各类异常。
//!
//! ## 设计意图
//! - **错误分类**：配置错误、数据库错误（查询/执行/连接）、记录不存在以及运行环境缺失。
//! - **携带诊断信息**：底层驱动的错误文本会被完整保留在变体中，而不是被吞掉。
//! - **路由不抛错**：路由器对畸形输入一律回退为空值，因此这里没有路由相关的变体。

use thiserror::Error;

/// 框架处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Exception {
    /// 配置缺失或非法，例如没有配置数据库、路由规则同时给出了 template 与 mapping。
    #[error("Config error: {0}")]
    Config(String),
    /// 通用数据库错误：非法的运算符、必需的 WHERE 为空等。
    #[error("Database error: {0}")]
    Database(String),
    /// 返回结果集的查询失败。
    #[error("Query failed: {0}")]
    Query(String),
    /// INSERT/UPDATE/DELETE 等执行类语句失败。
    #[error("Execute failed: {0}")]
    Execute(String),
    /// 无法建立数据库连接。
    #[error("Connect failed: {0}")]
    Connect(String),
    /// 按主键查找时记录不存在。
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    /// 缺少运行时依赖的扩展组件。
    #[error("Missing extension: {0}")]
    Extension(String),
    /// 请求字节流无法按 UTF-8 解析。
    #[error("Request bytes can't be parsed in UTF-8")]
    RequestIsNotUtf8,
    /// 请求行格式不正确。
    #[error("Invalid request line: {0}")]
    InvalidRequestLine(String),
}

impl Exception {
    /// 是否属于数据库异常族（Database 及其子类型 Query/Execute/Connect）。
    pub fn is_database(&self) -> bool {
        matches!(
            self,
            Exception::Database(_) | Exception::Query(_) | Exception::Execute(_) | Exception::Connect(_)
        )
    }
}
