// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 框架全局常量模块
//!
//! 该模块集中定义了路由与 SQL 构建共享的常量，包括：
//! - 路由配置项的默认值（伪静态后缀、各类衔接符、API 模式变量名）。
//! - 通配符路由的占位符到正则表达式的映射表。
//! - SQL 片段之间的连接符。

use lazy_static::lazy_static;
use regex::Regex;

/// PATH_INFO 模式下默认剥离的伪静态后缀
pub const MASQUERADE_TAIL: &str = ".html";

/// 操作与参数之间的默认衔接符，必须是 URL 中第一个出现的该字符
pub const AP_BRIDGE: &str = ".";

/// 模块之间、模块与控制器之间、控制器与操作之间的默认衔接符
pub const MCA_BRIDGE: &str = "/";

/// 参数对之间、参数键值之间的默认衔接符
pub const PARAM_BRIDGE: &str = "/";

/// API 模式下模块、控制器、操作对应的查询变量名
pub const API_MODULES_VARIABLE: &str = "_m";
pub const API_CONTROLLER_VARIABLE: &str = "_c";
pub const API_ACTION_VARIABLE: &str = "_a";

/// 静态路由目标以该前缀开头时视为外部重定向
pub const REDIRECT_PREFIX: &str = "http";

/// 已编译路由正则的默认缓存容量
pub const REGEX_CACHE_SIZE: usize = 64;

/// 每个连接保留的 SQL 历史条数
pub const SQL_HISTORY_SIZE: usize = 32;

/// 映射规则中承接未命名捕获组的键
pub const OVERFLOW_KEY: &str = "o";

/// 映射规则中路由参数所在的分组
pub const PARAMS_GROUP: &str = "p";

/// SQL 片段连接符
pub const CONNECT_AND: &str = " AND ";
pub const CONNECT_OR: &str = " OR ";
pub const CONNECT_COMMA: &str = " , ";

lazy_static! {
    /// 通配符路由的占位符及其对应的正则表达式。
    ///
    /// - `[any]`：任意非 `/` 的单词字符
    /// - `[num]`：数字
    /// - `[id]`：标识符（字母开头，后随至多一个单词字符）
    pub static ref WILDCARD_TOKENS: Vec<(&'static str, &'static str)> = {
        vec![
            ("[any]", r"([\w\d_]+)"),
            ("[num]", r"([0-9]+)"),
            ("[id]", r"(\w[\w_\d]?)"),
        ]
    };
}

lazy_static! {
    /// 模板字符串中的反向引用：`${n}`、`$n`、`\n`（n 最多两位）
    pub static ref BACKREFERENCE: Regex =
        Regex::new(r"\$\{(\d{1,2})\}|\$(\d{1,2})|\\(\d{1,2})").unwrap();
}
