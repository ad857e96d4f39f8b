//! # SQL 方言
//!
//! 每种数据库在标识符转义、SELECT 语句拼装与 DSN 格式上各有不同，
//! `Dialect` 以带标签的枚举承载这些差异。
//!
//! SELECT 的子句顺序对所有方言都是固定的：
//! `SELECT [DISTINCT] 字段 FROM 表 [JOIN...] [WHERE] [GROUP BY] [HAVING] [ORDER BY] [分页]`，
//! 缺失的子句渲染为空字符串。

use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::query::QueryComponents;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    SqlServer,
}

impl Dialect {
    /// 转义标识符（可能是关键字），已经转义过的保持不变
    pub fn escape(&self, field: &str) -> String {
        match self {
            Dialect::MySql => {
                if field.contains('`') {
                    field.to_string()
                } else {
                    format!("`{}`", field)
                }
            }
            Dialect::SqlServer => {
                if field.starts_with('[') {
                    field.to_string()
                } else {
                    format!("[{}]", field)
                }
            }
        }
    }

    /// 将查询组件编译为可执行的 SELECT 语句
    pub fn compile(&self, components: &QueryComponents) -> String {
        let distinct = if components.distinct { "DISTINCT" } else { "" };
        let fields = if components.fields.trim().is_empty() {
            "*"
        } else {
            components.fields.as_str()
        };
        let joins: String = components
            .joins
            .iter()
            .map(|join| format!("\n{}\n", join))
            .collect();
        let where_clause = clause("WHERE", &components.where_clause);
        let group = clause("GROUP BY", &components.group);
        let having = clause("HAVING", &components.having);

        match self {
            Dialect::MySql => {
                let order = clause("ORDER BY", &components.order);
                let limit = match (components.limit, components.offset) {
                    (Some(limit), Some(offset)) if offset > 0 => format!("LIMIT {},{}", offset, limit),
                    (Some(limit), _) => format!("LIMIT {}", limit),
                    (None, _) => String::new(),
                };
                format!(
                    "SELECT {} {} FROM {} {} {} {} {} {} {};",
                    distinct, fields, components.table, joins, where_clause, group, having, order, limit
                )
            }
            Dialect::SqlServer => {
                let offset = components.offset.filter(|o| *o > 0);
                let top = match (components.limit, offset) {
                    (Some(limit), None) => format!("TOP {}", limit),
                    _ => String::new(),
                };
                // OFFSET/FETCH 必须跟在 ORDER BY 之后
                let order = match (&components.order, offset) {
                    (Some(order), _) => format!("ORDER BY {}", order),
                    (None, Some(_)) => "ORDER BY (SELECT NULL)".to_string(),
                    (None, None) => String::new(),
                };
                let paging = match (components.limit, offset) {
                    (Some(limit), Some(offset)) => {
                        format!("OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, limit)
                    }
                    (None, Some(offset)) => format!("OFFSET {} ROWS", offset),
                    _ => String::new(),
                };
                format!(
                    "SELECT {} {} {} FROM {} {} {} {} {} {} {};",
                    distinct, top, fields, components.table, joins, where_clause, group, having, order, paging
                )
            }
        }
    }

    /// 根据连接配置创建 DSN
    pub fn build_dsn(&self, config: &DatabaseConfig) -> String {
        match self {
            Dialect::MySql => {
                let mut dsn = format!("mysql:host={}", config.host);
                if !config.name.is_empty() {
                    dsn.push_str(&format!(";dbname={}", config.name));
                }
                if let Some(port) = config.port {
                    dsn.push_str(&format!(";port={}", port));
                }
                if let Some(socket) = config.socket.as_deref().filter(|s| !s.is_empty()) {
                    dsn.push_str(&format!(";unix_socket={}", socket));
                }
                if !config.charset.is_empty() {
                    dsn.push_str(&format!(";charset={}", config.charset));
                }
                dsn
            }
            Dialect::SqlServer => {
                let mut dsn = format!("sqlsrv:Database={};Server={}", config.name, config.host);
                if let Some(port) = config.port {
                    dsn.push_str(&format!(",{}", port));
                }
                dsn
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::SqlServer => write!(f, "sqlserver"),
        }
    }
}

fn clause(keyword: &str, body: &Option<String>) -> String {
    match body.as_deref().map(str::trim) {
        Some(body) if !body.is_empty() => format!("{} {}", keyword, body),
        _ => String::new(),
    }
}

/// 将连续空白折叠为单个空格，便于比较编译结果
pub fn normalize_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
