//! # 数据访问对象
//!
//! `Dao` 持有一个数据库驱动与所使用的方言，负责：
//! - 执行查询/语句，并把驱动错误包装为带有 SQL 与参数的异常；
//! - 记录本连接上最近执行过的 SQL（容量有限，超出时丢弃最早的记录）；
//! - 转发事务操作。
//!
//! 驱动本身通过 `Driver` trait 注入，框架不内置任何真实数据库驱动。

use std::collections::VecDeque;

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::dialect::Dialect;
use crate::exception::Exception;
use crate::param::SQL_HISTORY_SIZE;
use crate::query::{BindParams, QueryComponents};

/// 结果集中的一行，列名到值
pub type Row = serde_json::Map<String, Value>;

/// 驱动返回的原始错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct DriverError {
    pub code: String,
    pub message: String,
}

impl DriverError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 数据库驱动需要提供的能力
#[cfg_attr(test, mockall::automock)]
pub trait Driver {
    /// 执行返回结果集的语句
    fn query(&mut self, sql: &str, params: &BindParams) -> Result<Vec<Row>, DriverError>;
    /// 执行语句，返回受影响的行数
    fn exec(&mut self, sql: &str, params: &BindParams) -> Result<u64, DriverError>;
    fn last_insert_id(&mut self) -> Result<Value, DriverError>;
    fn begin_transaction(&mut self) -> Result<(), DriverError>;
    fn commit(&mut self) -> Result<(), DriverError>;
    fn rollback(&mut self) -> Result<(), DriverError>;
    fn in_transaction(&self) -> bool;
}

/// 一条执行记录
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: BindParams,
}

pub struct Dao<D: Driver> {
    driver: D,
    dialect: Dialect,
    history: VecDeque<Statement>,
    history_size: usize,
}

impl<D: Driver> Dao<D> {
    pub fn new(driver: D, dialect: Dialect) -> Self {
        Self {
            driver,
            dialect,
            history: VecDeque::new(),
            history_size: SQL_HISTORY_SIZE,
        }
    }

    /// 设置历史容量，至少保留一条以支持 `last_sql`
    pub fn with_history_size(mut self, size: usize) -> Self {
        if size == 0 {
            warn!("SQL历史容量不能为0，已调整为1");
        }
        self.history_size = size.max(1);
        while self.history.len() > self.history_size {
            self.history.pop_front();
        }
        self
    }

    /// 按配置建立连接。
    ///
    /// 配置中给出 `dsn` 时直接使用，否则由方言根据连接参数生成；
    /// `connector` 接收 DSN 与数据库配置，失败时返回 `Exception::Connect`。
    pub fn connect<F>(config: &DatabaseConfig, connector: F) -> Result<Self, Exception>
    where
        F: FnOnce(&str, &DatabaseConfig) -> Result<D, DriverError>,
    {
        let dsn = match config.dsn.as_deref().filter(|dsn| !dsn.is_empty()) {
            Some(dsn) => dsn.to_string(),
            None => config.dialect.build_dsn(config),
        };
        match connector(&dsn, config) {
            Ok(driver) => {
                info!("已连接数据库：{}", dsn);
                Ok(Self::new(driver, config.dialect).with_history_size(config.history_size))
            }
            Err(e) => {
                error!("无法连接数据库 {}：{}", dsn, e);
                Err(Exception::Connect(format!("{} ({})", e, dsn)))
            }
        }
    }

    /// 执行查询并返回结果集
    pub fn query(&mut self, sql: &str, params: BindParams) -> Result<Vec<Row>, Exception> {
        debug!("query: {} {}", sql, params);
        let result = self.driver.query(sql, &params);
        let statement = self.record(sql, params);
        result.map_err(|e| {
            let message = describe(&e, statement);
            error!("查询失败：{}", message);
            Exception::Query(message)
        })
    }

    /// 执行语句并返回受影响的行数
    pub fn exec(&mut self, sql: &str, params: BindParams) -> Result<u64, Exception> {
        debug!("exec: {} {}", sql, params);
        let result = self.driver.exec(sql, &params);
        let statement = self.record(sql, params);
        result.map_err(|e| {
            let message = describe(&e, statement);
            error!("执行失败：{}", message);
            Exception::Execute(message)
        })
    }

    pub fn last_insert_id(&mut self) -> Result<Value, Exception> {
        self.driver
            .last_insert_id()
            .map_err(|e| Exception::Database(e.to_string()))
    }

    pub fn begin_transaction(&mut self) -> Result<(), Exception> {
        self.driver
            .begin_transaction()
            .map_err(|e| Exception::Database(e.to_string()))
    }

    pub fn commit(&mut self) -> Result<(), Exception> {
        self.driver.commit().map_err(|e| Exception::Database(e.to_string()))
    }

    pub fn rollback(&mut self) -> Result<(), Exception> {
        self.driver.rollback().map_err(|e| Exception::Database(e.to_string()))
    }

    pub fn in_transaction(&self) -> bool {
        self.driver.in_transaction()
    }

    fn record(&mut self, sql: &str, params: BindParams) -> &Statement {
        if self.history.len() >= self.history_size {
            self.history.pop_front();
        }
        self.history.push_back(Statement {
            sql: sql.to_string(),
            params,
        });
        &self.history[self.history.len() - 1]
    }
}

// --- 方言与历史记录 ---

impl<D: Driver> Dao<D> {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn escape(&self, field: &str) -> String {
        self.dialect.escape(field)
    }

    pub fn compile(&self, components: &QueryComponents) -> String {
        self.dialect.compile(components)
    }

    pub fn last_sql(&self) -> Option<&str> {
        self.history.back().map(|s| s.sql.as_str())
    }

    pub fn last_params(&self) -> Option<&BindParams> {
        self.history.back().map(|s| &s.params)
    }

    /// 最近执行的语句，按执行顺序排列
    pub fn history(&self) -> &VecDeque<Statement> {
        &self.history
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

fn describe(e: &DriverError, statement: &Statement) -> String {
    format!("{} ;SQL: {} ;PARAMS: {}", e, statement.sql, statement.params)
}
