// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 查询组件与片段翻译
//!
//! 该模块承载 SQL 构建器的状态与片段翻译规则：
//! - `QueryComponents`：尚未编译的 SELECT 组件。
//! - `Segments`：字段条件列表，翻译为 SQL 片段与绑定参数。
//! - `BindParams`：交给驱动的位置参数或命名参数。
//!
//! ## 片段翻译规则
//! - `=`、`!=`、`LIKE`、`NOT LIKE`：值为 `NULL` 时直接写入 `NULL`，不产生占位符；
//!   否则写入 `:字段名` 占位符并记录绑定值。
//! - `IN`、`NOT IN`：值列表以 `'a','b'` 形式直接内联进 SQL，不做参数绑定，
//!   调用方需自行保证元素安全。
//! - 含 `.` 的字段名视为已限定表名，不做转义，占位符取最后一段。
//! - 同一列表中占位符重名时，后出现者追加 `_2`、`_3` 等后缀。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde_json::Value;

use crate::dialect::Dialect;
use crate::exception::Exception;
use crate::param::{CONNECT_AND, CONNECT_COMMA, CONNECT_OR};

/// 尚未编译的 SELECT 组件，各子句不含关键字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryComponents {
    pub distinct: bool,
    /// 已拼接好的字段列表
    pub fields: String,
    pub table: String,
    pub joins: Vec<String>,
    pub where_clause: Option<String>,
    pub group: Option<String>,
    pub having: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for QueryComponents {
    fn default() -> Self {
        Self {
            distinct: false,
            fields: "*".to_string(),
            table: String::new(),
            joins: Vec::new(),
            where_clause: None,
            group: None,
            having: None,
            order: None,
            limit: None,
            offset: None,
        }
    }
}

/// 字段条件运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Like,
    NotLike,
    In,
    NotIn,
}

impl FromStr for Operator {
    type Err = Exception;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "=" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            _ => Err(Exception::Database(format!("operator '{}' is invalid", s))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operator::Equal => write!(f, "="),
            Operator::NotEqual => write!(f, "!="),
            Operator::Like => write!(f, "LIKE"),
            Operator::NotLike => write!(f, "NOT LIKE"),
            Operator::In => write!(f, "IN"),
            Operator::NotIn => write!(f, "NOT IN"),
        }
    }
}

/// 片段之间的连接符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    Comma,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => CONNECT_AND,
            Connective::Or => CONNECT_OR,
            Connective::Comma => CONNECT_COMMA,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// 普通字段条件
    Field {
        field: String,
        value: Value,
        operator: Operator,
    },
    /// 调用方自行准备好的 SQL 片段及其绑定值，占位符以 `:` 开头
    Prepared {
        sql: String,
        placeholder: String,
        value: Value,
    },
}

/// 有序的条件片段列表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segments(Vec<Segment>);

impl Segments {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field = value`
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, value, Operator::Equal)
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>, operator: Operator) -> Self {
        self.0.push(Segment::Field {
            field: field.into(),
            value: value.into(),
            operator,
        });
        self
    }

    /// 过于复杂的条件由调用方自定义，例如 `("price * :rate > 100", ":rate", 1.2)`
    pub fn prepared(
        mut self,
        sql: impl Into<String>,
        placeholder: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.0.push(Segment::Prepared {
            sql: sql.into(),
            placeholder: placeholder.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Segments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Segments::new(), |segments, (k, v)| segments.eq(k, v))
    }
}

/// WHERE 条件或 UPDATE 的 SET 部分：原样使用的字符串，或待翻译的片段
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Raw(String),
    Segments(Segments),
}

impl From<&str> for Condition {
    fn from(raw: &str) -> Self {
        Condition::Raw(raw.to_string())
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        Condition::Raw(raw)
    }
}

impl From<Segments> for Condition {
    fn from(segments: Segments) -> Self {
        Condition::Segments(segments)
    }
}

impl Condition {
    /// 解析为 SQL 片段与命名绑定参数
    pub fn resolve(&self, dialect: Dialect, connective: Connective) -> (String, BTreeMap<String, Value>) {
        match self {
            Condition::Raw(raw) => (raw.trim().to_string(), BTreeMap::new()),
            Condition::Segments(segments) => parse_segments(dialect, segments, connective),
        }
    }
}

/// 字段设置方式
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// `*`
    All,
    /// 原样使用
    Raw(String),
    /// 字段名列表，逐个转义
    List(Vec<String>),
    /// 字段名与值，字段名转义后用于查询，值记入 fields 阶段的绑定参数
    Values(Vec<(String, Value)>),
}

impl From<&str> for FieldSpec {
    fn from(raw: &str) -> Self {
        FieldSpec::Raw(raw.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(raw: String) -> Self {
        FieldSpec::Raw(raw)
    }
}

impl From<Vec<&str>> for FieldSpec {
    fn from(list: Vec<&str>) -> Self {
        FieldSpec::List(list.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for FieldSpec {
    fn from(list: Vec<String>) -> Self {
        FieldSpec::List(list)
    }
}

/// JOIN 的类型；`Raw` 保持调用方给出的原样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Raw,
    Join,
    Inner,
    LeftOuter,
}

impl JoinKind {
    pub fn render(&self, join: &str) -> String {
        match self {
            JoinKind::Raw => join.to_string(),
            JoinKind::Join => format!("JOIN {}", join),
            JoinKind::Inner => format!("INNER JOIN {}", join),
            JoinKind::LeftOuter => format!("LEFT OUTER JOIN {}", join),
        }
    }
}

/// 交给驱动的绑定参数
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BindParams {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(BTreeMap<String, Value>),
}

impl BindParams {
    pub fn named(map: BTreeMap<String, Value>) -> Self {
        if map.is_empty() {
            BindParams::None
        } else {
            BindParams::Named(map)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BindParams::None => true,
            BindParams::Positional(values) => values.is_empty(),
            BindParams::Named(map) => map.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BindParams::None => 0,
            BindParams::Positional(values) => values.len(),
            BindParams::Named(map) => map.len(),
        }
    }

    pub fn get(&self, placeholder: &str) -> Option<&Value> {
        match self {
            BindParams::Named(map) => map.get(placeholder),
            _ => None,
        }
    }
}

impl fmt::Display for BindParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindParams::None => write!(f, "[]"),
            BindParams::Positional(values) => write!(f, "{}", Value::from(values.clone())),
            BindParams::Named(map) => {
                let object: serde_json::Map<String, Value> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                write!(f, "{}", Value::Object(object))
            }
        }
    }
}

/// 翻译单个字段条件，返回 SQL 片段与绑定参数
pub fn parse_segment(
    dialect: Dialect,
    field: &str,
    value: &Value,
    operator: Operator,
) -> (String, BTreeMap<String, Value>) {
    render_segment(dialect, field, value, operator, &default_holder(field))
}

/// 占位符以字段名的最后一段命名
fn default_holder(field: &str) -> String {
    match field.rsplit_once('.') {
        Some((_, name)) => format!(":{}", name),
        None => format!(":{}", field),
    }
}

fn render_segment(
    dialect: Dialect,
    field: &str,
    value: &Value,
    operator: Operator,
    holder: &str,
) -> (String, BTreeMap<String, Value>) {
    let mut input = BTreeMap::new();
    let column = if field.contains('.') {
        // 已经限定了表名
        field.to_string()
    } else {
        dialect.escape(field)
    };

    let sql = match operator {
        Operator::Equal | Operator::NotEqual | Operator::Like | Operator::NotLike => {
            if value.is_null() {
                format!("{} {} NULL", column, operator)
            } else {
                input.insert(holder.to_string(), value.clone());
                format!("{} {} {}", column, operator, holder)
            }
        }
        Operator::In | Operator::NotIn => {
            format!("{} {} ({})", column, operator, inline_list(value))
        }
    };
    (sql, input)
}

/// 翻译片段列表，以连接符连接并合并绑定参数。
///
/// 同一列表中占位符重名时（如 `a.status` 与 `b.status`），后出现的依次改名为
/// `:status_2`、`:status_3`……，并避开预处理片段中已写定的占位符。
pub fn parse_segments(
    dialect: Dialect,
    segments: &Segments,
    connective: Connective,
) -> (String, BTreeMap<String, Value>) {
    let mut taken: BTreeSet<String> = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Prepared { placeholder, .. } => Some(placeholder.clone()),
            Segment::Field { .. } => None,
        })
        .collect();

    let mut fragments = Vec::with_capacity(segments.len());
    let mut bind = BTreeMap::new();
    for segment in segments.iter() {
        match segment {
            Segment::Field {
                field,
                value,
                operator,
            } => {
                let holder = unique_holder(&default_holder(field), &taken);
                let (sql, input) = render_segment(dialect, field, value, *operator, &holder);
                if !input.is_empty() {
                    if holder != default_holder(field) {
                        debug!("占位符重名，{}改用{}", field, holder);
                    }
                    taken.insert(holder);
                }
                fragments.push(sql);
                bind.extend(input);
            }
            Segment::Prepared {
                sql,
                placeholder,
                value,
            } => {
                fragments.push(sql.clone());
                bind.insert(placeholder.clone(), value.clone());
            }
        }
    }
    (fragments.join(connective.as_str()), bind)
}

fn unique_holder(holder: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(holder) {
        return holder.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", holder, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| holder.to_string())
}

fn inline_list(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| format!("'{}'", scalar_text(item)))
            .collect::<Vec<_>>()
            .join(","),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
