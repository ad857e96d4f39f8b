//! # 路由规则
//!
//! 规则由正则模式与导向结果组成，导向结果三选一：
//! - `Mapping`：捕获组按 `$i` 键投放到目标键（支持一层 `group.field` 嵌套）
//! - `Template`：反向引用替换后得到新的路径字符串
//! - `Callback`：以捕获组为参数调用闭包

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};

use crate::exception::Exception;
use crate::packet::{split_modules, Params, RoutePacket};
use crate::param::{OVERFLOW_KEY, PARAMS_GROUP};
use crate::pathinfo::parse_path;

/// 回调规则的返回值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    /// 回调已自行完成响应，停止处理
    Handled,
    /// 返回一个待解析的 `"模块s/控制器/操作"` 路径
    Path(String),
    /// 直接返回路由结果
    Packet(RoutePacket),
    /// 不接受本次匹配，继续尝试下一条规则
    Decline,
}

pub type RouteCallback = Arc<dyn Fn(&[String]) -> CallbackResult + Send + Sync>;

/// 规则的导向结果，一条规则只能取其一
#[derive(Clone)]
pub enum RuleSpec {
    Mapping(BTreeMap<String, String>),
    Template(String),
    Callback(RouteCallback),
}

impl RuleSpec {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> CallbackResult + Send + Sync + 'static,
    {
        RuleSpec::Callback(Arc::new(f))
    }

    pub fn template(template: impl Into<String>) -> Self {
        RuleSpec::Template(template.into())
    }

    pub fn mapping<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        RuleSpec::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
            RuleSpec::Template(template) => f.debug_tuple("Template").field(template).finish(),
            RuleSpec::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: String,
    pub spec: RuleSpec,
}

impl RouteRule {
    pub fn new(pattern: impl Into<String>, spec: RuleSpec) -> Self {
        Self {
            pattern: pattern.into(),
            spec,
        }
    }
}

/// 配置文件中的规则项：`template` 与 `mapping` 必须且只能给出一个
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub mapping: Option<BTreeMap<String, String>>,
}

impl TryFrom<&RuleConfig> for RouteRule {
    type Error = Exception;

    fn try_from(config: &RuleConfig) -> Result<Self, Self::Error> {
        let spec = match (&config.template, &config.mapping) {
            (Some(template), None) => RuleSpec::Template(template.clone()),
            (None, Some(mapping)) => RuleSpec::Mapping(mapping.clone()),
            (Some(_), Some(_)) => {
                return Err(Exception::Config(format!(
                    "route rule '{}' sets both template and mapping",
                    config.pattern
                )))
            }
            (None, None) => {
                return Err(Exception::Config(format!(
                    "route rule '{}' sets neither template nor mapping",
                    config.pattern
                )))
            }
        };
        Ok(RouteRule::new(config.pattern.clone(), spec))
    }
}

/// 映射规则匹配后的字段集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFields {
    pub values: BTreeMap<String, String>,
    pub nested: BTreeMap<String, BTreeMap<String, String>>,
    /// 没有 `$i` 去向的捕获值，按出现顺序
    pub overflow: Vec<String>,
}

impl RuleFields {
    /// 以映射规则的字面项为初始值，`$i` 项留给捕获组填充
    pub fn from_mapping(mapping: &BTreeMap<String, String>) -> Self {
        let mut fields = Self::default();
        for (key, value) in mapping.iter().filter(|(k, _)| !k.starts_with('$')) {
            fields.assign(key, value.clone());
        }
        fields
    }

    /// `group.field` 形式的键写入嵌套分组，其他写入平铺字段
    pub fn assign(&mut self, key: &str, value: String) {
        match key.split_once('.') {
            Some((group, field)) if !group.is_empty() => {
                self.nested
                    .entry(group.to_string())
                    .or_default()
                    .insert(field.to_string(), value);
            }
            _ if key == OVERFLOW_KEY => self.overflow.push(value),
            _ => {
                self.values.insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// `m`/`c`/`a` 为模块、控制器、操作，`p` 分组为参数，
    /// 溢出的捕获值以序号为键补入参数（键已存在时不覆盖）
    pub fn into_packet(mut self) -> RoutePacket {
        let mut params: Params = self.nested.remove(PARAMS_GROUP).unwrap_or_default();
        for (index, value) in self.overflow.into_iter().enumerate() {
            params.entry(index.to_string()).or_insert(value);
        }
        RoutePacket::new(
            split_modules(self.values.get("m").map(String::as_str).unwrap_or("")),
            self.values.remove("c").unwrap_or_default(),
            self.values.remove("a").unwrap_or_default(),
            params,
        )
    }
}

/// 单条规则的匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    Fields(RuleFields),
    Path(String),
    Packet(RoutePacket),
    Handled,
}

impl RuleMatch {
    /// 转换为路由结果；`Handled` 没有对应的路由结果
    pub fn into_packet(self) -> Option<RoutePacket> {
        match self {
            RuleMatch::Fields(fields) => Some(fields.into_packet()),
            RuleMatch::Path(path) => {
                let parsed = parse_path(&path);
                Some(RoutePacket::new(
                    parsed.modules,
                    parsed.controller,
                    parsed.action,
                    parsed.query,
                ))
            }
            RuleMatch::Packet(packet) => Some(packet),
            RuleMatch::Handled => None,
        }
    }
}
