//! 路由结果类型：`RoutePacket` 与 `RouteOutcome`。

use std::collections::BTreeMap;

use serde_derive::Serialize;

/// 路由参数，键值均为字符串
pub type Params = BTreeMap<String, String>;

/// 一次请求的路由解析结果，构造后不可变。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutePacket {
    modules: Vec<String>,
    controller: String,
    action: String,
    params: Params,
}

impl RoutePacket {
    /// 空的模块段会被丢弃，因此 `["", ""]` 与 `[]` 等价
    pub fn new(
        modules: Vec<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
        params: Params,
    ) -> Self {
        Self {
            modules: modules.into_iter().filter(|m| !m.is_empty()).collect(),
            controller: controller.into(),
            action: action.into(),
            params,
        }
    }

    /// 以 `/` 连接的模块路径构造
    pub fn from_module_path(
        module_path: &str,
        controller: impl Into<String>,
        action: impl Into<String>,
        params: Params,
    ) -> Self {
        Self::new(split_modules(module_path), controller, action, params)
    }
}

impl RoutePacket {
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// 模块序列以 `/` 连接，没有模块时为空字符串
    pub fn module_path(&self) -> String {
        self.modules.join("/")
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// 路由解析的最终去向。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "target", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// 交给分发器执行
    Dispatch(RoutePacket),
    /// 外部重定向，请求处理到此为止
    Redirect(String),
    /// 回调规则已自行完成响应
    Handled,
}

impl RouteOutcome {
    pub fn packet(&self) -> Option<&RoutePacket> {
        match self {
            RouteOutcome::Dispatch(packet) => Some(packet),
            _ => None,
        }
    }
}

pub(crate) fn split_modules(module_path: &str) -> Vec<String> {
    module_path
        .split('/')
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
