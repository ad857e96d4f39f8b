use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::prelude::*;

use crate::dialect::Dialect;
use crate::exception::Exception;
use crate::param::*;
use crate::rule::RuleConfig;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    router: RouterConfig,
    #[serde(default)]
    database: Option<DatabaseConfig>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = File::open(filename)
            .map_err(|e| Exception::Config(format!("no such file {} exception:{}", filename, e)))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| Exception::Config(format!("Error Reading file: {}", e)))?;
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Exception> {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}", e);
                return Err(Exception::Config(e.to_string()));
            }
        };
        if raw_config.router.regex_cache_size == 0 {
            warn!(
                "regex_cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为{}。",
                REGEX_CACHE_SIZE
            );
            raw_config.router.regex_cache_size = REGEX_CACHE_SIZE;
        }
        info!(
            "路由规则已载入：静态{}条，通配符{}条，正则{}条",
            raw_config.router.static_route_rules.len(),
            raw_config.router.wildcard_route_rules.len(),
            raw_config.router.regular_route_rules.len()
        );
        Ok(raw_config)
    }
}

impl Config {
    pub fn router(&self) -> &RouterConfig {
        &self.router
    }

    /// 数据库配置，未配置时返回 `ConfigException`
    pub fn database(&self) -> Result<&DatabaseConfig, Exception> {
        self.database
            .as_ref()
            .ok_or_else(|| Exception::Config("no database configured".to_string()))
    }
}

fn default_true() -> bool {
    true
}

fn default_masquerade_tail() -> String {
    MASQUERADE_TAIL.to_string()
}

fn default_ap_bridge() -> String {
    AP_BRIDGE.to_string()
}

fn default_mca_bridge() -> String {
    MCA_BRIDGE.to_string()
}

fn default_param_bridge() -> String {
    PARAM_BRIDGE.to_string()
}

fn default_api_modules_variable() -> String {
    API_MODULES_VARIABLE.to_string()
}

fn default_api_controller_variable() -> String {
    API_CONTROLLER_VARIABLE.to_string()
}

fn default_api_action_variable() -> String {
    API_ACTION_VARIABLE.to_string()
}

fn default_regex_cache_size() -> usize {
    REGEX_CACHE_SIZE
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RouterConfig {
    #[serde(default = "default_true")]
    pub route_on: bool,
    #[serde(default = "default_true")]
    pub static_route_on: bool,
    #[serde(default)]
    pub static_route_rules: BTreeMap<String, String>,
    #[serde(default)]
    pub wildcard_route_on: bool,
    #[serde(default)]
    pub wildcard_route_rules: Vec<RuleConfig>,
    #[serde(default = "default_true")]
    pub regular_route_on: bool,
    #[serde(default)]
    pub regular_route_rules: Vec<RuleConfig>,

    #[serde(default)]
    pub api_mode_on: bool,
    #[serde(default = "default_api_modules_variable")]
    pub api_modules_variable: String,
    #[serde(default = "default_api_controller_variable")]
    pub api_controller_variable: String,
    #[serde(default = "default_api_action_variable")]
    pub api_action_variable: String,

    #[serde(default = "default_masquerade_tail")]
    pub masquerade_tail: String,
    #[serde(default = "default_ap_bridge")]
    pub ap_bridge: String,
    #[serde(default = "default_mca_bridge")]
    pub mm_bridge: String,
    #[serde(default = "default_mca_bridge")]
    pub mc_bridge: String,
    #[serde(default = "default_mca_bridge")]
    pub ca_bridge: String,
    #[serde(default = "default_param_bridge")]
    pub pp_bridge: String,
    #[serde(default = "default_param_bridge")]
    pub pkv_bridge: String,

    #[serde(default = "default_regex_cache_size")]
    pub regex_cache_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            route_on: true,
            static_route_on: true,
            static_route_rules: BTreeMap::new(),
            wildcard_route_on: false,
            wildcard_route_rules: Vec::new(),
            regular_route_on: true,
            regular_route_rules: Vec::new(),
            api_mode_on: false,
            api_modules_variable: default_api_modules_variable(),
            api_controller_variable: default_api_controller_variable(),
            api_action_variable: default_api_action_variable(),
            masquerade_tail: default_masquerade_tail(),
            ap_bridge: default_ap_bridge(),
            mm_bridge: default_mca_bridge(),
            mc_bridge: default_mca_bridge(),
            ca_bridge: default_mca_bridge(),
            pp_bridge: default_param_bridge(),
            pkv_bridge: default_param_bridge(),
            regex_cache_size: default_regex_cache_size(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_charset() -> String {
    "UTF8".to_string()
}

fn default_history_size() -> usize {
    SQL_HISTORY_SIZE
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// 直接给出 DSN 时忽略其余连接参数
    #[serde(default)]
    pub dsn: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub socket: Option<String>,
    /// SQL 历史的容量，超出时丢弃最早的记录
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            dsn: None,
            name: String::new(),
            user: String::new(),
            password: String::new(),
            host: default_host(),
            port: None,
            charset: default_charset(),
            socket: None,
            history_size: default_history_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml_str("").unwrap();
        let router = config.router();
        assert!(router.route_on);
        assert!(router.static_route_on);
        assert!(!router.wildcard_route_on);
        assert!(router.regular_route_on);
        assert_eq!(router.masquerade_tail, ".html");
        assert_eq!(router.ap_bridge, ".");
        assert_eq!(router.api_modules_variable, "_m");
        assert_eq!(router.regex_cache_size, REGEX_CACHE_SIZE);
        assert!(matches!(config.database(), Err(Exception::Config(_))));
    }

    #[test]
    fn test_zero_cache_size_replaced() {
        let config = Config::from_toml_str("[router]\nregex_cache_size = 0\n").unwrap();
        assert_eq!(config.router().regex_cache_size, REGEX_CACHE_SIZE);
    }

    #[test]
    fn test_rules_and_database_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[router]
wildcard_route_on = true

[router.static_route_rules]
"/about" = "site/page/about"

[[router.wildcard_route_rules]]
pattern = "user/[num]"
mapping = {{ c = "user", a = "profile", "$1" = "p.uid" }}

[[router.regular_route_rules]]
pattern = 'article/(\d+)'
template = "blog/article/view?id=$1"

[database]
dialect = "mysql"
name = "shop"
user = "root"
port = 3306
"#
        )
        .unwrap();

        let config = Config::from_toml(file.path().to_str().unwrap()).unwrap();
        let router = config.router();
        assert_eq!(router.static_route_rules["/about"], "site/page/about");
        assert_eq!(router.wildcard_route_rules[0].pattern, "user/[num]");
        assert_eq!(
            router.wildcard_route_rules[0].mapping.as_ref().unwrap()["$1"],
            "p.uid"
        );
        assert_eq!(
            router.regular_route_rules[0].template.as_deref(),
            Some("blog/article/view?id=$1")
        );

        let database = config.database().unwrap();
        assert_eq!(database.dialect, Dialect::MySql);
        assert_eq!(database.name, "shop");
        assert_eq!(database.port, Some(3306));
        assert_eq!(database.host, "127.0.0.1");
        assert_eq!(database.history_size, SQL_HISTORY_SIZE);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_toml("/nonexistent/inframe.toml");
        assert!(matches!(result, Err(Exception::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml_str("[router\n"),
            Err(Exception::Config(_))
        ));
    }
}
