// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由引擎
//!
//! 将请求路径解析为 `RoutePacket`（模块、控制器、操作、参数）。
//!
//! ## 路由顺序：
//! 1. 静态路由：URL 与规则表的键完全相等。以 `http` 开头的目标触发外部重定向。
//! 2. 通配符路由：`[any]`、`[num]`、`[id]` 替换为正则后按正则路由处理。
//! 3. 正则路由：模式两端锚定，第一条匹配的规则胜出。
//! 4. 兜底解析：API 模式读取查询变量，否则按 PATH_INFO 拆分 MCA 段与参数段。
//!
//! 路由器不会因为畸形输入报错，缺失的部分一律为空。

use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, info, warn};

use crate::cache::RegexCache;
use crate::config::RouterConfig;
use crate::exception::Exception;
use crate::packet::{split_modules, Params, RouteOutcome, RoutePacket};
use crate::param::{REDIRECT_PREFIX, WILDCARD_TOKENS};
use crate::pathinfo::{
    decode_query, encode_query, fetch_key_value_pair, parse_mca, parse_path, substitute_backrefs,
};
use crate::request::Request;
use crate::rule::{CallbackResult, RouteRule, RuleFields, RuleMatch, RuleSpec};

pub struct Router {
    config: RouterConfig,
    static_rules: HashMap<String, String>,
    wildcard_rules: Vec<RouteRule>,
    regular_rules: Vec<RouteRule>,
    regex_cache: Mutex<RegexCache>,
}

impl Router {
    /// 根据配置构造路由器，规则项非法时返回 `ConfigException`
    pub fn new(config: RouterConfig) -> Result<Self, Exception> {
        let wildcard_rules = config
            .wildcard_route_rules
            .iter()
            .map(RouteRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let regular_rules = config
            .regular_route_rules
            .iter()
            .map(RouteRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let static_rules = config
            .static_route_rules
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let regex_cache = Mutex::new(RegexCache::from_capacity(config.regex_cache_size.max(1)));

        Ok(Self {
            config,
            static_rules,
            wildcard_rules,
            regular_rules,
            regex_cache,
        })
    }

    pub fn add_static_rule(&mut self, path: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.static_rules.insert(path.into(), target.into());
        self
    }

    pub fn add_wildcard_rule(&mut self, pattern: impl Into<String>, spec: RuleSpec) -> &mut Self {
        self.wildcard_rules.push(RouteRule::new(pattern, spec));
        self
    }

    pub fn add_regular_rule(&mut self, pattern: impl Into<String>, spec: RuleSpec) -> &mut Self {
        self.regular_rules.push(RouteRule::new(pattern, spec));
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

impl Router {
    /// 解析一个请求
    pub fn dispatch(&self, request: &Request) -> RouteOutcome {
        self.parse(request.path(), request.query())
    }

    /// 按静态、通配符、正则、兜底的顺序解析 URL
    pub fn parse(&self, url: &str, query: &Params) -> RouteOutcome {
        let config = &self.config;
        debug!("路由匹配开始: url='{}'", url);

        if config.route_on {
            if config.static_route_on {
                if let Some(target) = self.static_rules.get(url) {
                    return self.static_outcome(url, target, query);
                }
            }

            if config.wildcard_route_on {
                for rule in &self.wildcard_rules {
                    let pattern = expand_wildcards(&rule.pattern);
                    if let Some(outcome) = self.try_rule(&pattern, url, &rule.spec) {
                        debug!("通配符路由命中：{}", rule.pattern);
                        return outcome;
                    }
                }
            }

            if config.regular_route_on {
                for rule in &self.regular_rules {
                    if let Some(outcome) = self.try_rule(&rule.pattern, url, &rule.spec) {
                        debug!("正则路由命中：{}", rule.pattern);
                        return outcome;
                    }
                }
            }
        }

        let packet = if config.api_mode_on {
            self.parse_api(query)
        } else {
            self.parse_pathinfo(url)
        };
        RouteOutcome::Dispatch(packet)
    }

    fn static_outcome(&self, url: &str, target: &str, query: &Params) -> RouteOutcome {
        if target.starts_with(REDIRECT_PREFIX) {
            let mut location = target.to_string();
            if !query.is_empty() {
                location.push(if target.find('?').unwrap_or(0) > 0 { '&' } else { '?' });
                location.push_str(&encode_query(query));
            }
            info!("静态路由{}重定向至{}", url, location);
            return RouteOutcome::Redirect(location);
        }

        debug!("静态路由命中：{} => {}", url, target);
        let parsed = parse_path(target);
        RouteOutcome::Dispatch(RoutePacket::new(
            parsed.modules,
            parsed.controller,
            parsed.action,
            parsed.query,
        ))
    }

    fn try_rule(&self, pattern: &str, url: &str, spec: &RuleSpec) -> Option<RouteOutcome> {
        let matched = self.match_regular(pattern, url, spec)?;
        Some(match matched.into_packet() {
            Some(packet) => RouteOutcome::Dispatch(packet),
            None => RouteOutcome::Handled,
        })
    }

    /// 使用正则表达式匹配 URL，不匹配时返回 `None`。
    ///
    /// 模式两端被锚定，`/` 无需转义。
    pub fn match_regular(&self, pattern: &str, url: &str, spec: &RuleSpec) -> Option<RuleMatch> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = {
            let mut cache = match self.regex_cache.lock() {
                Ok(lock) => lock,
                Err(poisoned) => {
                    warn!("正则缓存锁被污染，恢复并继续");
                    poisoned.into_inner()
                }
            };
            cache.get_or_compile(&anchored)?
        };
        let captures = regex.captures(url)?;

        match spec {
            RuleSpec::Mapping(mapping) => {
                let mut fields = RuleFields::from_mapping(mapping);
                for i in 1..captures.len() {
                    let value = captures
                        .get(i)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    match mapping.get(&format!("${}", i)) {
                        Some(destination) => fields.assign(destination, value),
                        None => fields.overflow.push(value),
                    }
                }
                Some(RuleMatch::Fields(fields))
            }
            RuleSpec::Template(template) => {
                Some(RuleMatch::Path(substitute_backrefs(template, &captures)))
            }
            RuleSpec::Callback(callback) => {
                let args: Vec<String> = captures
                    .iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                match callback(&args) {
                    CallbackResult::Handled => Some(RuleMatch::Handled),
                    CallbackResult::Path(path) => Some(RuleMatch::Path(path)),
                    CallbackResult::Packet(packet) => Some(RuleMatch::Packet(packet)),
                    CallbackResult::Decline => None,
                }
            }
        }
    }

    fn parse_api(&self, query: &Params) -> RoutePacket {
        let config = &self.config;
        let mut params = query.clone();
        let modules = params.remove(&config.api_modules_variable).unwrap_or_default();
        let controller = params.remove(&config.api_controller_variable).unwrap_or_default();
        let action = params.remove(&config.api_action_variable).unwrap_or_default();
        RoutePacket::new(split_modules(&modules), controller, action, params)
    }

    fn parse_pathinfo(&self, url: &str) -> RoutePacket {
        let config = &self.config;
        let tail = config.masquerade_tail.as_str();
        let url = match url.strip_suffix(tail) {
            Some(stripped) if !tail.is_empty() => stripped,
            _ => url,
        };

        let ap = config.ap_bridge.as_str();
        let (mca_part, param_part) = match url.find(ap).filter(|_| !ap.is_empty()) {
            Some(pos) => (url[..pos].trim_matches('/'), &url[pos + ap.len()..]),
            None => (url.trim_matches('/'), ""),
        };

        let mca = parse_mca(mca_part, &config.mm_bridge, &config.mc_bridge, &config.ca_bridge);
        let params = fetch_key_value_pair(param_part, &config.pp_bridge, &config.pkv_bridge);
        RoutePacket::new(mca.modules, mca.controller, mca.action, params)
    }

    /// 根据路由结果生成 URL，是兜底解析的逆过程。
    ///
    /// PATH_INFO 模式下键或值为空的参数无法表达，会被省略；
    /// 生成的 URL 解析后与（省略空参数后的）路由结果不一致时返回 `None`，
    /// 例如有控制器但操作为空，或某一部分含有衔接符。
    pub fn build(&self, packet: &RoutePacket) -> Option<String> {
        let config = &self.config;

        if config.api_mode_on {
            let modules = packet.module_path();
            let controller = packet.controller().to_string();
            let action = packet.action().to_string();
            let route = [
                (&config.api_modules_variable, &modules),
                (&config.api_controller_variable, &controller),
                (&config.api_action_variable, &action),
            ];
            let pairs: Vec<(&String, &String)> = route
                .iter()
                .map(|(k, v)| (*k, *v))
                .filter(|(_, v)| !v.is_empty())
                .chain(packet.params().iter())
                .collect();
            let url = format!("?{}", encode_query(pairs));
            return self.verify_build(&url, packet, self.parse_api(&decode_query(&url[1..])));
        }

        let params: Params = packet
            .params()
            .iter()
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut url = String::from("/");
        if !packet.modules().is_empty() {
            url.push_str(&packet.modules().join(&config.mm_bridge));
            url.push_str(&config.mc_bridge);
            url.push_str(packet.controller());
            url.push_str(&config.ca_bridge);
        } else if !packet.controller().is_empty() {
            url.push_str(packet.controller());
            url.push_str(&config.ca_bridge);
        }
        url.push_str(packet.action());

        if !params.is_empty() {
            let pairs: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}{}{}", k, config.pkv_bridge, v))
                .collect();
            url.push_str(&config.ap_bridge);
            url.push_str(&pairs.join(&config.pp_bridge));
        }
        url.push_str(&config.masquerade_tail);

        let expected = RoutePacket::new(
            packet.modules().to_vec(),
            packet.controller(),
            packet.action(),
            params,
        );
        self.verify_build(&url, &expected, self.parse_pathinfo(&url))
    }

    fn verify_build(&self, url: &str, expected: &RoutePacket, parsed: RoutePacket) -> Option<String> {
        if &parsed == expected {
            Some(url.to_string())
        } else {
            warn!("路由结果无法表达为URL：{:?}，生成的{}将被解析为{:?}", expected, url, parsed);
            None
        }
    }
}

/// 将通配符占位符替换为对应的正则表达式
pub fn expand_wildcards(pattern: &str) -> String {
    WILDCARD_TOKENS
        .iter()
        .fold(pattern.to_string(), |acc, (token, regex)| acc.replace(token, regex))
}
