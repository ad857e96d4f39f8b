// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # PATH_INFO 解析工具
//!
//! 路由器的兜底解析器以及规则路由的结果都依赖这里的纯函数：
//! 1. `parse_path`：`"模块s/控制器/操作?查询串"` 形式的目标路径。
//! 2. `parse_mca`：按可配置衔接符从右向左拆分模块、控制器、操作。
//! 3. `fetch_key_value_pair`：将参数段拆分为键值对。
//! 4. `substitute_backrefs`：模板规则的反向引用替换。

use regex::Captures;
use url::form_urlencoded;

use crate::packet::{split_modules, Params};
use crate::param::BACKREFERENCE;

/// `parse_path` 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    pub modules: Vec<String>,
    pub controller: String,
    pub action: String,
    /// `?` 之后的查询参数
    pub query: Params,
}

impl ParsedPath {
    pub fn module_path(&self) -> String {
        self.modules.join("/")
    }
}

/// `parse_mca` 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mca {
    pub modules: Vec<String>,
    pub controller: String,
    pub action: String,
}

/// 解析 `"模块s/控制器/操作"`，末段为操作，倒数第二段为控制器，其余为模块。
pub fn parse_path(path: &str) -> ParsedPath {
    let (path, query) = match path.find('?') {
        Some(pos) => (&path[..pos], decode_query(&path[pos + 1..])),
        None => (path, Params::new()),
    };

    let mut segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let action = segments.pop().unwrap_or_default().to_string();
    let controller = segments.pop().unwrap_or_default().to_string();

    ParsedPath {
        modules: split_modules(&segments.join("/")),
        controller,
        action,
        query,
    }
}

/// 解析"模块、控制器、操作"。
///
/// 逆向查找：最后一个 `ca` 之后为操作，剩余部分最后一个 `mc` 之后为控制器，
/// 再剩余的部分以 `mm` 拆分为模块序列。缺失的部分为空。
pub fn parse_mca(mca: &str, mm: &str, mc: &str, ca: &str) -> Mca {
    let mut parsed = Mca::default();
    let mca = mca.trim_matches(|c| c == ' ' || c == '/');

    let capos = match mca.rfind(ca) {
        Some(pos) if !ca.is_empty() => pos,
        _ => {
            // 找不到控制器与操作之间的衔接符，一定不存在控制器
            parsed.action = mca.to_string();
            return parsed;
        }
    };
    parsed.action = mca[capos + ca.len()..].to_string();

    let mc_part = &mca[..capos];
    match mc_part.rfind(mc) {
        Some(mcpos) if !mc.is_empty() => {
            parsed.controller = mc_part[mcpos + mc.len()..].to_string();
            let m_part = &mc_part[..mcpos];
            if !m_part.is_empty() {
                parsed.modules = if mm.is_empty() {
                    vec![m_part.to_string()]
                } else {
                    m_part.split(mm).map(str::to_string).collect()
                };
            }
        }
        _ => parsed.controller = mc_part.to_string(),
    }
    parsed
}

/// 将参数段转换为参数表。
///
/// 两个衔接符相同时按位置两两成对，落单的末尾元素被丢弃；
/// 不同时每段按第一个键值衔接符拆分，不含该衔接符的段被丢弃。
pub fn fetch_key_value_pair(params: &str, ppb: &str, pkvb: &str) -> Params {
    let mut pairs = Params::new();
    let params = params.trim_matches(|c: char| c == ' ' || ppb.contains(c) || pkvb.contains(c));
    if params.is_empty() || ppb.is_empty() {
        return pairs;
    }

    if ppb != pkvb {
        for pair in params.split(ppb) {
            if let Some((key, value)) = pair.split_once(pkvb).filter(|_| !pkvb.is_empty()) {
                pairs.insert(key.to_string(), value.to_string());
            }
        }
    } else {
        let elements: Vec<&str> = params.split(ppb).collect();
        for chunk in elements.chunks(2) {
            if let [key, value] = chunk {
                pairs.insert(key.to_string(), value.to_string());
            }
        }
    }
    pairs
}

/// 用捕获组替换模板中的 `$n`、`${n}`、`\n`，不存在或未参与匹配的组替换为空串
pub fn substitute_backrefs(template: &str, captures: &Captures<'_>) -> String {
    BACKREFERENCE
        .replace_all(template, |refs: &Captures<'_>| {
            let index = refs
                .get(1)
                .or_else(|| refs.get(2))
                .or_else(|| refs.get(3))
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(0);
            captures
                .get(index)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

/// 解码 `application/x-www-form-urlencoded` 查询串
pub fn decode_query(query: &str) -> Params {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

/// 编码参数为查询串
pub fn encode_query<'a>(pairs: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
