// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求输入模块
//!
//! 路由器需要两样输入：请求路径（PATH_INFO）与查询参数。该模块负责从
//! 请求目标（如 `/blog/list.html?page=2`）或原始 HTTP 请求行中提取它们。

use log::error;
use percent_encoding::percent_decode_str;

use crate::{exception::Exception, packet::Params, pathinfo::decode_query};

/// 路由所需的请求元数据。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// 请求方法，原样保留（大写）
    method: String,
    /// 百分号解码后的请求路径，不含查询串
    path: String,
    /// 解码后的查询参数
    query: Params,
}

impl Request {
    /// 从请求目标构造，方法默认为 GET
    ///
    /// 路径按百分号编码解码（`+` 保持原样），非法 UTF-8 序列替换为 U+FFFD；
    /// 查询串按表单编码解码。
    pub fn from_uri(uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, decode_query(query)),
            None => (uri, Params::new()),
        };
        Self {
            method: "GET".to_string(),
            path: percent_decode_str(path).decode_utf8_lossy().into_owned(),
            query,
        }
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例，只解析请求行。
    ///
    /// # 错误处理
    /// 非 UTF-8 数据返回 `RequestIsNotUtf8`；请求行不是 `METHOD target VERSION`
    /// 的形式时返回 `InvalidRequestLine`。
    pub fn try_from(buffer: &[u8]) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string,
            Err(_) => {
                error!("无法解析HTTP请求");
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let first_line = request_string.lines().next().unwrap_or_default();
        let parts: Vec<&str> = first_line.split_whitespace().collect();
        if parts.len() != 3 || !parts[2].to_uppercase().starts_with("HTTP/") {
            error!("HTTP请求行格式不正确：{}", first_line);
            return Err(Exception::InvalidRequestLine(first_line.to_string()));
        }

        let mut request = Self::from_uri(parts[1]);
        request.method = parts[0].to_uppercase();
        Ok(request)
    }

    /// 替换查询参数，供 POST 表单等场景合并参数
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Params {
        &self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri_splits_query() {
        let request = Request::from_uri("/blog/list.html?page=2&tag=rust%20lang");
        assert_eq!(request.method(), "GET");
        assert_eq!(request.path(), "/blog/list.html");
        assert_eq!(request.query()["page"], "2");
        assert_eq!(request.query()["tag"], "rust lang");
    }

    #[test]
    fn test_from_uri_decodes_path() {
        let request = Request::from_uri("/caf%C3%A9/a%20b+c.html?q=%E4%B8%AD");
        assert_eq!(request.path(), "/café/a b+c.html");
        assert_eq!(request.query()["q"], "中");

        // 残缺的转义序列原样保留
        let request = Request::from_uri("/100%/x%2");
        assert_eq!(request.path(), "/100%/x%2");
    }

    #[test]
    fn test_from_uri_without_query() {
        let request = Request::from_uri("/index");
        assert_eq!(request.path(), "/index");
        assert!(request.query().is_empty());
    }

    /// 验证常规请求行的解析
    #[test]
    fn test_parse_request_line() {
        let buffer = b"post /user/save?id=3 HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let request = Request::try_from(buffer).unwrap();
        assert_eq!(request.method(), "POST");
        assert_eq!(request.path(), "/user/save");
        assert_eq!(request.query()["id"], "3");
    }

    /// 验证 UTF-8 编码检查
    #[test]
    fn test_invalid_utf8() {
        let result = Request::try_from(&[0xFF, 0xFE, 0xFD]);
        assert_eq!(result.unwrap_err(), Exception::RequestIsNotUtf8);
    }

    #[test]
    fn test_malformed_request_line() {
        let result = Request::try_from(b"GET /only-two\r\n\r\n");
        assert!(matches!(result, Err(Exception::InvalidRequestLine(_))));
    }
}
