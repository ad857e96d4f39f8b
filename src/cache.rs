use std::num::NonZeroUsize;

use log::{debug, warn};
use lru::LruCache;
use regex::Regex;

// 已编译路由正则的缓存。规则表在进程生命周期内不变，缓存项无需失效。
pub struct RegexCache {
    cache: LruCache<String, Regex>,
}

impl RegexCache {
    // 根据容量构造
    pub fn from_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            panic!("调用from_capacity时指定的大小是0。如果需要自动设置大小，请在调用处进行处理，而不是传入0");
        }
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap()),
        }
    }

    // 查询，未命中时编译并放入；非法的正则返回None且不缓存
    pub fn get_or_compile(&mut self, pattern: &str) -> Option<Regex> {
        if let Some(regex) = self.cache.get(pattern) {
            return Some(regex.clone());
        }
        match Regex::new(pattern) {
            Ok(regex) => {
                debug!("路由正则编译完成：{}", pattern);
                self.cache.put(pattern.to_string(), regex.clone());
                Some(regex)
            }
            Err(e) => {
                warn!("路由正则{}无法编译，按不匹配处理：{}", pattern, e);
                None
            }
        }
    }

    // 测试
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    #[cfg(test)]
    pub fn contains(&self, pattern: &str) -> bool {
        self.cache.contains(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_creation() {
        let cache = RegexCache::from_capacity(10);
        assert_eq!(cache.capacity(), 10);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    #[should_panic(expected = "调用from_capacity时指定的大小是0")]
    fn test_cache_zero_capacity_panics() {
        RegexCache::from_capacity(0);
    }

    #[test]
    fn test_compile_and_reuse() {
        let mut cache = RegexCache::from_capacity(3);
        let first = cache.get_or_compile(r"^(?:blog/(\d+))$").unwrap();
        assert!(first.is_match("blog/12"));
        assert_eq!(cache.len(), 1);

        cache.get_or_compile(r"^(?:blog/(\d+))$").unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_not_cached() {
        let mut cache = RegexCache::from_capacity(3);
        assert!(cache.get_or_compile(r"^(?:blog/(\d+)$").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = RegexCache::from_capacity(2);
        cache.get_or_compile("^a$");
        cache.get_or_compile("^b$");
        cache.get_or_compile("^a$");
        cache.get_or_compile("^c$");

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("^a$"));
        assert!(!cache.contains("^b$"));
        assert!(cache.contains("^c$"));
    }
}
