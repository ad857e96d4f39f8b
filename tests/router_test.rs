// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 路由器的集成测试与性质测试
//!
//! - 兜底解析：`build` 生成的 URL 经 `parse` 后得到同一个路由结果（PATH_INFO 与 API 两种模式）；
//!   无法表达的路由结果得到 `None`。
//! - `parse_mca`：以衔接符拼接的模块、控制器、操作可以被原样拆回。
//! - 规则优先级：静态路由先于通配符与正则路由。

use std::collections::BTreeMap;

use inframe::pathinfo::{fetch_key_value_pair, parse_mca};
use inframe::{Config, Params, Request, RouteOutcome, RoutePacket, Router, RouterConfig, RuleSpec};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn maybe_segment() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), segment()]
}

fn packet() -> impl Strategy<Value = RoutePacket> {
    (
        prop::collection::vec(segment(), 0..3),
        maybe_segment(),
        maybe_segment(),
        prop::collection::btree_map("[a-z]{1,4}", "[a-z0-9]{0,6}", 0..4),
    )
        .prop_map(|(modules, controller, action, params)| {
            RoutePacket::new(modules, controller, action, params)
        })
}

proptest! {
    #[test]
    fn prop_pathinfo_build_parse_round_trip(packet in packet()) {
        let router = Router::new(RouterConfig::default()).unwrap();
        let url = router.build(&packet);
        let unreachable = packet.action().is_empty()
            && (!packet.controller().is_empty() || !packet.modules().is_empty());
        if unreachable {
            prop_assert_eq!(url, None);
        } else {
            let url = url.unwrap();
            let params: Params = packet
                .params()
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let expected = RoutePacket::new(
                packet.modules().to_vec(),
                packet.controller(),
                packet.action(),
                params,
            );
            let outcome = router.parse(&url, &Params::new());
            prop_assert_eq!(outcome.packet(), Some(&expected));
        }
    }

    #[test]
    fn prop_api_build_dispatch_round_trip(packet in packet()) {
        let config = RouterConfig { api_mode_on: true, ..RouterConfig::default() };
        let router = Router::new(config).unwrap();
        let url = router.build(&packet).unwrap();
        let outcome = router.dispatch(&Request::from_uri(&url));
        prop_assert_eq!(outcome.packet(), Some(&packet));
    }

    #[test]
    fn prop_parse_mca_splits_joined_parts(
        modules in prop::collection::vec(segment(), 1..4),
        controller in segment(),
        action in segment(),
    ) {
        let joined = format!("{}/{}/{}", modules.join("/"), controller, action);
        let mca = parse_mca(&joined, "/", "/", "/");
        prop_assert_eq!(mca.modules, modules);
        prop_assert_eq!(mca.controller, controller);
        prop_assert_eq!(mca.action, action);
    }

    #[test]
    fn prop_template_substitutes_capture(id in 0u32..1_000_000) {
        let mut router = Router::new(RouterConfig::default()).unwrap();
        router.add_regular_rule(r"item/(\d+)", RuleSpec::template("shop/item/show?id=$1"));
        let outcome = router.parse(&format!("item/{}", id), &Params::new());
        let packet = outcome.packet().unwrap();
        prop_assert_eq!(packet.module_path(), "shop");
        prop_assert_eq!(packet.controller(), "item");
        prop_assert_eq!(packet.action(), "show");
        let expected = id.to_string();
        prop_assert_eq!(packet.param("id"), Some(expected.as_str()));
    }
}

#[test]
fn test_static_wins_over_rules() {
    let config = RouterConfig {
        wildcard_route_on: true,
        ..RouterConfig::default()
    };
    let mut router = Router::new(config).unwrap();
    router
        .add_static_rule("page/about", "site/page/fixed")
        .add_wildcard_rule("page/[any]", RuleSpec::template("site/page/wildcard"))
        .add_regular_rule(r"page/(\w+)", RuleSpec::template("site/page/regular"));

    let packet = router.parse("page/about", &Params::new()).packet().cloned().unwrap();
    assert_eq!(packet.action(), "fixed");

    let packet = router.parse("page/help", &Params::new()).packet().cloned().unwrap();
    assert_eq!(packet.action(), "wildcard");
}

#[test]
fn test_wildcard_before_regular() {
    let config = RouterConfig {
        wildcard_route_on: true,
        ..RouterConfig::default()
    };
    let mut router = Router::new(config).unwrap();
    router
        .add_regular_rule(r"post/(\d+)", RuleSpec::template("blog/post/regular?id=$1"))
        .add_wildcard_rule("post/[num]", RuleSpec::template("blog/post/wildcard?id=$1"));

    let packet = router.parse("post/8", &Params::new()).packet().cloned().unwrap();
    assert_eq!(packet.action(), "wildcard");
    assert_eq!(packet.param("id"), Some("8"));
}

#[test]
fn test_mapping_with_modules_and_overflow() {
    let mut router = Router::new(RouterConfig::default()).unwrap();
    router.add_regular_rule(
        r"(\d{4})/(\d{2})/(\w+)",
        RuleSpec::mapping([
            ("m", "front/blog"),
            ("c", "archive"),
            ("a", "show"),
            ("$1", "p.year"),
            ("$2", "p.month"),
        ]),
    );

    let packet = router.parse("2024/05/rust", &Params::new()).packet().cloned().unwrap();
    assert_eq!(packet.modules(), ["front".to_string(), "blog".to_string()]);
    assert_eq!(packet.controller(), "archive");
    assert_eq!(packet.param("year"), Some("2024"));
    assert_eq!(packet.param("month"), Some("05"));
    assert_eq!(packet.param("0"), Some("rust"));
}

#[test]
fn test_custom_bridges() {
    let config = RouterConfig {
        mm_bridge: "-".to_string(),
        mc_bridge: "/".to_string(),
        ca_bridge: "/".to_string(),
        ap_bridge: "-".to_string(),
        pp_bridge: "&".to_string(),
        pkv_bridge: "=".to_string(),
        masquerade_tail: String::new(),
        ..RouterConfig::default()
    };
    let router = Router::new(config).unwrap();
    let packet = router
        .parse("/shop/cart/add-sku=12&qty=3", &Params::new())
        .packet()
        .cloned()
        .unwrap();
    assert_eq!(packet.module_path(), "shop");
    assert_eq!(packet.controller(), "cart");
    assert_eq!(packet.action(), "add");
    assert_eq!(packet.param("sku"), Some("12"));
    assert_eq!(packet.param("qty"), Some("3"));
}

#[test]
fn test_fetch_key_value_pair_edges() {
    let expected: BTreeMap<String, String> = [("a", "1")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    // 落单的末尾元素被丢弃
    assert_eq!(fetch_key_value_pair("a/1/b", "/", "/"), expected);
    // 不含键值衔接符的段被丢弃
    assert_eq!(fetch_key_value_pair("a=1&b", "&", "="), expected);
    assert!(fetch_key_value_pair("", "/", "/").is_empty());
}

#[test]
fn test_redirect_outcome_from_config() {
    let config = Config::from_toml_str(
        r#"
[router.static_route_rules]
"/docs" = "https://docs.example.com/"
"#,
    )
    .unwrap();
    let router = Router::new(config.router().clone()).unwrap();
    let request = Request::from_uri("/docs?page=intro");
    assert_eq!(
        router.dispatch(&request),
        RouteOutcome::Redirect("https://docs.example.com/?page=intro".to_string())
    );
}

#[test]
fn test_outcome_serializes_for_console() {
    let packet = RoutePacket::from_module_path("admin", "user", "edit", Params::new());
    let json = serde_json::to_value(RouteOutcome::Dispatch(packet)).unwrap();
    assert_eq!(json["outcome"], "dispatch");
    assert_eq!(json["target"]["controller"], "user");
    assert_eq!(json["target"]["modules"][0], "admin");

    let json = serde_json::to_value(RouteOutcome::Handled).unwrap();
    assert_eq!(json["outcome"], "handled");
}

#[test]
fn test_dispatch_decodes_percent_encoded_path() {
    let mut router = Router::new(RouterConfig::default()).unwrap();
    router.add_static_rule("/café/list", "shop/menu/list");
    let packet = router
        .dispatch(&Request::from_uri("/caf%C3%A9/list"))
        .packet()
        .cloned()
        .unwrap();
    assert_eq!(packet.controller(), "menu");
    assert_eq!(packet.action(), "list");

    // 兜底解析同样看到解码后的路径
    let packet = Router::new(RouterConfig::default())
        .unwrap()
        .dispatch(&Request::from_uri("/blog/show.title/hello%20world.html"))
        .packet()
        .cloned()
        .unwrap();
    assert_eq!(packet.param("title"), Some("hello world"));
}
