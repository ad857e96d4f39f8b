use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use inframe::request::Request;
use inframe::{Params, Router, RouterConfig, RuleSpec};

fn router_with_rules(count: usize) -> Router {
    let config = RouterConfig {
        wildcard_route_on: true,
        ..RouterConfig::default()
    };
    let mut router = Router::new(config).unwrap();
    for i in 0..count {
        router.add_static_rule(format!("/static/{}", i), format!("site/page/p{}", i));
        router.add_wildcard_rule(
            format!("wild{}/[num]/[any]", i),
            RuleSpec::mapping([("c", "wild"), ("a", "show"), ("$1", "p.id")]),
        );
        router.add_regular_rule(
            format!(r"regex{}/(\d+)", i),
            RuleSpec::template("blog/article/view?id=$1"),
        );
    }
    router
}

fn pathinfo_fallback_benchmark(c: &mut Criterion) {
    let router = router_with_rules(0);
    let query = Params::new();

    c.bench_function("pathinfo_fallback", |b| {
        b.iter(|| {
            let _ = router.parse(black_box("/admin/system/user/edit.id/5/tab/base.html"), &query);
        });
    });
}

fn rule_table_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_table");
    let query = Params::new();

    for size in [1, 10, 50].iter() {
        let router = router_with_rules(*size);
        let last = size - 1;
        let urls = [
            ("static", format!("/static/{}", last)),
            ("wildcard", format!("wild{}/42/posts", last)),
            ("regular", format!("regex{}/42", last)),
        ];
        for (kind, url) in urls.iter() {
            group.bench_with_input(BenchmarkId::new(*kind, size), url, |b, url| {
                b.iter(|| {
                    let _ = router.parse(black_box(url), &query);
                });
            });
        }
    }

    group.finish();
}

fn dispatch_request_benchmark(c: &mut Criterion) {
    let router = router_with_rules(10);
    let request = b"GET /admin/user/list.page/2.html?sort=desc HTTP/1.1\r\nHost: localhost\r\n\r\n";

    c.bench_function("dispatch_request", |b| {
        b.iter(|| {
            let request = Request::try_from(black_box(request)).unwrap();
            let _ = router.dispatch(&request);
        });
    });
}

criterion_group!(
    benches,
    pathinfo_fallback_benchmark,
    rule_table_benchmark,
    dispatch_request_benchmark
);
criterion_main!(benches);
