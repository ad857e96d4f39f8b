use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use inframe::query::{parse_segments, Connective};
use inframe::{BindParams, Dao, Dialect, Driver, DriverError, Model, Row, Segments, TableDef};

/// 不执行任何语句的驱动，只用于测量 SQL 构建开销
struct NullDriver;

impl Driver for NullDriver {
    fn query(&mut self, _sql: &str, _params: &BindParams) -> Result<Vec<Row>, DriverError> {
        Ok(Vec::new())
    }

    fn exec(&mut self, _sql: &str, _params: &BindParams) -> Result<u64, DriverError> {
        Ok(0)
    }

    fn last_insert_id(&mut self) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    fn begin_transaction(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        false
    }
}

fn parse_segments_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_segments");

    for size in [1, 8, 32].iter() {
        let segments: Segments = (0..*size)
            .map(|i| (format!("field{}", i), json!(i)))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &segments, |b, segments| {
            b.iter(|| {
                let _ = parse_segments(Dialect::MySql, black_box(segments), Connective::And);
            });
        });
    }

    group.finish();
}

fn compile_select_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_select");

    for dialect in [Dialect::MySql, Dialect::SqlServer].iter() {
        let mut dao = Dao::new(NullDriver, *dialect);
        group.bench_function(dialect.to_string(), |b| {
            b.iter(|| {
                let mut model = Model::new(&mut dao, TableDef::new("article").prefix("blg_"));
                model
                    .alias("a")
                    .inner_join("{{article_tag}} t on t.aid = a.aid")
                    .where_clause(Segments::new().eq("a.author", "tom").eq("a.status", 1))
                    .order("a.aid DESC")
                    .limit(10, 20);
                black_box(model.compile());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, parse_segments_benchmark, compile_select_benchmark);
criterion_main!(benches);
