//! Benchmarks for request matching and stylesheet generation.
//!
//! Run with: `cargo bench -p sieve-engine`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sieve_core::domain::PublicSuffixList;
use sieve_engine::Engine;

/// A synthetic list with `rule_count` network rules of mixed shapes plus a
/// handful of hiding rules.
fn build_list(rule_count: usize) -> String {
    let mut list = String::from("[Adblock Plus 2.0]\n! synthetic\n");
    for i in 0..rule_count {
        let line = match i % 4 {
            0 => format!("||ads{}.example.com^\n", i),
            1 => format!("/banner{}/*$image\n", i),
            2 => format!("||track{}.net^$third-party\n", i),
            _ => format!("@@||ads{}.example.com/ok/\n", i - 3),
        };
        list.push_str(&line);
    }
    list.push_str("example.com##.ad-banner\n##.tracker\n");
    list
}

fn bench_check_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_request");
    let cache = tempfile::tempdir().expect("temp dir");

    for count in [100usize, 1_000, 10_000] {
        let list = build_list(count);
        let engine = Engine::from_list(list.as_bytes(), PublicSuffixList::builtin(), cache.path(), None)
            .expect("engine should start");

        group.bench_with_input(BenchmarkId::new("miss", count), &engine, |b, engine| {
            b.iter(|| {
                engine.check_request(
                    black_box("http://www.example.org/static/app.js"),
                    Some("http://www.example.org/"),
                    Some("application/javascript"),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("domain_hit", count), &engine, |b, engine| {
            b.iter(|| engine.check_request(black_box("http://cdn.ads0.example.com/x.js"), None, None))
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let list = build_list(1_000);
    let cache = tempfile::tempdir().expect("temp dir");

    c.bench_function("compile_1000", |b| {
        b.iter(|| {
            Engine::from_list(black_box(list.as_bytes()), PublicSuffixList::builtin(), cache.path(), None)
                .expect("engine should start")
        })
    });
}

fn bench_base_domain(c: &mut Criterion) {
    let psl = PublicSuffixList::builtin();
    c.bench_function("base_domain_of", |b| {
        b.iter(|| psl.base_domain_of(black_box("a.b.c.example.co.uk")))
    });
}

criterion_group!(benches, bench_check_request, bench_compile, bench_base_domain);
criterion_main!(benches);
