use annonce_core::{Document, RawContent, fuse, parse_listing, parse_listing_text, parse_sources};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn bench_parse(c: &mut Criterion) {
    let structured = std::fs::read_to_string("../../tests/fixtures/listing_jsonld.html").unwrap();
    let patterns = std::fs::read_to_string("../../tests/fixtures/listing_patterns.html").unwrap();
    let meta = std::fs::read_to_string("../../tests/fixtures/listing_meta.html").unwrap();

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("document", "structured"), &structured, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("listing", "structured"), &structured, |b, html| {
        b.iter(|| parse_listing(black_box(html), None))
    });

    group.bench_with_input(BenchmarkId::new("listing", "patterns"), &patterns, |b, html| {
        b.iter(|| parse_listing(black_box(html), None))
    });

    group.bench_with_input(BenchmarkId::new("listing", "meta"), &meta, |b, html| {
        b.iter(|| parse_listing(black_box(html), None))
    });

    group.finish();
}

fn bench_free_text(c: &mut Criterion) {
    let text = std::fs::read_to_string("../../tests/fixtures/listing_paste.txt").unwrap();

    c.bench_function("free_text", |b| b.iter(|| parse_listing_text(black_box(&text))));
}

fn bench_fusion(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/listing_jsonld.html").unwrap();
    let sources = parse_sources(&RawContent::from_html(html), None);

    c.bench_function("fusion", |b| b.iter(|| fuse(None, black_box(&sources.candidates()))));
}

criterion_group!(benches, bench_parse, bench_free_text, bench_fusion);
criterion_main!(benches);
