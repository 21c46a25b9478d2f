// benches/codec_bench.rs
//! Benchmarks for property decoding and filter serialization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notion_dbkit::{
    CompoundFilter, FilterNode, Operator, PropertyCodec, PropertyFilter, PropertyType,
};
use serde_json::json;

fn create_rich_text_json(runs: usize) -> serde_json::Value {
    let runs: Vec<_> = (0..runs)
        .map(|i| {
            json!({
                "type": "text",
                "text": {"content": format!("segment {} ", i), "link": null},
                "annotations": {
                    "bold": i % 2 == 0,
                    "italic": false,
                    "strikethrough": false,
                    "underline": false,
                    "code": false,
                    "color": "default"
                },
                "plain_text": format!("segment {} ", i),
                "href": null
            })
        })
        .collect();
    json!({"id": "title", "type": "title", "title": runs})
}

fn create_page_properties_json(rows: usize) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    for i in 0..rows {
        let value = match i % 4 {
            0 => json!({"type": "number", "number": i}),
            1 => json!({"type": "checkbox", "checkbox": i % 3 == 0}),
            2 => json!({
                "type": "date",
                "date": {"start": "2024-02-29T10:15:00.000+01:00", "end": null, "time_zone": null}
            }),
            _ => json!({
                "type": "multi_select",
                "multi_select": [
                    {"id": "a", "name": "alpha", "color": "red"},
                    {"id": "b", "name": "beta", "color": "gray"}
                ]
            }),
        };
        properties.insert(format!("Property_{}", i), value);
    }
    serde_json::Value::Object(properties)
}

fn create_filter_tree(leaves: usize) -> FilterNode {
    let children = (0..leaves)
        .map(|i| match i % 3 {
            0 => PropertyFilter::number(format!("N{}", i), Operator::GreaterThan, i as i64),
            1 => PropertyFilter::text(
                format!("T{}", i),
                PropertyType::RichText,
                Operator::Contains,
                "needle",
            ),
            _ => PropertyFilter::date(
                format!("D{}", i),
                PropertyType::Date,
                Operator::OnOrAfter,
                "2024-01-01",
            ),
        })
        .collect::<Result<Vec<_>, _>>()
        .expect("benchmark filters are valid");
    CompoundFilter::and(children).expect("benchmark filter is non-empty")
}

fn bench_decode(c: &mut Criterion) {
    let codec = PropertyCodec::default();
    let mut group = c.benchmark_group("decode");

    for runs in [1, 25, 100] {
        let raw = create_rich_text_json(runs);
        group.bench_with_input(BenchmarkId::new("title_runs", runs), &raw, |b, raw| {
            b.iter(|| codec.decode(black_box(raw)))
        });
    }

    for count in [10, 50] {
        let raw = create_page_properties_json(count);
        group.bench_with_input(BenchmarkId::new("page_properties", count), &raw, |b, raw| {
            b.iter(|| codec.decode_properties(black_box(raw)))
        });
    }

    group.finish();
}

fn bench_filter_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_serialization");

    for leaves in [3, 30, 90] {
        let tree = create_filter_tree(leaves);
        group.bench_with_input(BenchmarkId::from_parameter(leaves), &tree, |b, tree| {
            b.iter(|| black_box(tree).serialize())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_filter_serialization);
criterion_main!(benches);
