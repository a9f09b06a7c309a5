use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nvf::{render, Document, RenderOptions};

fn flat_document(entries: usize) -> String {
    let mut text = String::new();
    for i in 0..entries {
        match i % 4 {
            0 => text.push_str(&format!("int_{i} {i}\n")),
            1 => text.push_str(&format!("float_{i} {}.25\n", i)),
            2 => text.push_str(&format!("str_{i} \"value number {i}\"\n")),
            _ => text.push_str(&format!("blob_{i} bx{:08x}\n", i)),
        }
    }
    text
}

fn nested_document(width: usize, depth: usize) -> String {
    fn level(text: &mut String, width: usize, depth: usize) {
        for i in 0..width {
            text.push_str(&format!("n{i} 0x{i:x}\n"));
        }
        text.push_str(&format!("list [1 2.5 \"x\" bx0a [{depth}]]\n"));
        if depth > 0 {
            text.push_str("child {\n");
            level(text, width, depth - 1);
            text.push_str("}\n");
        }
    }
    let mut text = String::new();
    level(&mut text, width, depth);
    text
}

fn benchmark_parse_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_flat");
    for size in [10, 100, 1000] {
        let text = flat_document(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| {
                let mut doc = Document::new();
                doc.parse(black_box(text.as_str())).unwrap();
                doc
            })
        });
    }
    group.finish();
}

fn benchmark_parse_nested(c: &mut Criterion) {
    let text = nested_document(8, 16);
    c.bench_function("parse_nested", |b| {
        b.iter(|| {
            let mut doc = Document::new();
            doc.parse(black_box(text.as_str())).unwrap();
            doc
        })
    });
}

fn benchmark_query(c: &mut Criterion) {
    let mut doc = Document::new();
    doc.parse(&nested_document(8, 4)).unwrap();
    let path = ["child", "child", "child", "n7"];
    c.bench_function("query_nested_int", |b| {
        b.iter(|| doc.get_int(black_box(&path)).unwrap())
    });
}

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    for size in [10, 100, 1000] {
        let mut doc = Document::new();
        doc.parse(&flat_document(size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| render(black_box(doc), &RenderOptions::default()).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse_flat,
    benchmark_parse_nested,
    benchmark_query,
    benchmark_render
);
criterion_main!(benches);
