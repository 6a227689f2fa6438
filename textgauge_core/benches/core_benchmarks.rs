use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use textgauge_common::LanguageTag;
use textgauge_core::{similarity, PlainHighlighter, PresentationBuilder, TextDiffEngine, WordDiff};

// Helper to build a JSON-ish document of `lines` lines
fn create_document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("  \"key_{}\": \"value number {}\",\n", i, i))
        .collect()
}

// Every `stride`-th line edited in place, every `stride * 7`-th line dropped
fn create_modified(original: &str, stride: usize) -> String {
    original
        .lines()
        .enumerate()
        .filter(|(i, _)| i % (stride * 7) != 3)
        .map(|(i, line)| {
            if i % stride == 0 {
                format!("{} // edited\n", line)
            } else {
                format!("{}\n", line)
            }
        })
        .collect()
}

fn bench_compare_identical(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_identical");
    group.sample_size(10);

    for size in [10_000, 100_000].iter() {
        let document = create_document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let engine = TextDiffEngine::new();
            b.iter(|| black_box(engine.compare(black_box(&document), black_box(&document))));
        });
    }

    group.finish();
}

fn bench_compare_scattered_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_scattered_edits");
    group.sample_size(10);

    for size in [10_000, 100_000].iter() {
        let original = create_document(*size);
        let modified = create_modified(&original, 50);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let engine = TextDiffEngine::new();
            b.iter(|| black_box(engine.compare(black_box(&original), black_box(&modified))));
        });
    }

    group.finish();
}

fn bench_line_similarity(c: &mut Criterion) {
    c.bench_function("line_similarity_80_chars", |b| {
        let left = "x".repeat(40) + &"a".repeat(40);
        let right = "x".repeat(40) + &"b".repeat(40);
        b.iter(|| black_box(similarity(black_box(&left), black_box(&right))));
    });
}

fn bench_word_diff(c: &mut Criterion) {
    c.bench_function("word_diff_paired_line", |b| {
        b.iter(|| {
            black_box(WordDiff::compute(
                black_box("  \"version\": \"1.0.0\", \"stable\": false,"),
                black_box("  \"version\": \"2.0.0\", \"stable\": true,"),
            ))
        });
    });
}

fn bench_render_window(c: &mut Criterion) {
    c.bench_function("render_100_row_window_of_100k", |b| {
        let original = create_document(100_000);
        let modified = create_modified(&original, 5);
        let result = TextDiffEngine::new().compare(&original, &modified);
        let builder = PresentationBuilder::new(&PlainHighlighter, LanguageTag::Json);

        b.iter(|| black_box(builder.side_by_side_range(black_box(&result), 50_000..50_100)));
    });
}

criterion_group!(
    engine_benches,
    bench_compare_identical,
    bench_compare_scattered_edits
);

criterion_group!(
    line_benches,
    bench_line_similarity,
    bench_word_diff,
    bench_render_window
);

criterion_main!(engine_benches, line_benches);
