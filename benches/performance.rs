use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use modelhub::{Context, HeuristicEncoder, extract_json};

// Helper function to create a context with alternating turns of a given size
fn create_context(turns: usize, text_size: usize) -> Context {
    let text = "lorem ipsum ".repeat(text_size / 12 + 1);
    let mut context = Context::new(&text);
    for i in 0..turns {
        if i % 2 == 0 {
            context.add_user_message(&text);
        } else {
            context.add_assistant_message(&text);
        }
    }
    context
}

// Helper to create a context with image turns
fn create_context_with_images(turns: usize) -> Context {
    let mut context = Context::new("You describe images");
    let urls = vec![
        "https://example.com/a.png".to_string(),
        "https://example.com/b.png".to_string(),
    ];
    for _ in 0..turns {
        context
            .add_image_message("What changed?", None, Some(&urls))
            .expect("urls provided");
        context.add_assistant_message("The second image is brighter.");
    }
    context
}

// Benchmark: estimate_tokens with varying turn counts
fn bench_estimate_tokens_by_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_tokens_by_count");
    let encoder = HeuristicEncoder::default();

    for turns in [0, 1, 5, 10, 20, 50, 100].iter() {
        let context = create_context(*turns, 100);
        group.bench_with_input(BenchmarkId::from_parameter(turns), &context, |b, ctx| {
            b.iter(|| ctx.estimate_tokens(black_box(&encoder), black_box("gpt-4o")));
        });
    }

    group.finish();
}

// Benchmark: estimate_tokens with varying message sizes
fn bench_estimate_tokens_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_tokens_by_size");
    let encoder = HeuristicEncoder::default();

    for size in [10, 100, 1000, 10000].iter() {
        let context = create_context(10, *size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &context, |b, ctx| {
            b.iter(|| ctx.estimate_tokens(black_box(&encoder), black_box("gpt-4")));
        });
    }

    group.finish();
}

// Benchmark: estimate_tokens with image turns
fn bench_estimate_tokens_with_images(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_tokens_with_images");
    let encoder = HeuristicEncoder::default();

    for turns in [3, 9, 30, 90].iter() {
        let context = create_context_with_images(*turns);
        group.bench_with_input(BenchmarkId::from_parameter(turns), &context, |b, ctx| {
            b.iter(|| ctx.estimate_tokens(black_box(&encoder), black_box("gpt-4o")));
        });
    }

    group.finish();
}

// Benchmark: extract_json across the extractor chain
fn bench_extract_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_json");

    let payload = format!(
        "{{\"items\": [{}]}}",
        (0..200)
            .map(|i| format!("{{\"id\": {}, \"name\": \"item{}\"}}", i, i))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let test_cases = vec![
        ("fenced", format!("Here you go:\n```json\n{}\n```\nDone.", payload)),
        ("inline", format!("The result is {} as requested.", payload)),
        ("bare", payload.clone()),
        ("prose_only", "I could not produce structured output. ".repeat(100)),
    ];

    for (name, text) in test_cases {
        group.bench_with_input(BenchmarkId::new(name, text.len()), &text, |b, t| {
            b.iter(|| extract_json(black_box(t)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_estimate_tokens_by_count,
    bench_estimate_tokens_by_size,
    bench_estimate_tokens_with_images,
    bench_extract_json
);
criterion_main!(benches);
