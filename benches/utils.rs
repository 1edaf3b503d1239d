//! 工具函数性能基准测试

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use credithub::storage::Difficulty;
use credithub::utils::url_validator::validate_url;
use credithub::utils::{TimeParser, generate_secure_token, is_valid_slug, slugify};

// ============== slug 基准测试 ==============

fn bench_slugify(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/slugify");

    group.bench_function("ascii_title", |b| {
        b.iter(|| slugify("OpenAI $5 Free API Credit for New Accounts"));
    });

    group.bench_function("mixed_script", |b| {
        b.iter(|| slugify("DeepSeek 新用户赠送 10 元额度 (limited)"));
    });

    let long_title = "Free credits ".repeat(40);
    group.bench_function("long_title", |b| {
        b.iter(|| slugify(&long_title));
    });

    group.finish();
}

fn bench_is_valid_slug(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/is_valid_slug");

    group.bench_function("valid", |b| {
        b.iter(|| {
            assert!(is_valid_slug("openrouter-free-credits-2026"));
        });
    });

    group.bench_function("invalid_double_hyphen", |b| {
        b.iter(|| {
            assert!(!is_valid_slug("openrouter--credits"));
        });
    });

    let too_long = "a".repeat(121);
    group.bench_function("invalid_too_long", |b| {
        b.iter(|| {
            assert!(!is_valid_slug(&too_long));
        });
    });

    group.finish();
}

// ============== URL 验证基准测试 ==============

fn bench_validate_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/validate_url");

    group.bench_function("valid_https", |b| {
        b.iter(|| validate_url("https://platform.openai.com/settings/billing?ref=credits"));
    });

    group.bench_function("dangerous_protocol", |b| {
        b.iter(|| validate_url("javascript:alert(1)"));
    });

    group.finish();
}

// ============== 时间解析基准测试 ==============

fn bench_time_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/time_parser");
    let now = Utc::now();

    for input in ["2026-10-01", "2026-10-01T12:00:00Z", "1w2d", "12h"] {
        group.bench_with_input(BenchmarkId::new("parse_until", input), &input, |b, input| {
            b.iter(|| TimeParser::parse_until(input, now));
        });
    }

    group.finish();
}

// ============== 其他 ==============

fn bench_generate_secure_token(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/generate_secure_token");

    for bytes in [16, 32, 64] {
        group.bench_with_input(BenchmarkId::new("bytes", bytes), &bytes, |b, &bytes| {
            b.iter(|| generate_secure_token(bytes));
        });
    }

    group.finish();
}

fn bench_difficulty(c: &mut Criterion) {
    let weights: Vec<i32> = (0..20).map(|i| (i % 5) - 1).collect();
    c.bench_function("utils/difficulty_from_weights", |b| {
        b.iter(|| Difficulty::from_weights(weights.iter().copied()));
    });
}

criterion_group!(
    benches,
    bench_slugify,
    bench_is_valid_slug,
    bench_validate_url,
    bench_time_parser,
    bench_generate_secure_token,
    bench_difficulty,
);

criterion_main!(benches);
