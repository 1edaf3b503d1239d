//! 活动列表过滤条件构建基准测试
//!
//! 只测 SQL 组装，不连接数据库。

use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sea_orm::{DbBackend, QueryTrait};

use credithub::services::{CampaignQuery, ListScope, build_comment_tree};
use credithub::storage::backend::filtered_select;
use credithub::storage::{CampaignFilter, CampaignSort, Comment, Difficulty};

fn full_query() -> CampaignQuery {
    CampaignQuery {
        page: Some(2),
        page_size: Some(50),
        locale: Some("zh".into()),
        platform: Some("openai".into()),
        tags: Some("chat,vision,embedding".into()),
        conditions: Some("phone-verification,credit-card".into()),
        difficulty: Some(Difficulty::Medium),
        q: Some("free 100%_credit".into()),
        sort: Some(CampaignSort::Popular),
        featured: Some(false),
        include_expired: Some(true),
        ..Default::default()
    }
}

fn bench_query_to_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/to_filter");
    let empty = CampaignQuery::default();
    let full = full_query();

    group.bench_function("empty", |b| {
        b.iter(|| empty.to_filter(ListScope::Public));
    });
    group.bench_function("all_params", |b| {
        b.iter(|| full.to_filter(ListScope::Public));
    });

    group.finish();
}

fn bench_build_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/build_sql");
    let now = Utc::now();
    let simple = CampaignFilter::public();
    let full = full_query()
        .to_filter(ListScope::Public)
        .expect("valid query");

    for (name, filter) in [("simple", &simple), ("all_params", &full)] {
        for backend in [DbBackend::Sqlite, DbBackend::Postgres, DbBackend::MySql] {
            group.bench_with_input(
                BenchmarkId::new(name, format!("{:?}", backend)),
                filter,
                |b, filter| {
                    b.iter(|| filtered_select(filter, now).build(backend).to_string());
                },
            );
        }
    }

    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let filter = full_query()
        .to_filter(ListScope::Public)
        .expect("valid query");
    c.bench_function("filter/cache_key", |b| b.iter(|| filter.cache_key()));
}

fn comments(count: usize) -> Vec<Comment> {
    let base = Utc::now();
    (1..=count as i64)
        .map(|id| {
            let created_at = base + Duration::seconds(id);
            Comment {
                id,
                campaign_id: 1,
                user_id: format!("user-{}", id % 17),
                // 每 5 条开一个新线程
                parent_id: (id % 5 != 1).then_some(id - 1),
                content: format!("comment {}", id),
                created_at,
                updated_at: created_at,
                deleted_at: (id % 11 == 0).then_some(created_at),
            }
        })
        .collect()
}

fn bench_comment_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/comment_tree");

    for size in [50, 500, 2000] {
        let list = comments(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &list, |b, list| {
            b.iter(|| build_comment_tree(list));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_query_to_filter,
    bench_build_sql,
    bench_cache_key,
    bench_comment_tree,
);

criterion_main!(benches);
