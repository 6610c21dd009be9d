//! Performance benchmarks for allowlist-engine

use allowlist_engine::{
    build_collection, diff_at, plan_sync, QueryEntry, RetentionFilter, RetentionPolicy,
    SourceDocument, SyncOptions, VersionTag, MILLIS_PER_DAY,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const NOW: i64 = 1_706_745_600_000;

/// A document with `count` operations sharing a small fragment tree.
fn create_test_document(count: usize) -> SourceDocument {
    let mut text = String::from(
        "fragment UserParts on User { id name address { ...AddressParts } }\n\
         fragment AddressParts on Address { street city }\n",
    );
    for i in 0..count {
        text.push_str(&format!(
            "query GetUser{i}($id: ID!) {{ user(id: $id) {{ ...UserParts friends {{ ...UserParts }} }} }}\n"
        ));
    }
    SourceDocument::parse("bench.graphql", &text).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in [10, 100, 1000] {
        let documents = vec![create_test_document(size)];
        group.bench_with_input(BenchmarkId::new("build_collection", size), &documents, |b, docs| {
            b.iter(|| build_collection(black_box(docs)))
        });
    }

    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    let fresh = build_collection(&[create_test_document(500)]).unwrap();

    // Half the remote entries differ
    let remote: Vec<QueryEntry> = fresh
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            if i % 2 == 0 {
                entry.clone()
            } else {
                QueryEntry::new(entry.name.clone(), "query Old { id }")
            }
        })
        .collect();

    group.bench_function("unversioned", |b| {
        b.iter(|| diff_at(black_box(&remote), black_box(&fresh), None, NOW))
    });

    let tag = VersionTag::new("v2").unwrap();
    let versioned_remote: Vec<QueryEntry> = remote
        .iter()
        .map(|entry| {
            QueryEntry::new(
                format!("{}___(1000-v1)", entry.name),
                entry.query.clone(),
            )
        })
        .collect();
    group.bench_function("versioned", |b| {
        b.iter(|| diff_at(black_box(&versioned_remote), black_box(&fresh), Some(&tag), NOW))
    });

    group.finish();
}

fn bench_retention(c: &mut Criterion) {
    let mut group = c.benchmark_group("retention");

    for versions in [10i64, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("queries_to_delete", versions),
            &versions,
            |b, &versions| {
                b.iter(|| {
                    let mut filter = RetentionFilter::new(RetentionPolicy::new(7, 5));
                    for family in 0..50 {
                        for v in 0..versions {
                            let timestamp = (NOW - v * MILLIS_PER_DAY / 4).to_string();
                            filter.add_query(
                                &timestamp,
                                &format!("Q{family}___({timestamp}-v{v})"),
                                &format!("Q{family}"),
                                "query",
                            );
                        }
                    }
                    filter.queries_to_delete_at(black_box(NOW))
                })
            },
        );
    }

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let fresh = build_collection(&[create_test_document(200)]).unwrap();
    let options = SyncOptions {
        version: Some(VersionTag::new("v1").unwrap()),
        retention: RetentionPolicy::new(30, 3),
        reset: false,
    };

    let remote: Vec<QueryEntry> = Vec::new();

    c.bench_function("plan_sync_versioned", |b| {
        b.iter(|| plan_sync(black_box(&remote), black_box(&fresh), &options, NOW))
    });
}

criterion_group!(benches, bench_build, bench_diff, bench_retention, bench_plan);
criterion_main!(benches);
