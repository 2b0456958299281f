use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use freebies::detect::ComparisonKey;
use freebies::snapshot::{Category, Offer, Snapshot};

/// Snapshot with `per_category` offers in each category, titles in reverse
/// order so the key has real sorting work to do.
fn snapshot(per_category: usize) -> Snapshot {
    let base = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
    let mut snapshot = Snapshot::empty();

    for category in Category::ALL {
        for i in (0..per_category).rev() {
            let offer = Offer::new(format!("{category} game {i:05}"))
                .with_url(format!("https://example.invalid/{category}/{i}"))
                .with_end(base + Duration::days(i as i64 % 14))
                .with_extra("originalPrice", "¥90.00");
            snapshot.push(category, offer);
        }
    }

    snapshot
}

fn bench_comparison_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("comparison_key");

    for size in [4, 64, 1024] {
        let snapshot = snapshot(size);
        group.bench_with_input(BenchmarkId::from_parameter(size * 4), &snapshot, |b, s| {
            b.iter(|| ComparisonKey::of(black_box(s)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_comparison_key);
criterion_main!(benches);
