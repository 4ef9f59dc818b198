//! Toggle resolution and grouping over large extension sets.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dlc_manager::grouping;
use dlc_manager::resolver::toggle_extension;
use dlc_manager::{RawEntry, SelectionState};
use std::hint::black_box;

/// `count` extensions, each excluding its neighbour and requiring the previous one.
fn entries(count: usize) -> Vec<RawEntry> {
    (0..count)
        .flat_map(|i| {
            let prerequisite = if i > 0 {
                format!("[<扩展{}]", i - 1)
            } else {
                String::new()
            };
            [
                RawEntry::new(
                    format!("[扩展][扩展{i}][!扩展{}]{prerequisite}正文(作者{i}-说明)", i + 1),
                    i % 2 == 0,
                ),
                RawEntry::new(format!("[扩展][扩展{i}]附录"), i % 2 == 0),
            ]
        })
        .collect()
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("extension_options");
    for count in [100, 1_000] {
        let entries = entries(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &entries, |b, entries| {
            b.iter(|| grouping::extension_options(black_box(entries)))
        });
    }
    group.finish();
}

fn bench_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_extension");
    for count in [100, 1_000] {
        let options = grouping::extension_options(&entries(count));
        let selections = SelectionState::from_options(&options);
        let key = format!("[扩展][扩展{}]", count / 2);

        group.bench_with_input(BenchmarkId::from_parameter(count), &key, |b, key| {
            b.iter(|| toggle_extension(black_box(&selections), black_box(&options), key))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_grouping, bench_toggle);
criterion_main!(benches);
