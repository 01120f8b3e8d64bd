use std::{fs::File, path::Path, time::Duration};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memm_tagger::{quark::StringTable, Dataset, TagVocabulary};

fn read(fpath: &Path) -> TagVocabulary {
    let f = File::open(fpath).expect("failed to open file");
    let ds = Dataset::try_from(f).expect("failed to read file");
    assert_eq!(ds.len(), 15);
    let tags = TagVocabulary::new(ds.tags());
    assert!(tags.to_id("NN").is_some());
    tags
}

fn quark_benchmark(c: &mut Criterion) {
    let fpath = Path::new("tests/data/ptb.tagged");
    c.bench_function("read_tags", |b| b.iter(|| read(black_box(fpath))));
}

criterion_group! {
    name = benchmarks;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = quark_benchmark
}

criterion_main!(benchmarks);
