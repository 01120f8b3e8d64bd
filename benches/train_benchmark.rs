use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memm_tagger::{Dataset, MaxEntTrainer, PosTagger, TrainOptions};

fn train(ds: &Dataset, parameters: &[&str]) {
    let mut options = TrainOptions::default();
    parameters.iter().for_each(|s| {
        if let Some((name, value)) = s.split_once('=') {
            options.set(name, value).expect("failed to set parameter");
        }
    });
    let mut tagger = PosTagger::new(MaxEntTrainer::new(options));
    let matrix = tagger.train(&ds.seqs).expect("failed to train");
    assert_eq!(matrix.labels.len(), ds.num_tokens());
}

fn train_benchmark(c: &mut Criterion) {
    let fpath = Path::new("tests/data/ptb.tagged");
    log::info!("reading dataset from: {:?}", fpath);
    let ds = Dataset::from_path(fpath).expect("failed to read file");
    c.bench_function("train_l1", |b| b.iter(|| train(black_box(&ds), &["c1=0.6667", "max_iterations=100"])));
    c.bench_function("train_l2", |b| b.iter(|| train(black_box(&ds), &["c1=0", "c2=0.1", "max_iterations=100"])));
}

criterion_group!(benchmarks, train_benchmark);
criterion_main!(benchmarks);
