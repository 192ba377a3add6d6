//! Consensus generation benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vcfconsensus::genomics::{
    ConsensusGenerator, ConsensusSampler, GenotypeRecord, ReferenceGenome, StreamMode,
    VariantStore,
};

fn inputs() -> (ReferenceGenome, VariantStore, Vec<Arc<str>>) {
    let bases = b"ACGT";
    let sequence: Vec<u8> = (0..1_000_000).map(|i: usize| bases[(i * 31 + 7) % 4]).collect();
    let reference =
        ReferenceGenome::from_sequences([("chr1", sequence.as_slice())]).expect("reference");

    let samples: Vec<Arc<str>> = (0..8).map(|s| Arc::from(format!("S{s}"))).collect();
    let records = (1..=20_000u64).map(|i| GenotypeRecord {
        line: i as usize,
        chrom: Arc::from("chr1"),
        position: i * 47,
        reference: "A".into(),
        alternate: "G".into(),
        info: String::new(),
        format: vec!["GT".into()],
        samples: (0..8)
            .map(|s| if (i as usize + s) % 3 == 0 { "0/1" } else { "0/0" }.to_string())
            .collect(),
    });
    let (store, _) = VariantStore::build(samples.iter().cloned(), records, 0.0).expect("store");
    (reference, store, samples)
}

fn benchmark_generation(c: &mut Criterion) {
    let (reference, store, samples) = inputs();

    c.bench_function("tiled_1kb_x100_8_samples", |b| {
        let generator =
            ConsensusGenerator::new(&reference, &store, ConsensusSampler::tiled(1_000, 100, 5_000));
        b.iter(|| {
            black_box(
                generator
                    .generate(&samples, 37, StreamMode::Shared)
                    .expect("generation"),
            );
        });
    });

    c.bench_function("random_1kb_x100_parallel", |b| {
        let generator = ConsensusGenerator::new(
            &reference,
            &store,
            ConsensusSampler::random(1_000, 100, Some(200)),
        );
        b.iter(|| {
            black_box(generator.generate_parallel(&samples, 37).expect("generation"));
        });
    });
}

criterion_group!(benches, benchmark_generation);
criterion_main!(benches);
