use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use vcfconsensus::genomics::{
    ConsensusSampler, GenotypeRecord, ReferenceGenome, SamplerError, SequenceBuilder, VariantStore,
};

proptest! {
    #[test]
    fn tiled_starts_step_exactly_and_fit(
        length in 0usize..400,
        window in 1usize..64,
        count in 1usize..32,
        step in 1usize..40,
    ) {
        let sampler = ConsensusSampler::tiled(window, count, step);
        let starts = sampler.starts(length, &mut StdRng::seed_from_u64(0)).unwrap();

        prop_assert!(starts.len() <= count);
        for (idx, &start) in starts.iter().enumerate() {
            prop_assert_eq!(start, idx * step);
            prop_assert!(start + window <= length);
        }
        if starts.len() < count {
            let next = starts.len() * step;
            prop_assert!(next + window > length, "tiling stopped while a window still fit");
        }
    }

    #[test]
    fn random_starts_respect_spacing_and_bounds(
        length in 1usize..300,
        window in 1usize..40,
        overlap_fraction in 0.0f64..=1.0,
        count in 1usize..6,
        seed in any::<u64>(),
    ) {
        prop_assume!(window <= length);
        let max_overlap = (window as f64 * overlap_fraction).floor() as usize;
        let sampler = ConsensusSampler::random(window, count, Some(max_overlap))
            .with_max_rejections(2_000);

        match sampler.starts(length, &mut StdRng::seed_from_u64(seed)) {
            Ok(starts) => {
                prop_assert_eq!(starts.len(), count);
                for (i, &a) in starts.iter().enumerate() {
                    prop_assert!(a + window <= length);
                    for &b in &starts[i + 1..] {
                        prop_assert!(a.abs_diff(b) >= window - max_overlap);
                    }
                }
            }
            Err(SamplerError::UnsatisfiableSampling { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn substitution_matches_store_lookup_everywhere(
        reference in proptest::collection::vec(prop_oneof![
            Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T'), Just(b'N')
        ], 1..80),
        calls in proptest::collection::vec(
            (1u64..80, prop_oneof![Just("A"), Just("C"), Just("G"), Just("T")],
             prop_oneof![Just("0/0"), Just("0/1"), Just("1|1"), Just("./1")],
             prop_oneof![Just("0|0"), Just("1/0"), Just("1"), Just("./.")]),
            0..24,
        ),
        window in 1usize..16,
        step in 1usize..8,
    ) {
        let genome = ReferenceGenome::from_sequences([("chr1", reference.as_slice())]).unwrap();
        let records = calls.iter().enumerate().map(|(line, (pos, alt, gt1, gt2))| GenotypeRecord {
            line: line + 1,
            chrom: Arc::from("chr1"),
            position: *pos,
            reference: "N".into(),
            alternate: alt.to_string(),
            info: String::new(),
            format: vec!["GT".into()],
            samples: vec![gt1.to_string(), gt2.to_string()],
        });
        let (store, _) = VariantStore::build(["S1", "S2"], records, 0.0).unwrap();
        let chrom = genome.get("chr1").unwrap();
        let builder = SequenceBuilder::new(&store);
        let starts = ConsensusSampler::tiled(window, usize::MAX, step)
            .starts(chrom.len(), &mut StdRng::seed_from_u64(0))
            .unwrap();

        for name in ["S1", "S2"] {
            let sample = store.sample_id(name).unwrap();
            for &start in &starts {
                let sequence = builder.sequence(chrom, start, start + window, sample).unwrap();
                prop_assert_eq!(sequence.len(), window);
                for (offset, &base) in sequence.iter().enumerate() {
                    let pos = start + offset;
                    let expected = store
                        .get("chr1", pos as u64, sample)
                        .unwrap_or(chrom.sequence[pos]);
                    prop_assert_eq!(base, expected);
                }
            }
        }
    }
}
