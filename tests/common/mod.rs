#![allow(dead_code)]

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use vcfconsensus::genomics::{GenotypeRecord, ReferenceGenome};

const BLESS_VAR: &str = "VCFCONSENSUS_BLESS";

fn golden_path(name: &str) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "tests", "snapshots", name]
        .iter()
        .collect()
}

/// Compare FASTA text against `tests/snapshots/<name>` line by line.
///
/// With `VCFCONSENSUS_BLESS` set the golden file is rewritten instead.
pub fn assert_snapshot(name: &str, actual: &str) {
    let path = golden_path(name);
    if env::var_os(BLESS_VAR).is_some() {
        fs::create_dir_all(path.parent().expect("golden files live in a directory"))
            .expect("create golden directory");
        fs::write(&path, actual).expect("write golden file");
        return;
    }

    let golden = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("cannot read golden file {}: {err}", path.display()));
    let mut expected_lines = golden.lines();
    let mut actual_lines = actual.lines();
    for line_no in 1.. {
        match (expected_lines.next(), actual_lines.next()) {
            (None, None) => return,
            (want, got) if want == got => continue,
            (want, got) => panic!(
                "{} differs at line {line_no}: expected {want:?}, got {got:?} (rerun with {BLESS_VAR}=1 to accept)",
                path.display()
            ),
        }
    }
}

/// Two-chromosome reference shared by the golden and end-to-end tests.
pub const FIXTURE_FASTA: &str = ">chr1 test contig\n\
ACGTACGTAC\n\
GTACGTACGT\n\
>chr2\n\
ggggccccaaaatttt\n";

/// Calls over the fixture reference. Only the chr1:5 and chr2:10 records
/// survive filtering with the default minimum allele frequency.
pub const FIXTURE_VCF: &str = "##fileformat=VCFv4.2\n\
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\n\
chr1\t2\t.\tC\tG\t60\tPASS\tAF=0.01\tGT\t1/1\t1/1\n\
chr1\t5\t.\tA\tT\t60\tPASS\tAF=0.25\tGT\t0/1\t0/0\n\
chr1\t8\t.\tT\tA,G\t60\tPASS\tAF=0.5\tGT\t1/1\t1/1\n\
chr2\t3\t.\tG\tA\t60\tPASS\t.\tGT\t./.\t./1\n\
chr2\t10\t.\tA\tC\t60\tPASS\tAF=0.75\tGT:DP\t1/1:20\t0|1:18\n";

pub fn fixture_reference() -> ReferenceGenome {
    ReferenceGenome::from_sequences([
        ("chr1", "ACGTACGTACGTACGTACGT"),
        ("chr2", "GGGGCCCCAAAATTTT"),
    ])
    .expect("fixture reference is valid")
}

/// Single-sample-column record with a `GT` only FORMAT.
pub fn snv(chrom: &str, position: u64, alt: &str, info: &str, genotypes: &[&str]) -> GenotypeRecord {
    GenotypeRecord {
        line: position as usize,
        chrom: Arc::from(chrom),
        position,
        reference: "N".into(),
        alternate: alt.into(),
        info: info.into(),
        format: vec!["GT".into()],
        samples: genotypes.iter().map(|gt| gt.to_string()).collect(),
    }
}

pub fn names(list: &[&str]) -> Vec<Arc<str>> {
    list.iter().map(|&name| Arc::from(name)).collect()
}
