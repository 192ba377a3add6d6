//! Plain-text VCF tokenizer.
//!
//! Splits data lines into [`GenotypeRecord`]s without interpreting them. The
//! optional sample allow-list is applied here: only allow-listed columns are
//! kept, in header order, and every record's sample fields are re-aligned to
//! that filtered list.

use std::collections::HashSet;
use std::io::{self, BufRead, Lines};
use std::iter::Enumerate;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::{GenotypeRecord, VariantStore, VariantStoreBuilder, VariantStoreError, VariantStoreStats};

/// Fixed columns preceding the sample columns (CHROM .. FORMAT).
const FIXED_COLUMNS: usize = 9;

/// Errors raised while tokenizing VCF text.
#[derive(Debug, Error)]
pub enum VcfError {
    /// Underlying read failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Data reached before the `#CHROM` header line.
    #[error("missing #CHROM header before line {line}")]
    MissingHeader {
        /// Line at which the header was expected.
        line: usize,
    },
    /// A record failed validation.
    #[error(transparent)]
    Record(#[from] VariantStoreError),
}

/// Read a sample allow-list: one identifier per line, blank lines ignored.
pub fn read_sample_list<R: BufRead>(reader: R) -> io::Result<HashSet<String>> {
    let mut allowed = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            allowed.insert(name.to_string());
        }
    }
    Ok(allowed)
}

/// Streaming reader over VCF data lines.
#[derive(Debug)]
pub struct VcfReader<R: BufRead> {
    lines: Enumerate<Lines<R>>,
    samples: Vec<Arc<str>>,
    columns: Vec<usize>,
    total_columns: usize,
}

impl<R: BufRead> VcfReader<R> {
    /// Consume meta lines and the `#CHROM` header.
    pub fn new(reader: R, allow_list: Option<&HashSet<String>>) -> Result<Self, VcfError> {
        let mut lines = reader.lines().enumerate();
        let mut read = 0usize;

        while let Some((idx, line)) = lines.next() {
            let line = line?;
            read = idx + 1;
            if line.starts_with("##") {
                continue;
            }
            if line.starts_with("#CHROM") {
                let names: Vec<&str> = line
                    .trim_end()
                    .split('\t')
                    .skip(FIXED_COLUMNS)
                    .collect();
                let total_columns = names.len();
                let (columns, samples): (Vec<usize>, Vec<Arc<str>>) = names
                    .into_iter()
                    .enumerate()
                    .filter(|(_, name)| allow_list.map_or(true, |allowed| allowed.contains(*name)))
                    .map(|(column, name)| (column, Arc::from(name)))
                    .unzip();
                info!(
                    samples = samples.len(),
                    columns = total_columns,
                    "parsed VCF header"
                );
                return Ok(Self {
                    lines,
                    samples,
                    columns,
                    total_columns,
                });
            }
            if !line.trim().is_empty() {
                return Err(VcfError::MissingHeader { line: idx + 1 });
            }
        }
        Err(VcfError::MissingHeader { line: read + 1 })
    }

    /// Samples kept after allow-list filtering, in header order.
    pub fn samples(&self) -> &[Arc<str>] {
        &self.samples
    }

    /// Fold every remaining record into a [`VariantStore`].
    pub fn into_variant_store(
        self,
        min_af: f64,
    ) -> Result<(VariantStore, VariantStoreStats), VcfError> {
        let store = VariantStore::new(self.samples.iter().cloned());
        let mut builder = VariantStoreBuilder::new(store, min_af);
        for record in self {
            builder.add(&record?)?;
        }
        Ok(builder.finish())
    }

    fn tokenize(&self, line_no: usize, line: &str) -> Result<GenotypeRecord, VariantStoreError> {
        let fields: Vec<&str> = line.split('\t').collect();
        let expected = FIXED_COLUMNS + self.total_columns;
        let sites_only = self.total_columns == 0 && fields.len() == FIXED_COLUMNS - 1;
        if fields.len() != expected && !sites_only {
            return Err(VariantStoreError::malformed(
                line_no,
                format!("expected {expected} tab-separated columns, found {}", fields.len()),
            ));
        }

        let position = fields[1].parse::<u64>().map_err(|_| {
            VariantStoreError::malformed(line_no, format!("invalid position '{}'", fields[1]))
        })?;
        let format = fields
            .get(FIXED_COLUMNS - 1)
            .map(|keys| keys.split(':').map(str::to_string).collect())
            .unwrap_or_default();
        let samples = self
            .columns
            .iter()
            .map(|&column| fields[FIXED_COLUMNS + column].to_string())
            .collect();

        Ok(GenotypeRecord {
            line: line_no,
            chrom: Arc::from(fields[0]),
            position,
            reference: fields[3].to_string(),
            alternate: fields[4].to_string(),
            info: fields[7].to_string(),
            format,
            samples,
        })
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<GenotypeRecord, VcfError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, line) = self.lines.next()?;
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() || line.starts_with('#') {
                debug!(line = idx + 1, "skipping blank or comment line");
                continue;
            }
            return Some(self.tokenize(idx + 1, line).map_err(VcfError::from));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const VCF: &str = "##fileformat=VCFv4.2\n\
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3\n\
chr1\t3\t.\tG\tT\t50\tPASS\tAF=0.5\tGT:DP\t0/1:10\t0/0:8\t1|1:12\n\
chr1\t5\trs2\tA\tC,G\t50\tPASS\tAF=0.5\tGT\t1/1\t1/1\t1/1\n";

    #[test]
    fn tokenizes_header_and_records() {
        let reader = VcfReader::new(Cursor::new(VCF), None).unwrap();
        let names: Vec<&str> = reader.samples().iter().map(|s| s.as_ref()).collect();
        assert_eq!(names, ["S1", "S2", "S3"]);

        let records: Vec<GenotypeRecord> = reader.map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 4);
        assert_eq!(records[0].position, 3);
        assert_eq!(records[0].format, ["GT", "DP"]);
        assert_eq!(records[0].samples, ["0/1:10", "0/0:8", "1|1:12"]);
        assert!(records[1].is_multiallelic());
    }

    #[test]
    fn allow_list_keeps_columns_aligned() {
        let allowed: HashSet<String> = ["S3".to_string(), "S1".to_string()].into();
        let reader = VcfReader::new(Cursor::new(VCF), Some(&allowed)).unwrap();
        let names: Vec<&str> = reader.samples().iter().map(|s| s.as_ref()).collect();
        assert_eq!(names, ["S1", "S3"]);

        let (store, _) = reader.into_variant_store(0.1).unwrap();
        let s1 = store.sample_id("S1").unwrap();
        let s3 = store.sample_id("S3").unwrap();
        assert_eq!(store.get("chr1", 2, s1), Some(b'T'));
        assert_eq!(store.get("chr1", 2, s3), Some(b'T'));
        assert!(store.sample_id("S2").is_err());
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let text = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
chr1\t3\t.\tG\tT\t50\tPASS\tAF=0.5\tGT\n";
        let mut reader = VcfReader::new(Cursor::new(text), None).unwrap();
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            VcfError::Record(VariantStoreError::MalformedRecord { line: 2, .. })
        ));
    }

    #[test]
    fn non_numeric_position_is_malformed() {
        let text = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
chr1\tx3\t.\tG\tT\t50\tPASS\tAF=0.5\n";
        let mut reader = VcfReader::new(Cursor::new(text), None).unwrap();
        assert!(matches!(
            reader.next().unwrap(),
            Err(VcfError::Record(VariantStoreError::MalformedRecord { line: 2, .. }))
        ));
    }

    #[test]
    fn data_before_header_is_rejected() {
        let err = VcfReader::new(Cursor::new("chr1\t1\t.\tA\tC\n"), None).unwrap_err();
        assert!(matches!(err, VcfError::MissingHeader { line: 1 }));
    }

    #[test]
    fn sample_list_ignores_blank_lines() {
        let allowed = read_sample_list(Cursor::new("S1\n\n  S2 \n")).unwrap();
        assert_eq!(allowed.len(), 2);
        assert!(allowed.contains("S2"));
    }
}
