use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::{ConsensusRecord, ReferenceError, ReferenceGenome};

/// Bases per output line unless configured otherwise.
pub const DEFAULT_LINE_WIDTH: usize = 60;

/// Parse a multi-record FASTA into a [`ReferenceGenome`].
///
/// The chromosome name is the first whitespace-delimited token of each
/// header; sequence lines are concatenated and upper-cased.
pub fn read_reference<R: BufRead>(reader: R) -> Result<ReferenceGenome, ReferenceError> {
    let mut genome = ReferenceGenome::default();
    let mut current: Option<(Arc<str>, Vec<u8>)> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            if let Some((name, sequence)) = current.take() {
                genome.push(name, &sequence)?;
            }
            let name = header
                .split_whitespace()
                .next()
                .ok_or(ReferenceError::EmptyName(idx + 1))?;
            current = Some((Arc::from(name), Vec::new()));
        } else if !line.is_empty() {
            let (_, sequence) = current
                .as_mut()
                .ok_or(ReferenceError::MissingHeader(idx + 1))?;
            sequence.extend_from_slice(line.as_bytes());
        }
    }
    if let Some((name, sequence)) = current {
        genome.push(name, &sequence)?;
    }
    Ok(genome)
}

/// Write consensus records as FASTA, wrapping sequences at `line_width`
/// bases (`0` writes each sequence on one line).
pub fn write_fasta<W: Write>(
    writer: &mut W,
    records: &[ConsensusRecord],
    line_width: usize,
) -> Result<()> {
    for record in records {
        writeln!(writer, ">{}", record.header())?;
        if line_width == 0 {
            writer.write_all(&record.sequence)?;
            writer.write_all(b"\n")?;
            continue;
        }
        for chunk in record.sequence.chunks(line_width) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Render records into a FASTA string (useful for tests and snapshots).
pub fn render_fasta(records: &[ConsensusRecord], line_width: usize) -> Result<String> {
    let mut buffer = Vec::new();
    write_fasta(&mut buffer, records, line_width)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered FASTA is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_multi_line_records_in_order() {
        let text = ">chr2 some description\nacgt\nNNa\n\n>chr1\r\nTTTT\r\n";
        let genome = read_reference(Cursor::new(text)).unwrap();
        let names: Vec<&str> = genome.iter().map(|c| c.name.as_ref()).collect();
        assert_eq!(names, ["chr2", "chr1"]);
        assert_eq!(genome.get("chr2").unwrap().sequence.as_ref(), b"ACGTNNA");
        assert_eq!(genome.get("chr1").unwrap().sequence.as_ref(), b"TTTT");
    }

    #[test]
    fn header_without_sequence_is_empty_chromosome() {
        let genome = read_reference(Cursor::new(">empty\n>chr1\nAC\n")).unwrap();
        assert!(genome.get("empty").unwrap().is_empty());
    }

    #[test]
    fn sequence_before_header_is_rejected() {
        let err = read_reference(Cursor::new("\nACGT\n>chr1\nA\n")).unwrap_err();
        assert!(matches!(err, ReferenceError::MissingHeader(2)));
    }

    #[test]
    fn nameless_header_is_rejected() {
        let err = read_reference(Cursor::new(">  \nACGT\n")).unwrap_err();
        assert!(matches!(err, ReferenceError::EmptyName(1)));
    }

    #[test]
    fn wraps_without_repeating_bases() {
        let record = ConsensusRecord {
            sample: Arc::from("S1"),
            chrom: Arc::from("chr1"),
            start: 0,
            end: 7,
            sequence: b"ACGTACG".to_vec(),
        };
        let text = render_fasta(&[record.clone()], 3).unwrap();
        assert_eq!(text, ">S1_chr1:0-7\nACG\nTAC\nG\n");
        let flat = render_fasta(&[record], 0).unwrap();
        assert_eq!(flat, ">S1_chr1:0-7\nACGTACG\n");
    }
}
