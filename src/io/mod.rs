//! Paired FASTQ output
//!
//! Each extraction function writes through a [`FastqChannel`], a pair of
//! FASTQ files for the first and second ends. Reads aligned to the reverse
//! strand are flipped back to original-read orientation before writing.

use anyhow::{Context, Result};
use noodles::fastq;
use noodles::fastq::record::Definition;
use noodles::sam::alignment::RecordBuf;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Offset between a raw Phred score and its FASTQ ASCII encoding.
const PHRED_OFFSET: u8 = 33;

/// Complement of an uppercase nucleotide; other bytes pass through.
#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        other => other,
    }
}

/// Reverse complement, uppercasing as it goes.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| complement(b.to_ascii_uppercase()))
        .collect()
}

/// Sequence and quality scores in original-read orientation.
///
/// Reverse-strand alignments come back reverse-complemented with reversed
/// qualities; forward-strand ones verbatim, sequence uppercased.
pub fn oriented_sequence_quality(aln: &RecordBuf) -> (Vec<u8>, Vec<u8>) {
    let seq: &[u8] = aln.sequence().as_ref();
    let qual: &[u8] = aln.quality_scores().as_ref();

    if aln.flags().is_reverse_complemented() {
        (reverse_complement(seq), qual.iter().rev().copied().collect())
    } else {
        (seq.to_ascii_uppercase(), qual.to_vec())
    }
}

/// Write one read as a 4-line FASTQ record named `qname/1` or `qname/2` by
/// read-pair end.
pub fn write_read<W: Write>(writer: &mut fastq::io::Writer<W>, aln: &RecordBuf) -> Result<()> {
    let end_id = if aln.flags().is_first_segment() { 1 } else { 2 };

    let mut name = aln.name().map(|n| n.to_vec()).unwrap_or_default();
    name.extend_from_slice(format!("/{end_id}").as_bytes());

    let (sequence, quality) = oriented_sequence_quality(aln);
    let quality: Vec<u8> = quality.iter().map(|&q| q + PHRED_OFFSET).collect();

    let record = fastq::Record::new(Definition::new(name, ""), sequence, quality);
    writer.write_record(&record)?;
    Ok(())
}

/// One extraction function's pair of FASTQ outputs, `<prefix>_<name>_1.fq`
/// and `<prefix>_<name>_2.fq`.
///
/// Both files are created eagerly so that a channel with zero matching pairs
/// still leaves empty files behind.
pub struct FastqChannel {
    path1: PathBuf,
    path2: PathBuf,
    writer1: fastq::io::Writer<BufWriter<File>>,
    writer2: fastq::io::Writer<BufWriter<File>>,
}

impl FastqChannel {
    pub fn create(prefix: &str, name: &str) -> Result<Self> {
        let path1 = PathBuf::from(format!("{prefix}_{name}_1.fq"));
        let path2 = PathBuf::from(format!("{prefix}_{name}_2.fq"));
        let writer1 = open_fastq_writer(&path1)?;
        let writer2 = open_fastq_writer(&path2)?;
        Ok(Self {
            path1,
            path2,
            writer1,
            writer2,
        })
    }

    /// Write both reads of a pair, read 1 to the first-end file and read 2
    /// to the second-end file.
    pub fn write_pair(&mut self, first: &RecordBuf, second: &RecordBuf) -> Result<()> {
        write_read(&mut self.writer1, first)?;
        write_read(&mut self.writer2, second)?;
        Ok(())
    }

    /// Flush both writers and hand back the output paths.
    pub fn finish(mut self) -> Result<(PathBuf, PathBuf)> {
        self.writer1.get_mut().flush()?;
        self.writer2.get_mut().flush()?;
        Ok((self.path1, self.path2))
    }
}

fn open_fastq_writer(path: &Path) -> Result<fastq::io::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(fastq::io::Writer::new(BufWriter::new(file)))
}
