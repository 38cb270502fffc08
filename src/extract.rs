//! Region fetch, mate resolution, and the extraction driver
//!
//! `extract_read_pairs` is the one-invocation pipeline: fetch primary
//! alignments overlapping the padded region, group them into pairs by query
//! name, resolve mates that fall outside the fetched window with one indexed
//! lookup each, then run every extraction function over the resolved pairs
//! and write accepted pairs to that function's FASTQ channel.

use anyhow::{Context, Result};
use bstr::BString;
use log::{debug, error, info};
use noodles::bam;
use noodles::core::Region;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::filters::ExtractFn;
use crate::io::FastqChannel;
use crate::region::PaddedRegion;
use crate::utils::format_elapsed;

/// Ceiling on distinct query names in a fetched window. Regions denser than
/// this are skipped outright rather than resolved pair by pair.
pub const EXTRACTION_MAX_READ_PAIRS: usize = 10_000;

type BamReader = bam::io::IndexedReader<noodles::bgzf::io::Reader<File>>;

/// Pair table keyed by query name, two slots per name.
///
/// Slot 0 holds the first segment, slot 1 the last. A later record with the
/// same name and slot overwrites the earlier one; the fetch only screens out
/// secondary records, so a supplementary alignment can displace the primary
/// it duplicates.
#[derive(Default)]
pub struct PairTable {
    slots: HashMap<BString, [Option<RecordBuf>; 2]>,
}

impl PairTable {
    pub fn insert(&mut self, aln: RecordBuf) {
        let Some(name) = aln.name().map(|n| n.to_owned()) else {
            debug!("skipping record without a query name");
            return;
        };
        let slot = if aln.flags().is_first_segment() { 0 } else { 1 };
        self.slots.entry(name).or_default()[slot] = Some(aln);
    }

    /// Number of distinct query names seen.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Resolve a pair table into complete (read 1, read 2) pairs.
///
/// Entries with both slots filled pass through. Entries with one slot filled
/// get one `mate_of` lookup; when it comes back empty the pair is dropped.
/// When the table holds more distinct names than `max_read_pairs`, the whole
/// step is skipped and no pairs are returned.
pub fn resolve_pairs<F>(table: PairTable, max_read_pairs: usize, mut mate_of: F) -> Vec<(RecordBuf, RecordBuf)>
where
    F: FnMut(&RecordBuf) -> Option<RecordBuf>,
{
    if table.len() > max_read_pairs {
        info!(
            "too many reads encountered ({} distinct names > {}), skipping read extraction",
            table.len(),
            max_read_pairs
        );
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(table.len());
    for (name, entry) in table.slots {
        match entry {
            [Some(first), Some(second)] => pairs.push((first, second)),
            [Some(first), None] => match mate_of(&first) {
                Some(mate) => pairs.push((first, mate)),
                None => debug!("dropping {name}: mate not found"),
            },
            [None, Some(second)] => match mate_of(&second) {
                Some(mate) => pairs.push((mate, second)),
                None => debug!("dropping {name}: mate not found"),
            },
            [None, None] => {}
        }
    }
    pairs
}

/// Look up the mate of a half pair with one indexed query at the mate's
/// recorded position, scanning for a primary record with the same name and
/// the opposite read-pair end.
///
/// Returns `Ok(None)` when the mate is unmapped, unlocatable, or absent.
fn find_mate(reader: &mut BamReader, header: &Header, aln: &RecordBuf) -> Result<Option<RecordBuf>> {
    let flags = aln.flags();
    if !flags.is_segmented() || flags.is_mate_unmapped() {
        return Ok(None);
    }
    let (Some(mate_ref_id), Some(mate_start)) =
        (aln.mate_reference_sequence_id(), aln.mate_alignment_start())
    else {
        return Ok(None);
    };
    let Some((mate_chrom, _)) = header.reference_sequences().get_index(mate_ref_id) else {
        return Ok(None);
    };

    let region = Region::new(mate_chrom.clone(), mate_start..=mate_start);
    let query = reader.query(header, &region)?;
    for result in query.records() {
        let record = result?;
        let record_flags = record.flags();
        if record_flags.is_secondary() || record_flags.is_supplementary() {
            continue;
        }
        if record.name() != aln.name() {
            continue;
        }
        if record_flags.is_first_segment() == flags.is_first_segment() {
            continue;
        }
        let mate = RecordBuf::try_from_alignment_record(header, &record)?;
        return Ok(Some(mate));
    }
    Ok(None)
}

/// Extract read pairs overlapping `region` from an indexed BAM file and
/// write the pairs accepted by each extraction function to that function's
/// paired FASTQ files under `prefix`.
///
/// Returns the `(end1, end2)` paths and kept-pair count per function. A
/// padded start before the chromosome beginning logs an error and extracts
/// nothing; output files are created either way.
pub fn extract_read_pairs(
    bam_path: &Path,
    region: &str,
    prefix: &str,
    extract_fns: &[ExtractFn],
    pad: u32,
    max_read_pairs: usize,
) -> Result<Vec<((PathBuf, PathBuf), u64)>> {
    let fn_names: Vec<&str> = extract_fns.iter().map(|f| f.name()).collect();
    info!(
        "extracting reads from {} for region {} with padding {} using functions {:?}",
        bam_path.display(),
        region,
        pad,
        fn_names
    );

    let start_time = Instant::now();
    let region = PaddedRegion::parse(region, pad)?;

    let mut reader = bam::io::indexed_reader::Builder::default()
        .build_from_path(bam_path)
        .with_context(|| format!("failed to open indexed BAM {}", bam_path.display()))?;
    let header = reader.read_header()?;

    let mut table = PairTable::default();
    if region.underflows() {
        error!("skipping read extraction since interval too close to chromosome beginning");
    } else {
        let query_region = region.to_query_region()?;
        let query = reader.query(&header, &query_region)?;
        let mut fetched = 0usize;
        for result in query.records() {
            let record = result?;
            if record.flags().is_secondary() {
                continue;
            }
            table.insert(RecordBuf::try_from_alignment_record(&header, &record)?);
            fetched += 1;
        }
        info!("building mate table from {fetched} reads");
    }

    let pairs = resolve_pairs(table, max_read_pairs, |aln| {
        match find_mate(&mut reader, &header, aln) {
            Ok(mate) => mate,
            Err(e) => {
                debug!("mate lookup failed: {e}");
                None
            }
        }
    });

    let mut channels = extract_fns
        .iter()
        .map(|f| FastqChannel::create(prefix, f.name()))
        .collect::<Result<Vec<_>>>()?;

    let mut counts = vec![0u64; extract_fns.len()];
    for (first, second) in &pairs {
        for (i, extract_fn) in extract_fns.iter().enumerate() {
            if extract_fn.accepts(first, second) {
                channels[i].write_pair(first, second)?;
                counts[i] += 1;
            }
        }
    }

    info!(
        "examined {} pairs in {}",
        pairs.len(),
        format_elapsed(start_time.elapsed())
    );
    let summary: Vec<(&str, u64)> = fn_names.into_iter().zip(counts.iter().copied()).collect();
    info!("extraction counts {summary:?}");

    let mut results = Vec::with_capacity(channels.len());
    for (channel, count) in channels.into_iter().zip(counts) {
        results.push((channel.finish()?, count));
    }
    Ok(results)
}
