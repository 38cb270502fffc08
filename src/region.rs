//! Padded genomic region parsing and geometry
//!
//! Regions come in as samtools-style `chrom:start-end` strings, 1-based and
//! inclusive at both ends. Padding widens the interval symmetrically before
//! the indexed fetch; the unpadded bounds are kept for read-level checks.

use anyhow::{Context, Result, bail};
use noodles::core::{Position, Region};

/// A parsed region plus the symmetric padding applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedRegion {
    chrom: String,
    start: i64,
    end: i64,
    pad: i64,
}

impl PaddedRegion {
    /// Parse a `chrom:start-end` region string and attach a padding.
    pub fn parse(region: &str, pad: u32) -> Result<Self> {
        let (chrom, span) = region
            .split_once(':')
            .with_context(|| format!("invalid region {region:?}: expected chrom:start-end"))?;
        let (start, end) = span
            .split_once('-')
            .with_context(|| format!("invalid region {region:?}: expected chrom:start-end"))?;

        if chrom.is_empty() {
            bail!("invalid region {region:?}: empty chromosome name");
        }

        let start: i64 = start
            .parse()
            .with_context(|| format!("invalid region start {start:?}"))?;
        let end: i64 = end
            .parse()
            .with_context(|| format!("invalid region end {end:?}"))?;
        if end < start {
            bail!("invalid region {region:?}: end before start");
        }

        Ok(Self {
            chrom: chrom.to_string(),
            start,
            end,
            pad: i64::from(pad),
        })
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Unpadded 1-based inclusive start.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Unpadded 1-based inclusive end.
    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn padded_start(&self) -> i64 {
        self.start - self.pad
    }

    pub fn padded_end(&self) -> i64 {
        self.end + self.pad
    }

    /// True when padding pushes the interval past the chromosome beginning.
    /// Extraction treats this as "nothing to fetch", not a hard error.
    pub fn underflows(&self) -> bool {
        self.padded_start() < 0
    }

    /// The padded interval as a query region. A padded start of 0 clamps to
    /// the first base since coordinates are 1-based.
    pub fn to_query_region(&self) -> Result<Region> {
        let start = Position::try_from(self.padded_start().max(1) as usize)?;
        let end = Position::try_from(self.padded_end() as usize)?;
        Ok(Region::new(self.chrom.as_str(), start..=end))
    }

    /// True if a 1-based position falls within the unpadded interval.
    pub fn contains(&self, pos: i64) -> bool {
        self.start <= pos && pos <= self.end
    }
}
