// Command-line argument parsing
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::extract::EXTRACTION_MAX_READ_PAIRS;
use crate::filters::{self, ExtractFn};

#[derive(Parser, Debug)]
#[command(
    name = "pairextract",
    about = "Extract reads and mates from a region for assembly"
)]
pub struct Args {
    /// BAM file to extract reads from (an index must sit next to it)
    #[arg(long)]
    pub bam: PathBuf,
    /// Samtools region string, e.g. chr1:100000-101000
    #[arg(long)]
    pub region: String,
    /// Output FASTQ prefix
    #[arg(long)]
    pub prefix: String,
    /// Extraction function
    #[arg(long = "extract_fn", value_enum, default_value = "all_pair")]
    pub extract_fn: FilterKind,
    /// Padding to apply on both sides of the interval
    #[arg(long, default_value_t = 0)]
    pub pad: u32,
    /// Minimum insert size for the discordant filter
    #[arg(long = "isize_min", default_value_t = 200)]
    pub isize_min: i64,
    /// Maximum insert size for the discordant filter
    #[arg(long = "isize_max", default_value_t = 500)]
    pub isize_max: i64,
    /// Maximum read pairs to extract for an interval
    #[arg(long = "max_read_pairs", default_value_t = EXTRACTION_MAX_READ_PAIRS)]
    pub max_read_pairs: usize,
}

/// Extraction functions selectable from the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    #[value(name = "all_pair")]
    AllPair,
    #[value(name = "non_perfect")]
    NonPerfect,
    #[value(name = "discordant")]
    Discordant,
}

impl Args {
    /// Resolve the selected extraction function, binding the discordant
    /// filter to the CLI insert-size bounds.
    pub fn extract_fns(&self) -> Vec<ExtractFn> {
        let extract_fn = match self.extract_fn {
            FilterKind::AllPair => filters::all_pair(),
            FilterKind::NonPerfect => filters::non_perfect(),
            FilterKind::Discordant => filters::discordant(self.isize_min, self.isize_max),
        };
        vec![extract_fn]
    }
}
