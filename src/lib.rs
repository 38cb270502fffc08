//! pairextract - extract read pairs overlapping a genomic region to paired FASTQ
//!
//! Fetches primary alignments overlapping a padded region of an indexed BAM
//! file, reconstructs read pairs by query name (with an indexed mate lookup
//! for pairs split across the window edge), and writes the pairs accepted by
//! each selected extraction function to that function's `_1.fq`/`_2.fq`
//! files, ready for downstream assembly.
//!
//! # Example
//!
//! ```ignore
//! use pairextract::{extract_read_pairs, filters, EXTRACTION_MAX_READ_PAIRS};
//!
//! let fns = vec![filters::discordant(300, 400)];
//! let results = extract_read_pairs(
//!     "sample.bam".as_ref(),
//!     "chr1:100000-101000",
//!     "out/sample",
//!     &fns,
//!     500,
//!     EXTRACTION_MAX_READ_PAIRS,
//! )?;

pub mod args;
pub mod extract;
pub mod filters;
pub mod io;
pub mod region;
pub mod utils;

// Re-export commonly used items
pub use args::Args;
pub use extract::{EXTRACTION_MAX_READ_PAIRS, PairTable, extract_read_pairs, resolve_pairs};
pub use filters::{ExtractFn, all_pair, discordant, discordant_with_normal_orientation, non_perfect};
pub use region::PaddedRegion;
