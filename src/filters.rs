//! Read-pair extraction functions
//!
//! An extraction function is a named predicate over a resolved read pair.
//! Every function gets its own paired FASTQ output channel; a pair is
//! written to a channel when that function accepts it. Functions are
//! evaluated independently, so one pair may land in several channels.

use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::region::PaddedRegion;

/// Canonical insert-size window for the discordant filters.
pub const DEFAULT_ISIZE_MIN: i64 = 300;
pub const DEFAULT_ISIZE_MAX: i64 = 400;

/// Minimum mapping quality for `keep_read`.
pub const KEEP_READ_MIN_MAPQ: u8 = 40;

/// Read length of a full-length perfect match (`100M`).
const PERFECT_MATCH_LEN: usize = 100;

/// A named pair predicate.
///
/// The name doubles as the output file infix (`<prefix>_<name>_1.fq`).
/// Custom predicates can be supplied through [`ExtractFn::new`].
pub struct ExtractFn {
    name: String,
    predicate: Box<dyn Fn(&RecordBuf, &RecordBuf) -> bool>,
}

impl ExtractFn {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&RecordBuf, &RecordBuf) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn accepts(&self, aln: &RecordBuf, mate: &RecordBuf) -> bool {
        (self.predicate)(aln, mate)
    }
}

impl std::fmt::Debug for ExtractFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractFn").field("name", &self.name).finish()
    }
}

/// Accepts every pair.
pub fn all_pair() -> ExtractFn {
    ExtractFn::new("all_pair", |_, _| true)
}

/// Rejects only pairs where both reads align as a full-length perfect match
/// in proper-pair orientation. Used to downsample uninformative pairs.
pub fn non_perfect() -> ExtractFn {
    ExtractFn::new("non_perfect", |aln, mate| !is_perfect_pair(aln, mate))
}

/// Accepts pairs with missing template length or an absolute template length
/// outside `[isize_min, isize_max]`.
pub fn discordant(isize_min: i64, isize_max: i64) -> ExtractFn {
    ExtractFn::new("discordant", move |aln, _mate| {
        let tlen = i64::from(aln.template_length());
        tlen == 0 || !(isize_min..=isize_max).contains(&tlen.abs())
    })
}

/// As [`discordant`], but pairs with both reads on the same strand are never
/// reported. Missing template length still always is.
pub fn discordant_with_normal_orientation(isize_min: i64, isize_max: i64) -> ExtractFn {
    ExtractFn::new("discordant_with_normal_orientation", move |aln, mate| {
        let tlen = i64::from(aln.template_length());
        if tlen == 0 {
            return true;
        }
        if aln.flags().is_reverse_complemented() == mate.flags().is_reverse_complemented() {
            return false;
        }
        !(isize_min..=isize_max).contains(&tlen.abs())
    })
}

/// True when both reads are a single full-length match and flagged as a
/// proper pair. The negation of [`non_perfect`]'s predicate.
pub fn is_perfect_pair(aln: &RecordBuf, mate: &RecordBuf) -> bool {
    is_full_length_match(aln)
        && is_full_length_match(mate)
        && aln.flags().is_properly_segmented()
        && mate.flags().is_properly_segmented()
}

fn is_full_length_match(aln: &RecordBuf) -> bool {
    let ops: &[_] = aln.cigar().as_ref();
    ops.len() == 1 && ops[0].kind() == Kind::Match && ops[0].len() == PERFECT_MATCH_LEN
}

/// True if the alignment is soft or hard clipped on both ends, or has no
/// CIGAR at all (unmapped).
pub fn is_clipped_both(aln: &RecordBuf) -> bool {
    let ops: &[_] = aln.cigar().as_ref();
    match (ops.first(), ops.last()) {
        (Some(first), Some(last)) => is_clip(first.kind()) && is_clip(last.kind()),
        _ => true,
    }
}

#[inline]
fn is_clip(kind: Kind) -> bool {
    matches!(kind, Kind::SoftClip | Kind::HardClip)
}

/// Read-level quality gate: mapped to the region's chromosome, not clipped
/// on both ends, MAPQ >= 40, and starting within the unpadded interval.
///
/// A missing mapping quality (255) passes the MAPQ gate.
pub fn keep_read(aln: &RecordBuf, aln_chrom: &str, region: &PaddedRegion) -> bool {
    if aln_chrom != region.chrom() || is_clipped_both(aln) {
        return false;
    }
    let mapq = aln.mapping_quality().map(u8::from).unwrap_or(255);
    if mapq < KEEP_READ_MIN_MAPQ {
        return false;
    }
    aln.alignment_start()
        .is_some_and(|pos| region.contains(usize::from(pos) as i64))
}

/// Pair-level gate: keep when either read passes [`keep_read`].
pub fn keep_pair(
    aln: &RecordBuf,
    mate: &RecordBuf,
    aln_chrom: &str,
    mate_chrom: &str,
    region: &PaddedRegion,
) -> bool {
    keep_read(aln, aln_chrom, region) || keep_read(mate, mate_chrom, region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::core::Position;
    use noodles::sam::alignment::record::cigar::op::Op;
    use noodles::sam::alignment::record::{Flags, MappingQuality};
    use noodles::sam::alignment::record_buf::Cigar;

    fn perfect_flags() -> Flags {
        Flags::SEGMENTED | Flags::PROPERLY_SEGMENTED | Flags::FIRST_SEGMENT
    }

    fn read(cigar: Vec<Op>, flags: Flags, tlen: i32) -> RecordBuf {
        RecordBuf::builder()
            .set_name(bstr::BString::from("q1"))
            .set_flags(flags)
            .set_cigar(Cigar::from(cigar))
            .set_template_length(tlen)
            .build()
    }

    fn perfect_read(tlen: i32) -> RecordBuf {
        read(vec![Op::new(Kind::Match, 100)], perfect_flags(), tlen)
    }

    #[test]
    fn test_all_pair_accepts_everything() {
        let f = all_pair();
        assert_eq!(f.name(), "all_pair");
        assert!(f.accepts(&perfect_read(350), &perfect_read(-350)));
        assert!(f.accepts(&perfect_read(0), &perfect_read(0)));
    }

    #[test]
    fn test_non_perfect_is_negation_of_perfect() {
        let f = non_perfect();
        let aln = perfect_read(350);
        let mate = perfect_read(-350);
        assert!(is_perfect_pair(&aln, &mate));
        assert!(!f.accepts(&aln, &mate));

        // split CIGAR breaks perfection
        let split = read(
            vec![Op::new(Kind::Match, 50), Op::new(Kind::SoftClip, 50)],
            perfect_flags(),
            350,
        );
        assert!(!is_perfect_pair(&split, &mate));
        assert!(f.accepts(&split, &mate));

        // missing proper-pair flag breaks perfection
        let improper = read(
            vec![Op::new(Kind::Match, 100)],
            Flags::SEGMENTED | Flags::FIRST_SEGMENT,
            350,
        );
        assert!(f.accepts(&improper, &mate));
    }

    #[test]
    fn test_discordant_default_window() {
        let f = discordant(DEFAULT_ISIZE_MIN, DEFAULT_ISIZE_MAX);
        assert_eq!(f.name(), "discordant");

        // tlen 0 is always discordant
        assert!(f.accepts(&perfect_read(0), &perfect_read(0)));
        // below, inside, and above the window
        assert!(f.accepts(&perfect_read(299), &perfect_read(-299)));
        assert!(!f.accepts(&perfect_read(300), &perfect_read(-300)));
        assert!(!f.accepts(&perfect_read(400), &perfect_read(-400)));
        assert!(f.accepts(&perfect_read(401), &perfect_read(-401)));
        // sign does not matter
        assert!(!f.accepts(&perfect_read(-350), &perfect_read(350)));
    }

    #[test]
    fn test_discordant_with_normal_orientation() {
        let f = discordant_with_normal_orientation(DEFAULT_ISIZE_MIN, DEFAULT_ISIZE_MAX);

        let fwd = |tlen| read(vec![Op::new(Kind::Match, 100)], Flags::SEGMENTED, tlen);
        let rev = |tlen| {
            read(
                vec![Op::new(Kind::Match, 100)],
                Flags::SEGMENTED | Flags::REVERSE_COMPLEMENTED,
                tlen,
            )
        };

        // same strand: excluded regardless of insert size
        assert!(!f.accepts(&fwd(600), &fwd(-600)));
        assert!(!f.accepts(&rev(600), &rev(-600)));
        // except when template length is missing
        assert!(f.accepts(&fwd(0), &fwd(0)));
        // opposite strands: plain insert-size check
        assert!(f.accepts(&fwd(600), &rev(-600)));
        assert!(!f.accepts(&fwd(350), &rev(-350)));
    }

    #[test]
    fn test_is_clipped_both() {
        let both = read(
            vec![
                Op::new(Kind::SoftClip, 10),
                Op::new(Kind::Match, 80),
                Op::new(Kind::HardClip, 10),
            ],
            Flags::SEGMENTED,
            0,
        );
        assert!(is_clipped_both(&both));

        let left_only = read(
            vec![Op::new(Kind::SoftClip, 10), Op::new(Kind::Match, 90)],
            Flags::SEGMENTED,
            0,
        );
        assert!(!is_clipped_both(&left_only));

        // no CIGAR counts as clipped (unmapped)
        let unmapped = read(Vec::new(), Flags::UNMAPPED, 0);
        assert!(is_clipped_both(&unmapped));
    }

    #[test]
    fn test_keep_read_gates() {
        let region = PaddedRegion::parse("chr1:1000-2000", 500).unwrap();

        let aln = |mapq: u8, pos: usize| {
            RecordBuf::builder()
                .set_name(bstr::BString::from("q1"))
                .set_flags(Flags::SEGMENTED)
                .set_cigar(Cigar::from(vec![Op::new(Kind::Match, 100)]))
                .set_mapping_quality(MappingQuality::new(mapq).unwrap())
                .set_alignment_start(Position::try_from(pos).unwrap())
                .build()
        };

        assert!(keep_read(&aln(60, 1500), "chr1", &region));
        // wrong chromosome
        assert!(!keep_read(&aln(60, 1500), "chr2", &region));
        // low mapping quality
        assert!(!keep_read(&aln(39, 1500), "chr1", &region));
        assert!(keep_read(&aln(40, 1500), "chr1", &region));
        // outside the unpadded interval, even though inside the padded one
        assert!(!keep_read(&aln(60, 700), "chr1", &region));
    }

    #[test]
    fn test_keep_pair_either_side() {
        let region = PaddedRegion::parse("chr1:1000-2000", 0).unwrap();
        let good = RecordBuf::builder()
            .set_name(bstr::BString::from("q1"))
            .set_flags(Flags::SEGMENTED)
            .set_cigar(Cigar::from(vec![Op::new(Kind::Match, 100)]))
            .set_mapping_quality(MappingQuality::new(60).unwrap())
            .set_alignment_start(Position::try_from(1500).unwrap())
            .build();
        let bad = RecordBuf::builder()
            .set_name(bstr::BString::from("q1"))
            .set_flags(Flags::SEGMENTED)
            .set_cigar(Cigar::from(vec![Op::new(Kind::Match, 100)]))
            .set_mapping_quality(MappingQuality::new(10).unwrap())
            .set_alignment_start(Position::try_from(1500).unwrap())
            .build();

        assert!(keep_pair(&good, &bad, "chr1", "chr1", &region));
        assert!(keep_pair(&bad, &good, "chr1", "chr1", &region));
        assert!(!keep_pair(&bad, &bad, "chr1", "chr1", &region));
    }
}
