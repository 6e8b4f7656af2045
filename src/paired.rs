//! Two mates of one fragment viewed together.

use crate::alignment::{BaseCall, SingleAlignment};
use crate::annotation::{BlockedFootprint, GenomicBlock, Strand};
use crate::error::{Error, Result};
use crate::orientation::{self, PairOrientation};
use std::cell::OnceCell;

/// A fragment built from two mates on the same reference.
///
/// Orientation and the merged footprint are computed on first use.
#[derive(Debug, Clone)]
pub struct PairedAlignment {
    first: SingleAlignment,
    second: SingleAlignment,
    orientation: OnceCell<PairOrientation>,
    footprint: OnceCell<BlockedFootprint>,
}

impl PairedAlignment {
    /// Roles follow the first-in-pair flag; when neither or both mates carry
    /// it, the given order is kept.
    pub fn new(a: SingleAlignment, b: SingleAlignment) -> Result<Self> {
        if a.reference() != b.reference() {
            return Err(Error::ReferenceMismatch {
                name: a.name().to_string(),
                first: a.reference().to_string(),
                second: b.reference().to_string(),
            });
        }
        let (first, second) = if b.is_first_in_pair() && !a.is_first_in_pair() { (b, a) } else { (a, b) };
        Ok(Self { first, second, orientation: OnceCell::new(), footprint: OnceCell::new() })
    }

    pub fn first(&self) -> &SingleAlignment {
        &self.first
    }

    pub fn second(&self) -> &SingleAlignment {
        &self.second
    }

    pub fn name(&self) -> &str {
        self.first.name()
    }

    pub fn reference(&self) -> &str {
        self.first.reference()
    }

    pub fn orientation(&self) -> PairOrientation {
        *self.orientation.get_or_init(|| orientation::classify(&self.first, &self.second))
    }

    pub fn strand(&self) -> Strand {
        self.orientation().fragment_strand()
    }

    pub fn is_concordant(&self) -> bool {
        self.orientation().is_concordant()
    }

    /// Union of both mates' blocks, on the fragment strand.
    pub fn footprint(&self) -> &BlockedFootprint {
        self.footprint.get_or_init(|| {
            self.first.footprint().merged(self.second.footprint(), self.strand())
        })
    }

    /// The unsequenced gap between non-overlapping mates, on the fragment
    /// strand. `None` when the mates' extents overlap or abut.
    pub fn insert_interval(&self) -> Option<GenomicBlock> {
        let (a, b) = (self.first.footprint(), self.second.footprint());
        if a.overlaps_extent(b) {
            return None;
        }
        let start = a.end().min(b.end());
        let end = a.start().max(b.start());
        GenomicBlock::new(self.reference(), start, end, self.strand()).ok()
    }

    /// Insert length in bases; 0 when there is no insert.
    pub fn insert_size(&self) -> u64 {
        self.insert_interval().map_or(0, |insert| insert.len())
    }

    /// The base both mates agree on at `pos`, or `Conflicting` if they differ.
    pub fn base_at_reference_position(&self, pos: u64) -> BaseCall {
        BaseCall::resolve(
            self.first.base_at_reference_position(pos),
            self.second.base_at_reference_position(pos),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    struct Mate<'a> {
        start: u64,
        cigar: &'a str,
        reverse: bool,
        first: bool,
        bases: Option<&'a str>,
    }

    fn mate(start: u64, cigar: &str, reverse: bool, first: bool) -> Mate<'_> {
        Mate { start, cigar, reverse, first, bases: None }
    }

    fn single(m: &Mate<'_>, reference: &str) -> SingleAlignment {
        let mut builder =
            RawRecord::builder().name("frag").reference(reference).start(m.start).cigar(m.cigar).reverse(m.reverse);
        builder = if m.first { builder.first_in_pair() } else { builder.second_in_pair() };
        if let Some(bases) = m.bases {
            builder = builder.bases(bases);
        }
        SingleAlignment::from_raw(&builder.build().unwrap()).unwrap()
    }

    fn pair(a: Mate<'_>, b: Mate<'_>) -> PairedAlignment {
        PairedAlignment::new(single(&a, "chr1"), single(&b, "chr1")).unwrap()
    }

    #[test]
    fn test_roles_follow_first_in_pair_flag() {
        let p = pair(mate(300, "50M", true, false), mate(100, "50M", false, true));
        assert!(p.first().is_first_in_pair());
        assert_eq!(p.first().start(), 100);
        assert_eq!(p.orientation(), PairOrientation::F1R2);
        assert!(p.is_concordant());
        assert_eq!(p.strand(), Strand::Forward);
    }

    #[test]
    fn test_roles_kept_when_ambiguous() {
        let a = single(&mate(300, "50M", true, true), "chr1");
        let b = single(&mate(100, "50M", false, true), "chr1");
        let p = PairedAlignment::new(a, b).unwrap();
        assert_eq!(p.first().start(), 300);
        assert_eq!(p.orientation(), PairOrientation::F2R1);
        assert_eq!(p.strand(), Strand::Reverse);
    }

    #[test]
    fn test_reference_mismatch_is_rejected() {
        let a = single(&mate(100, "50M", false, true), "chr1");
        let b = single(&mate(300, "50M", true, false), "chr2");
        assert!(matches!(PairedAlignment::new(a, b), Err(Error::ReferenceMismatch { .. })));
    }

    #[test]
    fn test_insert_between_separated_mates() {
        let p = pair(mate(100, "50M", false, true), mate(300, "50M", true, false));
        let insert = p.insert_interval().unwrap();
        assert_eq!((insert.start(), insert.end()), (150, 300));
        assert_eq!(insert.strand(), Strand::Forward);
        assert_eq!(p.insert_size(), 150);
    }

    #[test]
    fn test_no_insert_when_mates_overlap() {
        let p = pair(mate(100, "50M", false, true), mate(149, "50M", true, false));
        assert!(p.insert_interval().is_none());
        assert_eq!(p.insert_size(), 0);

        let abutting = pair(mate(100, "50M", false, true), mate(150, "50M", true, false));
        assert!(abutting.insert_interval().is_none());
    }

    #[test]
    fn test_insert_is_symmetric_in_mate_order() {
        let p = pair(mate(300, "50M", true, false), mate(100, "50M", false, true));
        let insert = p.insert_interval().unwrap();
        assert_eq!((insert.start(), insert.end()), (150, 300));
    }

    #[test]
    fn test_merged_footprint() {
        let p = pair(mate(100, "20M100N20M", false, true), mate(230, "30M", true, false));
        let spans: Vec<(u64, u64)> = p.footprint().blocks().iter().map(|b| (b.start(), b.end())).collect();
        assert_eq!(spans, vec![(100, 120), (220, 260)]);
        assert_eq!(p.footprint().strand(), Strand::Forward);
    }

    #[test]
    fn test_base_lookup_resolves_mates() {
        let mut r1 = mate(100, "6M", false, true);
        r1.bases = Some("AAAACC");
        let mut r2 = mate(104, "6M", true, false);
        r2.bases = Some("CGGGGG");
        let p = pair(r1, r2);

        assert_eq!(p.base_at_reference_position(100), BaseCall::Base(b'A'));
        assert_eq!(p.base_at_reference_position(104), BaseCall::Base(b'C'));
        assert_eq!(p.base_at_reference_position(105), BaseCall::Conflicting);
        assert_eq!(p.base_at_reference_position(109), BaseCall::Base(b'G'));
        assert_eq!(p.base_at_reference_position(110), BaseCall::Invalid);
    }
}
