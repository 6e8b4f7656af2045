//! CIGAR operator classification and the per-base walk shared by footprint
//! construction and base lookup.

use crate::error::{Error, Result};
use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    Match,
    Ins,
    Del,
    RefSkip,
    SoftClip,
    HardClip,
    Pad,
    Equal,
    Diff,
}

impl CigarOp {
    pub const ALL: [CigarOp; 9] = [
        CigarOp::Match,
        CigarOp::Ins,
        CigarOp::Del,
        CigarOp::RefSkip,
        CigarOp::SoftClip,
        CigarOp::HardClip,
        CigarOp::Pad,
        CigarOp::Equal,
        CigarOp::Diff,
    ];

    /// True if the operator consumes bases of the read sequence.
    pub const fn consumes_read(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::SoftClip | CigarOp::Equal | CigarOp::Diff
        )
    }

    /// True if the operator consumes bases of the reference.
    pub const fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Del | CigarOp::RefSkip | CigarOp::Equal | CigarOp::Diff
        )
    }

    /// True if a read base sits on a reference base under this operator.
    pub const fn is_aligned(self) -> bool {
        self.consumes_read() && self.consumes_reference()
    }

    pub const fn as_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
            CigarOp::RefSkip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Pad => 'P',
            CigarOp::Equal => '=',
            CigarOp::Diff => 'X',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        CigarOp::ALL.into_iter().find(|op| op.as_char() == c)
    }

    pub const fn kind(self) -> CigarKind {
        match self {
            CigarOp::Match => CigarKind::Match,
            CigarOp::Ins => CigarKind::Insertion,
            CigarOp::Del => CigarKind::Deletion,
            CigarOp::RefSkip => CigarKind::Skip,
            CigarOp::SoftClip => CigarKind::SoftClip,
            CigarOp::HardClip => CigarKind::HardClip,
            CigarOp::Pad => CigarKind::Pad,
            CigarOp::Equal => CigarKind::SequenceMatch,
            CigarOp::Diff => CigarKind::SequenceMismatch,
        }
    }
}

impl From<CigarKind> for CigarOp {
    fn from(kind: CigarKind) -> Self {
        match kind {
            CigarKind::Match => CigarOp::Match,
            CigarKind::Insertion => CigarOp::Ins,
            CigarKind::Deletion => CigarOp::Del,
            CigarKind::Skip => CigarOp::RefSkip,
            CigarKind::SoftClip => CigarOp::SoftClip,
            CigarKind::HardClip => CigarOp::HardClip,
            CigarKind::Pad => CigarOp::Pad,
            CigarKind::SequenceMatch => CigarOp::Equal,
            CigarKind::SequenceMismatch => CigarOp::Diff,
        }
    }
}

/// An alignment's operator runs, in read order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar {
    ops: Vec<(u32, CigarOp)>,
}

impl Cigar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operation(&mut self, len: u32, op: CigarOp) {
        if len == 0 {
            return;
        }
        if let Some((prev_len, prev_op)) = self.ops.last_mut()
            && *prev_op == op
        {
            *prev_len += len;
            return;
        }
        self.ops.push((len, op));
    }

    pub fn ops(&self) -> &[(u32, CigarOp)] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of reference bases spanned, deletions and skips included.
    pub fn reference_len(&self) -> u64 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_reference())
            .map(|(len, _)| u64::from(*len))
            .sum()
    }

    /// Number of bases the read sequence must hold.
    pub fn read_len(&self) -> u64 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_read())
            .map(|(len, _)| u64::from(*len))
            .sum()
    }

    /// Starts a fresh per-base walk over this CIGAR.
    pub fn walk(&self) -> CigarWalker<'_> {
        CigarWalker::new(&self.ops)
    }
}

impl FromIterator<(u32, CigarOp)> for Cigar {
    fn from_iter<T: IntoIterator<Item = (u32, CigarOp)>>(iter: T) -> Self {
        let mut cigar = Cigar::new();
        for (len, op) in iter {
            cigar.add_operation(len, op);
        }
        cigar
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("*");
        }
        for (len, op) in &self.ops {
            write!(f, "{len}{}", op.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Cigar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidCigar {
            cigar: s.to_string(),
            reason: reason.to_string(),
        };

        if s == "*" {
            return Ok(Cigar::new());
        }

        let mut cigar = Cigar::new();
        let mut len: Option<u32> = None;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                let next = len
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d))
                    .ok_or_else(|| invalid("operation length overflows u32"))?;
                len = Some(next);
                continue;
            }
            let op = CigarOp::from_char(c).ok_or_else(|| invalid("unknown operator"))?;
            let n = len.take().ok_or_else(|| invalid("operator without a length"))?;
            cigar.add_operation(n, op);
        }
        if len.is_some() {
            return Err(invalid("trailing length without an operator"));
        }
        Ok(cigar)
    }
}

/// Lazy per-base expansion of operator runs: each `(len, op)` yields `op`
/// `len` times. Single pass; build a new walker to start over.
#[derive(Debug, Clone)]
pub struct CigarWalker<'a> {
    runs: &'a [(u32, CigarOp)],
    front: usize,
    front_used: u32,
    // Exclusive index of the run the back cursor is in.
    back: usize,
    back_used: u32,
    remaining: usize,
}

impl<'a> CigarWalker<'a> {
    pub fn new(runs: &'a [(u32, CigarOp)]) -> Self {
        let remaining = runs.iter().map(|(len, _)| *len as usize).sum();
        Self { runs, front: 0, front_used: 0, back: runs.len(), back_used: 0, remaining }
    }
}

impl Iterator for CigarWalker<'_> {
    type Item = CigarOp;

    fn next(&mut self) -> Option<CigarOp> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let (len, op) = self.runs[self.front];
            if self.front_used < len {
                self.front_used += 1;
                self.remaining -= 1;
                return Some(op);
            }
            self.front += 1;
            self.front_used = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for CigarWalker<'_> {
    fn next_back(&mut self) -> Option<CigarOp> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let (len, op) = self.runs[self.back - 1];
            if self.back_used < len {
                self.back_used += 1;
                self.remaining -= 1;
                return Some(op);
            }
            self.back -= 1;
            self.back_used = 0;
        }
    }
}

impl ExactSizeIterator for CigarWalker<'_> {}

impl FusedIterator for CigarWalker<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cigar(s: &str) -> Cigar {
        s.parse().unwrap()
    }

    #[test]
    fn test_consumption_table() {
        use CigarOp::*;
        let expected = [
            (Match, true, true),
            (Ins, true, false),
            (Del, false, true),
            (RefSkip, false, true),
            (SoftClip, true, false),
            (HardClip, false, false),
            (Pad, false, false),
            (Equal, true, true),
            (Diff, true, true),
        ];
        for (op, read, reference) in expected {
            assert_eq!(op.consumes_read(), read, "{op:?} read");
            assert_eq!(op.consumes_reference(), reference, "{op:?} reference");
        }
    }

    #[test]
    fn test_kind_conversion_is_lossless() {
        for op in CigarOp::ALL {
            assert_eq!(CigarOp::from(op.kind()), op);
            assert_eq!(CigarOp::from_char(op.as_char()), Some(op));
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(cigar("5S10M2I3D4N6M1H").to_string(), "5S10M2I3D4N6M1H");
        assert_eq!(cigar("*").to_string(), "*");
        assert!(cigar("*").is_empty());
        assert_eq!(cigar("5M5M").ops(), &[(10, CigarOp::Match)]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("M".parse::<Cigar>().is_err());
        assert!("10".parse::<Cigar>().is_err());
        assert!("10Q".parse::<Cigar>().is_err());
        assert!("99999999999M".parse::<Cigar>().is_err());
    }

    #[test]
    fn test_lengths() {
        let c = cigar("5S10M2I3D4N6M1H");
        assert_eq!(c.reference_len(), 10 + 3 + 4 + 6);
        assert_eq!(c.read_len(), 5 + 10 + 2 + 6);
    }

    #[test]
    fn test_walk_expands_runs() {
        let c = cigar("2M1I1D");
        let ops: Vec<CigarOp> = c.walk().collect();
        assert_eq!(ops, vec![CigarOp::Match, CigarOp::Match, CigarOp::Ins, CigarOp::Del]);
        assert_eq!(c.walk().len(), 4);
    }

    #[test]
    fn test_walk_reverse() {
        let c = cigar("2S3M");
        let ops: Vec<CigarOp> = c.walk().rev().collect();
        assert_eq!(
            ops,
            vec![CigarOp::Match, CigarOp::Match, CigarOp::Match, CigarOp::SoftClip, CigarOp::SoftClip]
        );
    }

    #[test]
    fn test_walk_meets_in_the_middle() {
        let c = cigar("3M");
        let mut walker = c.walk();
        assert_eq!(walker.next(), Some(CigarOp::Match));
        assert_eq!(walker.next_back(), Some(CigarOp::Match));
        assert_eq!(walker.next(), Some(CigarOp::Match));
        assert_eq!(walker.next_back(), None);
        assert_eq!(walker.next(), None);
    }

    #[test]
    fn test_walk_skips_zero_length_runs() {
        let runs = [(0, CigarOp::SoftClip), (2, CigarOp::Match), (0, CigarOp::Del)];
        assert_eq!(CigarWalker::new(&runs).count(), 2);
        assert_eq!(CigarWalker::new(&runs).rev().count(), 2);
    }
}
