//! Relative orientation of two mates.
//!
//! Tags name the reads in reference order, upstream first: `F1R2` is read 1
//! on the forward strand upstream of read 2 on the reverse strand. "Upstream"
//! compares the reference coordinates of each read's 5' end; on a tie read 1
//! is taken as upstream.

use crate::alignment::SingleAlignment;
use crate::annotation::Strand;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairOrientation {
    F1F2,
    F1R2,
    R1F2,
    R1R2,
    F2F1,
    F2R1,
    R2F1,
    R2R1,
    Invalid,
}

use PairOrientation::*;

// Rows: (read1 strand, read2 strand) as FF, FR, RF, RR.
// Columns: read 1 upstream, read 2 upstream.
const TABLE: [[PairOrientation; 2]; 4] = [
    [F1F2, F2F1],
    [F1R2, R2F1],
    [R1F2, F2R1],
    [R1R2, R2R1],
];

impl PairOrientation {
    pub const ALL: [PairOrientation; 9] = [F1F2, F1R2, R1F2, R1R2, F2F1, F2R1, R2F1, R2R1, Invalid];

    /// Mates facing each other: the forward read upstream of the reverse read.
    pub const fn is_concordant(self) -> bool {
        matches!(self, F1R2 | F2R1)
    }

    /// Strand of the sequenced fragment, taken from read 1.
    ///
    /// Mates on the same strand contradict each other and give `Invalid`.
    pub const fn fragment_strand(self) -> Strand {
        match self {
            F1R2 | R2F1 => Strand::Forward,
            R1F2 | F2R1 => Strand::Reverse,
            F1F2 | F2F1 | R1R2 | R2R1 | Invalid => Strand::Invalid,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            F1F2 => "F1F2",
            F1R2 => "F1R2",
            R1F2 => "R1F2",
            R1R2 => "R1R2",
            F2F1 => "F2F1",
            F2R1 => "F2R1",
            R2F1 => "R2F1",
            R2R1 => "R2R1",
            Invalid => "INVALID",
        }
    }
}

impl fmt::Display for PairOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table lookup from each read's strand and 5' reference coordinate.
pub fn classify_ends(
    strand1: Strand,
    five_prime1: Option<u64>,
    strand2: Strand,
    five_prime2: Option<u64>,
) -> PairOrientation {
    let row = match (strand1, strand2) {
        (Strand::Forward, Strand::Forward) => 0,
        (Strand::Forward, Strand::Reverse) => 1,
        (Strand::Reverse, Strand::Forward) => 2,
        (Strand::Reverse, Strand::Reverse) => 3,
        _ => return Invalid,
    };
    let (Some(pos1), Some(pos2)) = (five_prime1, five_prime2) else {
        return Invalid;
    };
    let column = usize::from(pos2 < pos1);
    TABLE[row][column]
}

/// Classifies `read1` and `read2` as given; role flags are not consulted.
pub fn classify(read1: &SingleAlignment, read2: &SingleAlignment) -> PairOrientation {
    if read1.reference() != read2.reference() {
        return Invalid;
    }
    classify_ends(
        read1.strand(),
        read1.five_prime_position(),
        read2.strand(),
        read2.five_prime_position(),
    )
}
