//! Blocked genomic footprints of alignments.
//!
//! Coordinates are 0-based, half-open `[start, end)`. A spliced alignment
//! (CIGAR `N`) yields one block per exon; deletions stay inside their block.

use crate::cigar::{Cigar, CigarOp};
use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
    Invalid,
}

impl Strand {
    pub const fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Invalid => '.',
        }
    }

    pub const fn is_valid(self) -> bool {
        !matches!(self, Strand::Invalid)
    }

    pub const fn from_reverse_flag(is_reverse: bool) -> Self {
        if is_reverse { Strand::Reverse } else { Strand::Forward }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A contiguous reference interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicBlock {
    reference: String,
    start: u64,
    end: u64,
    strand: Strand,
}

impl GenomicBlock {
    pub fn new(reference: impl Into<String>, start: u64, end: u64, strand: Strand) -> Result<Self> {
        let reference = reference.into();
        if start >= end {
            return Err(Error::EmptyBlock { reference, start, end });
        }
        Ok(Self { reference, start, end, strand })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn overlaps(&self, other: &GenomicBlock) -> bool {
        self.reference == other.reference && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for GenomicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}({})", self.reference, self.start, self.end, self.strand)
    }
}

/// Ordered, non-overlapping blocks sharing one reference and strand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedFootprint {
    blocks: Vec<GenomicBlock>,
}

impl BlockedFootprint {
    pub fn new(blocks: Vec<GenomicBlock>) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidFootprint { reason };

        let Some(first) = blocks.first() else {
            return Err(invalid("no blocks".to_string()));
        };
        for pair in blocks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.reference != first.reference || next.strand != first.strand {
                return Err(invalid(format!("block {next} disagrees with {first}")));
            }
            if next.start < prev.end {
                return Err(invalid(format!("block {next} overlaps or precedes {prev}")));
            }
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[GenomicBlock] {
        &self.blocks
    }

    pub fn reference(&self) -> &str {
        &self.blocks[0].reference
    }

    pub fn strand(&self) -> Strand {
        self.blocks[0].strand
    }

    /// Start of the overall extent.
    pub fn start(&self) -> u64 {
        self.blocks[0].start
    }

    /// End (exclusive) of the overall extent.
    pub fn end(&self) -> u64 {
        self.blocks[self.blocks.len() - 1].end
    }

    /// True if `pos` falls inside one of the blocks, not in a gap between them.
    pub fn contains(&self, pos: u64) -> bool {
        self.blocks.iter().any(|b| b.contains(pos))
    }

    /// True if `pos` falls anywhere within the overall extent.
    pub fn spans(&self, pos: u64) -> bool {
        self.start() <= pos && pos < self.end()
    }

    /// Extent overlap, closed at both ends: abutting extents count as overlapping.
    pub fn overlaps_extent(&self, other: &BlockedFootprint) -> bool {
        self.start() <= other.end() && other.start() <= self.end()
    }

    /// Merges two footprints on the same reference, coalescing blocks that
    /// overlap or abut. The result carries `strand`.
    pub fn union(&self, other: &BlockedFootprint, strand: Strand) -> Result<Self> {
        if self.reference() != other.reference() {
            return Err(Error::InvalidFootprint {
                reason: format!(
                    "cannot merge footprints on '{}' and '{}'",
                    self.reference(),
                    other.reference()
                ),
            });
        }

        Ok(self.merged(other, strand))
    }

    /// `union` without the reference check, for callers that already hold it.
    pub(crate) fn merged(&self, other: &BlockedFootprint, strand: Strand) -> Self {
        let mut spans: Vec<(u64, u64)> = self
            .blocks
            .iter()
            .chain(other.blocks.iter())
            .map(|b| (b.start, b.end))
            .collect();
        spans.sort_unstable();

        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            if let Some(last) = merged.last_mut()
                && start <= last.1
            {
                last.1 = last.1.max(end);
                continue;
            }
            merged.push((start, end));
        }

        // Spans come from valid blocks, so each keeps start < end.
        let reference = self.reference().to_string();
        let blocks = merged
            .into_iter()
            .map(|(start, end)| GenomicBlock { reference: reference.clone(), start, end, strand })
            .collect();
        Self { blocks }
    }
}

/// Builds a `BlockedFootprint` from a CIGAR anchored at a 0-based start.
#[derive(Debug, Clone)]
pub struct AnnotationBuilder<'a> {
    reference: &'a str,
    start: u64,
    strand: Strand,
    declared_end: Option<u64>,
}

impl<'a> AnnotationBuilder<'a> {
    pub fn new(reference: &'a str, start: u64, strand: Strand) -> Self {
        Self { reference, start, strand, declared_end: None }
    }

    /// Exclusive end the source record claims; `build` fails if the walk disagrees.
    pub fn declared_end(mut self, end: u64) -> Self {
        self.declared_end = Some(end);
        self
    }

    pub fn build(&self, cigar: &Cigar) -> Result<BlockedFootprint> {
        let mut cursor = self.start;
        let mut open: Option<u64> = None;
        let mut spans: Vec<(u64, u64)> = Vec::new();

        for op in cigar.walk() {
            match op {
                CigarOp::RefSkip => {
                    if let Some(block_start) = open.take() {
                        spans.push((block_start, cursor));
                    }
                    cursor += 1;
                }
                op if op.consumes_reference() => {
                    open.get_or_insert(cursor);
                    cursor += 1;
                }
                _ => {}
            }
        }
        if let Some(block_start) = open {
            spans.push((block_start, cursor));
        }

        if spans.is_empty() {
            return Err(Error::EmptyFootprint { cigar: cigar.to_string() });
        }

        let blocks = spans
            .into_iter()
            .map(|(start, end)| GenomicBlock::new(self.reference, start, end, self.strand))
            .collect::<Result<Vec<_>>>()?;
        let footprint = BlockedFootprint::new(blocks)?;

        let expected = self.start + cigar.reference_len();
        if footprint.end() != expected {
            return Err(Error::InconsistentFootprint {
                cigar: cigar.to_string(),
                expected,
                observed: footprint.end(),
            });
        }
        if let Some(declared) = self.declared_end
            && declared != footprint.end()
        {
            return Err(Error::InconsistentFootprint {
                cigar: cigar.to_string(),
                expected: declared,
                observed: footprint.end(),
            });
        }

        Ok(footprint)
    }
}
