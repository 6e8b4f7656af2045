//! Single mapped alignments and per-position base lookup.

use crate::annotation::{AnnotationBuilder, BlockedFootprint, Strand};
use crate::cigar::Cigar;
use crate::error::{Error, Result};
use crate::record::RawRecord;
use noodles::sam::alignment::record::Flags;

/// Outcome of asking which read base sits at a reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseCall {
    Base(u8),
    /// Outside the footprint, or on a deletion or skip.
    Invalid,
    /// Both mates cover the position with different bases.
    Conflicting,
}

impl BaseCall {
    /// Reconciles the calls of two mates at the same position. Commutative.
    pub fn resolve(a: BaseCall, b: BaseCall) -> BaseCall {
        match (a, b) {
            (BaseCall::Invalid, other) | (other, BaseCall::Invalid) => other,
            (a, b) if a == b => a,
            _ => BaseCall::Conflicting,
        }
    }

    pub fn base(self) -> Option<u8> {
        match self {
            BaseCall::Base(b) => Some(b),
            _ => None,
        }
    }
}

/// An immutable view of one mapped read: footprint, sequence and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleAlignment {
    name: String,
    footprint: BlockedFootprint,
    alignment_start: u64,
    cigar: Cigar,
    bases: Vec<u8>,
    qualities: Vec<u8>,
    flags: Flags,
    mapping_quality: Option<u8>,
    mismatch_tag: Option<String>,
}

impl SingleAlignment {
    pub fn from_raw(record: &RawRecord) -> Result<Self> {
        if !record.is_mapped() {
            return Err(Error::UnmappedRecord { name: record.name.clone() });
        }
        let missing = |field| Error::MissingField { name: record.name.clone(), field };
        let reference = record.reference.as_deref().ok_or_else(|| missing("reference name"))?;
        let start = record.start.ok_or_else(|| missing("alignment start"))?;

        let strand = Strand::from_reverse_flag(record.flags.is_reverse_complemented());
        let mut builder = AnnotationBuilder::new(reference, start, strand);
        if let Some(end) = record.declared_end {
            builder = builder.declared_end(end);
        }
        let footprint = builder.build(&record.cigar)?;

        Ok(Self {
            name: record.name.clone(),
            footprint,
            alignment_start: start,
            cigar: record.cigar.clone(),
            bases: record.bases.clone(),
            qualities: record.qualities.clone(),
            flags: record.flags,
            mapping_quality: record.mapping_quality,
            mismatch_tag: record.mismatch_tag.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &str {
        self.footprint.reference()
    }

    pub fn footprint(&self) -> &BlockedFootprint {
        &self.footprint
    }

    pub fn start(&self) -> u64 {
        self.footprint.start()
    }

    pub fn end(&self) -> u64 {
        self.footprint.end()
    }

    pub fn strand(&self) -> Strand {
        self.footprint.strand()
    }

    pub fn cigar(&self) -> &Cigar {
        &self.cigar
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    pub fn qualities(&self) -> &[u8] {
        &self.qualities
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// `None` when the source reported mapping quality as unavailable.
    pub fn mapping_quality(&self) -> Option<u8> {
        self.mapping_quality
    }

    /// The `MD` tag, if present.
    pub fn mismatch_tag(&self) -> Option<&str> {
        self.mismatch_tag.as_deref()
    }

    pub fn is_paired(&self) -> bool {
        self.flags.is_segmented()
    }

    pub fn is_proper_pair(&self) -> bool {
        self.flags.is_properly_segmented()
    }

    pub fn is_reverse(&self) -> bool {
        self.flags.is_reverse_complemented()
    }

    pub fn is_first_in_pair(&self) -> bool {
        self.flags.is_first_segment()
    }

    pub fn is_second_in_pair(&self) -> bool {
        self.flags.is_last_segment()
    }

    pub fn is_primary(&self) -> bool {
        !self.flags.is_secondary() && !self.flags.is_supplementary()
    }

    pub fn is_duplicate(&self) -> bool {
        self.flags.is_duplicate()
    }

    pub fn is_supplementary(&self) -> bool {
        self.flags.is_supplementary()
    }

    pub fn passes_qc(&self) -> bool {
        !self.flags.is_qc_fail()
    }

    /// Reference coordinate of the 5'-most aligned read base.
    ///
    /// Forward reads walk the CIGAR from the alignment start; reverse reads
    /// walk it backwards from the alignment end. Clipped bases have no
    /// reference coordinate and are passed over.
    pub fn five_prime_position(&self) -> Option<u64> {
        match self.strand() {
            Strand::Forward => {
                let mut cursor = self.alignment_start;
                for op in self.cigar.walk() {
                    if op.is_aligned() {
                        return Some(cursor);
                    }
                    if op.consumes_reference() {
                        cursor += 1;
                    }
                }
                None
            }
            Strand::Reverse => {
                let mut cursor = self.alignment_start + self.cigar.reference_len();
                for op in self.cigar.walk().rev() {
                    if op.consumes_reference() {
                        cursor -= 1;
                    }
                    if op.is_aligned() {
                        return Some(cursor);
                    }
                }
                None
            }
            Strand::Invalid => None,
        }
    }

    /// The read base aligned to reference position `pos` (0-based).
    ///
    /// Linear in the expanded CIGAR length per call.
    pub fn base_at_reference_position(&self, pos: u64) -> BaseCall {
        if !self.footprint.spans(pos) {
            return BaseCall::Invalid;
        }

        let mut ref_idx = self.alignment_start;
        let mut read_idx: usize = 0;
        for op in self.cigar.walk() {
            if op.consumes_reference() && ref_idx == pos {
                if !op.consumes_read() {
                    return BaseCall::Invalid;
                }
                return self.bases.get(read_idx).map_or(BaseCall::Invalid, |b| BaseCall::Base(*b));
            }
            if op.consumes_reference() {
                ref_idx += 1;
            }
            if op.consumes_read() {
                read_idx += 1;
            }
        }
        BaseCall::Invalid
    }
}

impl TryFrom<&RawRecord> for SingleAlignment {
    type Error = Error;

    fn try_from(record: &RawRecord) -> Result<Self> {
        Self::from_raw(record)
    }
}
