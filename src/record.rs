//! Owned raw alignment records at the boundary with the BAM decoder.

use crate::cigar::{Cigar, CigarOp};
use crate::error::{Error, Result};
use noodles::core::Position;
use noodles::sam;
use sam::alignment::record::cigar::Op as SamCigarOp;
use sam::alignment::record::data::field::Tag;
use sam::alignment::record::{Flags, MappingQuality};
use sam::alignment::record_buf::data::field::Value;
use sam::alignment::record_buf::{Cigar as SamCigar, Data as SamData, QualityScores, Sequence};
use sam::alignment::RecordBuf;

pub const DEFAULT_BASE_QUALITY: u8 = 30;
pub const DEFAULT_MAPQ: u8 = 60;

/// A decoded alignment record as produced by the record source.
///
/// `start` is 0-based; `declared_end` is the exclusive end the source
/// computed for the record, when it reported one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub reference: Option<String>,
    pub start: Option<u64>,
    pub declared_end: Option<u64>,
    pub cigar: Cigar,
    pub flags: Flags,
    pub mapping_quality: Option<u8>,
    pub bases: Vec<u8>,
    pub qualities: Vec<u8>,
    pub mismatch_tag: Option<String>,
}

impl RawRecord {
    pub fn builder() -> RawRecordBuilder {
        RawRecordBuilder::default()
    }

    pub fn is_mapped(&self) -> bool {
        !self.flags.is_unmapped()
    }

    pub fn from_record_buf(header: &sam::Header, record: &RecordBuf) -> Result<Self> {
        let name = record.name().map(|n| n.to_string()).unwrap_or_default();

        let reference = record
            .reference_sequence_id()
            .and_then(|id| header.reference_sequences().get_index(id))
            .map(|(reference_name, _)| reference_name.to_string());

        let mut cigar = Cigar::new();
        for op in record.cigar().as_ref() {
            let len = u32::try_from(op.len()).map_err(|_| Error::InvalidCigar {
                cigar: format!("{}{}", op.len(), CigarOp::from(op.kind()).as_char()),
                reason: "operation length overflows u32".to_string(),
            })?;
            cigar.add_operation(len, CigarOp::from(op.kind()));
        }

        let mismatch_tag = match record.data().get(&Tag::MISMATCHED_POSITIONS) {
            Some(Value::String(s)) => Some(s.to_string()),
            _ => None,
        };

        Ok(Self {
            name,
            reference,
            start: record.alignment_start().map(|p| (usize::from(p) - 1) as u64),
            declared_end: record.alignment_end().map(|p| usize::from(p) as u64),
            cigar,
            flags: record.flags(),
            mapping_quality: record.mapping_quality().map(|mq| mq.get()),
            bases: record.sequence().as_ref().to_vec(),
            qualities: record.quality_scores().as_ref().to_vec(),
            mismatch_tag,
        })
    }

    pub fn to_record_buf(&self, header: &sam::Header) -> Result<RecordBuf> {
        let mut out = RecordBuf::default();

        *out.name_mut() = Some(self.name.as_bytes().to_vec().into());
        *out.flags_mut() = self.flags;

        if let Some(reference) = &self.reference {
            let id = header
                .reference_sequences()
                .get_index_of(reference.as_bytes())
                .ok_or_else(|| Error::MissingField {
                    name: self.name.clone(),
                    field: "reference sequence in output header",
                })?;
            *out.reference_sequence_id_mut() = Some(id);
        }
        if let Some(start) = self.start {
            *out.alignment_start_mut() = Position::new(start as usize + 1);
        }
        *out.mapping_quality_mut() = self.mapping_quality.and_then(MappingQuality::new);

        *out.cigar_mut() = self
            .cigar
            .ops()
            .iter()
            .map(|(len, op)| SamCigarOp::new(op.kind(), *len as usize))
            .collect::<SamCigar>();
        *out.sequence_mut() = Sequence::from(self.bases.clone());
        *out.quality_scores_mut() = QualityScores::from(self.qualities.clone());

        let mut data = SamData::default();
        if let Some(md) = &self.mismatch_tag {
            data.insert(Tag::MISMATCHED_POSITIONS, Value::String(md.as_bytes().to_vec().into()));
        }
        *out.data_mut() = data;

        Ok(out)
    }
}

/// Fluent construction of `RawRecord`s for library callers and tests.
///
/// Bases default to a repeating `ACGT` pattern sized to the CIGAR and
/// qualities default to [`DEFAULT_BASE_QUALITY`].
#[derive(Debug, Clone)]
pub struct RawRecordBuilder {
    name: String,
    reference: Option<String>,
    start: Option<u64>,
    declared_end: Option<u64>,
    cigar: String,
    flags: Flags,
    mapping_quality: Option<u8>,
    bases: Option<Vec<u8>>,
    qualities: Option<Vec<u8>>,
    mismatch_tag: Option<String>,
}

impl Default for RawRecordBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            reference: None,
            start: None,
            declared_end: None,
            cigar: "*".to_string(),
            flags: Flags::empty(),
            mapping_quality: Some(DEFAULT_MAPQ),
            bases: None,
            qualities: None,
            mismatch_tag: None,
        }
    }
}

impl RawRecordBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    /// 0-based alignment start.
    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn declared_end(mut self, end: u64) -> Self {
        self.declared_end = Some(end);
        self
    }

    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = cigar.to_string();
        self
    }

    pub fn bases(mut self, bases: &str) -> Self {
        self.bases = Some(bases.as_bytes().to_vec());
        self
    }

    pub fn qualities(mut self, qualities: &[u8]) -> Self {
        self.qualities = Some(qualities.to_vec());
        self
    }

    pub fn mapping_quality(mut self, mapq: Option<u8>) -> Self {
        self.mapping_quality = mapq;
        self
    }

    pub fn mismatch_tag(mut self, md: &str) -> Self {
        self.mismatch_tag = Some(md.to_string());
        self
    }

    pub fn reverse(self, is_reverse: bool) -> Self {
        self.flag(Flags::REVERSE_COMPLEMENTED, is_reverse)
    }

    pub fn first_in_pair(self) -> Self {
        self.flag(Flags::SEGMENTED | Flags::FIRST_SEGMENT, true)
    }

    pub fn second_in_pair(self) -> Self {
        self.flag(Flags::SEGMENTED | Flags::LAST_SEGMENT, true)
    }

    pub fn unmapped(self) -> Self {
        self.flag(Flags::UNMAPPED, true)
    }

    pub fn flag(mut self, flag: Flags, value: bool) -> Self {
        self.flags.set(flag, value);
        self
    }

    pub fn build(self) -> Result<RawRecord> {
        let cigar: Cigar = self.cigar.parse()?;
        let read_len = cigar.read_len() as usize;
        let bases = self
            .bases
            .unwrap_or_else(|| b"ACGT".iter().copied().cycle().take(read_len).collect());
        let qualities = self.qualities.unwrap_or_else(|| vec![DEFAULT_BASE_QUALITY; bases.len()]);

        Ok(RawRecord {
            name: self.name,
            reference: self.reference,
            start: self.start,
            declared_end: self.declared_end,
            cigar,
            flags: self.flags,
            mapping_quality: self.mapping_quality,
            bases,
            qualities,
            mismatch_tag: self.mismatch_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam::header::record::value::Map;
    use noodles::sam::header::record::value::map::ReferenceSequence;
    use std::num::NonZeroUsize;

    fn header() -> sam::Header {
        sam::Header::builder()
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(10_000).unwrap()),
            )
            .add_reference_sequence(
                "chr2",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(10_000).unwrap()),
            )
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let record = RawRecord::builder().name("q1").reference("chr1").start(5).cigar("2S4M").build().unwrap();
        assert_eq!(record.bases, b"ACGTAC");
        assert_eq!(record.qualities, vec![DEFAULT_BASE_QUALITY; 6]);
        assert_eq!(record.mapping_quality, Some(DEFAULT_MAPQ));
        assert!(record.is_mapped());
        assert!(!record.flags.is_segmented());
    }

    #[test]
    fn test_builder_flags() {
        let record = RawRecord::builder().first_in_pair().reverse(true).build().unwrap();
        assert!(record.flags.is_segmented());
        assert!(record.flags.is_first_segment());
        assert!(record.flags.is_reverse_complemented());
        assert!(!RawRecord::builder().unmapped().build().unwrap().is_mapped());
    }

    #[test]
    fn test_builder_rejects_bad_cigar() {
        assert!(RawRecord::builder().cigar("12").build().is_err());
    }

    #[test]
    fn test_record_buf_conversion_preserves_fields() {
        let header = header();
        let record = RawRecord::builder()
            .name("q1")
            .reference("chr2")
            .start(99)
            .cigar("3S5M2N5M")
            .bases("NNNACGTACGTAC")
            .mismatch_tag("10")
            .second_in_pair()
            .build()
            .unwrap();

        let buf = record.to_record_buf(&header).unwrap();
        assert_eq!(buf.reference_sequence_id(), Some(1));
        assert_eq!(buf.alignment_start().map(usize::from), Some(100));

        let back = RawRecord::from_record_buf(&header, &buf).unwrap();
        assert_eq!(back.name, "q1");
        assert_eq!(back.reference.as_deref(), Some("chr2"));
        assert_eq!(back.start, Some(99));
        assert_eq!(back.declared_end, Some(99 + 12));
        assert_eq!(back.cigar, record.cigar);
        assert_eq!(back.bases, record.bases);
        assert_eq!(back.mismatch_tag.as_deref(), Some("10"));
        assert!(back.flags.is_last_segment());
    }

    #[test]
    fn test_record_buf_unknown_reference_is_rejected() {
        let record = RawRecord::builder().name("q1").reference("chrUn").start(0).cigar("4M").build().unwrap();
        assert!(matches!(record.to_record_buf(&header()), Err(Error::MissingField { .. })));
    }
}
