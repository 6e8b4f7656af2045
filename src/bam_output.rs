use crate::error::Result;
use crate::reconciler::ReadPair;
use noodles::{bam, bgzf, sam};
use sam::alignment::io::Write as _;
use sam::alignment::record::Flags;
use sam::alignment::RecordBuf;
use sam::header::record::value::map::header::sort_order::UNSORTED;
use sam::header::record::value::map::header::tag as header_tag;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Sink that appends both mates of each pair, first then second, with mate
/// fields filled in from each other.
pub struct PairWriter<W: Write> {
    header: sam::Header,
    writer: bam::io::Writer<bgzf::io::Writer<W>>,
}

/// Opens a BAM sink at `path`. The input header is copied with `@HD SO`
/// set to `unsorted`, since pairs leave in emission order.
pub fn create_pair_writer(path: &Path, header: &sam::Header) -> Result<PairWriter<File>> {
    let header = unsorted_header(header);
    let mut writer = bam::io::writer::Builder.build_from_path(path)?;
    writer.write_header(&header)?;
    Ok(PairWriter { header, writer })
}

fn unsorted_header(header: &sam::Header) -> sam::Header {
    let mut header = header.clone();
    header
        .header_mut()
        .get_or_insert_with(Default::default)
        .other_fields_mut()
        .insert(header_tag::SORT_ORDER, UNSORTED.into());
    header
}

impl<W: Write> PairWriter<W> {
    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// Flushes the last block and writes the BGZF end-of-file marker.
    pub fn finish(mut self) -> Result<()> {
        self.writer.try_finish()?;
        Ok(())
    }

    pub fn write_pair(&mut self, pair: &ReadPair) -> Result<()> {
        let mut first = pair.first().record.to_record_buf(&self.header)?;
        let mut second = pair.second().record.to_record_buf(&self.header)?;
        link_mates(&mut first, &mut second);
        link_mates(&mut second, &mut first);

        let tlen = template_length(&first, &second);
        *first.template_length_mut() = tlen;
        *second.template_length_mut() = -tlen;

        self.writer.write_alignment_record(&self.header, &first)?;
        self.writer.write_alignment_record(&self.header, &second)?;
        Ok(())
    }
}

fn link_mates(record: &mut RecordBuf, mate: &RecordBuf) {
    *record.mate_reference_sequence_id_mut() = mate.reference_sequence_id();
    *record.mate_alignment_start_mut() = mate.alignment_start();

    let mut flags = record.flags();
    flags.insert(Flags::SEGMENTED);
    flags.remove(Flags::MATE_UNMAPPED);
    flags.set(Flags::MATE_REVERSE_COMPLEMENTED, mate.flags().is_reverse_complemented());
    *record.flags_mut() = flags;
}

/// Signed fragment extent as seen from `record`: positive when `record` is
/// the leftmost mate. Zero when the mates sit on different references or
/// the extent does not fit in an `i32`.
fn template_length(record: &RecordBuf, mate: &RecordBuf) -> i32 {
    if record.reference_sequence_id() != mate.reference_sequence_id() {
        return 0;
    }
    let (Some(start), Some(end), Some(mate_start), Some(mate_end)) = (
        record.alignment_start().map(usize::from),
        record.alignment_end().map(usize::from),
        mate.alignment_start().map(usize::from),
        mate.alignment_end().map(usize::from),
    ) else {
        return 0;
    };
    let Ok(extent) = i32::try_from(end.max(mate_end) + 1 - start.min(mate_start)) else {
        return 0;
    };
    if start <= mate_start { extent } else { -extent }
}


#[cfg(test)]
mod tests {
    use super::*;
    use noodles::core::Position;
    use sam::alignment::record::cigar::op::{Kind, Op};
    use sam::alignment::record_buf::Cigar;
    use sam::header::record::value::map::header::sort_order::COORDINATE;
    use sam::header::record::value::map::ReferenceSequence;
    use sam::header::record::value::Map;
    use std::num::NonZeroUsize;

    fn aligned(reference_id: usize, start: usize, len: usize) -> RecordBuf {
        RecordBuf::builder()
            .set_reference_sequence_id(reference_id)
            .set_alignment_start(Position::try_from(start).unwrap())
            .set_cigar(Cigar::from(vec![Op::new(Kind::Match, len)]))
            .build()
    }

    #[test]
    fn test_template_length_sign_follows_leftmost_mate() {
        let left = aligned(0, 101, 40);
        let right = aligned(0, 301, 40);
        assert_eq!(template_length(&left, &right), 240);
        assert_eq!(template_length(&right, &left), -240);
    }

    #[test]
    fn test_template_length_zero_across_references() {
        assert_eq!(template_length(&aligned(0, 101, 40), &aligned(1, 301, 40)), 0);
    }

    #[test]
    fn test_template_length_zero_when_extent_overflows() {
        let left = aligned(0, 1, 10);
        let right = aligned(0, 3_000_000_000, 10);
        assert_eq!(template_length(&left, &right), 0);
        assert_eq!(template_length(&right, &left), 0);
    }

    #[test]
    fn test_unsorted_header_overrides_sort_order() {
        let mut header = sam::Header::builder()
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(1_000).unwrap()),
            )
            .build();
        header
            .header_mut()
            .get_or_insert_with(Default::default)
            .other_fields_mut()
            .insert(header_tag::SORT_ORDER, COORDINATE.into());

        let out = unsorted_header(&header);
        let so = out.header().and_then(|hd| hd.other_fields().get(b"SO"));
        assert_eq!(so.map(|v| <_ as AsRef<[u8]>>::as_ref(v)), Some(UNSORTED));
        assert_eq!(out.reference_sequences().len(), 1);
    }

    #[test]
    fn test_unsorted_header_adds_missing_hd_line() {
        let out = unsorted_header(&sam::Header::default());
        assert!(out.header().is_some());
    }
}
