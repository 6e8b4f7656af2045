use crate::error::Result;
use crate::record::RawRecord;
use noodles::core::Region;
use noodles::{bam, sam};
use sam::alignment::RecordBuf;
use std::path::Path;

/// Decodes one BAM record into the owned form the reconciler consumes.
pub fn convert(header: &sam::Header, record: &bam::Record) -> Result<RawRecord> {
    let buf = RecordBuf::try_from_alignment_record(header, record)?;
    RawRecord::from_record_buf(header, &buf)
}

/// Opens `path` and hands its header and a record stream to `f`.
///
/// With a `region`, only records overlapping it are streamed, which needs a
/// `.bai` index next to the BAM. The reader is closed when `f` returns,
/// whether or not the stream was drained.
pub fn read_bam<T, F>(path: &Path, region: Option<&Region>, f: F) -> Result<T>
where
    F: FnOnce(&sam::Header, &mut dyn Iterator<Item = Result<RawRecord>>) -> T,
{
    match region {
        None => {
            let mut reader = bam::io::reader::Builder.build_from_path(path)?;
            let header = reader.read_header()?;
            let mut record = bam::Record::default();
            let mut records = std::iter::from_fn(|| match reader.read_record(&mut record) {
                Ok(0) => None,
                Ok(_) => Some(convert(&header, &record)),
                Err(e) => Some(Err(e.into())),
            });
            Ok(f(&header, &mut records))
        }
        Some(region) => {
            let mut reader = bam::io::indexed_reader::Builder::default().build_from_path(path)?;
            let header = reader.read_header()?;
            let query = reader.query(&header, region)?;
            let mut records = query.map(|result| convert(&header, &result?));
            Ok(f(&header, &mut records))
        }
    }
}
