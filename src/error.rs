//! Error types for alignment reconstruction and mate reconciliation.

use thiserror::Error;

/// Result type alias for fraglink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fraglink operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A mapped-alignment object was requested for an unmapped record.
    #[error("Record '{name}' is unmapped and cannot be used as an alignment")]
    UnmappedRecord {
        /// The read name
        name: String,
    },

    /// A field required to build an alignment is absent from the record.
    #[error("Record '{name}' is missing required field: {field}")]
    MissingField {
        /// The read name
        name: String,
        /// The missing field
        field: &'static str,
    },

    /// Two mates claim different reference sequences.
    #[error("Mates of '{name}' are on different references: '{first}' vs '{second}'")]
    ReferenceMismatch {
        /// The read name of the first mate
        name: String,
        /// Reference of the first mate
        first: String,
        /// Reference of the second mate
        second: String,
    },

    /// A genomic block with `start >= end`.
    #[error("Empty genomic block on '{reference}': [{start}, {end})")]
    EmptyBlock {
        /// Reference name
        reference: String,
        /// Block start (0-based)
        start: u64,
        /// Block end (exclusive)
        end: u64,
    },

    /// A CIGAR that consumes no reference bases yields no footprint.
    #[error("CIGAR '{cigar}' consumes no reference bases")]
    EmptyFootprint {
        /// CIGAR text
        cigar: String,
    },

    /// Blocks that are unordered, overlapping, or disagree on reference/strand.
    #[error("Invalid footprint: {reason}")]
    InvalidFootprint {
        /// Explanation of the problem
        reason: String,
    },

    /// The walked footprint end disagrees with the record's own declared end.
    #[error("Footprint end {observed} does not match declared alignment end {expected} (CIGAR '{cigar}')")]
    InconsistentFootprint {
        /// CIGAR text
        cigar: String,
        /// End declared by the record (exclusive, 0-based)
        expected: u64,
        /// End computed by walking the CIGAR
        observed: u64,
    },

    /// Malformed CIGAR text.
    #[error("Invalid CIGAR '{cigar}': {reason}")]
    InvalidCigar {
        /// CIGAR text
        cigar: String,
        /// Explanation of the problem
        reason: String,
    },

    /// I/O failure from the record source or sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_record_message() {
        let error = Error::UnmappedRecord { name: "q1".to_string() };
        let msg = format!("{error}");
        assert!(msg.contains("'q1'"));
        assert!(msg.contains("unmapped"));
    }

    #[test]
    fn test_reference_mismatch_message() {
        let error = Error::ReferenceMismatch {
            name: "q1".to_string(),
            first: "chr1".to_string(),
            second: "chr2".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("'chr1' vs 'chr2'"));
    }

    #[test]
    fn test_inconsistent_footprint_message() {
        let error =
            Error::InconsistentFootprint { cigar: "10M".to_string(), expected: 111, observed: 110 };
        let msg = format!("{error}");
        assert!(msg.contains("110"));
        assert!(msg.contains("111"));
        assert!(msg.contains("10M"));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let error: Error = std::io::Error::other("disk gone").into();
        assert_eq!(format!("{error}"), "disk gone");
    }
}
