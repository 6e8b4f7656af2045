//! fraglink-rs: reconstruct alignment footprints and pair mates into fragments.
//!
//! # Library usage
//!
//! ```no_run
//! use fraglink_rs::{PairedEndReconciler, RawRecord};
//!
//! // Any coordinate-ordered stream of records will do: a whole BAM via
//! // `bam_input::read_bam`, a region query, or records built in memory.
//! let records: Vec<fraglink_rs::Result<RawRecord>> = vec![
//!     RawRecord::builder().name("q1").reference("chr1").start(100).cigar("50M").first_in_pair().build(),
//!     RawRecord::builder().name("q1").reference("chr1").start(300).cigar("50M").second_in_pair().reverse(true).build(),
//! ];
//!
//! for pair in PairedEndReconciler::new(records.into_iter()) {
//!     let fragment = pair?.to_paired_alignment()?;
//!     println!("{} {} insert={}", fragment.name(), fragment.orientation(), fragment.insert_size());
//! }
//! # Ok::<(), fraglink_rs::Error>(())
//! ```

pub(crate) mod types;

pub mod alignment;
pub mod annotation;
pub mod bam_input;
pub mod bam_output;
pub mod cigar;
pub mod error;
pub mod orientation;
pub mod paired;
pub mod reconciler;
pub mod record;

// Flat re-exports for the most commonly used types.
pub use alignment::{BaseCall, SingleAlignment};
pub use annotation::{AnnotationBuilder, BlockedFootprint, GenomicBlock, Strand};
pub use cigar::{Cigar, CigarOp, CigarWalker};
pub use error::{Error, Result};
pub use orientation::PairOrientation;
pub use paired::PairedAlignment;
pub use reconciler::{
    AlignedRecord, EvictionPolicy, PairedEndReconciler, ReadPair, ReconcilerConfig,
    ReconcilerStats, ReferenceScoped, RetainAll, Unmatched,
};
pub use record::RawRecord;
