//! Single-pass mate matching over a coordinate-sorted record stream.
//!
//! Each mapped record is looked up by read name in a cache of pending reads.
//! A hit emits a [`ReadPair`]; a miss parks the record. Which pending reads
//! are dropped before each lookup is decided by an [`EvictionPolicy`]. The
//! default, [`ReferenceScoped`], clears the cache whenever the reference
//! changes, so mates split across references are never paired. Evicted reads
//! are held until the caller takes them with
//! [`take_evicted`](PairedEndReconciler::take_evicted) or
//! [`finish`](PairedEndReconciler::finish).

use crate::alignment::SingleAlignment;
use crate::error::Result;
use crate::paired::PairedAlignment;
use crate::record::RawRecord;
use crate::types::{HashMap, HashMapExt};
use noodles::sam::alignment::record::Flags;

/// Pending reads keyed by read name.
pub type PendingReads = HashMap<String, AlignedRecord>;

/// A raw record together with the alignment built from it.
#[derive(Debug, Clone)]
pub struct AlignedRecord {
    pub record: RawRecord,
    pub alignment: SingleAlignment,
}

/// Two mates matched by name, in first/second role order.
#[derive(Debug, Clone)]
pub struct ReadPair {
    first: AlignedRecord,
    second: AlignedRecord,
}

impl ReadPair {
    /// `earlier` is the mate seen first in the stream; it keeps the first
    /// role unless only `later` carries the first-in-pair flag.
    fn new(earlier: AlignedRecord, later: AlignedRecord) -> Self {
        if later.alignment.is_first_in_pair() && !earlier.alignment.is_first_in_pair() {
            Self { first: later, second: earlier }
        } else {
            Self { first: earlier, second: later }
        }
    }

    pub fn name(&self) -> &str {
        self.first.alignment.name()
    }

    pub fn first(&self) -> &AlignedRecord {
        &self.first
    }

    pub fn second(&self) -> &AlignedRecord {
        &self.second
    }

    pub fn into_records(self) -> (RawRecord, RawRecord) {
        (self.first.record, self.second.record)
    }

    /// Builds the fragment view. Fails if the mates are on different
    /// references, which only a policy that retains across references allows.
    pub fn to_paired_alignment(&self) -> Result<PairedAlignment> {
        PairedAlignment::new(self.first.alignment.clone(), self.second.alignment.clone())
    }
}

/// Decides which pending reads to drop before `incoming` is looked up.
pub trait EvictionPolicy {
    /// Removes entries from `pending` and returns them.
    fn evict(
        &mut self,
        pending: &mut PendingReads,
        incoming: &SingleAlignment,
    ) -> Vec<AlignedRecord>;
}

/// Clears the cache whenever the incoming reference differs from the last one.
#[derive(Debug, Clone, Default)]
pub struct ReferenceScoped {
    scope: Option<String>,
}

impl ReferenceScoped {
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl EvictionPolicy for ReferenceScoped {
    fn evict(
        &mut self,
        pending: &mut PendingReads,
        incoming: &SingleAlignment,
    ) -> Vec<AlignedRecord> {
        if self.scope.as_deref() == Some(incoming.reference()) {
            return Vec::new();
        }
        let dropped: Vec<AlignedRecord> = pending.drain().map(|(_, read)| read).collect();
        if !dropped.is_empty() {
            tracing::debug!(
                from = self.scope.as_deref().unwrap_or(""),
                to = incoming.reference(),
                dropped = dropped.len(),
                "reference changed; evicting unmatched reads"
            );
        }
        self.scope = Some(incoming.reference().to_string());
        dropped
    }
}

/// Never evicts; every unmatched read survives to the end of the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainAll;

impl EvictionPolicy for RetainAll {
    fn evict(
        &mut self,
        _pending: &mut PendingReads,
        _incoming: &SingleAlignment,
    ) -> Vec<AlignedRecord> {
        Vec::new()
    }
}

/// Which mapped records take part in matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub include_secondary: bool,
    pub include_supplementary: bool,
}

impl ReconcilerConfig {
    fn accepts(&self, flags: Flags) -> bool {
        (self.include_secondary || !flags.is_secondary())
            && (self.include_supplementary || !flags.is_supplementary())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
    /// Records pulled from the source.
    pub records: u64,
    /// Unmapped records, skipped.
    pub unmapped: u64,
    /// Secondary or supplementary records skipped by the config.
    pub filtered: u64,
    /// Pairs emitted.
    pub pairs: u64,
    /// Pending reads dropped by the eviction policy.
    pub evicted: u64,
}

/// What is left once the source is exhausted or abandoned.
#[derive(Debug)]
pub struct Unmatched {
    /// Pending reads that never met their mate, ordered by reference, start and name.
    pub reads: Vec<AlignedRecord>,
    /// Evicted reads not yet taken with `take_evicted`, in eviction order.
    pub evicted: Vec<AlignedRecord>,
    pub stats: ReconcilerStats,
}

/// Pull-based pairing of mates. Owns its record source; dropping the
/// reconciler, or calling [`finish`](Self::finish), releases it.
pub struct PairedEndReconciler<I, P = ReferenceScoped> {
    records: I,
    policy: P,
    config: ReconcilerConfig,
    pending: PendingReads,
    evicted: Vec<AlignedRecord>,
    stats: ReconcilerStats,
}

impl<I> PairedEndReconciler<I, ReferenceScoped>
where
    I: Iterator<Item = Result<RawRecord>>,
{
    pub fn new(records: I) -> Self {
        Self::with_policy(records, ReferenceScoped::default())
    }
}

impl<I, P> PairedEndReconciler<I, P>
where
    I: Iterator<Item = Result<RawRecord>>,
    P: EvictionPolicy,
{
    pub fn with_policy(records: I, policy: P) -> Self {
        Self {
            records,
            policy,
            config: ReconcilerConfig::default(),
            pending: PendingReads::new(),
            evicted: Vec::new(),
            stats: ReconcilerStats::default(),
        }
    }

    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stats(&self) -> ReconcilerStats {
        self.stats
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Reads currently waiting for their mate.
    pub fn unmatched(&self) -> impl Iterator<Item = &AlignedRecord> {
        self.pending.values()
    }

    pub fn unmatched_len(&self) -> usize {
        self.pending.len()
    }

    /// Drains reads the policy has evicted so far. Callers that take them as
    /// they go keep memory bounded by the policy.
    pub fn take_evicted(&mut self) -> Vec<AlignedRecord> {
        std::mem::take(&mut self.evicted)
    }

    /// Stops pulling, releases the source and returns the leftovers.
    pub fn finish(self) -> Unmatched {
        let Self { records, pending, evicted, stats, .. } = self;
        drop(records);

        let mut reads: Vec<AlignedRecord> = pending.into_values().collect();
        reads.sort_by(|a, b| {
            (a.alignment.reference(), a.alignment.start(), a.alignment.name()).cmp(&(
                b.alignment.reference(),
                b.alignment.start(),
                b.alignment.name(),
            ))
        });
        Unmatched { reads, evicted, stats }
    }
}

impl<I, P> Iterator for PairedEndReconciler<I, P>
where
    I: Iterator<Item = Result<RawRecord>>,
    P: EvictionPolicy,
{
    type Item = Result<ReadPair>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            self.stats.records += 1;

            if !record.is_mapped() {
                self.stats.unmapped += 1;
                continue;
            }
            if !self.config.accepts(record.flags) {
                self.stats.filtered += 1;
                continue;
            }

            let alignment = match SingleAlignment::from_raw(&record) {
                Ok(alignment) => alignment,
                Err(e) => return Some(Err(e)),
            };

            let evicted = self.policy.evict(&mut self.pending, &alignment);
            self.stats.evicted += evicted.len() as u64;
            self.evicted.extend(evicted);

            let incoming = AlignedRecord { record, alignment };
            match self.pending.remove(incoming.alignment.name()) {
                Some(mate) => {
                    self.stats.pairs += 1;
                    return Some(Ok(ReadPair::new(mate, incoming)));
                }
                None => {
                    self.pending.insert(incoming.alignment.name().to_string(), incoming);
                }
            }
        }
    }
}
