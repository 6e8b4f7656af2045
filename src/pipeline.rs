use crate::cli::Args;
use anyhow::Result;
use fraglink_rs::bam_input;
use fraglink_rs::bam_output::{self, PairWriter};
use fraglink_rs::{
    AlignedRecord, EvictionPolicy, PairedAlignment, PairedEndReconciler, RawRecord,
    ReconcilerConfig, RetainAll,
};
use noodles::core::Region;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default)]
pub struct Stats {
    pub records: u64,
    pub unmapped: u64,
    pub filtered: u64,
    pub pairs: u64,
    pub concordant: u64,
    pub cross_reference: u64,
    pub evicted: u64,
    pub unmatched: u64,
}

pub fn run(args: &Args) -> Result<Stats> {
    let region: Option<Region> = args.region.as_deref().map(str::parse).transpose()?;
    let config = ReconcilerConfig {
        include_secondary: args.include_secondary,
        include_supplementary: args.include_supplementary,
    };

    bam_input::read_bam(&args.in_bam, region.as_ref(), |header, records| -> Result<Stats> {
        let mut writer = bam_output::create_pair_writer(&args.out_bam, header)?;
        let mut report = args.report.as_deref().map(Report::create).transpose()?;

        let stats = if args.retain_all {
            let reconciler = PairedEndReconciler::with_policy(records, RetainAll).with_config(config);
            drive(reconciler, &mut writer, report.as_mut())?
        } else {
            let reconciler = PairedEndReconciler::new(records).with_config(config);
            drive(reconciler, &mut writer, report.as_mut())?
        };
        writer.finish()?;
        Ok(stats)
    })?
}

fn drive<I, P, W>(
    mut reconciler: PairedEndReconciler<I, P>,
    writer: &mut PairWriter<W>,
    mut report: Option<&mut Report>,
) -> Result<Stats>
where
    I: Iterator<Item = fraglink_rs::Result<RawRecord>>,
    P: EvictionPolicy,
    W: Write,
{
    let mut stats = Stats::default();

    while let Some(result) = reconciler.next() {
        log_evicted(&reconciler.take_evicted());
        let pair = result?;
        writer.write_pair(&pair)?;

        match pair.to_paired_alignment() {
            Ok(paired) => {
                if paired.is_concordant() {
                    stats.concordant += 1;
                }
                if let Some(report) = report.as_deref_mut() {
                    report.write(&paired)?;
                }
            }
            Err(e) => {
                stats.cross_reference += 1;
                tracing::warn!(name = pair.name(), error = %e, "mates not combined into a fragment");
            }
        }
    }

    let unmatched = reconciler.finish();
    log_evicted(&unmatched.evicted);
    stats.records = unmatched.stats.records;
    stats.unmapped = unmatched.stats.unmapped;
    stats.filtered = unmatched.stats.filtered;
    stats.pairs = unmatched.stats.pairs;
    stats.evicted = unmatched.stats.evicted;
    stats.unmatched = unmatched.reads.len() as u64;

    if stats.evicted + stats.unmatched > 0 {
        tracing::warn!(
            evicted = stats.evicted,
            unmatched = stats.unmatched,
            "some reads never met their mate"
        );
    }
    for read in unmatched.reads.iter().take(10) {
        tracing::debug!(
            name = read.alignment.name(),
            reference = read.alignment.reference(),
            start = read.alignment.start(),
            "unmatched at end of stream"
        );
    }

    if let Some(report) = report {
        report.flush()?;
    }
    Ok(stats)
}

fn log_evicted(reads: &[AlignedRecord]) {
    for read in reads {
        tracing::debug!(
            name = read.alignment.name(),
            reference = read.alignment.reference(),
            start = read.alignment.start(),
            "evicted before its mate arrived"
        );
    }
}

struct Report {
    out: BufWriter<File>,
}

impl Report {
    fn create(path: &Path) -> Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "name\treference\torientation\tconcordant\tstrand\tinsert_start\tinsert_end\tinsert_size"
        )?;
        Ok(Self { out })
    }

    fn write(&mut self, paired: &PairedAlignment) -> Result<()> {
        let (insert_start, insert_end) = match paired.insert_interval() {
            Some(insert) => (insert.start().to_string(), insert.end().to_string()),
            None => (".".to_string(), ".".to_string()),
        };
        writeln!(
            self.out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            paired.name(),
            paired.reference(),
            paired.orientation(),
            paired.is_concordant(),
            paired.strand(),
            insert_start,
            insert_end,
            paired.insert_size(),
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
