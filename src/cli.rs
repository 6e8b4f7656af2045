use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fraglink-rs",
    about = "Pair mates from a coordinate-sorted BAM into fragment-level alignments",
    version
)]
pub struct Args {
    /// Input coordinate-sorted BAM
    pub in_bam: PathBuf,

    /// Output BAM of matched pairs (first mate, then second)
    #[arg(short = 'o', long = "out", value_name = "BAM")]
    pub out_bam: PathBuf,

    /// Only stream records overlapping this region (needs a .bai index)
    #[arg(short = 'r', long, value_name = "CHR[:START-END]")]
    pub region: Option<String>,

    /// Keep unmatched reads across reference changes instead of discarding them
    #[arg(long)]
    pub retain_all: bool,

    /// Include secondary alignments in mate matching
    #[arg(long)]
    pub include_secondary: bool,

    /// Include supplementary alignments in mate matching
    #[arg(long)]
    pub include_supplementary: bool,

    /// Write a per-fragment TSV report (orientation, strand, insert)
    #[arg(long, value_name = "TSV")]
    pub report: Option<PathBuf>,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
