use clap::{Parser, ValueEnum};

use crate::indexing::IndexStrategy;

#[derive(Parser)]
#[command(
    name = "cache_indexing",
    version = "0.1.0",
    about = "Set-associative cache simulator with selectable index bits"
)]
pub struct Cli {
    /// Cache geometry file (address bits, block size, sets, associativity)
    pub cache_file: String,

    /// Reference trace file
    pub trace_file: String,

    /// Output report location
    pub output: String,

    /// How the set-index bits are chosen
    #[arg(short, long, value_enum, default_value_t = Indexing::Lsb)]
    pub indexing: Indexing,

    /// Print derived bit counts and selection details
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Indexing {
    /// Use the lowest-order non-offset bits
    Lsb,
    /// Pick bits by trace-driven quality ranking
    Quality,
}

impl From<Indexing> for IndexStrategy {
    fn from(value: Indexing) -> Self {
        match value {
            Indexing::Lsb => IndexStrategy::FixedLsb,
            Indexing::Quality => IndexStrategy::QualityGreedy,
        }
    }
}
