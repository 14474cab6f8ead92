use std::path::Path;

use log::debug;

use crate::cli::Cli;
use crate::error::SimError;
use crate::indexing::IndexStrategy;

/// Cache model and the per-reference simulation pass
pub mod cache;
pub mod cli;
pub mod error;
/// Cache shape and the derived offset/index/tag bit split
pub mod geometry;
/// Index-bit selection strategies
pub mod indexing;
/// Functions for parsing input files and rendering the report
pub mod io;
pub mod trace;

/// Runs the whole pipeline: geometry → trace → index selection →
/// simulation → report. The report is rendered in memory and written in
/// one shot, so a failing run leaves no partial output.
pub fn run(cli: &Cli) -> Result<(), SimError> {
    let geometry = io::read_geometry(Path::new(&cli.cache_file))?;
    debug!(
        "offset bits: {}, index bits: {}, addressable bits: {}",
        geometry.offset_bits(),
        geometry.index_bits(),
        geometry.addressable_bits()
    );

    let trace = io::read_trace(Path::new(&cli.trace_file), &geometry)?;
    let decoded = trace.decode(&geometry);

    let strategy = IndexStrategy::from(cli.indexing);
    let mask = strategy.select(&geometry, &decoded);
    let outcome = cache::simulate(&geometry, &mask, &decoded);

    let report = io::render_report(&geometry, &mask, &trace, &outcome);
    io::write_report(Path::new(&cli.output), &report)
}
