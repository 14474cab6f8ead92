use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::cache::SimulationOutcome;
use crate::error::SimError;
use crate::geometry::CacheGeometry;
use crate::indexing::IndexBitMask;
use crate::trace::Trace;

/// Reads a document, decompressing `.zst` files transparently.
fn read_document(path: &Path) -> Result<String, SimError> {
    let config_error = |source| SimError::Config {
        path: path.to_path_buf(),
        source,
    };

    let raw = fs::read(path).map_err(config_error)?;
    let bytes = if path.extension().is_some_and(|ext| ext == "zst") {
        zstd::decode_all(raw.as_slice()).map_err(config_error)?
    } else {
        raw
    };
    String::from_utf8(bytes)
        .map_err(|e| config_error(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn read_geometry(path: &Path) -> Result<CacheGeometry, SimError> {
    let content = read_document(path)?;
    parse_geometry(&content)
}

/// Four whitespace-separated label/value pairs in fixed order:
/// address bits, block size, cache sets, associativity. Labels are
/// echoed conventions, not validated.
fn parse_geometry(content: &str) -> Result<CacheGeometry, SimError> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(SimError::geometry("label without a value"));
    }

    let values: Vec<usize> = tokens
        .chunks(2)
        .map(|pair| {
            pair[1]
                .parse()
                .map_err(|_| SimError::geometry(format!("'{}' is not a non-negative integer", pair[1])))
        })
        .collect::<Result<_, _>>()?;

    match values[..] {
        [address_bits, block_bytes, sets, ways] => {
            CacheGeometry::new(address_bits, block_bytes, sets, ways)
        }
        _ => Err(SimError::geometry(format!(
            "expected 4 values, found {}",
            values.len()
        ))),
    }
}

pub fn read_trace(path: &Path, geometry: &CacheGeometry) -> Result<Trace, SimError> {
    let content = read_document(path)?;
    parse_trace(&content, geometry)
}

/// Line-oriented trace body delimited by marker lines: everything
/// strictly between the `benchmark` header and the `end` trailer is one
/// fixed-width binary reference. Lines after the trailer are ignored.
fn parse_trace(content: &str, geometry: &CacheGeometry) -> Result<Trace, SimError> {
    let header_marker = Regex::new("benchmark").unwrap();
    let trailer_marker = Regex::new("end").unwrap();

    let mut header = None;
    let mut trailer = None;
    let mut refs = Vec::new();
    let mut line_count = 0;

    for (number, line) in content.lines().enumerate().map(|(i, l)| (i + 1, l)) {
        line_count = number;
        if header.is_none() {
            if header_marker.is_match(line) {
                header = Some(line.to_string());
            } else if !line.trim().is_empty() {
                return Err(SimError::trace(number, "content before the benchmark header"));
            }
            continue;
        }
        if trailer_marker.is_match(line) {
            trailer = Some(line.to_string());
            break;
        }
        validate_reference(line, geometry.address_bits, number)?;
        refs.push(line.to_string());
    }

    // line_count is where scanning stopped, i.e. the end of the file
    let header = header.ok_or_else(|| {
        SimError::trace(
            line_count,
            "reached end of file without finding the benchmark header",
        )
    })?;
    let trailer = trailer.ok_or_else(|| {
        SimError::trace(line_count, "reached end of file without finding the end marker")
    })?;

    debug!("trace: {} references", refs.len());
    Ok(Trace {
        header,
        trailer,
        refs,
    })
}

fn validate_reference(line: &str, width: usize, number: usize) -> Result<(), SimError> {
    if line.len() != width {
        return Err(SimError::trace(
            number,
            format!("expected {width} binary digits, found {}", line.len()),
        ));
    }
    if let Some(bad) = line.chars().find(|c| *c != '0' && *c != '1') {
        return Err(SimError::trace(number, format!("invalid character '{bad}'")));
    }
    Ok(())
}

/// The whole report in the fixed output layout: geometry echo, bit
/// split, per-reference verdicts between the echoed marker lines, then
/// the miss total.
pub fn render_report(
    geometry: &CacheGeometry,
    mask: &IndexBitMask,
    trace: &Trace,
    outcome: &SimulationOutcome,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Address bits: {}", geometry.address_bits);
    let _ = writeln!(out, "Block size: {}", geometry.block_bytes);
    let _ = writeln!(out, "Cache sets: {}", geometry.sets);
    let _ = writeln!(out, "Associativity: {}", geometry.ways);
    out.push('\n');

    let _ = writeln!(out, "Offset bit count: {}", geometry.offset_bits());
    let _ = writeln!(out, "Indexing bit count: {}", geometry.index_bits());
    out.push_str("Indexing bits:");
    for position in mask.absolute_positions(geometry.offset_bits()) {
        let _ = write!(out, " {position}");
    }
    out.push('\n');
    out.push('\n');

    let _ = writeln!(out, "{}", trace.header);
    for (raw, hit) in trace.refs.iter().zip(&outcome.hits) {
        let _ = writeln!(out, "{raw} {}", if *hit { "hit" } else { "miss" });
    }
    let _ = writeln!(out, "{}", trace.trailer);
    out.push('\n');

    let _ = writeln!(out, "Total cache miss count: {}", outcome.miss_count);

    out
}

pub fn write_report(path: &Path, report: &str) -> Result<(), SimError> {
    fs::write(path, report).map_err(|source| SimError::Output {
        path: path.to_path_buf(),
        source,
    })
}
