use log::trace;

use crate::geometry::CacheGeometry;
use crate::indexing::IndexBitMask;
use crate::trace::BlockBits;

/// One way of a set. `eligible` is the single NRU usage bit: true means
/// the line may be evicted. Lines start unoccupied rather than holding a
/// sentinel tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheLine {
    tag: Option<u64>,
    eligible: bool,
}

impl CacheLine {
    fn empty() -> Self {
        CacheLine {
            tag: None,
            eligible: true,
        }
    }
}

/// Tag storage for the whole cache, one flat allocation indexed by
/// `set * ways + way`.
#[derive(Debug)]
pub struct Cache {
    lines: Vec<CacheLine>,
    ways: usize,
}

impl Cache {
    pub fn new(geometry: &CacheGeometry) -> Self {
        Cache {
            lines: vec![CacheLine::empty(); geometry.sets * geometry.ways],
            ways: geometry.ways,
        }
    }

    /// Looks up `tag` in the given set and installs it on a miss.
    /// Returns true on a hit.
    ///
    /// Hits never touch the usage bits; only an install clears one. On a
    /// miss the first eligible way (lowest index) takes the new tag. If
    /// every way is ineligible, all usage bits reset and the install
    /// lands in way 0.
    pub fn access(&mut self, set: usize, tag: u64) -> bool {
        let base = set * self.ways;
        let set_lines = &mut self.lines[base..base + self.ways];

        if set_lines.iter().any(|line| line.tag == Some(tag)) {
            return true;
        }

        match set_lines.iter_mut().find(|line| line.eligible) {
            Some(victim) => {
                victim.tag = Some(tag);
                victim.eligible = false;
            }
            None => {
                for line in set_lines.iter_mut() {
                    line.eligible = true;
                }
                set_lines[0] = CacheLine {
                    tag: Some(tag),
                    eligible: false,
                };
            }
        }
        false
    }
}

/// Hit/miss verdicts aligned 1:1 with the trace, plus the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub hits: Vec<bool>,
    pub miss_count: u64,
}

/// Splits a decoded reference into (set index, tag) under the given
/// mask. Selected positions, ascending, form the index; the rest form
/// the tag; both are read most-significant-first in that order, exactly
/// as the bits concatenate. Empty selections read as 0.
pub fn split_reference(bits: &BlockBits, mask: &IndexBitMask) -> (usize, u64) {
    let mut set = 0usize;
    let mut tag = 0u64;
    for (position, &bit) in bits.iter().enumerate() {
        if mask.is_index_bit(position) {
            set = (set << 1) | usize::from(bit);
        } else {
            tag = (tag << 1) | u64::from(bit);
        }
    }
    (set, tag)
}

/// Drives the decoded trace through a fresh cache, one reference fully
/// resolved before the next.
pub fn simulate(
    geometry: &CacheGeometry,
    mask: &IndexBitMask,
    decoded: &[BlockBits],
) -> SimulationOutcome {
    let mut cache = Cache::new(geometry);
    let mut miss_count = 0;
    let hits = decoded
        .iter()
        .map(|bits| {
            let (set, tag) = split_reference(bits, mask);
            let hit = cache.access(set, tag);
            trace!("set {set} tag {tag:#x}: {}", if hit { "hit" } else { "miss" });
            if !hit {
                miss_count += 1;
            }
            hit
        })
        .collect();

    SimulationOutcome { hits, miss_count }
}
