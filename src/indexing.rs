use log::debug;

use crate::geometry::CacheGeometry;
use crate::trace::BlockBits;

/// Which of the addressable bit positions feed the set index. Exactly
/// `index_bits` flags are true; every other position is a tag bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBitMask {
    bits: Vec<bool>,
}

impl IndexBitMask {
    fn with_width(width: usize) -> Self {
        IndexBitMask {
            bits: vec![false; width],
        }
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn is_index_bit(&self, position: usize) -> bool {
        self.bits[position]
    }

    /// Chosen positions within the decoded (LSB-first) representation,
    /// ascending.
    pub fn index_positions(&self) -> Vec<usize> {
        (0..self.bits.len()).filter(|&i| self.bits[i]).collect()
    }

    /// Chosen positions expressed as absolute address bit numbers, the
    /// form the report lists them in.
    pub fn absolute_positions(&self, offset_bits: usize) -> Vec<usize> {
        self.index_positions()
            .into_iter()
            .map(|p| offset_bits + p)
            .collect()
    }
}

/// The two mutually exclusive ways of choosing index bits, picked at
/// configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStrategy {
    /// The lowest-order addressable bits, regardless of the trace.
    FixedLsb,
    /// Greedy selection of the bits that split the trace most evenly
    /// while avoiding mutually correlated picks.
    QualityGreedy,
}

impl IndexStrategy {
    pub fn select(self, geometry: &CacheGeometry, decoded: &[BlockBits]) -> IndexBitMask {
        let width = geometry.addressable_bits();
        let wanted = geometry.index_bits();
        let mask = match self {
            IndexStrategy::FixedLsb => fixed_lsb(width, wanted),
            IndexStrategy::QualityGreedy => quality_greedy(width, wanted, decoded),
        };
        debug!(
            "index bits chosen ({self:?}): {:?}",
            mask.index_positions()
        );
        mask
    }
}

fn fixed_lsb(width: usize, wanted: usize) -> IndexBitMask {
    let mut mask = IndexBitMask::with_width(width);
    for bit in mask.bits.iter_mut().take(wanted) {
        *bit = true;
    }
    mask
}

/// (min, max) of a pair of counts over the whole trace. A ratio near 1
/// means the two outcomes are balanced.
type Split = (u64, u64);

fn quality_greedy(width: usize, wanted: usize, decoded: &[BlockBits]) -> IndexBitMask {
    // Scores compound multiplicatively every round and the exact integer
    // products grow by up to a factor of the trace length per selection,
    // past any fixed-width integer. Only the min/max ratio is ever
    // compared, and the ratio of products equals the product of ratios,
    // so the running score is held as an f64 ratio instead.
    let mut score: Vec<f64> = initial_quality(width, decoded)
        .into_iter()
        .map(ratio)
        .collect();
    let agreement = agreement_table(width, decoded);

    let mut mask = IndexBitMask::with_width(width);
    let mut remaining = vec![true; width];

    for _ in 0..wanted {
        let mut best = 0;
        let mut best_score = -1.0;
        for (j, &candidate) in score.iter().enumerate() {
            if remaining[j] && candidate > best_score {
                best_score = candidate;
                best = j;
            }
        }
        remaining[best] = false;
        mask.bits[best] = true;

        // Compound each candidate's score with its agreement against the
        // chosen bit: a bit that always moves with `best` collapses to a
        // zero ratio and drops out of contention.
        for k in 0..width {
            if remaining[k] {
                score[k] *= agreement[best][k];
            }
        }
    }

    mask
}

fn initial_quality(width: usize, decoded: &[BlockBits]) -> Vec<Split> {
    (0..width)
        .map(|i| {
            let zeros = decoded.iter().filter(|bits| !bits[i]).count() as u64;
            let ones = decoded.len() as u64 - zeros;
            (zeros.min(ones), zeros.max(ones))
        })
        .collect()
}

/// Symmetric equal-vs-differing agreement ratio for every pair of
/// positions. The diagonal is never consulted.
fn agreement_table(width: usize, decoded: &[BlockBits]) -> Vec<Vec<f64>> {
    let mut table = vec![vec![0.0; width]; width];
    for i in 0..width {
        for j in (i + 1)..width {
            let equal = decoded.iter().filter(|bits| bits[i] == bits[j]).count() as u64;
            let differ = decoded.len() as u64 - equal;
            let entry = ratio((equal.min(differ), equal.max(differ)));
            table[i][j] = entry;
            table[j][i] = entry;
        }
    }
    table
}

fn ratio((min, max): Split) -> f64 {
    if max == 0 {
        // Empty trace; score every bit alike instead of comparing NaN.
        0.0
    } else {
        min as f64 / max as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(sets: usize) -> CacheGeometry {
        CacheGeometry::new(8, 4, sets, 1).unwrap()
    }

    /// Decoded entries from LSB-first bit tuples.
    fn decoded(rows: &[&[u8]]) -> Vec<BlockBits> {
        rows.iter()
            .map(|row| row.iter().map(|&b| b == 1).collect())
            .collect()
    }

    #[test]
    fn fixed_lsb_takes_lowest_positions() {
        let geom = geometry(4);
        let mask = IndexStrategy::FixedLsb.select(&geom, &[]);
        assert_eq!(mask.index_positions(), vec![0, 1]);
        assert_eq!(mask.width(), 6);
    }

    #[test]
    fn fixed_lsb_ignores_trace_content() {
        let geom = geometry(4);
        let a = IndexStrategy::FixedLsb.select(&geom, &decoded(&[&[1, 1, 1, 1, 1, 1]]));
        let b = IndexStrategy::FixedLsb.select(&geom, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn mask_has_exactly_index_bits_set() {
        let geom = geometry(8);
        for strategy in [IndexStrategy::FixedLsb, IndexStrategy::QualityGreedy] {
            let rows = decoded(&[&[0, 1, 0, 1, 1, 0], &[1, 0, 0, 1, 0, 1]]);
            let mask = strategy.select(&geom, &rows);
            assert_eq!(mask.index_positions().len(), geom.index_bits());
        }
    }

    #[test]
    fn quality_prefers_evenly_split_bits() {
        let geom = CacheGeometry::new(5, 1, 2, 1).unwrap();
        // bit 0 splits 2/2, bit 1 is constant, bit 2 splits 3/1.
        let trace = decoded(&[
            &[1, 0, 0, 0, 0],
            &[0, 0, 0, 0, 0],
            &[1, 0, 0, 0, 0],
            &[0, 0, 1, 0, 0],
        ]);
        let mask = IndexStrategy::QualityGreedy.select(&geom, &trace);
        assert_eq!(mask.index_positions(), vec![0]);
    }

    #[test]
    fn correlated_bit_loses_to_independent_bit() {
        let geom = CacheGeometry::new(5, 2, 4, 1).unwrap();
        // bits 0, 1, 2 all split 2/2, but bit 2 always equals bit 0.
        let trace = decoded(&[
            &[0, 0, 0, 0],
            &[1, 0, 1, 0],
            &[0, 1, 0, 0],
            &[1, 1, 1, 0],
        ]);
        let mask = IndexStrategy::QualityGreedy.select(&geom, &trace);
        assert_eq!(mask.index_positions(), vec![0, 1]);
    }

    #[test]
    fn ties_break_toward_lowest_position() {
        let geom = geometry(2);
        // every bit splits 1/1, all pairwise agreements identical
        let trace = decoded(&[
            &[0, 0, 0, 0, 0, 0],
            &[1, 1, 1, 1, 1, 1],
        ]);
        let mask = IndexStrategy::QualityGreedy.select(&geom, &trace);
        assert_eq!(mask.index_positions(), vec![0]);
    }

    #[test]
    fn quality_selection_is_deterministic() {
        let geom = geometry(4);
        let trace = decoded(&[
            &[0, 1, 1, 0, 1, 0],
            &[1, 1, 0, 0, 1, 1],
            &[0, 0, 1, 1, 0, 0],
            &[1, 0, 0, 1, 0, 1],
            &[0, 1, 1, 0, 1, 1],
        ]);
        let first = IndexStrategy::QualityGreedy.select(&geom, &trace);
        let second = IndexStrategy::QualityGreedy.select(&geom, &trace);
        assert_eq!(first, second);
    }

    #[test]
    fn wide_index_selection_survives_long_traces() {
        // 14 selection rounds over 1024 references: enough score
        // compounding to exceed integer range if the products were exact
        let geom = CacheGeometry::new(18, 4, 16384, 1).unwrap();
        let mut state = 0x2545_f491u32;
        let trace: Vec<BlockBits> = (0..1024)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (0..16).map(|bit| state >> bit & 1 == 1).collect()
            })
            .collect();

        let first = IndexStrategy::QualityGreedy.select(&geom, &trace);
        let second = IndexStrategy::QualityGreedy.select(&geom, &trace);
        assert_eq!(first.index_positions().len(), geom.index_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn empty_trace_falls_back_to_ascending_positions() {
        let geom = geometry(4);
        let mask = IndexStrategy::QualityGreedy.select(&geom, &[]);
        assert_eq!(mask.index_positions(), vec![0, 1]);
    }

    #[test]
    fn absolute_positions_offset_by_offset_bits() {
        let geom = geometry(4);
        let mask = IndexStrategy::FixedLsb.select(&geom, &[]);
        assert_eq!(mask.absolute_positions(geom.offset_bits()), vec![2, 3]);
    }
}
