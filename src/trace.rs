use crate::geometry::CacheGeometry;

/// One decoded reference: the non-offset address bits, reversed so that
/// position 0 is the least-significant addressable bit.
pub type BlockBits = Vec<bool>;

/// A parsed reference trace. `refs` holds the raw fixed-width binary
/// strings in file order; the header and trailer lines are kept so the
/// report can echo them verbatim.
#[derive(Debug, Clone)]
pub struct Trace {
    pub header: String,
    pub trailer: String,
    pub refs: Vec<String>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Drops the offset bits (the tail of each address) and reverses the
    /// rest, yielding LSB-first bit vectors in trace order. References
    /// are validated at parse time, so this cannot fail.
    pub fn decode(&self, geometry: &CacheGeometry) -> Vec<BlockBits> {
        let width = geometry.addressable_bits();
        self.refs
            .iter()
            .map(|raw| raw.bytes().take(width).rev().map(|b| b == b'1').collect())
            .collect()
    }
}
