use crate::error::SimError;

/// Cache shape as read from the geometry file, plus the derived bit
/// counts the rest of the pipeline indexes by. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    pub address_bits: usize,
    pub block_bytes: usize,
    pub sets: usize,
    pub ways: usize,
    offset_bits: usize,
    index_bits: usize,
}

impl CacheGeometry {
    /// Validates the four raw values and derives the bit split.
    ///
    /// Block size and set count must be powers of two so that the offset
    /// and index widths come out integral; tags and set indices are held
    /// in `u64`, which caps the addressable width at 64 bits.
    pub fn new(
        address_bits: usize,
        block_bytes: usize,
        sets: usize,
        ways: usize,
    ) -> Result<Self, SimError> {
        let offset_bits = exact_log2(block_bytes)
            .ok_or_else(|| SimError::geometry("block size must be a power of two"))?;
        let index_bits = exact_log2(sets)
            .ok_or_else(|| SimError::geometry("cache set count must be a power of two"))?;
        if ways == 0 {
            return Err(SimError::geometry("associativity must be at least 1"));
        }
        if address_bits < offset_bits + index_bits {
            return Err(SimError::geometry(format!(
                "{address_bits} address bits cannot hold {offset_bits} offset + {index_bits} index bits"
            )));
        }
        if address_bits - offset_bits > 64 {
            return Err(SimError::geometry(
                "more than 64 non-offset address bits are not supported",
            ));
        }

        Ok(CacheGeometry {
            address_bits,
            block_bytes,
            sets,
            ways,
            offset_bits,
            index_bits,
        })
    }

    /// Low-order bits addressing a byte within a block.
    pub fn offset_bits(&self) -> usize {
        self.offset_bits
    }

    /// Bits selecting a set; `log2(sets)`.
    pub fn index_bits(&self) -> usize {
        self.index_bits
    }

    /// Bits left after dropping the offset, the candidates for the
    /// tag/index classification.
    pub fn addressable_bits(&self) -> usize {
        self.address_bits - self.offset_bits
    }
}

fn exact_log2(value: usize) -> Option<usize> {
    if value.is_power_of_two() {
        Some(value.trailing_zeros() as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_bit_counts() {
        let geom = CacheGeometry::new(8, 4, 4, 1).unwrap();
        assert_eq!(geom.offset_bits(), 2);
        assert_eq!(geom.index_bits(), 2);
        assert_eq!(geom.addressable_bits(), 6);
    }

    #[test]
    fn single_set_needs_no_index_bits() {
        let geom = CacheGeometry::new(8, 1, 1, 2).unwrap();
        assert_eq!(geom.offset_bits(), 0);
        assert_eq!(geom.index_bits(), 0);
        assert_eq!(geom.addressable_bits(), 8);
    }

    #[test]
    fn rejects_non_power_of_two_block() {
        assert!(CacheGeometry::new(8, 3, 4, 1).is_err());
        assert!(CacheGeometry::new(8, 0, 4, 1).is_err());
    }

    #[test]
    fn rejects_non_power_of_two_sets() {
        assert!(CacheGeometry::new(8, 4, 6, 1).is_err());
    }

    #[test]
    fn rejects_zero_ways() {
        assert!(CacheGeometry::new(8, 4, 4, 0).is_err());
    }

    #[test]
    fn rejects_too_narrow_address() {
        assert!(CacheGeometry::new(3, 4, 4, 1).is_err());
    }

    #[test]
    fn rejects_oversized_address() {
        assert!(CacheGeometry::new(80, 4, 4, 1).is_err());
        assert!(CacheGeometry::new(66, 4, 4, 1).is_ok());
    }
}
