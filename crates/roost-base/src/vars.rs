//! Variable allocation.
//!
//! A [`VarAllocator`] hands out disjoint, contiguous ID ranges to
//! multi-dimensional [`VarFamily`] values. Every container facet sharing one
//! allocator is guaranteed collision-free, and the index-to-ID mapping is
//! fully deterministic for a fixed sequence of allocations. Encoders rely on
//! specific numeric relationships between families.

use crate::error::{Error, Result};
use crate::Lit;

/// A named multi-dimensional array of variable IDs.
///
/// The mapping from index tuple to ID is a bijection onto the contiguous
/// range `[start, start + product-of-extents)`: indices are flattened in
/// row-major order over the declared extents, then offset by `start`.
#[derive(Debug, Clone)]
pub struct VarFamily {
    start: i32,
    extents: Vec<u32>,
}

impl VarFamily {
    fn new(start: i32, extents: Vec<u32>) -> Self {
        debug_assert!(start > 0);
        Self { start, extents }
    }

    /// Looks up the variable ID for an index tuple.
    ///
    /// # Panics
    ///
    /// Panics if the tuple arity does not match the declared dimensions or
    /// any index is out of its declared extent. Both are programming errors,
    /// never recoverable conditions.
    pub fn get(&self, index: &[u32]) -> Lit {
        assert_eq!(
            index.len(),
            self.extents.len(),
            "family index arity {} does not match {} declared dimensions",
            index.len(),
            self.extents.len()
        );
        let mut flat: u64 = 0;
        for (i, (&v, &extent)) in index.iter().zip(&self.extents).enumerate() {
            assert!(
                v < extent,
                "family index {v} out of extent {extent} in dimension {i}"
            );
            flat = flat * u64::from(extent) + u64::from(v);
        }
        let id = self.start as u64 + flat;
        debug_assert!(id < self.start as u64 + self.len());
        id as Lit
    }

    /// First ID of the family's range.
    pub fn start(&self) -> Lit {
        self.start
    }

    /// Highest ID of the family's range.
    pub fn last(&self) -> Lit {
        self.start + (self.len() as i32 - 1)
    }

    /// Number of variables in the family (product of extents).
    pub fn len(&self) -> u64 {
        self.extents.iter().map(|&e| u64::from(e)).product()
    }

    /// Whether the family is empty. Never true for an allocated family.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The declared per-dimension extents.
    pub fn extents(&self) -> &[u32] {
        &self.extents
    }
}

/// Issues disjoint contiguous ID ranges from a cursor starting at 1.
///
/// 0 is reserved as the clause terminator, so IDs are strictly positive. The
/// allocator lives exactly as long as the set of families derived from it and
/// never shrinks or reclaims.
#[derive(Debug)]
pub struct VarAllocator {
    next_free: i32,
}

impl VarAllocator {
    /// Creates an allocator with its cursor at 1.
    pub fn new() -> Self {
        Self { next_free: 1 }
    }

    /// Reserves `product(extents)` consecutive IDs and returns the family.
    ///
    /// Fails on a zero extent or when the product would overflow the
    /// representable ID range.
    pub fn family(&mut self, extents: &[u32]) -> Result<VarFamily> {
        if extents.is_empty() || extents.iter().any(|&e| e == 0) {
            return Err(Error::EmptyExtent {
                extents: extents.to_vec(),
            });
        }
        let count: u64 = extents.iter().map(|&e| u64::from(e)).product();
        let end = self.next_free as u64 + count;
        if end > i32::MAX as u64 {
            return Err(Error::VarSpaceExhausted {
                requested: count,
                cursor: self.next_free,
            });
        }
        let family = VarFamily::new(self.next_free, extents.to_vec());
        self.next_free = end as i32;
        Ok(family)
    }

    /// Total number of IDs issued so far.
    pub fn num_allocated(&self) -> u32 {
        (self.next_free - 1) as u32
    }
}

impl Default for VarAllocator {
    fn default() -> Self {
        Self::new()
    }
}
