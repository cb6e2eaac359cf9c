//! Capability containers.
//!
//! Each concrete map wraps exactly one [`VarFamily`] and exposes one typed
//! accessor capability. Encoders never depend on a concrete container type:
//! they query a [`VarContainer`] for the capabilities they need and treat a
//! missing capability as a programming error. [`Compose`] combines two
//! containers sharing one allocator into one exposing the union of their
//! capabilities, with collision freedom guaranteed by the shared allocator.

use crate::vars::{VarAllocator, VarFamily};
use crate::{Lit, Result};

/// Accessor capability: pigeon-in-hole variables.
pub trait PigeonHoleVars {
    /// Variable asserting that `pigeon` sits in `hole`.
    fn pigeon_in_hole(&self, pigeon: u32, hole: u32) -> Lit;
}

/// Accessor capability: chain/connector variables.
pub trait ConnectorVars {
    /// Variable asserting that `pigeon`'s chain is still open at `depth`.
    fn connector(&self, pigeon: u32, depth: u32) -> Lit;
}

/// Accessor capability: per-stage helper literals.
pub trait HelperVars {
    /// Helper literal soft-disabling the stage-`stage` clauses (1-based).
    fn helper(&self, stage: u32) -> Lit;
}

/// Accessor capability: extended-resolution layer-reduction variables.
pub trait ReductionVars {
    /// Variable standing for "`pigeon` sits in `hole`" at reduction `layer`.
    ///
    /// Layers are counted by remaining pigeons, `2 ..= num_pigeons - 1`; the
    /// top layer `num_pigeons` is the pigeon-in-hole family itself and is not
    /// part of this capability.
    fn reduction(&self, layer: u32, pigeon: u32, hole: u32) -> Lit;
}

/// Capability query interface.
///
/// Every accessor defaults to `None`; concrete maps override the one they
/// back, and [`Compose`] forwards to whichever side exposes a capability.
pub trait VarContainer {
    /// Pigeon-in-hole accessor, if this container exposes it.
    fn pigeon_holes(&self) -> Option<&dyn PigeonHoleVars> {
        None
    }

    /// Connector accessor, if this container exposes it.
    fn connectors(&self) -> Option<&dyn ConnectorVars> {
        None
    }

    /// Helper accessor, if this container exposes it.
    fn helpers(&self) -> Option<&dyn HelperVars> {
        None
    }

    /// Reduction accessor, if this container exposes it.
    fn reductions(&self) -> Option<&dyn ReductionVars> {
        None
    }
}

/// Pigeon-in-hole variable map backed by a `[pigeons, holes]` family.
#[derive(Debug)]
pub struct PigeonHoleMap {
    family: VarFamily,
}

impl PigeonHoleMap {
    /// Allocates the map from a shared allocator.
    pub fn new(alloc: &mut VarAllocator, num_pigeons: u32, num_holes: u32) -> Result<Self> {
        Ok(Self {
            family: alloc.family(&[num_pigeons, num_holes])?,
        })
    }
}

impl PigeonHoleVars for PigeonHoleMap {
    fn pigeon_in_hole(&self, pigeon: u32, hole: u32) -> Lit {
        self.family.get(&[pigeon, hole])
    }
}

impl VarContainer for PigeonHoleMap {
    fn pigeon_holes(&self) -> Option<&dyn PigeonHoleVars> {
        Some(self)
    }
}

/// Connector variable map backed by a `[pigeons, depths]` family.
#[derive(Debug)]
pub struct ConnectorMap {
    family: VarFamily,
}

impl ConnectorMap {
    /// Allocates the map from a shared allocator.
    pub fn new(alloc: &mut VarAllocator, num_pigeons: u32, num_depths: u32) -> Result<Self> {
        Ok(Self {
            family: alloc.family(&[num_pigeons, num_depths])?,
        })
    }
}

impl ConnectorVars for ConnectorMap {
    fn connector(&self, pigeon: u32, depth: u32) -> Lit {
        self.family.get(&[pigeon, depth])
    }
}

impl VarContainer for ConnectorMap {
    fn connectors(&self) -> Option<&dyn ConnectorVars> {
        Some(self)
    }
}

/// Stage helper map backed by a `[stages]` family, addressed 1-based.
#[derive(Debug)]
pub struct HelperMap {
    family: VarFamily,
}

impl HelperMap {
    /// Allocates helpers for stages `1 ..= num_stages`.
    pub fn new(alloc: &mut VarAllocator, num_stages: u32) -> Result<Self> {
        Ok(Self {
            family: alloc.family(&[num_stages])?,
        })
    }
}

impl HelperVars for HelperMap {
    fn helper(&self, stage: u32) -> Lit {
        assert!(stage >= 1, "helper stages are 1-based");
        self.family.get(&[stage - 1])
    }
}

impl VarContainer for HelperMap {
    fn helpers(&self) -> Option<&dyn HelperVars> {
        Some(self)
    }
}

/// Layer-reduction map backed by a `[layers, pigeons, holes]` family.
///
/// With two pigeons there are no reduction layers; the map is then empty and
/// any access is a programming error.
#[derive(Debug)]
pub struct ReductionMap {
    family: Option<VarFamily>,
    num_pigeons: u32,
}

impl ReductionMap {
    /// Allocates reduction layers `2 ..= num_pigeons - 1`.
    pub fn new(alloc: &mut VarAllocator, num_pigeons: u32) -> Result<Self> {
        let family = if num_pigeons > 2 {
            Some(alloc.family(&[num_pigeons - 2, num_pigeons, num_pigeons - 1])?)
        } else {
            None
        };
        Ok(Self {
            family,
            num_pigeons,
        })
    }
}

impl ReductionVars for ReductionMap {
    fn reduction(&self, layer: u32, pigeon: u32, hole: u32) -> Lit {
        assert!(
            layer >= 2 && layer < self.num_pigeons,
            "reduction layer {layer} outside 2..{}",
            self.num_pigeons
        );
        let family = self
            .family
            .as_ref()
            .expect("reduction map has no layers for 2 pigeons");
        family.get(&[layer - 2, pigeon, hole])
    }
}

impl VarContainer for ReductionMap {
    fn reductions(&self) -> Option<&dyn ReductionVars> {
        Some(self)
    }
}

/// Union of two containers sharing one allocator.
///
/// Capability exposure is associative and commutative; ID values are not,
/// since they depend on allocation order. Lookup is left-biased when both
/// sides expose the same capability.
#[derive(Debug)]
pub struct Compose<A, B> {
    a: A,
    b: B,
}

impl<A: VarContainer, B: VarContainer> Compose<A, B> {
    /// Composes two containers. Both must come from the same allocator.
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<A: VarContainer, B: VarContainer> VarContainer for Compose<A, B> {
    fn pigeon_holes(&self) -> Option<&dyn PigeonHoleVars> {
        self.a.pigeon_holes().or_else(|| self.b.pigeon_holes())
    }

    fn connectors(&self) -> Option<&dyn ConnectorVars> {
        self.a.connectors().or_else(|| self.b.connectors())
    }

    fn helpers(&self) -> Option<&dyn HelperVars> {
        self.a.helpers().or_else(|| self.b.helpers())
    }

    fn reductions(&self) -> Option<&dyn ReductionVars> {
        self.a.reductions().or_else(|| self.b.reductions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_exposes_union() {
        let mut alloc = VarAllocator::new();
        let ph = PigeonHoleMap::new(&mut alloc, 3, 2).unwrap();
        let helpers = HelperMap::new(&mut alloc, 2).unwrap();
        let both = Compose::new(ph, helpers);

        assert!(both.pigeon_holes().is_some());
        assert!(both.helpers().is_some());
        assert!(both.connectors().is_none());
        assert!(both.reductions().is_none());
    }

    #[test]
    fn composed_capabilities_do_not_collide() {
        let mut alloc = VarAllocator::new();
        let ph = PigeonHoleMap::new(&mut alloc, 3, 2).unwrap();
        let conn = ConnectorMap::new(&mut alloc, 3, 3).unwrap();
        let both = Compose::new(ph, conn);

        let mut seen = std::collections::HashSet::new();
        let phs = both.pigeon_holes().unwrap();
        for p in 0..3 {
            for h in 0..2 {
                assert!(seen.insert(phs.pigeon_in_hole(p, h)));
            }
        }
        let cs = both.connectors().unwrap();
        for p in 0..3 {
            for d in 0..3 {
                assert!(seen.insert(cs.connector(p, d)));
            }
        }
        assert_eq!(seen.len(), 3 * 2 + 3 * 3);
    }

    #[test]
    fn helper_map_is_one_based() {
        let mut alloc = VarAllocator::new();
        let helpers = HelperMap::new(&mut alloc, 3).unwrap();
        assert_eq!(helpers.helper(1), 1);
        assert_eq!(helpers.helper(3), 3);
    }
}
