//! # roost-base
//!
//! Core types for the roost incremental pigeonhole driver.
//!
//! This crate provides the foundational building blocks used across the other
//! roost crates:
//!
//! - **Variable Allocator**: disjoint contiguous ID ranges for
//!   multi-dimensional variable families
//! - **Capability Containers**: typed accessor facets composable by union
//! - **Error Types**: unified error handling across the workspace

pub mod container;
pub mod error;
pub mod vars;

pub use container::{
    Compose, ConnectorMap, ConnectorVars, HelperMap, HelperVars, PigeonHoleMap, PigeonHoleVars,
    ReductionMap, ReductionVars, VarContainer,
};
pub use error::{Error, Result};
pub use vars::{VarAllocator, VarFamily};

/// A DIMACS-style literal: a signed integer whose absolute value is a
/// variable ID and whose sign denotes polarity. 0 is the clause terminator.
pub type Lit = i32;
