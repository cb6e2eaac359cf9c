//! Unified error types for roost.

use thiserror::Error;

/// The main error type for roost operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A variable family was declared with a zero extent.
    #[error("variable family extents must be positive, got {extents:?}")]
    EmptyExtent {
        /// The offending extent list.
        extents: Vec<u32>,
    },

    /// Allocating a family would overflow the representable ID range.
    #[error("variable space exhausted: {requested} ids requested past cursor {cursor}")]
    VarSpaceExhausted {
        /// Number of IDs the allocation asked for.
        requested: u64,
        /// Allocator cursor at the time of the request.
        cursor: i32,
    },

    /// The pigeonhole principle needs at least two pigeons.
    #[error("at least 2 pigeons required, got {0}")]
    TooFewPigeons(u32),

    /// An encoder stage was requested out of order.
    #[error("stage {requested} requested, but the next legal stage is {expected}")]
    StageOrder {
        /// The stage the caller asked for.
        requested: u32,
        /// The stage the encoder would accept.
        expected: u32,
    },

    /// A probe that must certify unsatisfiability reported SAT.
    #[error("probe at stage {stage} returned SAT, expected UNSAT")]
    UnexpectedSat {
        /// Stage index of the failed probe.
        stage: u32,
    },

    /// The learned-clause stream did not reproduce an expected certificate.
    #[error("learned-clause certificate missing at layer {layer} for clause {expected:?}")]
    CertificateMismatch {
        /// Layer whose fact was being derived.
        layer: u32,
        /// The exact clause the stream was expected to contain.
        expected: Vec<i32>,
    },

    /// The engine's termination predicate cancelled a solve.
    #[error("solve interrupted by termination predicate")]
    Interrupted,

    /// Engine-reported failure; never retried.
    #[error("engine error: {0}")]
    Engine(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
