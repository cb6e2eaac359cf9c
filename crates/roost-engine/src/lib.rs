//! # roost-engine
//!
//! The incremental search-engine call contract consumed by the roost
//! encoders, together with:
//!
//! - a compact reference CDCL engine implementing the contract
//! - a scripted engine for deterministic tests
//! - the learned-clause evaluation decorator
//! - the metrics sink contract for per-stage records and decorator counters

pub mod cdcl;
pub mod contract;
pub mod eval;
pub mod metrics;
pub mod script;

pub use cdcl::CdclEngine;
pub use contract::{Engine, SolveResult};
pub use eval::{EvalCounters, LearnedClauseEval};
pub use metrics::{JsonLinesSink, MemorySink, MetricsSink, NullSink, ProbeOutcome, StageRecord};
pub use script::{ScriptedEngine, ScriptedSolve};
