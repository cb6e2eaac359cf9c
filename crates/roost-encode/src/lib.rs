//! # roost-encode
//!
//! Incremental CNF encoders for the pigeonhole principle.
//!
//! Three encoder state machines grow a formula stage by stage against the
//! [`Engine`](roost_engine::Engine) contract and certify prefix
//! unsatisfiability with assumption-scoped probes:
//!
//! - [`BasicHelperEncoder`]: direct encoding with per-stage helper literals
//! - [`ChainEncoder`]: 3-literal connector chains per pigeon
//! - [`ExtendedResolutionEncoder`]: connector chains plus auxiliary layer
//!   reduction variables, re-deriving proved sub-clauses through the
//!   learned-clause stream
//!
//! [`Dimspec`] is the non-incremental baseline: a fixed-schedule four-section
//! export of the same problem family.

pub mod basic;
pub mod chain;
pub mod config;
pub mod dimspec;
pub mod extended;

pub use basic::BasicHelperEncoder;
pub use chain::ChainEncoder;
pub use config::EncoderConfig;
pub use dimspec::Dimspec;
pub use extended::ExtendedResolutionEncoder;
