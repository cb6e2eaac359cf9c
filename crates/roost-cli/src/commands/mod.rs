//! CLI command implementations.

pub mod dimspec;
pub mod encode;
