//! URL risk scoring: domain, content, network and navigation heuristics,
//! fused with an optional AI verdict.

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod sources;
