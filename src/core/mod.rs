//! Data model, validation and the full-path engine.

pub mod engine;
pub mod error;
pub mod output;
pub mod time;
pub mod types;
pub mod url;
