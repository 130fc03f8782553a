use anyhow::Result;

use crate::core::types::SignalResult;

pub mod content;
pub mod domain;
pub mod navigation;
pub mod network;
pub mod rules;

use rules::Tally;

/// One heuristic signal source. Implementations are pure over their input.
pub trait Analyzer {
    type Input: ?Sized;

    fn name(&self) -> &'static str;

    /// Maximum score this analyzer may contribute.
    fn cap(&self) -> u8;

    fn analyze(&self, input: &Self::Input) -> Result<Tally>;
}

/// Runs an analyzer and applies its cap. A failing analyzer yields a
/// zero-score "analysis error" issue instead of an error.
pub fn run_analyzer<A: Analyzer>(analyzer: &A, input: &A::Input) -> SignalResult {
    match analyzer.analyze(input) {
        Ok(tally) => tally.finish(analyzer.cap()),
        Err(err) => {
            tracing::warn!("{} analyzer failed: {:#}", analyzer.name(), err);
            SignalResult::analysis_error(analyzer.name(), &format!("{err:#}"))
        }
    }
}
