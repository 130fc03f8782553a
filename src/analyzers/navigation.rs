use anyhow::Result;

use crate::analyzers::rules::Tally;
use crate::analyzers::Analyzer;

pub const NAVIGATION_CAP: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Loaded,
    TimedOut,
    NetworkFailure,
}

/// Maps the render error text (if any) onto a navigation outcome.
/// Any error that is not a timeout counts as a network-level failure.
pub fn classify_navigation(error: Option<&str>) -> NavigationOutcome {
    match error {
        None => NavigationOutcome::Loaded,
        Some(text) => {
            let lowered = text.to_lowercase();
            if lowered.contains("timeout") || lowered.contains("timed out") {
                NavigationOutcome::TimedOut
            } else {
                NavigationOutcome::NetworkFailure
            }
        }
    }
}

pub struct NavigationAnalyzer;

impl Analyzer for NavigationAnalyzer {
    type Input = NavigationOutcome;

    fn name(&self) -> &'static str {
        "navigation"
    }

    fn cap(&self) -> u8 {
        NAVIGATION_CAP
    }

    fn analyze(&self, outcome: &NavigationOutcome) -> Result<Tally> {
        let mut tally = Tally::default();
        match outcome {
            NavigationOutcome::Loaded => {}
            NavigationOutcome::TimedOut => tally.add(10, "page load timeout"),
            NavigationOutcome::NetworkFailure => tally.add(5, "network error"),
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::run_analyzer;

    #[test]
    fn classification_covers_each_branch() {
        assert_eq!(classify_navigation(None), NavigationOutcome::Loaded);
        assert_eq!(
            classify_navigation(Some("Navigation timeout of 30000 ms exceeded")),
            NavigationOutcome::TimedOut
        );
        assert_eq!(
            classify_navigation(Some("net::ERR_NAME_NOT_RESOLVED")),
            NavigationOutcome::NetworkFailure
        );
    }

    #[test]
    fn scores_match_outcome() {
        let loaded = run_analyzer(&NavigationAnalyzer, &NavigationOutcome::Loaded);
        assert_eq!(loaded.score, 0);
        assert!(loaded.issues.is_empty());

        let timeout = run_analyzer(&NavigationAnalyzer, &NavigationOutcome::TimedOut);
        assert_eq!(timeout.score, 10);
        assert_eq!(timeout.issues, vec!["page load timeout"]);

        let net = run_analyzer(&NavigationAnalyzer, &NavigationOutcome::NetworkFailure);
        assert_eq!(net.score, 5);
        assert_eq!(net.issues, vec!["network error"]);
    }
}
