use regex::Regex;

use crate::core::types::SignalResult;

/// Raw point accumulation before the analyzer cap is applied.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    points: u32,
    issues: Vec<String>,
}

impl Tally {
    pub fn add(&mut self, points: u32, issue: impl Into<String>) {
        self.points = self.points.saturating_add(points);
        self.issues.push(issue.into());
    }

    pub fn finish(self, cap: u8) -> SignalResult {
        SignalResult {
            score: self.points.min(cap as u32) as u8,
            issues: self.issues,
        }
    }
}

/// A single scoring rule: the check returns the issue text when it fires.
pub struct Rule<T: ?Sized> {
    pub id: &'static str,
    pub points: u32,
    pub check: fn(&T) -> Option<String>,
}

/// Evaluates every rule in order; each rule contributes at most once.
pub fn evaluate<T: ?Sized>(rules: &[Rule<T>], input: &T, tally: &mut Tally) {
    for rule in rules {
        if let Some(issue) = (rule.check)(input) {
            tracing::debug!(rule = rule.id, points = rule.points, "rule fired");
            tally.add(rule.points, issue);
        }
    }
}

/// Set of patterns that fire as one signal when any of them matches.
pub struct PatternGroup {
    patterns: Vec<Regex>,
}

impl PatternGroup {
    /// Patterns are compile-time constants; a bad one is a programming error.
    pub fn new(patterns: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad rule pattern {p}: {e}")))
            .collect();
        Self { patterns }
    }

    pub fn first_match(&self, text: &str) -> Option<&Regex> {
        self.patterns.iter().find(|re| re.is_match(text))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }
}
