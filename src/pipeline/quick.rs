use crate::analyzers::domain::analyze_domain;
use crate::core::error::ScanError;
use crate::core::types::{
    BatchReport, BatchSummary, QuickCheckResult, QuickRiskLevel, RiskLevel,
};
use crate::core::url::parse_url;
use crate::pipeline::scorer::risk_level_for;

/// Validation plus domain heuristics only; no rendering, no AI.
pub fn quick_check(input: &str) -> QuickCheckResult {
    match parse_url(input) {
        Ok(url) => {
            let domain = analyze_domain(&url);
            let level = risk_level_for(domain.score);
            QuickCheckResult {
                url: input.to_string(),
                valid: true,
                risk_score: domain.score,
                risk_level: level.into(),
                issues: Some(domain.issues),
                message: quick_message(level).to_string(),
            }
        }
        Err(err) => QuickCheckResult {
            url: input.to_string(),
            valid: false,
            risk_score: 0,
            risk_level: QuickRiskLevel::Unknown,
            issues: None,
            message: err.to_string(),
        },
    }
}

fn quick_message(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Safe => "no obvious risk in the URL itself; run a full analysis to inspect the page",
        RiskLevel::Warning => "URL shows suspicious traits; proceed with caution",
        RiskLevel::Danger => "URL shows strong signs of abuse; do not visit",
    }
}

/// Quick-checks every URL independently. Output order matches input order.
pub fn batch_quick_check<S: AsRef<str>>(urls: &[S]) -> BatchReport {
    let results: Vec<QuickCheckResult> = urls.iter().map(|u| quick_check(u.as_ref())).collect();
    BatchReport {
        summary: summarize(&results),
        results,
    }
}

/// URL-count ceiling applied by callers that accept batches from outside.
pub fn enforce_batch_cap(count: usize, max: usize) -> Result<(), ScanError> {
    if count > max {
        return Err(ScanError::BatchTooLarge { count, max });
    }
    Ok(())
}

pub fn summarize(results: &[QuickCheckResult]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: results.len(),
        ..BatchSummary::default()
    };
    for res in results {
        match res.risk_level {
            QuickRiskLevel::Safe => summary.safe += 1,
            QuickRiskLevel::Warning => summary.warning += 1,
            QuickRiskLevel::Danger => summary.danger += 1,
            QuickRiskLevel::Unknown => summary.invalid += 1,
        }
    }
    summary
}
