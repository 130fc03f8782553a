//! Fuses the heuristic result with the AI collaborator's verdict.
//!
//! The blended score weights AI at 60%, but the level is the worse of the two
//! independently computed levels. It is not re-derived from the blended score,
//! so a result can carry a `danger` level with a `warning`-range score.

use crate::core::types::{AiAnalysis, AiOutcome, FinalResult, HeuristicResult, RiskLevel};

pub const HEURISTIC_WEIGHT_PCT: u16 = 40;
pub const AI_WEIGHT_PCT: u16 = 60;

pub fn fuse(heuristic: HeuristicResult, ai: AiOutcome) -> FinalResult {
    match ai {
        AiOutcome::Skipped(reason) => {
            tracing::debug!("AI did not participate: {}", reason);
            FinalResult {
                result: heuristic,
                ai_analysis: AiAnalysis::NotParticipated { reason },
            }
        }
        AiOutcome::Participated(verdict) => {
            let heuristic_score = heuristic.risk_score;
            let heuristic_level = heuristic.risk_level;
            let combined_score = combined_score(heuristic_score, verdict.risk_score);
            let combined_level = escalate(heuristic_level, verdict.risk_level);
            if combined_level > heuristic_level {
                tracing::info!(
                    "AI escalated {} from {} to {}",
                    heuristic.url,
                    heuristic_level,
                    combined_level
                );
            }

            let mut result = heuristic;
            result.risk_score = combined_score;
            result.risk_level = combined_level;

            FinalResult {
                result,
                ai_analysis: AiAnalysis::Participated {
                    heuristic_score,
                    heuristic_level,
                    ai_score: verdict.risk_score,
                    ai_level: verdict.risk_level,
                    summary: verdict.summary,
                    findings: verdict.findings,
                    recommendations: verdict.recommendations,
                    confidence: verdict.confidence,
                },
            }
        }
    }
}

/// `round(heuristic * 0.4 + ai * 0.6)`, rounding halves up.
pub fn combined_score(heuristic: u8, ai: u8) -> u8 {
    let weighted = heuristic as u16 * HEURISTIC_WEIGHT_PCT + ai as u16 * AI_WEIGHT_PCT;
    ((weighted + 50) / 100).min(100) as u8
}

/// The more severe of two levels.
pub fn escalate(a: RiskLevel, b: RiskLevel) -> RiskLevel {
    a.max(b)
}
