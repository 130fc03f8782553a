use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-level verdict. Ordering is severity: `Safe < Warning < Danger`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Warning => "warning",
            RiskLevel::Danger => "danger",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "safe" | "low" => Some(RiskLevel::Safe),
            "warning" | "medium" | "suspicious" => Some(RiskLevel::Warning),
            "danger" | "high" | "critical" | "malicious" => Some(RiskLevel::Danger),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial judgment from one analyzer. `score` is already capped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalResult {
    pub score: u8,
    pub issues: Vec<String>,
}

impl SignalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn analysis_error(analyzer: &str, reason: &str) -> Self {
        Self {
            score: 0,
            issues: vec![format!("{analyzer} analysis error: {reason}")],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSummary {
    pub form_count: usize,
    pub has_password_field: bool,
    pub hidden_field_count: usize,
    pub has_external_action: bool,
}

/// What the rendering collaborator saw on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageObservation {
    pub text: String,
    pub forms: FormSummary,
    pub script_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequestRecord {
    pub url: String,
    pub resource_type: String,
    pub originating_domain: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderedPage {
    pub title: Option<String>,
    pub final_url: Option<String>,
    pub observation: Option<PageObservation>,
    /// Set when the collaborator could load the page but not inspect it.
    pub observation_error: Option<String>,
    pub requests: Vec<NetworkRequestRecord>,
    /// Opaque encoded capture, passed through untouched.
    pub screenshot: Option<String>,
}

/// Result of asking the rendering collaborator for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Succeeded(RenderedPage),
    Failed {
        reason: String,
        partial: Option<RenderedPage>,
    },
    Skipped(String),
}

impl RenderOutcome {
    pub fn page(&self) -> Option<&RenderedPage> {
        match self {
            RenderOutcome::Succeeded(page) => Some(page),
            RenderOutcome::Failed { partial, .. } => partial.as_ref(),
            RenderOutcome::Skipped(_) => None,
        }
    }

    pub fn navigation_error(&self) -> Option<&str> {
        match self {
            RenderOutcome::Failed { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeuristicDetails {
    pub domain: SignalResult,
    pub content: SignalResult,
    pub network: SignalResult,
    pub navigation: SignalResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub total_requests: usize,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicResult {
    pub url: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub details: HeuristicDetails,
    pub network_summary: NetworkSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub analysis_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiFinding {
    pub category: String,
    pub severity: String,
    pub description: String,
}

/// Structured verdict from the AI collaborator, already range-checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiVerdict {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub findings: Vec<AiFinding>,
    pub recommendations: Vec<String>,
    pub confidence: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum AiSkipReason {
    Disabled,
    Unreachable(String),
    Unparsable(String),
}

impl fmt::Display for AiSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiSkipReason::Disabled => f.write_str("AI analysis disabled"),
            AiSkipReason::Unreachable(detail) => write!(f, "AI unreachable: {detail}"),
            AiSkipReason::Unparsable(detail) => write!(f, "AI response unparsable: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Participated(AiVerdict),
    Skipped(AiSkipReason),
}

/// AI annotation on a final result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AiAnalysis {
    #[serde(rename_all = "camelCase")]
    Participated {
        heuristic_score: u8,
        heuristic_level: RiskLevel,
        ai_score: u8,
        ai_level: RiskLevel,
        summary: String,
        findings: Vec<AiFinding>,
        recommendations: Vec<String>,
        confidence: u8,
    },
    NotParticipated {
        reason: AiSkipReason,
    },
}

/// Heuristic result with score/level possibly overridden by fusion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinalResult {
    #[serde(flatten)]
    pub result: HeuristicResult,
    pub ai_analysis: AiAnalysis,
}

impl FinalResult {
    pub fn risk_score(&self) -> u8 {
        self.result.risk_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.result.risk_level
    }
}

/// Level reported by the quick path; `Unknown` only for invalid input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuickRiskLevel {
    Safe,
    Warning,
    Danger,
    Unknown,
}

impl From<RiskLevel> for QuickRiskLevel {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Safe => QuickRiskLevel::Safe,
            RiskLevel::Warning => QuickRiskLevel::Warning,
            RiskLevel::Danger => QuickRiskLevel::Danger,
        }
    }
}

impl fmt::Display for QuickRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuickRiskLevel::Safe => "safe",
            QuickRiskLevel::Warning => "warning",
            QuickRiskLevel::Danger => "danger",
            QuickRiskLevel::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuickCheckResult {
    pub url: String,
    pub valid: bool,
    pub risk_score: u8,
    pub risk_level: QuickRiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub safe: usize,
    pub warning: usize,
    pub danger: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<QuickCheckResult>,
}
