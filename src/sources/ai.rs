use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::AiConfig;
use crate::core::error::ScanError;
use crate::core::types::{AiFinding, AiOutcome, AiSkipReason, AiVerdict, HeuristicResult, RiskLevel};
use crate::pipeline::scorer::risk_level_for;

const PAGE_TEXT_EXCERPT_CHARS: usize = 2_000;
const SYNTHETIC_SUMMARY_CHARS: usize = 200;

/// What the classifier gets to see about one analysis.
#[derive(Debug, Clone, Copy)]
pub struct AiRequest<'a> {
    pub url: &'a str,
    pub page_title: Option<&'a str>,
    pub page_text: Option<&'a str>,
    pub heuristic: &'a HeuristicResult,
}

/// AI classification collaborator. Never fails: transport problems come
/// back as `AiOutcome::Skipped`.
pub trait AiClassifier {
    fn classify(&self, request: &AiRequest<'_>) -> impl Future<Output = AiOutcome> + Send;
}

/// Classifier selected from configuration.
pub enum AiBackend {
    Disabled,
    Http(HttpAiClassifier),
}

impl AiBackend {
    pub fn from_config(cfg: &AiConfig, user_agent: &str) -> Result<Self, ScanError> {
        if !cfg.enabled {
            return Ok(AiBackend::Disabled);
        }
        match cfg.api_key() {
            Some(key) => Ok(AiBackend::Http(HttpAiClassifier::new(cfg, key, user_agent)?)),
            None => {
                tracing::warn!(
                    "AI enabled but {} is not set; continuing without AI",
                    cfg.api_key_env
                );
                Ok(AiBackend::Disabled)
            }
        }
    }
}

impl AiClassifier for AiBackend {
    async fn classify(&self, request: &AiRequest<'_>) -> AiOutcome {
        match self {
            AiBackend::Disabled => AiOutcome::Skipped(AiSkipReason::Disabled),
            AiBackend::Http(client) => client.classify(request).await,
        }
    }
}

/// Talks to an OpenAI-compatible chat completions endpoint.
pub struct HttpAiClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpAiClassifier {
    pub fn new(cfg: &AiConfig, api_key: String, user_agent: &str) -> Result<Self, ScanError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(ScanError::from)?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key,
        })
    }

    async fn fetch_text(&self, request: &AiRequest<'_>) -> Result<String, AiSkipReason> {
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(request).to_string()},
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiSkipReason::Unreachable(ScanError::from(e).to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiSkipReason::Unreachable(format!("status {status}")));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| AiSkipReason::Unreachable(ScanError::from(e).to_string()))?;
        extract_message_text(&raw)
    }
}

impl AiClassifier for HttpAiClassifier {
    async fn classify(&self, request: &AiRequest<'_>) -> AiOutcome {
        match self.fetch_text(request).await {
            Ok(text) => AiOutcome::Participated(parse_verdict(&text)),
            Err(reason) => {
                tracing::warn!("AI classification skipped for {}: {}", request.url, reason);
                AiOutcome::Skipped(reason)
            }
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a security analyst classifying URLs as phishing, scam or malware. \
Reply with JSON only, no markdown, using the keys riskScore (0-100), riskLevel (safe|warning|danger), \
summary, findings (array of {category, severity, description}), recommendations (array of strings) \
and confidence (0-100).";

fn build_prompt(request: &AiRequest<'_>) -> serde_json::Value {
    let excerpt: Option<String> = request
        .page_text
        .map(|t| t.chars().take(PAGE_TEXT_EXCERPT_CHARS).collect());
    let h = request.heuristic;
    json!({
        "url": request.url,
        "pageTitle": request.page_title,
        "pageTextExcerpt": excerpt,
        "heuristic": {
            "riskScore": h.risk_score,
            "riskLevel": h.risk_level,
            "domainIssues": h.details.domain.issues,
            "contentIssues": h.details.content.issues,
            "networkIssues": h.details.network.issues,
            "navigationIssues": h.details.navigation.issues,
        }
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Message text from a chat envelope. A body that is not an envelope is
/// returned as-is so the verdict parser can still try it.
fn extract_message_text(raw: &str) -> Result<String, AiSkipReason> {
    let text = match serde_json::from_str::<ChatResponse>(raw) {
        Ok(ChatResponse {
            choices: Some(choices),
        }) => choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default(),
        _ => raw.to_string(),
    };
    if text.trim().is_empty() {
        return Err(AiSkipReason::Unparsable("response carried no text".to_string()));
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiPayload {
    #[serde(alias = "risk_score", alias = "score")]
    risk_score: f64,
    #[serde(default, alias = "risk_level")]
    risk_level: Option<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    findings: Vec<AiFinding>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn strip_code_fence(value: &str) -> &str {
    let trimmed = value.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        return rest.trim().trim_end_matches("```").trim();
    }
    trimmed
}

/// The outermost `{...}` span, for replies that wrap JSON in prose.
fn json_object_span(value: &str) -> Option<&str> {
    let start = value.find('{')?;
    let end = value.rfind('}')?;
    (end > start).then(|| &value[start..=end])
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Turns model output into a verdict, falling back to a low-confidence
/// synthetic verdict when the text is not a usable payload.
pub fn parse_verdict(text: &str) -> AiVerdict {
    let cleaned = strip_code_fence(text);
    let payload = serde_json::from_str::<AiPayload>(cleaned).ok().or_else(|| {
        json_object_span(cleaned).and_then(|span| serde_json::from_str::<AiPayload>(span).ok())
    });

    let Some(payload) = payload else {
        tracing::warn!("AI verdict unparsable; using synthetic verdict");
        return synthetic_verdict(text);
    };

    let risk_score = clamp_percent(payload.risk_score);
    let risk_level = payload
        .risk_level
        .as_deref()
        .and_then(RiskLevel::parse)
        .unwrap_or_else(|| risk_level_for(risk_score));

    AiVerdict {
        risk_score,
        risk_level,
        summary: payload.summary,
        findings: payload.findings,
        recommendations: payload.recommendations,
        confidence: payload.confidence.map(clamp_percent).unwrap_or(50),
    }
}

pub fn synthetic_verdict(raw: &str) -> AiVerdict {
    AiVerdict {
        risk_score: 50,
        risk_level: RiskLevel::Warning,
        summary: raw.trim().chars().take(SYNTHETIC_SUMMARY_CHARS).collect(),
        findings: vec![AiFinding {
            category: "suspicious".to_string(),
            severity: "medium".to_string(),
            description: "AI result unparsable".to_string(),
        }],
        recommendations: vec!["Review the page manually before entering any information".to_string()],
        confidence: 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_verdict() {
        let v = parse_verdict(
            r#"{"riskScore": 91.6, "riskLevel": "danger", "summary": "fake bank",
               "findings": [{"category": "phishing", "severity": "high", "description": "cloned login"}],
               "recommendations": ["block"], "confidence": 80}"#,
        );
        assert_eq!(v.risk_score, 92);
        assert_eq!(v.risk_level, RiskLevel::Danger);
        assert_eq!(v.findings.len(), 1);
        assert_eq!(v.confidence, 80);
    }

    #[test]
    fn parses_fenced_json_and_derives_missing_level() {
        let v = parse_verdict("```json\n{\"score\": 45, \"summary\": \"odd\"}\n```");
        assert_eq!(v.risk_score, 45);
        assert_eq!(v.risk_level, RiskLevel::Warning);
        assert_eq!(v.confidence, 50);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let v = parse_verdict("Here you go: {\"riskScore\": 10, \"riskLevel\": \"safe\"} hope it helps");
        assert_eq!(v.risk_score, 10);
        assert_eq!(v.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let v = parse_verdict(r#"{"riskScore": 250, "confidence": -4}"#);
        assert_eq!(v.risk_score, 100);
        assert_eq!(v.risk_level, RiskLevel::Danger);
        assert_eq!(v.confidence, 0);
    }

    #[test]
    fn malformed_text_yields_synthetic_verdict() {
        let v = parse_verdict("I think this site is probably a scam.");
        assert_eq!(v.risk_score, 50);
        assert_eq!(v.risk_level, RiskLevel::Warning);
        assert_eq!(v.confidence, 30);
        assert_eq!(v.findings.len(), 1);
        assert_eq!(v.findings[0].description, "AI result unparsable");
        assert_eq!(v.summary, "I think this site is probably a scam.");
    }

    #[test]
    fn synthetic_summary_is_truncated_on_char_boundary() {
        let raw = "é".repeat(500);
        let v = synthetic_verdict(&raw);
        assert_eq!(v.summary.chars().count(), SYNTHETIC_SUMMARY_CHARS);
    }

    #[test]
    fn envelope_text_is_extracted() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"riskScore\":5}"}}]}"#;
        assert_eq!(extract_message_text(raw).unwrap(), "{\"riskScore\":5}");
    }

    #[test]
    fn empty_envelope_is_unparsable() {
        let raw = r#"{"choices":[]}"#;
        assert!(matches!(
            extract_message_text(raw),
            Err(AiSkipReason::Unparsable(_))
        ));
    }

    #[test]
    fn non_envelope_body_is_passed_through() {
        assert_eq!(extract_message_text("not json").unwrap(), "not json");
    }

    #[test]
    fn bare_verdict_body_is_scored() {
        let raw = r#"{"riskScore": 88, "riskLevel": "danger"}"#;
        let text = extract_message_text(raw).unwrap();
        assert_eq!(text, raw);
        let v = parse_verdict(&text);
        assert_eq!(v.risk_score, 88);
        assert_eq!(v.risk_level, RiskLevel::Danger);
    }

    #[test]
    fn non_chat_json_falls_back_to_synthetic_verdict() {
        let raw = r#"{"error": "model overloaded, here is text"}"#;
        let text = extract_message_text(raw).unwrap();
        let v = parse_verdict(&text);
        assert_eq!(v.risk_score, 50);
        assert_eq!(v.confidence, 30);
        assert_eq!(v.summary, raw);
    }
}
