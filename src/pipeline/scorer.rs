use chrono::{DateTime, Utc};

use crate::analyzers::content::ContentAnalyzer;
use crate::analyzers::domain::analyze_domain;
use crate::analyzers::navigation::{classify_navigation, NavigationAnalyzer};
use crate::analyzers::network::NetworkAnalyzer;
use crate::analyzers::run_analyzer;
use crate::core::types::{
    HeuristicDetails, HeuristicResult, NetworkSummary, RenderOutcome, RiskLevel,
};
use crate::core::url::ParsedUrl;

pub const MAX_RISK_SCORE: u8 = 100;
pub const SAFE_CEILING: u8 = 30;
pub const WARNING_CEILING: u8 = 70;

/// The one score-to-level mapping used by every path.
pub fn risk_level_for(score: u8) -> RiskLevel {
    if score <= SAFE_CEILING {
        RiskLevel::Safe
    } else if score <= WARNING_CEILING {
        RiskLevel::Warning
    } else {
        RiskLevel::Danger
    }
}

pub fn total_score(details: &HeuristicDetails) -> u8 {
    let sum = details.domain.score as u16
        + details.content.score as u16
        + details.network.score as u16
        + details.navigation.score as u16;
    sum.min(MAX_RISK_SCORE as u16) as u8
}

/// Runs all four analyzers over whatever the renderer managed to collect.
pub fn score_heuristics(
    url: &ParsedUrl,
    render: &RenderOutcome,
    analysis_time_ms: u64,
    timestamp: DateTime<Utc>,
) -> HeuristicResult {
    let page = render.page();

    let domain = analyze_domain(url);
    let content = page
        .map(|p| run_analyzer(&ContentAnalyzer, p))
        .unwrap_or_default();
    let requests = page.map(|p| p.requests.as_slice()).unwrap_or_default();
    let network = run_analyzer(&NetworkAnalyzer, requests);
    let network_summary: NetworkSummary = NetworkAnalyzer.summarize(requests);
    let navigation = run_analyzer(
        &NavigationAnalyzer,
        &classify_navigation(render.navigation_error()),
    );

    let details = HeuristicDetails {
        domain,
        content,
        network,
        navigation,
    };
    let risk_score = total_score(&details);

    HeuristicResult {
        url: url.as_str().to_string(),
        risk_score,
        risk_level: risk_level_for(risk_score),
        details,
        network_summary,
        page_title: page.and_then(|p| p.title.clone()),
        final_url: page.and_then(|p| p.final_url.clone()),
        screenshot: page.and_then(|p| p.screenshot.clone()),
        analysis_time_ms,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        FormSummary, NetworkRequestRecord, PageObservation, RenderedPage, SignalResult,
    };
    use crate::core::url::parse_url;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn thresholds_are_inclusive_at_the_ceilings() {
        assert_eq!(risk_level_for(0), RiskLevel::Safe);
        assert_eq!(risk_level_for(30), RiskLevel::Safe);
        assert_eq!(risk_level_for(31), RiskLevel::Warning);
        assert_eq!(risk_level_for(70), RiskLevel::Warning);
        assert_eq!(risk_level_for(71), RiskLevel::Danger);
        assert_eq!(risk_level_for(100), RiskLevel::Danger);
    }

    #[test]
    fn total_is_capped_at_100() {
        let details = HeuristicDetails {
            domain: SignalResult { score: 40, issues: vec![] },
            content: SignalResult { score: 50, issues: vec![] },
            network: SignalResult { score: 20, issues: vec![] },
            navigation: SignalResult { score: 10, issues: vec![] },
        };
        assert_eq!(total_score(&details), 100);
    }

    #[test]
    fn skipped_render_leaves_domain_only() {
        let url = parse_url("https://192.0.2.10/login").unwrap();
        let res = score_heuristics(&url, &RenderOutcome::Skipped("quick".into()), 3, now());
        assert_eq!(res.risk_score, 25);
        assert_eq!(res.risk_level, RiskLevel::Safe);
        assert!(res.details.content.issues.is_empty());
        assert_eq!(res.details.navigation.score, 0);
        assert_eq!(res.network_summary.total_requests, 0);
    }

    #[test]
    fn failed_render_with_partial_page_still_scores_content() {
        let url = parse_url("http://login-secure.example.com/").unwrap();
        let partial = RenderedPage {
            title: Some("Sign in".into()),
            observation: Some(PageObservation {
                forms: FormSummary {
                    form_count: 1,
                    has_password_field: true,
                    has_external_action: true,
                    ..FormSummary::default()
                },
                ..PageObservation::default()
            }),
            requests: vec![NetworkRequestRecord {
                url: "https://cdn.evil.test/k.js".into(),
                resource_type: "script".into(),
                originating_domain: "login-secure.example.com".into(),
            }],
            ..RenderedPage::default()
        };
        let render = RenderOutcome::Failed {
            reason: "Navigation timeout of 30000 ms exceeded".into(),
            partial: Some(partial),
        };
        let res = score_heuristics(&url, &render, 10, now());
        // http 15 + content 35 + network 10 + timeout 10
        assert_eq!(res.details.domain.score, 15);
        assert_eq!(res.details.content.score, 35);
        assert_eq!(res.details.network.score, 10);
        assert_eq!(res.details.navigation.score, 10);
        assert_eq!(res.risk_score, 70);
        assert_eq!(res.risk_level, RiskLevel::Warning);
        assert_eq!(res.page_title.as_deref(), Some("Sign in"));
    }
}
