//! Page text, form and script heuristics over what the renderer observed.

use std::sync::LazyLock;

use anyhow::{anyhow, Result};

use crate::analyzers::rules::{evaluate, PatternGroup, Rule, Tally};
use crate::analyzers::Analyzer;
use crate::core::types::{PageObservation, RenderedPage};

pub const CONTENT_CAP: u8 = 50;

const MAX_HIDDEN_FIELDS: usize = 5;

/// Loose two-token co-occurrences typical of credential lures.
static PHISHING_PHRASES: LazyLock<PatternGroup> = LazyLock::new(|| {
    PatternGroup::new(&[
        r"(?is)login.*verify",
        r"(?is)account.*suspend",
        r"(?is)urgent.*action",
        r"(?is)password.*expire",
        r"(?is)verify.*identity",
        r"(?is)security.*alert",
        r"(?is)confirm.*bank",
        r"(?is)update.*payment",
    ])
});

static MALICIOUS_SCRIPT: LazyLock<PatternGroup> = LazyLock::new(|| {
    PatternGroup::new(&[
        r"\beval\s*\(",
        r"document\.write\s*\(",
        r"\.innerHTML\s*=",
        r"\blocation(?:\.href)?\s*=[^=]",
        r"String\.fromCharCode\s*\(",
        r"\batob\s*\(",
        r"\bbtoa\s*\(",
    ])
});

static CONTENT_RULES: [Rule<PageObservation>; 5] = [
    Rule {
        id: "phishing-phrasing",
        points: 20,
        check: phishing_phrasing,
    },
    Rule {
        id: "password-field",
        points: 10,
        check: password_field,
    },
    Rule {
        id: "external-form-action",
        points: 25,
        check: external_form_action,
    },
    Rule {
        id: "hidden-fields",
        points: 10,
        check: hidden_fields,
    },
    Rule {
        id: "script-pattern",
        points: 15,
        check: script_pattern,
    },
];

fn phishing_phrasing(obs: &PageObservation) -> Option<String> {
    PHISHING_PHRASES
        .is_match(&obs.text)
        .then(|| "suspected phishing phrasing".to_string())
}

fn password_field(obs: &PageObservation) -> Option<String> {
    obs.forms
        .has_password_field
        .then(|| "password field present".to_string())
}

fn external_form_action(obs: &PageObservation) -> Option<String> {
    obs.forms
        .has_external_action
        .then(|| "form submits to external server".to_string())
}

fn hidden_fields(obs: &PageObservation) -> Option<String> {
    let count = obs.forms.hidden_field_count;
    (count > MAX_HIDDEN_FIELDS).then(|| format!("many hidden fields ({count})"))
}

fn script_pattern(obs: &PageObservation) -> Option<String> {
    MALICIOUS_SCRIPT
        .is_match(&obs.script_text)
        .then(|| "suspicious script pattern".to_string())
}

pub struct ContentAnalyzer;

impl ContentAnalyzer {
    pub fn analyze_observation(&self, obs: &PageObservation) -> Tally {
        let mut tally = Tally::default();
        evaluate(&CONTENT_RULES, obs, &mut tally);
        tally
    }
}

impl Analyzer for ContentAnalyzer {
    type Input = RenderedPage;

    fn name(&self) -> &'static str {
        "content"
    }

    fn cap(&self) -> u8 {
        CONTENT_CAP
    }

    fn analyze(&self, page: &RenderedPage) -> Result<Tally> {
        if let Some(err) = &page.observation_error {
            return Err(anyhow!("{err}"));
        }
        Ok(page
            .observation
            .as_ref()
            .map(|obs| self.analyze_observation(obs))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::run_analyzer;
    use crate::core::types::FormSummary;

    fn page(obs: PageObservation) -> RenderedPage {
        RenderedPage {
            observation: Some(obs),
            ..RenderedPage::default()
        }
    }

    #[test]
    fn password_plus_external_action_is_35() {
        let obs = PageObservation {
            forms: FormSummary {
                form_count: 1,
                has_password_field: true,
                has_external_action: true,
                ..FormSummary::default()
            },
            ..PageObservation::default()
        };
        let res = run_analyzer(&ContentAnalyzer, &page(obs));
        assert_eq!(res.score, 35);
        assert_eq!(
            res.issues,
            vec!["password field present", "form submits to external server"]
        );
    }

    #[test]
    fn phrasing_fires_once_for_many_phrases() {
        let obs = PageObservation {
            text: "Security alert! Your account will be suspended. Login to verify now."
                .to_string(),
            ..PageObservation::default()
        };
        let res = run_analyzer(&ContentAnalyzer, &page(obs));
        assert_eq!(res.score, 20);
        assert_eq!(res.issues, vec!["suspected phishing phrasing"]);
    }

    #[test]
    fn phrasing_is_case_insensitive_across_lines() {
        let obs = PageObservation {
            text: "Please UPDATE\nyour PAYMENT details".to_string(),
            ..PageObservation::default()
        };
        assert_eq!(run_analyzer(&ContentAnalyzer, &page(obs)).score, 20);
    }

    #[test]
    fn hidden_field_threshold_is_strict() {
        let mut obs = PageObservation::default();
        obs.forms.hidden_field_count = 5;
        assert_eq!(run_analyzer(&ContentAnalyzer, &page(obs.clone())).score, 0);
        obs.forms.hidden_field_count = 6;
        let res = run_analyzer(&ContentAnalyzer, &page(obs));
        assert_eq!(res.score, 10);
        assert_eq!(res.issues, vec!["many hidden fields (6)"]);
    }

    #[test]
    fn script_patterns_fire_once() {
        let obs = PageObservation {
            script_text: "var s = atob('ZXZpbA=='); eval(s); window.location = 'x';".to_string(),
            ..PageObservation::default()
        };
        let res = run_analyzer(&ContentAnalyzer, &page(obs));
        assert_eq!(res.score, 15);
        assert_eq!(res.issues, vec!["suspicious script pattern"]);
    }

    #[test]
    fn location_comparison_is_not_reassignment() {
        let obs = PageObservation {
            script_text: "if (location.href == 'a') { track(); }".to_string(),
            ..PageObservation::default()
        };
        assert_eq!(run_analyzer(&ContentAnalyzer, &page(obs)).score, 0);
    }

    #[test]
    fn identifiers_ending_in_location_are_not_reassignment() {
        let obs = PageObservation {
            script_text: "var allocation = 5; relocation=allocation;".to_string(),
            ..PageObservation::default()
        };
        assert_eq!(run_analyzer(&ContentAnalyzer, &page(obs)).score, 0);
    }

    #[test]
    fn top_location_href_reassignment_fires() {
        let obs = PageObservation {
            script_text: "top.location.href='https://evil.test/'".to_string(),
            ..PageObservation::default()
        };
        assert_eq!(run_analyzer(&ContentAnalyzer, &page(obs)).score, 15);
    }

    #[test]
    fn everything_at_once_caps_at_50() {
        let obs = PageObservation {
            text: "urgent action required".to_string(),
            forms: FormSummary {
                form_count: 2,
                has_password_field: true,
                hidden_field_count: 9,
                has_external_action: true,
            },
            script_text: "document.write('<p>')".to_string(),
        };
        let res = run_analyzer(&ContentAnalyzer, &page(obs));
        assert_eq!(res.issues.len(), 5);
        assert_eq!(res.score, CONTENT_CAP);
    }

    #[test]
    fn extraction_error_is_absorbed() {
        let broken = RenderedPage {
            observation_error: Some("execution context was destroyed".to_string()),
            ..RenderedPage::default()
        };
        let res = run_analyzer(&ContentAnalyzer, &broken);
        assert_eq!(res.score, 0);
        assert_eq!(
            res.issues,
            vec!["content analysis error: execution context was destroyed"]
        );
    }

    #[test]
    fn missing_observation_scores_nothing() {
        let res = run_analyzer(&ContentAnalyzer, &RenderedPage::default());
        assert_eq!(res, crate::core::types::SignalResult::empty());
    }
}
