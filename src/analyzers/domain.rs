//! URL/domain shape heuristics. This is the only analyzer the quick path runs.

use std::sync::LazyLock;

use anyhow::Result;

use crate::analyzers::rules::{evaluate, PatternGroup, Rule, Tally};
use crate::analyzers::Analyzer;
use crate::core::types::SignalResult;
use crate::core::url::ParsedUrl;

pub const DOMAIN_CAP: u8 = 40;

const MAX_SUBDOMAINS: usize = 3;

/// Throwaway-TLD, digit-run, hyphen-run and Cyrillic homograph shapes.
static SUSPICIOUS_HOST: LazyLock<PatternGroup> = LazyLock::new(|| {
    PatternGroup::new(&[
        r"\d{4,}",
        r"-{2,}",
        r"(?i)\.(tk|ml|ga|cf|gq)$",
        r"[\p{Cyrillic}]",
    ])
});

static DOMAIN_RULES: [Rule<ParsedUrl>; 5] = [
    Rule {
        id: "ip-literal",
        points: 25,
        check: ip_literal,
    },
    Rule {
        id: "suspicious-host",
        points: 15,
        check: suspicious_host,
    },
    Rule {
        id: "deep-subdomains",
        points: 10,
        check: deep_subdomains,
    },
    Rule {
        id: "no-https",
        points: 15,
        check: no_https,
    },
    Rule {
        id: "nonstandard-port",
        points: 10,
        check: nonstandard_port,
    },
];

fn ip_literal(url: &ParsedUrl) -> Option<String> {
    url.is_ipv4_literal()
        .then(|| "direct IP address access".to_string())
}

fn suspicious_host(url: &ParsedUrl) -> Option<String> {
    // Cyrillic only survives in the decoded form; the parser hands back punycode.
    let ascii = url.host();
    let unicode = url.unicode_host();
    (SUSPICIOUS_HOST.is_match(ascii) || SUSPICIOUS_HOST.is_match(&unicode))
        .then(|| "suspicious domain pattern".to_string())
}

fn deep_subdomains(url: &ParsedUrl) -> Option<String> {
    let count = subdomain_count(url.host());
    (count > MAX_SUBDOMAINS).then(|| format!("excessive subdomains ({count})"))
}

fn no_https(url: &ParsedUrl) -> Option<String> {
    (!url.is_https()).then(|| "HTTPS not used".to_string())
}

fn nonstandard_port(url: &ParsedUrl) -> Option<String> {
    match url.port() {
        Some(80) | Some(443) | None => None,
        Some(port) => Some(format!("non-standard port ({port})")),
    }
}

/// Labels beyond `domain.tld`.
pub fn subdomain_count(host: &str) -> usize {
    host.trim_end_matches('.')
        .split('.')
        .filter(|label| !label.is_empty())
        .count()
        .saturating_sub(2)
}

pub struct DomainAnalyzer;

impl Analyzer for DomainAnalyzer {
    type Input = ParsedUrl;

    fn name(&self) -> &'static str {
        "domain"
    }

    fn cap(&self) -> u8 {
        DOMAIN_CAP
    }

    fn analyze(&self, url: &ParsedUrl) -> Result<Tally> {
        let mut tally = Tally::default();
        evaluate(&DOMAIN_RULES, url, &mut tally);
        Ok(tally)
    }
}

/// Shared entry point for the full and quick paths.
pub fn analyze_domain(url: &ParsedUrl) -> SignalResult {
    crate::analyzers::run_analyzer(&DomainAnalyzer, url)
}
