use url::{Host, Url};

use crate::core::error::ScanError;

/// A URL that passed validation: scheme is `http` or `https` and a host is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    raw: String,
    url: Url,
}

impl ParsedUrl {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Host as the URL parser normalized it (lowercase, punycode for IDNs).
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Host with punycode labels decoded back to Unicode.
    pub fn unicode_host(&self) -> String {
        let (decoded, result) = idna::domain_to_unicode(self.host());
        if result.is_err() {
            return self.host().to_string();
        }
        decoded
    }

    pub fn is_ipv4_literal(&self) -> bool {
        matches!(self.url.host(), Some(Host::Ipv4(_)))
    }

    /// Explicit port, if any. Default ports for the scheme are folded away by the parser.
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub fn parse_url(input: &str) -> Result<ParsedUrl, ScanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidUrl("empty url".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| ScanError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ScanError::UnsupportedScheme(other.to_string())),
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(ScanError::InvalidUrl(format!("{trimmed}: missing host")));
    }
    Ok(ParsedUrl {
        raw: trimmed.to_string(),
        url,
    })
}

/// Lowercased hostname of an arbitrary URL string, if it parses.
pub fn hostname_of(input: &str) -> Option<String> {
    Url::parse(input)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .filter(|h| !h.is_empty())
}
