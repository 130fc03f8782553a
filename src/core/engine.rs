use std::{sync::Arc, time::Duration};

use tokio::sync::Semaphore;

use crate::{
    config::AppConfig,
    core::{
        error::ScanError,
        time::{now_utc, Deadline},
        types::{AiOutcome, AiSkipReason, FinalResult, RenderOutcome},
        url::{parse_url, ParsedUrl},
    },
    pipeline::{escalator::fuse, scorer::score_heuristics},
    sources::{
        ai::{AiClassifier, AiRequest},
        render::PageRenderer,
    },
};

/// Per-call switches for the full path.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub render: bool,
    pub use_ai: bool,
    /// Overall budget; falls back to `analysis_deadline_ms`.
    pub deadline: Option<Duration>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            render: true,
            use_ai: true,
            deadline: None,
        }
    }
}

pub struct Engine<R, A> {
    pub config: AppConfig,
    renderer: R,
    classifier: A,
    semaphore: Arc<Semaphore>,
}

impl<R: PageRenderer, A: AiClassifier> Engine<R, A> {
    pub fn new(config: AppConfig, renderer: R, classifier: A) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_analyses.max(1))),
            config,
            renderer,
            classifier,
        }
    }

    /// Full path. Only URL validation errors are returned; collaborator
    /// failures are folded into the result.
    pub async fn analyze(&self, input: &str, opts: AnalyzeOptions) -> Result<FinalResult, ScanError> {
        let url = parse_url(input)?;
        let budget = opts
            .deadline
            .unwrap_or_else(|| Duration::from_millis(self.config.analysis_deadline_ms));
        // Queueing behind the limiter spends the same budget.
        let deadline = Deadline::new(budget);
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ScanError::Config("analysis limiter closed".into()))?;
        tracing::info!("analyzing {}", url.as_str());

        let render = if opts.render {
            self.render_within(&url, &deadline).await
        } else {
            RenderOutcome::Skipped("rendering disabled".to_string())
        };
        if let Some(reason) = render.navigation_error() {
            tracing::warn!("render of {} failed: {}", url.as_str(), reason);
        }

        let heuristic = score_heuristics(&url, &render, deadline.elapsed_ms(), now_utc());

        let ai = if opts.use_ai {
            let page = render.page();
            let request = AiRequest {
                url: url.as_str(),
                page_title: page.and_then(|p| p.title.as_deref()),
                page_text: page
                    .and_then(|p| p.observation.as_ref())
                    .map(|o| o.text.as_str()),
                heuristic: &heuristic,
            };
            self.classify_within(&request, &deadline).await
        } else {
            AiOutcome::Skipped(AiSkipReason::Disabled)
        };

        let mut result = fuse(heuristic, ai);
        result.result.analysis_time_ms = deadline.elapsed_ms();
        tracing::info!(
            "{} scored {} ({}) in {} ms",
            url.as_str(),
            result.risk_score(),
            result.risk_level(),
            result.result.analysis_time_ms
        );
        Ok(result)
    }

    /// Dropping the render future on timeout is what releases the renderer's resources.
    async fn render_within(&self, url: &ParsedUrl, deadline: &Deadline) -> RenderOutcome {
        let limit = deadline.clamp(Duration::from_millis(self.config.render_timeout_ms));
        match tokio::time::timeout(limit, self.renderer.render(url)).await {
            Ok(outcome) => outcome,
            Err(_) => RenderOutcome::Failed {
                reason: format!("navigation timeout after {} ms", limit.as_millis()),
                partial: None,
            },
        }
    }

    async fn classify_within(&self, request: &AiRequest<'_>, deadline: &Deadline) -> AiOutcome {
        let limit = deadline.clamp(Duration::from_millis(self.config.ai.timeout_ms));
        if limit.is_zero() {
            return AiOutcome::Skipped(AiSkipReason::Unreachable(
                "analysis deadline reached before AI call".to_string(),
            ));
        }
        match tokio::time::timeout(limit, self.classifier.classify(request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("AI call for {} timed out", request.url);
                AiOutcome::Skipped(AiSkipReason::Unreachable(format!(
                    "timed out after {} ms",
                    limit.as_millis()
                )))
            }
        }
    }
}
