use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::cli::config::{collect_batch_urls, resolve_config, RunConfig};
use crate::cli::flags::{Cli, Command};
use crate::config::{load_config, AppConfig};
use crate::core::engine::{AnalyzeOptions, Engine};
use crate::core::output::{render_report, write_report, Report};
use crate::core::types::FinalResult;
use crate::pipeline::quick::{batch_quick_check, enforce_batch_cap, quick_check};
use crate::sources::ai::AiBackend;
use crate::sources::render::{FixtureRenderer, PageRenderer, StaticHtmlRenderer};

pub async fn run(cli: Cli) -> Result<()> {
    let run_cfg = resolve_config(&cli);
    let app_cfg = load_config(run_cfg.config_path.as_deref())?;

    match cli.command {
        Command::Check { url } => {
            let res = quick_check(&url);
            emit(Report::Quick(&res), &run_cfg)
        }
        Command::Analyze {
            url,
            page,
            no_render,
            no_ai,
            deadline_ms,
        } => {
            let opts = AnalyzeOptions {
                render: !no_render,
                use_ai: !no_ai,
                deadline: deadline_ms.map(Duration::from_millis),
            };
            let res = run_analyze(app_cfg, &url, page.as_deref(), opts).await?;
            emit(Report::Analysis(&res), &run_cfg)
        }
        Command::Batch { urls, file } => {
            let urls = collect_batch_urls(&urls, file.as_deref())?;
            enforce_batch_cap(urls.len(), app_cfg.max_batch_urls)?;
            let report = batch_quick_check(&urls);
            let s = &report.summary;
            tracing::info!(
                "batch of {}: {} safe, {} warning, {} danger, {} invalid",
                s.total,
                s.safe,
                s.warning,
                s.danger,
                s.invalid
            );
            emit(Report::Batch(&report), &run_cfg)
        }
    }
}

async fn run_analyze(
    cfg: AppConfig,
    url: &str,
    page: Option<&Path>,
    opts: AnalyzeOptions,
) -> Result<FinalResult> {
    let ai = if opts.use_ai {
        AiBackend::from_config(&cfg.ai, &cfg.user_agent)?
    } else {
        AiBackend::Disabled
    };

    match page {
        Some(path) => {
            let renderer = FixtureRenderer::from_path(path)?;
            analyze_with(Engine::new(cfg, renderer, ai), url, opts).await
        }
        None => {
            let renderer = StaticHtmlRenderer::new(
                &cfg.user_agent,
                Duration::from_millis(cfg.render_timeout_ms),
            )?;
            analyze_with(Engine::new(cfg, renderer, ai), url, opts).await
        }
    }
}

async fn analyze_with<R: PageRenderer>(
    engine: Engine<R, AiBackend>,
    url: &str,
    opts: AnalyzeOptions,
) -> Result<FinalResult> {
    Ok(engine.analyze(url, opts).await?)
}

fn emit(report: Report<'_>, cfg: &RunConfig) -> Result<()> {
    match &cfg.output {
        Some(path) => {
            write_report(report, cfg.format, path)?;
            tracing::info!("report written to {}", path.display());
        }
        None => println!("{}", render_report(report, cfg.format)?.trim_end()),
    }
    Ok(())
}
