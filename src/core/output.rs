use std::fs;
use std::path::Path;

use crate::core::error::ScanError;
use crate::core::types::{AiAnalysis, BatchReport, FinalResult, QuickCheckResult, SignalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Markdown,
}

/// Anything the CLI can print.
#[derive(Debug, Clone, Copy)]
pub enum Report<'a> {
    Analysis(&'a FinalResult),
    Quick(&'a QuickCheckResult),
    Batch(&'a BatchReport),
}

pub fn render_report(report: Report<'_>, format: OutputFormat) -> Result<String, ScanError> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Jsonl => render_jsonl(report),
        OutputFormat::Markdown => Ok(render_markdown(report)),
    }
}

pub fn write_report(report: Report<'_>, format: OutputFormat, path: &Path) -> Result<(), ScanError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = render_report(report, format)?;
    fs::write(path, body)?;
    Ok(())
}

fn render_json(report: Report<'_>) -> Result<String, ScanError> {
    let json = match report {
        Report::Analysis(res) => serde_json::to_string_pretty(res)?,
        Report::Quick(res) => serde_json::to_string_pretty(res)?,
        Report::Batch(res) => serde_json::to_string_pretty(res)?,
    };
    Ok(json)
}

/// One object per line; a batch emits its summary, then one line per URL.
fn render_jsonl(report: Report<'_>) -> Result<String, ScanError> {
    let mut lines = String::new();
    match report {
        Report::Analysis(res) => lines.push_str(&serde_json::to_string(res)?),
        Report::Quick(res) => lines.push_str(&serde_json::to_string(res)?),
        Report::Batch(res) => {
            let mut rows = vec![serde_json::to_string(&serde_json::json!({
                "summary": res.summary
            }))?];
            for item in &res.results {
                rows.push(serde_json::to_string(item)?);
            }
            lines.push_str(&rows.join("\n"));
        }
    }
    lines.push('\n');
    Ok(lines)
}

fn render_markdown(report: Report<'_>) -> String {
    match report {
        Report::Analysis(res) => analysis_markdown(res),
        Report::Quick(res) => quick_markdown(res),
        Report::Batch(res) => batch_markdown(res),
    }
}

fn push_signal(out: &mut String, name: &str, signal: &SignalResult) {
    out.push_str(&format!("### {} ({})\n", name, signal.score));
    if signal.issues.is_empty() {
        out.push_str("- no issues\n");
    }
    for issue in &signal.issues {
        out.push_str(&format!("- {issue}\n"));
    }
    out.push('\n');
}

fn analysis_markdown(res: &FinalResult) -> String {
    let r = &res.result;
    let mut out = String::new();
    out.push_str(&format!("# URL analysis: {}\n\n", r.url));
    out.push_str(&format!(
        "- Risk: **{}** ({}/100)\n- Analyzed: {}\n- Duration: {} ms\n",
        r.risk_level,
        r.risk_score,
        r.timestamp.to_rfc3339(),
        r.analysis_time_ms
    ));
    if let Some(title) = &r.page_title {
        out.push_str(&format!("- Title: {title}\n"));
    }
    if let Some(final_url) = &r.final_url {
        out.push_str(&format!("- Final URL: {final_url}\n"));
    }
    out.push_str(&format!(
        "- Requests: {} across {} domains\n\n",
        r.network_summary.total_requests,
        r.network_summary.domains.len()
    ));

    out.push_str("## Heuristics\n\n");
    push_signal(&mut out, "Domain", &r.details.domain);
    push_signal(&mut out, "Content", &r.details.content);
    push_signal(&mut out, "Network", &r.details.network);
    push_signal(&mut out, "Navigation", &r.details.navigation);

    out.push_str("## AI\n\n");
    match &res.ai_analysis {
        AiAnalysis::NotParticipated { reason } => {
            out.push_str(&format!("_Not used: {reason}_\n"));
        }
        AiAnalysis::Participated {
            heuristic_score,
            heuristic_level,
            ai_score,
            ai_level,
            summary,
            findings,
            recommendations,
            confidence,
        } => {
            out.push_str(&format!(
                "- Heuristic: {heuristic_level} ({heuristic_score})\n- AI: {ai_level} ({ai_score}), confidence {confidence}\n"
            ));
            if !summary.is_empty() {
                out.push_str(&format!("- Summary: {summary}\n"));
            }
            for f in findings {
                out.push_str(&format!(
                    "- [{}/{}] {}\n",
                    f.category, f.severity, f.description
                ));
            }
            for rec in recommendations {
                out.push_str(&format!("- Recommended: {rec}\n"));
            }
        }
    }
    out
}

fn quick_markdown(res: &QuickCheckResult) -> String {
    let mut out = format!("# Quick check: {}\n\n", res.url);
    out.push_str(&format!(
        "- Valid: {}\n- Risk: **{}** ({}/100)\n- {}\n",
        res.valid, res.risk_level, res.risk_score, res.message
    ));
    for issue in res.issues.iter().flatten() {
        out.push_str(&format!("- Issue: {issue}\n"));
    }
    out
}

fn batch_markdown(res: &BatchReport) -> String {
    let s = &res.summary;
    let mut out = String::from("# Batch quick check\n\n");
    out.push_str(&format!(
        "Total {} | safe {} | warning {} | danger {} | invalid {}\n\n",
        s.total, s.safe, s.warning, s.danger, s.invalid
    ));
    out.push_str("| URL | Level | Score | Issues |\n|---|---|---|---|\n");
    for r in &res.results {
        let issues = r
            .issues
            .as_ref()
            .map(|i| i.join("; "))
            .unwrap_or_else(|| r.message.clone());
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            r.url.replace('|', "%7C"),
            r.risk_level,
            r.risk_score,
            issues
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::quick::{batch_quick_check, quick_check};

    #[test]
    fn batch_jsonl_leads_with_summary_then_one_line_per_url() {
        let report = batch_quick_check(&["https://example.com", "bogus"]);
        let out = render_report(Report::Batch(&report), OutputFormat::Jsonl).unwrap();
        let rows: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["summary"]["total"], 2);
        assert_eq!(rows[0]["summary"]["invalid"], 1);
        assert_eq!(rows[2]["valid"], false);
    }

    #[test]
    fn markdown_levels_are_lowercase() {
        let res = quick_check("https://example.com/");
        let md = render_report(Report::Quick(&res), OutputFormat::Markdown).unwrap();
        assert!(md.contains("Risk: **safe** (0/100)"));

        let report = batch_quick_check(&["https://example.com", "bogus"]);
        let md = render_report(Report::Batch(&report), OutputFormat::Markdown).unwrap();
        assert!(md.contains("| https://example.com | safe | 0 |"));
        assert!(md.contains("| bogus | unknown | 0 |"));
    }

    #[test]
    fn quick_markdown_lists_issues() {
        let res = quick_check("http://192.0.2.10/");
        let md = render_report(Report::Quick(&res), OutputFormat::Markdown).unwrap();
        assert!(md.contains("direct IP address access"));
        assert!(md.contains("HTTPS not used"));
    }
}
