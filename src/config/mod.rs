use std::{fs, path::Path};

use serde::Deserialize;

use crate::core::error::ScanError;

pub const DEFAULT_CONFIG_PATH: &str = "config/lure-scan.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render_timeout_ms: u64,
    pub analysis_deadline_ms: u64,
    pub max_batch_urls: usize,
    pub max_concurrent_analyses: usize,
    pub user_agent: String,
    pub ai: AiConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "LURE_SCAN_AI_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl AiConfig {
    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: 30_000,
            analysis_deadline_ms: 60_000,
            max_batch_urls: 10,
            max_concurrent_analyses: 4,
            user_agent: "lure-scan/1.0 (+url risk analysis)".to_string(),
            ai: AiConfig::default(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, ScanError> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ScanError::Config(e.to_string()))?;
    let cfg: AppConfig = toml::from_str(&content).map_err(|e| ScanError::Config(e.to_string()))?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &AppConfig) -> Result<(), ScanError> {
    if cfg.max_batch_urls == 0 {
        return Err(ScanError::Config("max_batch_urls must be at least 1".into()));
    }
    if cfg.max_concurrent_analyses == 0 {
        return Err(ScanError::Config(
            "max_concurrent_analyses must be at least 1".into(),
        ));
    }
    if cfg.render_timeout_ms == 0 || cfg.analysis_deadline_ms == 0 {
        return Err(ScanError::Config("timeouts must be non-zero".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config(Some("does/not/exist.toml")).unwrap();
        assert_eq!(cfg.max_batch_urls, 10);
        assert!(!cfg.ai.enabled);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let dir = std::env::temp_dir().join("lure_scan_cfg_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        fs::write(
            &path,
            "render_timeout_ms = 5000\n[ai]\nenabled = true\nmodel = \"local\"\n",
        )
        .unwrap();
        let cfg = load_config(path.to_str()).unwrap();
        assert_eq!(cfg.render_timeout_ms, 5000);
        assert_eq!(cfg.analysis_deadline_ms, 60_000);
        assert!(cfg.ai.enabled);
        assert_eq!(cfg.ai.model, "local");
        assert_eq!(cfg.ai.timeout_ms, 30_000);
    }

    #[test]
    fn zero_batch_cap_is_rejected() {
        let dir = std::env::temp_dir().join("lure_scan_cfg_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("zero.toml");
        fs::write(&path, "max_batch_urls = 0\n").unwrap();
        assert!(matches!(
            load_config(path.to_str()),
            Err(ScanError::Config(_))
        ));
    }
}
