use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::SimId;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub page_limit: u32,
    pub usage_days: u32,
    pub throttle_reduction_pct: f64,
    pub sample_ids: Vec<SimId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            request_timeout_secs: 15,
            page_limit: 200,
            usage_days: 30,
            throttle_reduction_pct: 65.0,
            sample_ids: ["2001", "2002", "2003", "2004", "2005"]
                .into_iter()
                .map(SimId::from)
                .collect(),
        }
    }
}

/// Keys accepted in `console.toml`. Anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    request_timeout_secs: Option<u64>,
    page_limit: Option<u32>,
    usage_days: Option<u32>,
    throttle_reduction_pct: Option<f64>,
    sample_ids: Option<Vec<String>>,
}

/// Defaults, then `path` if it exists, then environment overrides looked up
/// through `env`.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    if let Some(v) = env("FLEET_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_env("APP__REQUEST_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = env("APP__PAGE_LIMIT") {
        settings.page_limit = parse_env("APP__PAGE_LIMIT", &v)?;
    }
    if let Some(v) = env("APP__USAGE_DAYS") {
        settings.usage_days = parse_env("APP__USAGE_DAYS", &v)?;
    }
    if let Some(v) = env("APP__THROTTLE_REDUCTION_PCT") {
        settings.throttle_reduction_pct = parse_env("APP__THROTTLE_REDUCTION_PCT", &v)?;
    }

    settings.api_base = normalize_api_base(&settings.api_base);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base {
        settings.api_base = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.page_limit {
        settings.page_limit = v;
    }
    if let Some(v) = file_cfg.usage_days {
        settings.usage_days = v;
    }
    if let Some(v) = file_cfg.throttle_reduction_pct {
        settings.throttle_reduction_pct = v;
    }
    if let Some(v) = file_cfg.sample_ids {
        settings.sample_ids = v.into_iter().map(SimId::from).collect();
    }
}

fn parse_env<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value '{raw}' for {key}"))
}

pub fn normalize_api_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_BASE.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
