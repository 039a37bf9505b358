use std::{collections::HashMap, fs};

use anyhow::{bail, Context, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub judge_url: String,
    pub database_url: String,
    pub user: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            judge_url: "http://127.0.0.1:8080".into(),
            database_url: "sqlite://./data/workbench.db".into(),
            user: "guest".into(),
        }
    }
}

/// Defaults, overlaid by the TOML file (if present), overlaid by env vars.
/// CLI flags are applied on top by the caller.
pub fn load_settings(config_path: &str) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("judge_url") {
                settings.judge_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("user") {
                settings.user = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("JUDGE_URL") {
        settings.judge_url = v;
    }
    if let Ok(v) = std::env::var("APP__JUDGE_URL") {
        settings.judge_url = v;
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Ok(v) = std::env::var("WORKBENCH_USER") {
        settings.user = v;
    }
    if let Ok(v) = std::env::var("APP__USER") {
        settings.user = v;
    }

    settings
}

pub fn validate_judge_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid judge url '{raw}'"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("judge url must use http or https, got '{raw}'");
    }
    Ok(raw.trim_end_matches('/').to_string())
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
