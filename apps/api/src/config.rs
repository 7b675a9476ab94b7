use std::path::PathBuf;

use anyhow::{Context, Result};

/// Process configuration loaded from environment variables.
///
/// Everything the user edits at runtime (SMTP, sender identity, file paths)
/// lives in [`crate::settings::Settings`] instead; this only covers what the
/// process needs before it can serve a request.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory every relative path in the settings tree resolves against.
    pub base_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let base_dir = PathBuf::from(env_or("FINDINT_BASE_DIR", "."));
        let settings_path = base_dir.join(env_or("FINDINT_SETTINGS_PATH", "config.local.toml"));

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            base_dir,
            settings_path,
        })
    }

    #[cfg(test)]
    pub fn rooted_at(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            settings_path: base_dir.join("config.local.toml"),
            base_dir,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
