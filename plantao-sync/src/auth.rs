//! Bearer-credential resolution for the blob host.
//!
//! Resolution order: explicit value → per-user secrets file → environment.
//! Requests without a resolvable credential go out unauthenticated, which
//! is fine for public repositories.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable consulted last.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Deserialize)]
struct SecretsFile {
    github_token: Option<String>,
}

/// Default secrets file location: `<config-dir>/plantao/secrets.json`.
#[must_use]
pub fn default_secrets_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("plantao").join("secrets.json"))
}

/// Reads the `github_token` key from a secrets file, if present and valid.
#[must_use]
pub fn token_from_secrets_file(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let secrets: SecretsFile = serde_json::from_str(&raw).ok()?;
    secrets.github_token.filter(|t| !t.trim().is_empty())
}

/// Resolves the bearer credential: explicit parameter, then the secrets
/// file, then [`TOKEN_ENV_VAR`]. Returns `None` when no source has one.
#[must_use]
pub fn resolve_token(explicit: Option<&str>) -> Option<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    if let Some(token) = default_secrets_path()
        .as_deref()
        .and_then(token_from_secrets_file)
    {
        debug!("bearer credential resolved from secrets file");
        return Some(token);
    }
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
