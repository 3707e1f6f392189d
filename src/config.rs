// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Process configuration, read once at startup and passed to the clients that need it.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Bearer token for the movie catalog API.
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub firebase_api_key: String,
    /// Root of the realtime database, e.g. `https://<project>.firebaseio.com`.
    pub firebase_database_url: String,
    pub identity_toolkit_url: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let tmdb_access_token = required("TMDB_ACCESS_TOKEN")?;
        let tmdb_base_url = get("TMDB_BASE_URL")
            .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let firebase_api_key = required("FIREBASE_API_KEY")?;
        let firebase_database_url = required("FIREBASE_DATABASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let identity_toolkit_url = get("IDENTITY_TOOLKIT_URL")
            .unwrap_or_else(|| DEFAULT_IDENTITY_TOOLKIT_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    var: "HTTP_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Config {
            tmdb_access_token,
            tmdb_base_url,
            firebase_api_key,
            firebase_database_url,
            identity_toolkit_url,
            http_timeout,
        })
    }

    /// Shared HTTP client for every REST collaborator.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                var: "HTTP_TIMEOUT_SECS",
                reason: e.to_string(),
            })
    }
}
