//! Base URL and API key for the results service.

use crate::error::ApiError;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-NI-API-KEY";

pub const BASE_URL_ENV: &str = "TESTMONITOR_BASE_URL";
pub const API_KEY_ENV: &str = "TESTMONITOR_API_KEY";

/// Connection settings plus the auth headers derived from them.
///
/// `headers` is regenerated whenever the key changes, so it never goes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    api_key: String,
    headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            headers: auth_headers(api_key),
        }
    }

    /// Load from `TESTMONITOR_BASE_URL` and `TESTMONITOR_API_KEY`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. The base URL is required; a
    /// missing key falls back to the empty string.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{BASE_URL_ENV} is not set")))?;
        let api_key = lookup(API_KEY_ENV).unwrap_or_default();
        Ok(Self::new(&base_url, &api_key))
    }

    /// Replace both values and regenerate the auth headers. No format
    /// validation is performed on either value.
    pub fn set_base_url_and_api_key(&mut self, server_url: &str, key: &str) {
        self.base_url = server_url.to_string();
        self.api_key = key.to_string();
        self.headers = auth_headers(key);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Join `route` onto the base URL with exactly one `/` between them.
    pub fn url_for(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

fn auth_headers(api_key: &str) -> Vec<(String, String)> {
    vec![(API_KEY_HEADER.to_string(), api_key.to_string())]
}
