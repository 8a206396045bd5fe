//! Autodesk Forge configuration types.

use crate::error::{ConfigError, ConfigResult};
use crate::provider::AutodeskForgeProvider;
use serde::{Deserialize, Serialize};
use url::Url;

pub const FORGE_API_BASE: &str = "https://developer.api.autodesk.com";

const AUTHORIZE_PATH: &str = "/authentication/v1/authorize";
const TOKEN_PATH: &str = "/authentication/v1/gettoken";
const USER_PROFILE_PATH: &str = "/userprofile/v1/users/@me";

pub const ENV_CLIENT_ID: &str = "ADSK_FORGE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ADSK_FORGE_CLIENT_SECRET";
pub const ENV_CALLBACK_URL: &str = "ADSK_FORGE_CALLBACK_URL";
pub const ENV_SCOPES: &str = "ADSK_FORGE_SCOPES";
pub const ENV_ENDPOINT_BASE: &str = "ADSK_FORGE_ENDPOINT_BASE";

pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:3000/auth/autodeskforge/callback";

/// The three Forge URLs the provider talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize: Url,
    pub token: Url,
    pub user_profile: Url,
}

impl Endpoints {
    /// Build the endpoints below an alternate API host, e.g. a sandbox or a
    /// mock server.
    pub fn from_base(base: &str) -> ConfigResult<Self> {
        let base = base.trim_end_matches('/');
        Ok(Self {
            authorize: Url::parse(&format!("{base}{AUTHORIZE_PATH}"))?,
            token: Url::parse(&format!("{base}{TOKEN_PATH}"))?,
            user_profile: Url::parse(&format!("{base}{USER_PROFILE_PATH}"))?,
        })
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_base(FORGE_API_BASE).expect("Forge API base is a valid URL")
    }
}

/// Autodesk Forge provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutodeskForgeConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Replaces `https://developer.api.autodesk.com` for every endpoint
    #[serde(default)]
    pub endpoint_base: Option<String>,
}

impl AutodeskForgeConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            scopes: Vec::new(),
            endpoint_base: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_endpoint_base(mut self, base: impl Into<String>) -> Self {
        self.endpoint_base = Some(base.into());
        self
    }

    /// Read the configuration from `ADSK_FORGE_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let client_id = required(ENV_CLIENT_ID)?;
        let client_secret = required(ENV_CLIENT_SECRET)?;
        let callback_url =
            lookup(ENV_CALLBACK_URL).unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string());
        let scopes = lookup(ENV_SCOPES)
            .map(|value| value.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        let endpoint_base = lookup(ENV_ENDPOINT_BASE).filter(|value| !value.is_empty());

        Ok(Self {
            client_id,
            client_secret,
            callback_url,
            scopes,
            endpoint_base,
        })
    }

    pub fn endpoints(&self) -> ConfigResult<Endpoints> {
        match &self.endpoint_base {
            Some(base) => Endpoints::from_base(base),
            None => Ok(Endpoints::default()),
        }
    }

    pub fn into_provider(self) -> ConfigResult<AutodeskForgeProvider> {
        let endpoints = self.endpoints()?;
        Ok(
            AutodeskForgeProvider::new(self.client_id, self.client_secret, self.callback_url)
                .with_scopes(self.scopes)
                .with_endpoints(endpoints),
        )
    }
}
