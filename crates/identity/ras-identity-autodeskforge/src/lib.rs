//! Autodesk Forge identity provider.
//!
//! Implements the ras-identity-core [`Provider`] and [`Session`] traits for
//! `developer.api.autodesk.com`. The OAuth2 mechanics (authorization URL,
//! code exchange, refresh) are delegated to the `oauth2` crate; this crate
//! only knows the Forge endpoints and how to map the Forge user profile.

mod config;
mod error;
mod provider;
mod session;
mod types;


pub use config::{
    AutodeskForgeConfig, DEFAULT_CALLBACK_URL, ENV_CALLBACK_URL, ENV_CLIENT_ID, ENV_CLIENT_SECRET,
    ENV_ENDPOINT_BASE, ENV_SCOPES, Endpoints, FORGE_API_BASE,
};
pub use error::{ConfigError, ConfigResult};
pub use provider::{AutodeskForgeProvider, PROVIDER_NAME};
pub use session::AutodeskForgeSession;
pub use types::{ForgeUserProfile, ProfileImages};

// Re-export common types for convenience
pub use ras_identity_core::{IdentityError, IdentityResult, Params, Provider, Session, Token, User};
