//! Example showing a complete Autodesk Forge login from the terminal
//!
//! This example demonstrates:
//! 1. Loading the provider configuration from `ADSK_FORGE_*` variables (or `.env`)
//! 2. Persisting the session across the redirect
//! 3. Exchanging the authorization code and fetching the user profile
//!
//! Run with `ADSK_FORGE_CLIENT_ID`, `ADSK_FORGE_CLIENT_SECRET` and
//! `ADSK_FORGE_CALLBACK_URL` set, open the printed URL, then paste the `code`
//! query parameter of the callback.

use anyhow::{Context, Result};
use ras_identity_autodeskforge::{AutodeskForgeConfig, Provider, Session};
use std::collections::HashMap;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let provider = AutodeskForgeConfig::from_env()
        .context("Autodesk Forge configuration is incomplete")?
        .into_provider()
        .context("Autodesk Forge endpoint base is not a valid URL")?;

    println!("Autodesk Forge login - {}", provider.name());
    println!("==============================");

    let state = uuid::Uuid::new_v4().to_string();
    let session = provider.begin_auth(&state)?;
    let stored = session.marshal()?;

    println!("\n1. Open this URL in a browser:\n\n   {}\n", session.auth_url()?);
    print!("2. Paste the `code` parameter from the callback: ");
    std::io::stdout().flush()?;

    let mut code = String::new();
    std::io::stdin().read_line(&mut code)?;

    let mut params = HashMap::new();
    params.insert("code".to_string(), code.trim().to_string());
    params.insert("state".to_string(), state);

    let mut session = provider.unmarshal_session(&stored)?;
    session
        .authorize(&provider, &params)
        .await
        .context("Code exchange failed")?;
    info!("Authorization code exchanged");

    let user = provider.fetch_user(&session).await?;

    println!("\n3. Signed in:");
    println!("   user id:  {}", user.user_id);
    println!("   nickname: {}", user.nick_name);
    println!("   name:     {} {}", user.first_name, user.last_name);
    println!("   email:    {}", user.email);
    println!("   location: {}", user.location);
    println!("   avatar:   {}", user.avatar_url);

    if provider.refresh_token_available() && !session.refresh_token.is_empty() {
        let token = provider.refresh_token(&session.refresh_token).await?;
        println!(
            "\n4. Refreshed access token, expires at {}",
            token
                .expires_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }

    Ok(())
}
