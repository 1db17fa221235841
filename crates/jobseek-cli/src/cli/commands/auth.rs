//! Auth command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use jobseek_session::config::Config;
use jobseek_session::session::mask_token;
use jobseek_session::storage::FileStorage;
use jobseek_session::{Credentials, SessionClient};

use super::build_client;

pub async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let client = build_client(config)?;
    let session = client.login(&Credentials::new(email, password)).await?;

    if let Some(token) = session.access_token() {
        println!("  Access token: {}", mask_token(token));
    }
    println!("  Session saved to: {}", FileStorage::default_path().display());
    Ok(())
}

fn read_password() -> Result<String> {
    if io::stdin().is_terminal() {
        print!("Password: ");
        io::stdout().flush()?;
    }
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("read password from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn refresh(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    match client.refresh_token().await? {
        Some(session) => {
            let token = mask_token(session.access_token().unwrap_or_default());
            client
                .ops()
                .notifier()
                .success(&format!("Session refreshed (token: {token})"));
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let Some(session) = client.refresh_token().await? else {
        println!("Not logged in.");
        return Ok(());
    };
    let user = serde_json::to_string_pretty(&session.user()).context("render user")?;
    println!("{user}");
    Ok(())
}

pub async fn logout(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    client.logout().await;
    Ok(())
}

/// Restores the session for commands that need an access token.
pub(super) async fn require_session(client: &SessionClient) -> Result<()> {
    if client.refresh_token().await?.is_none() {
        anyhow::bail!("Not logged in. Run `jobseek login` first.");
    }
    Ok(())
}
