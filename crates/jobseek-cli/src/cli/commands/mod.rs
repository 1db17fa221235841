//! CLI command handlers.

use std::sync::Arc;

use anyhow::Result;
use jobseek_session::config::Config;
use jobseek_session::storage::{CookieJar, FileStorage, KeyValueStore};
use jobseek_session::transport::HttpTransport;
use jobseek_session::upload::HttpUploader;
use jobseek_session::{SessionClient, SessionOps};

use crate::cli::notice::ConsoleNotifier;

pub mod auth;
pub mod config;
pub mod profile;

/// Wires a session client to the configured API and the on-disk session file.
pub fn build_client(config: &Config) -> Result<SessionClient> {
    let storage = Arc::new(FileStorage::default_location());
    tracing::debug!(path = %storage.path().display(), "using session storage");

    let local: Arc<dyn KeyValueStore> = Arc::<FileStorage>::clone(&storage);
    let cookies: Arc<dyn CookieJar> = storage;

    let transport = HttpTransport::from_config(config)?.with_cookie_jar(Arc::clone(&cookies));
    let uploader = HttpUploader::new(&config.upload, config.request_timeout())?;

    let ops = SessionOps::new(
        Arc::new(transport),
        Arc::new(uploader),
        local,
        cookies,
        Arc::new(ConsoleNotifier),
    );
    Ok(SessionClient::new(ops))
}
