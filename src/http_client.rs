use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// One client per process; callers clone it into each collaborator.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("club_dashboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")
}
