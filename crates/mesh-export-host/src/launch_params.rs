//! Launch parameter parsing for the host.
//!
//! Parameters come from command-line arguments, with the model id and access
//! token also read from the environment so they stay out of shell history.

use std::time::Duration;

use clap::Parser;
use mesh_export::{Client, Session};

use crate::poll::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollPolicy};

/// Launch parameters for the host.
#[derive(Parser, Debug)]
#[command(about = "Resolve a model's 3D Tiles export and compute its scene alignment")]
pub struct LaunchParams {
    /// Identifier of the model whose export to load.
    #[arg(long, env = "IMODEL_ID")]
    pub model_id: String,

    /// Access token, either raw or already prefixed with its scheme
    /// (e.g. `Bearer eyJ...`).
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Override the export service base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seconds to wait between listing requests while the export is not ready.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub poll_interval_secs: u64,

    /// Number of listing requests before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,
}

impl LaunchParams {
    /// Build the session, adding the `Bearer` scheme to raw tokens.
    pub fn session(&self) -> mesh_export::Result<Session> {
        if self.access_token.trim().contains(' ') {
            Session::new(self.access_token.as_str())
        } else {
            Session::bearer(&self.access_token)
        }
    }

    /// Build the export client.
    pub fn client(&self) -> Client {
        match &self.base_url {
            Some(base_url) => Client::new().with_base_url(base_url.clone()),
            None => Client::new(),
        }
    }

    /// Polling policy for the export listing.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_attempts,
        }
    }
}

/// Parse launch parameters from the command line and environment.
pub fn parse() -> LaunchParams {
    LaunchParams::parse()
}
