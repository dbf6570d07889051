//! Process configuration, built once in `main` and injected.

use anyhow::Context;

use topup_core::ChannelId;

/// Runtime configuration for the API process.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener on.
    pub bind_addr: String,
    /// The one channel allowed to decide tickets.
    pub admin_channel: ChannelId,
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
}

impl ApiConfig {
    /// Read configuration from the environment.
    ///
    /// `ADMIN_CHANNEL_ID` is required; `BIND_ADDR` and `DATABASE_URL` are
    /// optional.
    pub fn from_env() -> anyhow::Result<Self> {
        let admin_channel = std::env::var("ADMIN_CHANNEL_ID")
            .context("ADMIN_CHANNEL_ID is not set")?
            .parse::<i64>()
            .context("ADMIN_CHANNEL_ID must be an integer channel id")?;

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            admin_channel: ChannelId::new(admin_channel),
            database_url: std::env::var("DATABASE_URL").ok(),
        })
    }
}
