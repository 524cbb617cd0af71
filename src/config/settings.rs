use std::{env, time::Duration};

use anyhow::Context;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub allowed_origin: String,
    pub sweep_interval: Duration,
    pub event_capacity: usize,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a valid port number")?,
            Err(_) => 8000,
        };

        let allowed_origin =
            env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let sweep_interval_secs = match env::var("SWEEP_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse()
                .context("SWEEP_INTERVAL_SECS must be a number of seconds")?,
            Err(_) => 3600,
        };

        let event_capacity = match env::var("EVENT_CHANNEL_CAPACITY") {
            Ok(raw) => raw
                .parse()
                .context("EVENT_CHANNEL_CAPACITY must be a positive integer")?,
            Err(_) => 256,
        };

        Ok(Self {
            port,
            allowed_origin,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            event_capacity,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origin: "http://localhost:3000".to_string(),
            sweep_interval: Duration::from_secs(3600),
            event_capacity: 256,
        }
    }
}
