//! Mailer service configuration

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Configuration for a mailer service instance.
///
/// Fixed at startup and never mutated afterwards: the delivery
/// strategy is chosen once from `fake`, and the SMTP settings are
/// baked into the transport when the service starts.
///
/// Deserializes from a JSON deployment object with per-field defaults,
/// so `{ "address": "test.mailer", "fake": true }` is a complete
/// configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailerConfig {
    /// Logical inbound endpoint name, used to identify the service in
    /// logs and on its handle.
    pub address: String,
    /// Use simulated delivery instead of a real SMTP transport.
    pub fake: bool,
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Connect with implicit TLS.
    pub ssl: bool,
    /// Authenticate with `username`/`password`.
    pub auth: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// SMTP I/O timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            address: "mailer".to_string(),
            fake: false,
            host: "localhost".to_string(),
            port: 25,
            ssl: false,
            auth: false,
            username: None,
            password: None,
            timeout_ms: 120_000,
        }
    }
}

impl MailerConfig {
    /// Load mailer configuration from environment variables.
    ///
    /// Reads from `.env` file if present. All variables are optional
    /// (defaults in parentheses):
    /// - `MAILER_ADDRESS` (`mailer`)
    /// - `MAILER_FAKE` (`false`)
    /// - `SMTP_HOST` (`localhost`)
    /// - `SMTP_PORT` (`25`)
    /// - `SMTP_SSL` (`false`)
    /// - `SMTP_AUTH` (`false`)
    /// - `SMTP_USERNAME`
    /// - `SMTP_PASSWORD`
    /// - `MAILER_TIMEOUT_MS` (`120000`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is present but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            address: env::var("MAILER_ADDRESS").unwrap_or(defaults.address),
            fake: parse_var("MAILER_FAKE", defaults.fake)?,
            host: env::var("SMTP_HOST").unwrap_or(defaults.host),
            port: parse_var("SMTP_PORT", defaults.port)?,
            ssl: parse_var("SMTP_SSL", defaults.ssl)?,
            auth: parse_var("SMTP_AUTH", defaults.auth)?,
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            timeout_ms: parse_var("MAILER_TIMEOUT_MS", defaults.timeout_ms)?,
        })
    }

    /// The SMTP I/O timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
