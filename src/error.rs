//! Error types for mail-dispatch

use thiserror::Error;

/// A transport-level delivery failure.
///
/// Produced by a [`Delivery`](crate::Delivery) strategy when handing
/// the message to the outside world fails (connection refused,
/// rejected recipient, and so on). The `reason` ends up verbatim in
/// the reply's `detail` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct DeliveryError {
    pub reason: String,
}

impl DeliveryError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Mailer service is no longer running")]
    ServiceClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
