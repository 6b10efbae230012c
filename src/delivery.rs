//! Delivery strategies
//!
//! A [`Delivery`] turns a validated [`MailRequest`] into an attempt to
//! actually move the message somewhere. [`FakeDelivery`] drops it on
//! the floor and reports success, for deterministic testing.
//! [`SmtpDelivery`] submits it to an SMTP server via [`lettre`].
//!
//! The strategy is chosen once at service start and shared read-only
//! across all requests.

use crate::config::MailerConfig;
use crate::error::{DeliveryError, Error, Result};
use crate::message::MailRequest;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

/// A pluggable mechanism for sending (or simulating sending) a
/// message.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Attempt to deliver `request` once.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] describing the transport failure.
    /// No retries are performed at this level.
    async fn attempt(&self, request: &MailRequest) -> std::result::Result<(), DeliveryError>;
}

/// Delivery that always succeeds without performing any network I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeDelivery;

#[async_trait]
impl Delivery for FakeDelivery {
    async fn attempt(&self, request: &MailRequest) -> std::result::Result<(), DeliveryError> {
        debug!(
            from = %request.from,
            recipients = request.to.len(),
            "fake delivery, message discarded"
        );
        Ok(())
    }
}

/// Delivery through a real SMTP server.
///
/// The transport is built once from the service configuration and
/// connects lazily: an unreachable relay does not fail startup, it
/// fails each delivery attempt instead.
pub struct SmtpDelivery {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpDelivery {
    /// Build an SMTP transport from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `auth` is enabled without both
    /// `username` and `password`, or if the TLS parameters cannot be
    /// built for `config.host`.
    pub fn new(config: &MailerConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.clone())
            .port(config.port)
            .timeout(Some(config.timeout()));

        if config.ssl {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| Error::Config(format!("Invalid TLS parameters: {e}")))?;
            builder = builder.tls(Tls::Wrapper(tls));
        }

        if config.auth {
            let (Some(username), Some(password)) =
                (config.username.clone(), config.password.clone())
            else {
                return Err(Error::Config(
                    "auth is enabled but username/password are not set".to_string(),
                ));
            };
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Delivery for SmtpDelivery {
    async fn attempt(&self, request: &MailRequest) -> std::result::Result<(), DeliveryError> {
        let message = build_message(request)?;
        debug!(from = %request.from, "submitting message over SMTP");
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::new(e.to_string()))
    }
}

/// Assemble a plain-text MIME message from a request.
fn build_message(request: &MailRequest) -> std::result::Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&request.from)?)
        .subject(request.subject.clone());

    for address in &request.to {
        builder = builder.to(parse_mailbox(address)?);
    }
    for address in &request.cc {
        builder = builder.cc(parse_mailbox(address)?);
    }
    for address in &request.bcc {
        builder = builder.bcc(parse_mailbox(address)?);
    }
    if let Some(id) = &request.message_id {
        builder = builder.message_id(Some(id.clone()));
    }

    builder
        .header(ContentType::TEXT_PLAIN)
        .body(request.body.clone())
        .map_err(|e| DeliveryError::new(format!("failed to build message: {e}")))
}

fn parse_mailbox(address: &str) -> std::result::Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e| DeliveryError::new(format!("invalid address {address}: {e}")))
}
