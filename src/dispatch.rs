//! Mail dispatch service
//!
//! The service owns the inbound request channel. Every request travels
//! through the same short state machine: it is received together with
//! a one-shot reply sender, parsed and validated, handed to the
//! delivery strategy if validation passed, and answered with exactly
//! one reply on the captured sender. A failure anywhere resolves into
//! an error reply for that request alone; nothing stops the service.
//!
//! Each request is processed in its own task, so requests progress
//! concurrently and no ordering holds between replies of distinct
//! requests.

use crate::address::is_valid_address;
use crate::config::MailerConfig;
use crate::delivery::{Delivery, FakeDelivery, SmtpDelivery};
use crate::error::{Error, Result};
use crate::message::{MailReply, MailRequest, RequestError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 64;

/// An inbound request plus the one-shot sender its reply must go to.
struct Envelope {
    payload: Payload,
    reply_to: oneshot::Sender<MailReply>,
}

enum Payload {
    /// Already-typed request from a library caller.
    Typed(MailRequest),
    /// Loosely-typed JSON payload, parsed at the boundary.
    Json(Value),
}

/// The mail dispatch service.
///
/// Starting it spawns a background task that drains the request
/// channel until every [`MailerHandle`] has been dropped.
pub struct Mailer;

impl Mailer {
    /// Start a service, selecting the delivery strategy from
    /// `config.fake`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the SMTP transport cannot be built
    /// from `config`. An unreachable SMTP server is not a startup
    /// error; it surfaces per request as a delivery failure.
    pub fn start(config: &MailerConfig) -> Result<MailerHandle> {
        let delivery: Arc<dyn Delivery> = if config.fake {
            Arc::new(FakeDelivery)
        } else {
            Arc::new(SmtpDelivery::new(config)?)
        };
        Ok(Self::start_with(config, delivery))
    }

    /// Start a service with an explicit delivery strategy.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start_with(config: &MailerConfig, delivery: Arc<dyn Delivery>) -> MailerHandle {
        let (tx, mut rx) = mpsc::channel::<Envelope>(CHANNEL_CAPACITY);
        let address = config.address.clone();
        let fake = config.fake;

        let service_address = address.clone();
        tokio::spawn(async move {
            info!(address = %service_address, fake, "mailer service started");
            while let Some(envelope) = rx.recv().await {
                let delivery = Arc::clone(&delivery);
                tokio::spawn(async move {
                    let reply = process(delivery.as_ref(), envelope.payload).await;
                    if envelope.reply_to.send(reply).is_err() {
                        warn!("reply receiver dropped before the reply arrived");
                    }
                });
            }
            info!(address = %service_address, "mailer service stopped");
        });

        MailerHandle { address, tx }
    }
}

/// A cloneable handle for dispatching requests to a running service.
///
/// The handle is the correlation mechanism: every dispatch creates a
/// fresh one-shot channel, and the returned future resolves with the
/// reply to that request and no other.
#[derive(Clone)]
pub struct MailerHandle {
    address: String,
    tx: mpsc::Sender<Envelope>,
}

impl MailerHandle {
    /// The logical endpoint name the service was configured with.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Dispatch a typed request and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceClosed`] if the service has stopped.
    /// Validation and delivery failures are not errors; they come back
    /// as a reply with `status == Status::Error`.
    pub async fn dispatch(&self, request: MailRequest) -> Result<MailReply> {
        self.send(Payload::Typed(request)).await
    }

    /// Dispatch a loosely-typed JSON payload and wait for its reply.
    ///
    /// The payload goes through the same boundary as wire traffic:
    /// missing required fields produce an error reply naming the
    /// field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceClosed`] if the service has stopped.
    pub async fn dispatch_json(&self, payload: Value) -> Result<MailReply> {
        self.send(Payload::Json(payload)).await
    }

    async fn send(&self, payload: Payload) -> Result<MailReply> {
        let (reply_to, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { payload, reply_to })
            .await
            .map_err(|_| Error::ServiceClosed)?;
        reply_rx.await.map_err(|_| Error::ServiceClosed)
    }
}

/// Run one request through validation and delivery, producing the
/// single reply it is owed.
async fn process(delivery: &dyn Delivery, payload: Payload) -> MailReply {
    let request = match payload {
        Payload::Typed(request) => {
            if request.to.is_empty() {
                return MailReply::error(RequestError::MissingTo.to_string());
            }
            request
        }
        Payload::Json(value) => match MailRequest::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "rejected request at the boundary");
                return MailReply::error(e.to_string());
            }
        },
    };

    if let Some(bad) = request.addresses().find(|a| !is_valid_address(a)) {
        debug!(address = bad, "rejected request with malformed address");
        return MailReply::error("invalid address");
    }

    match delivery.attempt(&request).await {
        Ok(()) => {
            debug!(from = %request.from, "request delivered");
            MailReply::ok()
        }
        Err(e) => {
            warn!(error = %e, from = %request.from, "delivery failed");
            MailReply::error(e.reason)
        }
    }
}
