//! Asynchronous mail-dispatch service
//!
//! Accepts JSON-shaped send requests over an in-process channel,
//! validates the addresses, hands the message to a configurable
//! delivery strategy (simulated, or SMTP via [`lettre`]), and answers
//! every request with exactly one correlated status reply.
//!
//! Start a service with [`Mailer::start`], then dispatch requests
//! through the returned [`MailerHandle`]. With `fake: true` in the
//! [`MailerConfig`], delivery always succeeds without touching the
//! network, which makes the full request/reply path deterministic for
//! tests.

mod address;
mod config;
mod delivery;
mod dispatch;
mod error;
mod message;

pub use address::is_valid_address;
pub use config::MailerConfig;
pub use delivery::{Delivery, FakeDelivery, SmtpDelivery};
pub use dispatch::{Mailer, MailerHandle};
pub use error::{DeliveryError, Error, Result};
pub use message::{MailReply, MailRequest, Recipients, RequestError, Status};
