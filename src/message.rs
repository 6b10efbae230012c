//! Mail request and reply types
//!
//! Inbound payloads are loosely-typed JSON objects; this module is the
//! boundary where they become typed [`MailRequest`] values or a
//! [`RequestError`] naming the first missing field. Replies are the
//! mirror image: a [`MailReply`] serializes back to the wire shape
//! `{"status":"ok"}` or `{"status":"error","detail":"..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why an inbound payload could not be turned into a [`MailRequest`].
///
/// The display text is exactly what the caller sees in the reply's
/// `detail` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("from address must be specified")]
    MissingFrom,

    #[error("to address(es) must be specified")]
    MissingTo,

    #[error("subject must be specified")]
    MissingSubject,

    #[error("body must be specified")]
    MissingBody,

    #[error("malformed request: {0}")]
    Malformed(String),
}

/// One or more recipient addresses.
///
/// On the wire this accepts either a single string or an array of
/// strings; it always serializes as an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Recipients(Vec<String>);

impl Recipients {
    /// Iterate over the addresses as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl<'de> Deserialize<'de> for Recipients {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(address) => Self(vec![address]),
            OneOrMany::Many(addresses) => Self(addresses),
        })
    }
}

/// A mail send request.
///
/// Immutable once constructed; the dispatch service consumes it
/// exactly once. `to`, `cc` and `bcc` accept a single address or a
/// list on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailRequest {
    pub from: String,
    pub to: Recipients,
    #[serde(default, skip_serializing_if = "Recipients::is_empty")]
    pub cc: Recipients,
    #[serde(default, skip_serializing_if = "Recipients::is_empty")]
    pub bcc: Recipients,
    pub subject: String,
    pub body: String,
    /// Explicit Message-ID header value, if the caller wants one.
    #[serde(
        default,
        rename = "messageID",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_id: Option<String>,
}

impl MailRequest {
    /// Create a request with the four required fields. Optional fields
    /// start out empty.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<Recipients>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Convert a loosely-typed JSON payload into a typed request.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] naming the first missing required
    /// field (`from`, `to`, `subject`, `body`; an empty `to` list
    /// counts as missing), or [`RequestError::Malformed`] when the
    /// payload is not an object or a field has the wrong type.
    pub fn from_value(payload: Value) -> std::result::Result<Self, RequestError> {
        let object = payload
            .as_object()
            .ok_or_else(|| RequestError::Malformed("payload must be a JSON object".to_string()))?;

        if !object.contains_key("from") {
            return Err(RequestError::MissingFrom);
        }
        if !object.contains_key("to") {
            return Err(RequestError::MissingTo);
        }
        if !object.contains_key("subject") {
            return Err(RequestError::MissingSubject);
        }
        if !object.contains_key("body") {
            return Err(RequestError::MissingBody);
        }

        let request: Self = serde_json::from_value(payload)
            .map_err(|e| RequestError::Malformed(e.to_string()))?;

        if request.to.is_empty() {
            return Err(RequestError::MissingTo);
        }
        Ok(request)
    }

    /// All addresses carried by the request: `from`, then every `to`,
    /// `cc` and `bcc` recipient.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.from.as_str())
            .chain(self.to.iter())
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
    }
}

/// Reply status: the request either went out or it did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// The status reply correlated to a single [`MailRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailReply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MailReply {
    /// A successful reply, with no detail.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: Status::Ok,
            detail: None,
        }
    }

    /// An error reply carrying a human-readable reason.
    #[must_use]
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            detail: Some(detail.into()),
        }
    }
}
