//! Email address format validation
//!
//! A deliberately minimal policy: the service only needs to reject
//! strings that cannot possibly be a `local-part@domain` address
//! before they reach the transport. Full RFC 5321 parsing is the
//! transport's job.

/// Check whether `address` has a minimal `local-part@domain` shape.
///
/// Accepts exactly one `@` separating a non-empty local part from a
/// non-empty domain, with no whitespace anywhere in the string.
/// Single-label domains such as `localhost` are accepted.
///
/// This is a pure function: no I/O, no hidden state.
///
/// # Examples
///
/// ```
/// use mail_dispatch::is_valid_address;
///
/// assert!(is_valid_address("alice@localhost"));
/// assert!(is_valid_address("bob@example.com"));
/// assert!(!is_valid_address("wdok wdqwd qd"));
/// assert!(!is_valid_address("@example.com"));
/// ```
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = address.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}
