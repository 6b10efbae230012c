//! Shared I/O helpers for the fake SMTP server.
//!
//! Thin wrappers around `AsyncWriteExt` that flush after every write.
//! Real SMTP servers would batch writes for performance, but flushing
//! eagerly keeps the test server simple and deterministic.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Write a string to the stream and flush.
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}
