//! In-process fake SMTP server for integration testing
//!
//! # How SMTP submission works (educational overview)
//!
//! SMTP (Simple Mail Transfer Protocol, RFC 5321) is a line-based
//! text protocol. The client drives; the server answers every command
//! with a three-digit status code:
//!
//! ```text
//!   Server:  220 fake.test ESMTP ready
//!   Client:  EHLO client.example
//!   Server:  250-fake.test greets you
//!   Server:  250-AUTH PLAIN LOGIN
//!   Server:  250 8BITMIME
//!   Client:  MAIL FROM:<alice@localhost>
//!   Server:  250 OK
//!   Client:  RCPT TO:<bob@localhost>
//!   Server:  250 OK
//!   Client:  DATA
//!   Server:  354 end data with <CR><LF>.<CR><LF>
//!   Client:  <headers, blank line, body>
//!   Client:  .
//!   Server:  250 2.0.0 OK queued
//!   Client:  QUIT
//!   Server:  221 bye
//! ```
//!
//! The EHLO reply is the only multi-line response: continuation lines
//! use `250-`, the final line `250 `. The client reads capabilities
//! from it -- advertising `AUTH PLAIN` here is what makes a `lettre`
//! client with credentials send an `AUTH PLAIN <base64>` command.
//!
//! Note that the envelope (`MAIL FROM` / `RCPT TO`) is separate from
//! the message headers transferred after `DATA`: BCC recipients appear
//! only in the envelope, which is exactly what tests want to observe.

use super::io::write_line;
use super::store::{ReceivedMail, SmtpBehavior};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// A fake SMTP server on localhost with an OS-assigned port.
///
/// Records every accepted submission; optionally rejects configured
/// recipients at `RCPT TO` time. Plaintext only -- the clients under
/// test connect with TLS disabled.
pub struct FakeSmtpServer {
    port: u16,
    state: Arc<Mutex<ServerState>>,
    /// Handle to the background task so it lives as long as the server.
    _handle: tokio::task::JoinHandle<()>,
}

#[derive(Default)]
struct ServerState {
    received: Vec<ReceivedMail>,
    auth_lines: Vec<String>,
}

impl FakeSmtpServer {
    /// Start a server that accepts every recipient.
    pub async fn start() -> Self {
        Self::start_with(SmtpBehavior::default()).await
    }

    /// Start a server with the given behavior.
    ///
    /// Binds to `127.0.0.1:0` (the OS picks a free port) and spawns a
    /// tokio task that accepts connections until the server is
    /// dropped.
    pub async fn start_with(behavior: SmtpBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let state = Arc::new(Mutex::new(ServerState::default()));
        let server_state = state.clone();

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let behavior = behavior.clone();
                let state = server_state.clone();
                tokio::spawn(async move {
                    handle_connection(stream, &behavior, &state).await;
                });
            }
        });

        Self {
            port,
            state,
            _handle: handle,
        }
    }

    /// The port the server is listening on.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Every message accepted so far, in arrival order.
    pub fn received(&self) -> Vec<ReceivedMail> {
        self.state.lock().unwrap().received.clone()
    }

    /// Raw `AUTH` command lines the server has seen.
    pub fn auth_attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().auth_lines.clone()
    }
}

/// Run the SMTP session loop for one client connection.
async fn handle_connection(
    stream: TcpStream,
    behavior: &SmtpBehavior,
    state: &Mutex<ServerState>,
) {
    let mut reader = BufReader::new(stream);

    if write_line(&mut reader, "220 fake.test ESMTP ready\r\n")
        .await
        .is_err()
    {
        return;
    }

    // Envelope state for the transaction in progress.
    let mut sender = String::new();
    let mut recipients: Vec<String> = Vec::new();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let trimmed = line.trim_end();
        let upper = trimmed.to_ascii_uppercase();

        let response: &str = if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            "250-fake.test greets you\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n"
        } else if upper.starts_with("AUTH") {
            state.lock().unwrap().auth_lines.push(trimmed.to_string());
            "235 2.7.0 authentication successful\r\n"
        } else if upper.starts_with("MAIL FROM:") {
            sender = angle_addr(trimmed);
            recipients.clear();
            "250 OK\r\n"
        } else if upper.starts_with("RCPT TO:") {
            let recipient = angle_addr(trimmed);
            if behavior.reject_recipients.contains(&recipient) {
                "550 5.1.1 mailbox unavailable\r\n"
            } else {
                recipients.push(recipient);
                "250 OK\r\n"
            }
        } else if upper == "DATA" {
            if write_line(&mut reader, "354 end data with <CR><LF>.<CR><LF>\r\n")
                .await
                .is_err()
            {
                break;
            }
            let Some(data) = read_data(&mut reader).await else {
                break;
            };
            state.lock().unwrap().received.push(ReceivedMail {
                sender: std::mem::take(&mut sender),
                recipients: std::mem::take(&mut recipients),
                data,
            });
            "250 2.0.0 OK queued\r\n"
        } else if upper == "RSET" {
            sender.clear();
            recipients.clear();
            "250 OK\r\n"
        } else if upper == "NOOP" {
            "250 OK\r\n"
        } else if upper == "QUIT" {
            let _ = write_line(&mut reader, "221 bye\r\n").await;
            break;
        } else {
            "500 unrecognized command\r\n"
        };

        if write_line(&mut reader, response).await.is_err() {
            break;
        }
    }
}

/// Read the message content following a DATA command, up to the
/// terminating lone `.` line (which is not included).
async fn read_data(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut data = String::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        if line == ".\r\n" || line == ".\n" {
            return Some(data);
        }
        data.push_str(&line);
    }
}

/// Extract the address from a `MAIL FROM:<addr>` / `RCPT TO:<addr>`
/// line. Falls back to everything after the colon if the client sent
/// no angle brackets.
fn angle_addr(line: &str) -> String {
    if let Some(open) = line.find('<')
        && let Some(close) = line.rfind('>')
        && open < close
    {
        return line[open + 1..close].to_string();
    }
    line.split_once(':')
        .map_or("", |(_, rest)| rest.trim())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_addr_extracts_path() {
        assert_eq!(
            angle_addr("MAIL FROM:<alice@localhost>"),
            "alice@localhost"
        );
        assert_eq!(angle_addr("RCPT TO:<bob@example.com>"), "bob@example.com");
    }

    #[test]
    fn angle_addr_ignores_parameters() {
        assert_eq!(
            angle_addr("MAIL FROM:<alice@localhost> BODY=8BITMIME"),
            "alice@localhost"
        );
    }

    #[test]
    fn angle_addr_without_brackets_takes_rest_of_line() {
        assert_eq!(angle_addr("MAIL FROM: alice@localhost"), "alice@localhost");
    }
}
