//! Email channel — IMAP polling for inbound purchase-order mail.
//!
//! Speaks just enough IMAP over rustls to log in, find unseen messages,
//! fetch them whole and flag them `\Seen`. Blocking; run it inside
//! `spawn_blocking`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rustls_pki_types::ServerName;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::channels::email_types::MailEvent;
use crate::error::{ChannelError, ConfigError};

const CHANNEL: &str = "email";

// ── Configuration ───────────────────────────────────────────────────

/// Mailbox configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub mailbox: String,
    pub poll_interval_secs: u64,
}

impl EmailConfig {
    /// Build config from environment variables.
    ///
    /// `EMAIL_HOST` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("EMAIL_HOST")
            .map_err(|_| ConfigError::MissingEnvVar("EMAIL_HOST".into()))?;

        let port = parse_var("EMAIL_PORT", 993)?;
        let poll_interval_secs = parse_var("EMAIL_POLL_INTERVAL_SECS", 60)?;

        let username = std::env::var("EMAIL_USERNAME").unwrap_or_default();
        let password = SecretString::from(std::env::var("EMAIL_PASSWORD").unwrap_or_default());
        let mailbox = std::env::var("EMAIL_MAILBOX").unwrap_or_else(|_| "INBOX".to_string());

        Ok(Self {
            host,
            port,
            username,
            password,
            mailbox,
            poll_interval_secs,
        })
    }
}

/// Read an optional numeric environment variable.
pub(crate) fn parse_var<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

// ── IMAP session ────────────────────────────────────────────────────

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// A tagged-command IMAP session over TLS.
struct ImapSession {
    tls: TlsStream,
    next_tag: u32,
}

impl ImapSession {
    fn connect(config: &EmailConfig) -> Result<Self, ChannelError> {
        let tcp = TcpStream::connect((config.host.as_str(), config.port))?;
        tcp.set_read_timeout(Some(Duration::from_secs(30)))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name = ServerName::try_from(config.host.clone()).map_err(|e| {
            ChannelError::ConnectFailed {
                name: CHANNEL.into(),
                reason: format!("invalid host name {}: {e}", config.host),
            }
        })?;
        let conn = rustls::ClientConnection::new(tls_config, server_name).map_err(|e| {
            ChannelError::ConnectFailed {
                name: CHANNEL.into(),
                reason: format!("TLS setup failed: {e}"),
            }
        })?;

        let mut session = Self {
            tls: rustls::StreamOwned::new(conn, tcp),
            next_tag: 1,
        };
        let _greeting = session.read_line()?;
        Ok(session)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ChannelError> {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.tls.read(&mut byte)? {
                0 => {
                    return Err(ChannelError::Disconnected {
                        name: CHANNEL.into(),
                        reason: "IMAP connection closed".into(),
                    });
                }
                _ => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(buf);
                    }
                }
            }
        }
    }

    /// Send a command and collect every response line up to its tagged
    /// completion. Fails unless the completion is `OK`.
    fn command(&mut self, cmd: &str) -> Result<Vec<Vec<u8>>, ChannelError> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;

        self.tls.write_all(format!("{tag} {cmd}\r\n").as_bytes())?;
        self.tls.flush()?;

        let prefix = format!("{tag} ");
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            let done = line.starts_with(prefix.as_bytes());
            lines.push(line);
            if done {
                break;
            }
        }

        let status = lines.last().map(|l| String::from_utf8_lossy(l).to_string());
        match status {
            Some(s) if s[prefix.len()..].starts_with("OK") => Ok(lines),
            other => Err(ChannelError::CommandFailed {
                name: CHANNEL.into(),
                command: cmd.split_whitespace().next().unwrap_or(cmd).to_string(),
                reason: other.unwrap_or_default().trim().to_string(),
            }),
        }
    }
}

/// Fetch unseen messages, parse them, and flag them `\Seen`.
///
/// Messages that fail to parse are flagged too, so they are not retried
/// on every poll.
pub fn fetch_unseen(config: &EmailConfig) -> Result<Vec<MailEvent>, ChannelError> {
    let mut session = ImapSession::connect(config)?;

    session
        .command(&format!(
            "LOGIN \"{}\" \"{}\"",
            config.username,
            config.password.expose_secret()
        ))
        .map_err(|e| ChannelError::AuthFailed {
            name: CHANNEL.into(),
            reason: e.to_string(),
        })?;

    session.command(&format!("SELECT \"{}\"", config.mailbox))?;

    let search = session.command("SEARCH UNSEEN")?;
    let ids = search_ids(&search);
    debug!(count = ids.len(), mailbox = %config.mailbox, "Unseen messages");

    let mut events = Vec::new();
    for id in &ids {
        let lines = session.command(&format!("FETCH {id} RFC822"))?;
        let raw = fetch_body(&lines);

        match MailEvent::from_raw(&raw) {
            Some(event) => events.push(event),
            None => warn!(id = %id, "Could not parse fetched message"),
        }

        if let Err(e) = session.command(&format!("STORE {id} +FLAGS (\\Seen)")) {
            warn!(id = %id, error = %e, "Failed to flag message as seen");
        }
    }

    let _ = session.command("LOGOUT");
    Ok(events)
}

/// Message sequence numbers from `* SEARCH` response lines.
fn search_ids(lines: &[Vec<u8>]) -> Vec<String> {
    lines
        .iter()
        .map(|l| String::from_utf8_lossy(l))
        .filter(|l| l.starts_with("* SEARCH"))
        .flat_map(|l| {
            l.split_whitespace()
                .skip(2)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Raw message bytes from a FETCH response.
///
/// The `* n FETCH (RFC822 {size}` line announces a literal of exactly `size`
/// bytes. Anything the server sends after it is not part of the message.
fn fetch_body(lines: &[Vec<u8>]) -> Vec<u8> {
    let Some((start, size)) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| literal_size(line).map(|size| (i, size)))
    else {
        return Vec::new();
    };

    lines[start + 1..]
        .iter()
        .flatten()
        .copied()
        .take(size)
        .collect()
}

/// Length announced by a trailing `{n}` literal marker.
fn literal_size(line: &[u8]) -> Option<usize> {
    let line = std::str::from_utf8(line).ok()?.trim_end();
    let open = line.rfind('{')?;
    line.strip_suffix('}')?[open + 1..].parse().ok()
}
