//! Email-specific types — inbound mail events and their attachments.

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content type assumed for parts that declare none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file attached to an inbound email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name from the part's Content-Disposition / Content-Type name.
    pub file_name: String,
    /// Declared MIME type (`type/subtype`, parameters stripped).
    pub content_type: String,
    /// Decoded part body.
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// A newly arrived email, reduced to what the order pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailEvent {
    /// Message-ID header (generated when missing).
    pub message_id: String,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Date header, or the time the message was parsed.
    pub received_at: DateTime<Utc>,
    /// Attachments in MIME order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl MailEvent {
    /// Parse a raw RFC 822 message. Returns `None` if it cannot be parsed.
    pub fn from_raw(raw: &[u8]) -> Option<Self> {
        let parsed = MessageParser::default().parse(raw)?;

        let from = parsed
            .from()
            .and_then(|addr| addr.first())
            .and_then(|a| a.address())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".into());

        let received_at = parsed
            .date()
            .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
            .unwrap_or_else(Utc::now);

        let attachments = parsed
            .attachments()
            .enumerate()
            .map(|(i, part)| {
                let file_name = MimeHeaders::attachment_name(part)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("attachment-{}", i + 1));
                let content_type = MimeHeaders::content_type(part)
                    .map(|ct| match ct.subtype() {
                        Some(sub) => format!("{}/{}", ct.ctype(), sub),
                        None => ct.ctype().to_string(),
                    })
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                Attachment::new(file_name, content_type, part.contents())
            })
            .collect();

        Some(Self {
            message_id: parsed
                .message_id()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("gen-{}", Uuid::new_v4())),
            from,
            subject: parsed.subject().unwrap_or("(no subject)").to_string(),
            received_at,
            attachments,
        })
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
