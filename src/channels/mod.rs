//! Mailbox I/O — IMAP polling and attachment extraction.

pub mod email;
pub mod email_poller;
pub mod email_types;

pub use email::EmailConfig;
pub use email_poller::spawn_email_poller;
pub use email_types::{Attachment, MailEvent};
