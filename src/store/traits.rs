//! `OrderSink` trait — single async interface for pipeline persistence.

use async_trait::async_trait;

use crate::channels::email_types::Attachment;
use crate::error::SinkError;
use crate::orders::OrderRecord;

/// Destination for everything the order pipeline produces.
///
/// Every method returns a human-readable location (a path, a key, a URL)
/// for the written artifact, used only in reports and logs.
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Claim the stored name for an accepted attachment.
    ///
    /// The archived CSV and its orders are both written under this name, and
    /// no other attachment is handed the same one.
    async fn reserve_name(&self, attachment: &Attachment) -> Result<String, SinkError>;

    /// Keep a copy of an accepted CSV attachment as received.
    async fn save_source(&self, name: &str, attachment: &Attachment)
    -> Result<String, SinkError>;

    /// Keep an attachment the classifier rejected.
    async fn save_rejected(&self, attachment: &Attachment) -> Result<String, SinkError>;

    /// Persist the consolidated orders of the attachment stored as `name`.
    async fn save_orders(&self, name: &str, orders: &[OrderRecord]) -> Result<String, SinkError>;
}
