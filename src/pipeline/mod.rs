//! Order processing pipeline.
//!
//! Every attachment of an inbound mail flows through:
//! 1. `orders::classify()` — only CSV content types go further
//! 2. `orders::parse()` — fixed header map, one raw order per row
//! 3. `orders::consolidate()` — one order per PO number
//! 4. `OrderSink` — consolidated orders persisted as JSON
//!
//! Rejections and failures are reported per attachment, never as a whole-mail error.

pub mod processor;
pub mod types;

pub use processor::{OrderPipeline, process_csv};
pub use types::{AttachmentOutcome, AttachmentReport, MailReport};
