//! Purchase-order core: classification, CSV parsing, consolidation.
//!
//! Everything here is synchronous and free of I/O. Attachments flow through:
//! 1. `classifier::classify()` — content type → accepted / rejected
//! 2. `parser::parse()` — CSV bytes → one raw order per row, in file order
//! 3. `consolidator::consolidate()` — raw orders → one order per PO number

pub mod classifier;
pub mod consolidator;
pub mod model;
pub mod parser;

pub use classifier::{Classification, ClassificationDecision, classify};
pub use consolidator::consolidate;
pub use model::{LineItem, OrderRecord, ShipTo, pad_zip_code};
pub use parser::{HeaderMap, parse};
