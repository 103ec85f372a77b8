//! Persistence layer — where consolidated orders and raw attachments go.

pub mod json_dir;
pub mod traits;

pub use json_dir::JsonDirectorySink;
pub use traits::OrderSink;
