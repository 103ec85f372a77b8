//! po-intake — purchase-order intake from mailbox CSV attachments.

pub mod channels;
pub mod config;
pub mod error;
pub mod orders;
pub mod pipeline;
pub mod store;
