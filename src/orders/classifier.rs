//! Attachment classification — decides which attachments carry CSV orders.
//!
//! The decision is driven by the declared MIME type only. The extension is
//! looked up from the content type, never read off the file name, and the
//! attachment bytes are never inspected.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Extension an attachment's content type must map to.
pub const CSV_EXTENSION: &str = "csv";

/// Verdict for a single attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Accepted,
    Rejected,
}

impl Classification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// A classification verdict with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub file_name: String,
    pub content_type: String,
    /// Primary extension registered for the content type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub verdict: Classification,
}

impl ClassificationDecision {
    /// Build the decision for an attachment.
    pub fn for_attachment(file_name: &str, content_type: &str) -> Self {
        let extensions = extensions_for(content_type);
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            extension: extensions.first().map(|e| (*e).to_string()),
            verdict: verdict(extensions),
        }
    }

    /// Turn a rejection into the error reported for the attachment.
    pub fn rejection(&self) -> Option<PipelineError> {
        match self.verdict {
            Classification::Accepted => None,
            Classification::Rejected => Some(PipelineError::UnsupportedAttachment {
                file_name: self.file_name.clone(),
                content_type: self.content_type.clone(),
            }),
        }
    }
}

/// Classify an attachment from its declared content type.
///
/// `_file_name` is never consulted: a `.csv` suffix on an `image/png` part
/// is still rejected.
pub fn classify(_file_name: &str, content_type: &str) -> Classification {
    verdict(extensions_for(content_type))
}

fn verdict(extensions: &[&str]) -> Classification {
    if extensions.contains(&CSV_EXTENSION) {
        Classification::Accepted
    } else {
        Classification::Rejected
    }
}

/// Extensions registered for a MIME type, ignoring parameters and case.
fn extensions_for(content_type: &str) -> &'static [&'static str] {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        return &[];
    }
    mime_guess::get_mime_extensions_str(&essence).unwrap_or(&[])
}
