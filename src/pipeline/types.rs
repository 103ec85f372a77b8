//! Shared types for the order pipeline — per-attachment and per-mail reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::orders::ClassificationDecision;

// ── Attachment outcome ──────────────────────────────────────────────

/// What happened to a single attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttachmentOutcome {
    /// Parsed, consolidated and written to the sink.
    Persisted {
        orders: usize,
        items: usize,
        location: String,
    },
    /// Not a CSV payload. `retained_at` is set when the file was kept.
    Rejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retained_at: Option<String>,
    },
    /// Parse or persistence failed; no orders from this attachment were written.
    Failed { kind: ErrorKind, reason: String },
}

impl AttachmentOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Persisted { .. } => "persisted",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Classification decision plus outcome for one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentReport {
    pub file_name: String,
    pub decision: ClassificationDecision,
    #[serde(flatten)]
    pub outcome: AttachmentOutcome,
}

// ── Mail report ─────────────────────────────────────────────────────

/// Result of running one mail event through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailReport {
    pub message_id: String,
    /// One entry per attachment, in MIME order.
    pub attachments: Vec<AttachmentReport>,
    pub processed_at: DateTime<Utc>,
}

impl MailReport {
    pub fn persisted(&self) -> usize {
        self.count(|o| matches!(o, AttachmentOutcome::Persisted { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, AttachmentOutcome::Rejected { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, AttachmentOutcome::Failed { .. }))
    }

    /// Classification decisions in attachment order.
    pub fn decisions(&self) -> impl Iterator<Item = &ClassificationDecision> {
        self.attachments.iter().map(|a| &a.decision)
    }

    fn count(&self, pred: impl Fn(&AttachmentOutcome) -> bool) -> usize {
        self.attachments.iter().filter(|a| pred(&a.outcome)).count()
    }
}
