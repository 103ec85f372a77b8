//! Order pipeline — routes a mail event's attachments through
//! classify → parse → consolidate → sink.
//!
//! Attachments of one message are processed concurrently. Each runs its own
//! parse and consolidation over a private accumulator, so rows within one
//! payload are always handled in file order. A rejected or failed
//! attachment never stops the others.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::channels::email_types::{Attachment, MailEvent};
use crate::config::{OutputConfig, RejectedPolicy};
use crate::error::{ParseError, PipelineError, SinkError};
use crate::orders::{ClassificationDecision, HeaderMap, OrderRecord, consolidate, parse};
use crate::pipeline::types::{AttachmentOutcome, AttachmentReport, MailReport};
use crate::store::OrderSink;

/// Parse and consolidate one CSV payload, without touching the sink.
pub fn process_csv(raw: &[u8], headers: &HeaderMap) -> Result<Vec<OrderRecord>, ParseError> {
    Ok(consolidate(parse(raw, headers)?))
}

/// Orchestrates the order pipeline for incoming mail.
pub struct OrderPipeline {
    headers: HeaderMap,
    sink: Arc<dyn OrderSink>,
    rejected: RejectedPolicy,
    archive_source_csv: bool,
}

impl OrderPipeline {
    pub fn new(headers: HeaderMap, sink: Arc<dyn OrderSink>, output: &OutputConfig) -> Self {
        Self {
            headers,
            sink,
            rejected: output.rejected,
            archive_source_csv: output.archive_source_csv,
        }
    }

    /// Run every attachment of `event` through the pipeline.
    pub async fn process(&self, event: &MailEvent) -> MailReport {
        let attachments = join_all(
            event
                .attachments
                .iter()
                .map(|attachment| self.process_attachment(attachment)),
        )
        .await;

        MailReport {
            message_id: event.message_id.clone(),
            attachments,
            processed_at: Utc::now(),
        }
    }

    /// Classify one attachment and, if accepted, parse and persist it.
    pub async fn process_attachment(&self, attachment: &Attachment) -> AttachmentReport {
        let decision =
            ClassificationDecision::for_attachment(&attachment.file_name, &attachment.content_type);

        let outcome = match decision.rejection() {
            Some(rejection) => self.reject(attachment, rejection).await,
            None => match self.accept(attachment).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        file_name = %attachment.file_name,
                        kind = %e.kind(),
                        error = %e,
                        "Attachment discarded"
                    );
                    AttachmentOutcome::Failed {
                        kind: e.kind(),
                        reason: e.to_string(),
                    }
                }
            },
        };

        AttachmentReport {
            file_name: attachment.file_name.clone(),
            decision,
            outcome,
        }
    }

    async fn reject(&self, attachment: &Attachment, rejection: PipelineError) -> AttachmentOutcome {
        warn!(
            file_name = %attachment.file_name,
            content_type = %attachment.content_type,
            kind = %rejection.kind(),
            "Not a CSV file"
        );

        if self.rejected == RejectedPolicy::Discard {
            return AttachmentOutcome::Rejected { retained_at: None };
        }

        match self.sink.save_rejected(attachment).await {
            Ok(location) => {
                info!(file_name = %attachment.file_name, location = %location, "Rejected file saved");
                AttachmentOutcome::Rejected {
                    retained_at: Some(location),
                }
            }
            Err(e) => {
                // Still reported as rejected; only the copy is missing.
                error!(file_name = %attachment.file_name, error = %e, "Failed to save rejected file");
                AttachmentOutcome::Rejected { retained_at: None }
            }
        }
    }

    async fn accept(&self, attachment: &Attachment) -> Result<AttachmentOutcome, PipelineError> {
        let sink_err = |source: SinkError| PipelineError::Sink {
            file_name: attachment.file_name.clone(),
            source,
        };

        let name = self
            .sink
            .reserve_name(attachment)
            .await
            .map_err(sink_err)?;

        if self.archive_source_csv {
            let location = self
                .sink
                .save_source(&name, attachment)
                .await
                .map_err(sink_err)?;
            debug!(file_name = %attachment.file_name, location = %location, "CSV saved");
        }

        let orders = process_csv(&attachment.content, &self.headers).map_err(|source| {
            PipelineError::Parse {
                file_name: attachment.file_name.clone(),
                source,
            }
        })?;

        let location = self
            .sink
            .save_orders(&name, &orders)
            .await
            .map_err(sink_err)?;

        let items = OrderRecord::item_count(&orders);
        info!(
            file_name = %attachment.file_name,
            orders = orders.len(),
            items,
            location = %location,
            "Orders saved"
        );

        Ok(AttachmentOutcome::Persisted {
            orders: orders.len(),
            items,
            location,
        })
    }
}
