//! Standalone IMAP poller — fetches unseen mail and feeds it to the order
//! pipeline.
//!
//! Each tick:
//! 1. Fetches unseen emails via IMAP (blocking thread)
//! 2. Runs every message with attachments through `OrderPipeline::process()`
//! 3. Logs the per-attachment report
//!
//! A failed fetch is logged and the next tick simply tries again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::channels::email::{EmailConfig, fetch_unseen};
use crate::channels::email_types::MailEvent;
use crate::pipeline::processor::OrderPipeline;

/// Spawn a background task that polls IMAP and processes new mail.
///
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop polling.
pub fn spawn_email_poller(
    config: EmailConfig,
    pipeline: Arc<OrderPipeline>,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            "Email poller started — polling every {}s on {}",
            config.poll_interval_secs, config.host
        );

        let mut tick = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Email poller shutting down");
                return;
            }

            poll_once(&config, &pipeline).await;
        }
    });

    (handle, shutdown_flag)
}

/// Run a single poll cycle: fetch unseen → process each message.
async fn poll_once(config: &EmailConfig, pipeline: &OrderPipeline) {
    let cfg = config.clone();
    let fetch_result = tokio::task::spawn_blocking(move || fetch_unseen(&cfg)).await;

    let events = match fetch_result {
        Ok(Ok(events)) => events,
        Ok(Err(e)) => {
            error!("Email poll failed: {e}");
            return;
        }
        Err(e) => {
            error!("Email poll task panicked: {e}");
            return;
        }
    };

    if events.is_empty() {
        return;
    }

    debug!("Fetched {} unseen emails", events.len());

    for event in &events {
        handle_event(pipeline, event).await;
    }
}

/// Process one mail event and log the outcome of every attachment.
pub async fn handle_event(pipeline: &OrderPipeline, event: &MailEvent) {
    info!(
        from = %event.from,
        subject = %event.subject,
        has_attachments = event.has_attachments(),
        "Mail received"
    );

    if !event.has_attachments() {
        warn!(
            message_id = %event.message_id,
            "Mail did not have any attachments, not touching it"
        );
        return;
    }

    let report = pipeline.process(event).await;
    for entry in &report.attachments {
        debug!(
            message_id = %report.message_id,
            file_name = %entry.file_name,
            outcome = entry.outcome.label(),
            "Attachment handled"
        );
    }
    info!(
        message_id = %report.message_id,
        persisted = report.persisted(),
        rejected = report.rejected(),
        failed = report.failed(),
        "Mail processed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::email_types::Attachment;
    use crate::config::{FileNaming, OutputConfig};
    use crate::orders::HeaderMap;
    use crate::store::JsonDirectorySink;

    fn pipeline_at(dir: &std::path::Path) -> OrderPipeline {
        let sink = Arc::new(JsonDirectorySink::new(dir, FileNaming::Original));
        OrderPipeline::new(HeaderMap::purchase_order(), sink, &OutputConfig::default())
    }

    fn event(attachments: Vec<Attachment>) -> MailEvent {
        MailEvent {
            message_id: "m1".into(),
            from: "buyer@example.com".into(),
            subject: "Orders".into(),
            received_at: chrono::Utc::now(),
            attachments,
        }
    }

    #[tokio::test]
    async fn mail_without_attachments_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        handle_event(&pipeline_at(dir.path()), &event(Vec::new())).await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn mail_with_csv_reaches_the_sink() {
        let dir = tempfile::tempdir().unwrap();
        let csv = Attachment::new("orders.csv", "text/csv", b"header\n".to_vec());
        handle_event(&pipeline_at(dir.path()), &event(vec![csv])).await;
        assert!(dir.path().join("json").join("orders.json").exists());
    }
}
