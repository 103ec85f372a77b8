//! Directory-backed sink for consolidated orders.
//!
//! Layout under the configured root:
//! - `<root>/<name>.csv` — accepted CSV attachments, as received
//! - `<root>/invalid/<name>` — rejected attachments (when retained)
//! - `<root>/json/<stem>.json` — consolidated orders, pretty-printed
//!
//! Names are reserved before anything is written. With
//! [`FileNaming::Original`] a name already taken on disk or by an
//! in-flight attachment gets a `-1`, `-2`, ... suffix, so two `orders.csv`
//! attachments never overwrite each other.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::channels::email_types::Attachment;
use crate::config::FileNaming;
use crate::error::SinkError;
use crate::orders::OrderRecord;
use crate::store::traits::OrderSink;

/// Well-known sub-directories of the output root.
pub mod paths {
    pub const INVALID: &str = "invalid";
    pub const JSON: &str = "json";
}

/// Which part of the layout a reserved name lives in.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Archived CSV in the root plus its orders under `json/`.
    Accepted,
    /// Rejected attachment under `invalid/`.
    Rejected,
}

/// Writes pipeline output as files under a root directory.
pub struct JsonDirectorySink {
    root: PathBuf,
    naming: FileNaming,
    /// Paths reserved but not yet written.
    pending: Mutex<HashSet<PathBuf>>,
}

impl JsonDirectorySink {
    pub fn new(root: impl Into<PathBuf>, naming: FileNaming) -> Self {
        Self {
            root: root.into(),
            naming,
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Candidate stored name for `base` on the given attempt.
    fn candidate(&self, base: &str, attempt: usize) -> String {
        let (stem, ext) = split_extension(base);
        let suffix = match self.naming {
            FileNaming::Unique => Uuid::new_v4().to_string(),
            FileNaming::Original if attempt == 0 => return base.to_string(),
            FileNaming::Original => attempt.to_string(),
        };
        match ext {
            Some(ext) => format!("{stem}-{suffix}.{ext}"),
            None => format!("{stem}-{suffix}"),
        }
    }

    fn source_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn rejected_path(&self, name: &str) -> PathBuf {
        self.root.join(paths::INVALID).join(name)
    }

    fn orders_path(&self, name: &str) -> PathBuf {
        let (stem, _) = split_extension(name);
        self.root.join(paths::JSON).join(format!("{stem}.json"))
    }

    fn slot_paths(&self, slot: Slot, name: &str) -> Vec<PathBuf> {
        match slot {
            Slot::Accepted => vec![self.source_path(name), self.orders_path(name)],
            Slot::Rejected => vec![self.rejected_path(name)],
        }
    }

    /// Pick the first candidate name whose paths are neither pending nor on
    /// disk, and mark them pending.
    async fn reserve(&self, slot: Slot, attachment_name: &str) -> Result<String, SinkError> {
        let base = sanitize_file_name(attachment_name);
        let mut pending = self.pending.lock().await;

        let mut attempt = 0;
        loop {
            let name = self.candidate(&base, attempt);
            attempt += 1;

            let slot_paths = self.slot_paths(slot, &name);
            if slot_paths.iter().any(|p| pending.contains(p)) {
                continue;
            }
            if any_exists(&slot_paths).await? {
                continue;
            }

            pending.extend(slot_paths);
            if name != base {
                debug!(attachment = %attachment_name, stored_as = %name, "Name reserved");
            }
            return Ok(name);
        }
    }

    async fn write(&self, path: PathBuf, content: &[u8]) -> Result<String, SinkError> {
        let location = path.display().to_string();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::Write {
                    path: parent.display().to_string(),
                    source,
                })?;
        }
        fs::write(&path, content)
            .await
            .map_err(|source| SinkError::Write {
                path: location.clone(),
                source,
            })?;
        // On disk now; the existence check covers it from here on.
        self.pending.lock().await.remove(&path);
        debug!(path = %location, bytes = content.len(), "File written");
        Ok(location)
    }
}

async fn any_exists(paths: &[PathBuf]) -> Result<bool, SinkError> {
    for path in paths {
        let exists = fs::try_exists(path)
            .await
            .map_err(|source| SinkError::Write {
                path: path.display().to_string(),
                source,
            })?;
        if exists {
            return Ok(true);
        }
    }
    Ok(false)
}

#[async_trait]
impl OrderSink for JsonDirectorySink {
    async fn reserve_name(&self, attachment: &Attachment) -> Result<String, SinkError> {
        self.reserve(Slot::Accepted, &attachment.file_name).await
    }

    async fn save_source(
        &self,
        name: &str,
        attachment: &Attachment,
    ) -> Result<String, SinkError> {
        self.write(self.source_path(name), &attachment.content).await
    }

    async fn save_rejected(&self, attachment: &Attachment) -> Result<String, SinkError> {
        let name = self.reserve(Slot::Rejected, &attachment.file_name).await?;
        self.write(self.rejected_path(&name), &attachment.content)
            .await
    }

    async fn save_orders(&self, name: &str, orders: &[OrderRecord]) -> Result<String, SinkError> {
        let json = serde_json::to_vec_pretty(orders)?;
        self.write(self.orders_path(name), &json).await
    }
}

/// Reduce an attachment name to a bare file name safe to join onto a
/// directory. Path separators and parent references are dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match last {
        "" | "." | ".." => "attachment".to_string(),
        other => other.to_string(),
    }
}

/// Split `name` at its last dot. Leading-dot names have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}
