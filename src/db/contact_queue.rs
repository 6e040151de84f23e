//! Append-only queue of contact messages that could not be delivered.
//!
//! Each append is a full read-modify-write of one JSON value with no lock, so
//! two writers racing can lose an entry. Nothing ever flushes or retries the
//! queue; it grows until something outside this crate inspects it.

use crate::errors::SyncError;
use crate::models::ContactSubmission;

use super::LocalStore;

/// Storage key of the contact queue.
pub const CONTACT_QUEUE_KEY: &str = "contact_submissions";

/// Contact messages waiting on this device.
#[derive(Clone)]
pub struct ContactQueue {
    store: LocalStore,
}

impl ContactQueue {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Every queued submission, oldest first.
    ///
    /// A missing or unreadable stored value reads as an empty queue.
    pub async fn read_all(&self) -> Result<Vec<ContactSubmission>, SyncError> {
        let Some(raw) = self.store.get_item(CONTACT_QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!("Ignoring corrupt contact queue: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Add a submission to the end of the queue.
    pub async fn append(&self, submission: ContactSubmission) -> Result<(), SyncError> {
        let mut items = self.read_all().await?;
        items.push(submission);
        let encoded = serde_json::to_string(&items)?;
        self.store.set_item(CONTACT_QUEUE_KEY, &encoded).await?;
        tracing::info!("Contact queue now holds {} message(s)", items.len());
        Ok(())
    }
}
