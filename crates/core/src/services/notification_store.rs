//! Read-state of in-app notifications, per user.

use std::collections::BTreeMap;
use std::path::Path;

use fichajes_common::AppResult;

use super::json_store::JsonFile;

/// File name inside the data directory.
pub const READ_NOTIFICATIONS_FILE: &str = "read_notifications.json";

type ReadMap = BTreeMap<String, Vec<String>>;

/// Stores which notification ids each user has already seen.
#[derive(Debug, Clone)]
pub struct ReadNotificationStore {
    file: JsonFile<ReadMap>,
}

impl ReadNotificationStore {
    /// Open the store inside `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir.join(READ_NOTIFICATIONS_FILE)),
        }
    }

    /// Ids read by `user_id`, in the order they were first marked.
    pub async fn read_ids(&self, user_id: &str) -> Vec<String> {
        self.file.read().await.remove(user_id).unwrap_or_default()
    }

    /// Mark ids as read. Already-read ids are kept once.
    pub async fn mark_as_read(&self, user_id: &str, ids: &[String]) -> AppResult<()> {
        self.file
            .update(|doc| {
                let seen = doc.entry(user_id.to_string()).or_default();
                for id in ids {
                    if !seen.contains(id) {
                        seen.push(id.clone());
                    }
                }
            })
            .await?;

        tracing::debug!(user_id = %user_id, count = ids.len(), "Marked notifications as read");
        Ok(())
    }
}
