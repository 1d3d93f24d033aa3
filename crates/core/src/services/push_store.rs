//! Push subscriptions and notification preferences.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use fichajes_common::AppResult;

use super::json_store::JsonFile;

pub const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Encryption keys of a browser push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser push subscription as produced by `PushManager.subscribe()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// A stored subscription. One record per endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub subscription: PushSubscription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub updated_at: String,
}

/// Notification categories a user can opt out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTopic {
    /// Shift reminders.
    Fichajes,
    /// Vacation decisions.
    Vacaciones,
    /// Correction decisions.
    Cambios,
}

const fn enabled() -> bool {
    true
}

/// Per-user preferences. Anything not stored defaults to enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "enabled")]
    pub fichajes: bool,
    #[serde(default = "enabled")]
    pub vacaciones: bool,
    #[serde(default = "enabled")]
    pub cambios: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            fichajes: true,
            vacaciones: true,
            cambios: true,
        }
    }
}

impl NotificationPreferences {
    #[must_use]
    pub const fn allows(&self, topic: NotificationTopic) -> bool {
        match topic {
            NotificationTopic::Fichajes => self.fichajes,
            NotificationTopic::Vacaciones => self.vacaciones,
            NotificationTopic::Cambios => self.cambios,
        }
    }
}

/// Partial preference update. `None` leaves the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub fichajes: Option<bool>,
    pub vacaciones: Option<bool>,
    pub cambios: Option<bool>,
}

impl PreferencesUpdate {
    /// Pick the boolean keys out of an arbitrary JSON body.
    #[must_use]
    pub fn from_json(body: &serde_json::Value) -> Self {
        let flag = |key: &str| body.get(key).and_then(serde_json::Value::as_bool);
        Self {
            fichajes: flag("fichajes"),
            vacaciones: flag("vacaciones"),
            cambios: flag("cambios"),
        }
    }

    fn apply(self, prefs: &mut NotificationPreferences) {
        if let Some(v) = self.fichajes {
            prefs.fichajes = v;
        }
        if let Some(v) = self.vacaciones {
            prefs.vacaciones = v;
        }
        if let Some(v) = self.cambios {
            prefs.cambios = v;
        }
    }
}

/// Subscription and preference storage.
#[derive(Debug, Clone)]
pub struct PushStore {
    subscriptions: JsonFile<Vec<SubscriptionRecord>>,
    preferences: JsonFile<BTreeMap<String, NotificationPreferences>>,
}

impl PushStore {
    /// Open the store inside `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            subscriptions: JsonFile::new(data_dir.join(SUBSCRIPTIONS_FILE)),
            preferences: JsonFile::new(data_dir.join(PREFERENCES_FILE)),
        }
    }

    /// Insert or replace the record for the subscription's endpoint.
    pub async fn save_subscription(
        &self,
        user_id: &str,
        subscription: PushSubscription,
        user_agent: Option<String>,
    ) -> AppResult<()> {
        let record = SubscriptionRecord {
            user_id: user_id.to_string(),
            subscription,
            user_agent,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        self.subscriptions
            .update(move |records| {
                match records
                    .iter_mut()
                    .find(|r| r.subscription.endpoint == record.subscription.endpoint)
                {
                    Some(existing) => *existing = record,
                    None => records.push(record),
                }
            })
            .await?;

        tracing::debug!(user_id = %user_id, "Saved push subscription");
        Ok(())
    }

    pub async fn subscriptions_for_user(&self, user_id: &str) -> Vec<PushSubscription> {
        self.subscriptions
            .read()
            .await
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.subscription)
            .collect()
    }

    pub async fn all_subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.subscriptions.read().await
    }

    /// Drop every record for `endpoint`. Returns whether anything was removed.
    pub async fn remove_endpoint(&self, endpoint: &str) -> AppResult<bool> {
        self.subscriptions
            .update(|records| {
                let before = records.len();
                records.retain(|r| r.subscription.endpoint != endpoint);
                records.len() != before
            })
            .await
    }

    pub async fn preferences(&self, user_id: &str) -> NotificationPreferences {
        self.preferences
            .read()
            .await
            .remove(user_id)
            .unwrap_or_default()
    }

    /// Merge `update` into the stored preferences and return the result.
    pub async fn save_preferences(
        &self,
        user_id: &str,
        update: PreferencesUpdate,
    ) -> AppResult<NotificationPreferences> {
        self.preferences
            .update(|doc| {
                let prefs = doc.entry(user_id.to_string()).or_default();
                update.apply(prefs);
                *prefs
            })
            .await
    }
}
