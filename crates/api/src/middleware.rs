//! Shared application state.

#![allow(missing_docs)]

use fichajes_common::{AppResult, Config};
use fichajes_core::{
    DolibarrClient, PushNotificationService, PushStore, ReadNotificationStore, ReminderService,
    VapidConfig,
};

/// Settings read by handlers directly.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// `None` when no secret is configured.
    pub cron_secret: Option<String>,
    pub allow_insecure_cron: bool,
    pub logout_after_clock: bool,
}

impl ApiSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            cron_secret: Some(config.cron.secret.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            allow_insecure_cron: config.cron.allow_insecure,
            logout_after_clock: config.features.logout_after_clock,
        }
    }
}

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub dolibarr: DolibarrClient,
    pub read_notifications: ReadNotificationStore,
    pub push: PushNotificationService,
    pub reminders: ReminderService,
    pub settings: ApiSettings,
}

impl AppState {
    /// Wire every service from configuration.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let dolibarr = DolibarrClient::new(&config.dolibarr)?;
        let data_dir = config.storage.data_dir.as_path();
        let push = PushNotificationService::new(
            PushStore::new(data_dir),
            VapidConfig::from_config(&config.push),
        )?;

        Self::new(dolibarr, push, config)
    }

    /// Wire state around an already built push service.
    pub fn new(
        dolibarr: DolibarrClient,
        push: PushNotificationService,
        config: &Config,
    ) -> AppResult<Self> {
        let reminders = ReminderService::new(dolibarr.clone(), push.clone(), &config.cron);

        Ok(Self {
            read_notifications: ReadNotificationStore::new(&config.storage.data_dir),
            dolibarr,
            push,
            reminders,
            settings: ApiSettings::from_config(config),
        })
    }
}
