//! Services talking to the ERP, the local stores and push endpoints.

#![allow(missing_docs)]

pub mod dolibarr;
pub mod json_store;
pub mod notification_store;
pub mod push_notification;
pub mod push_store;
pub mod reminder;

pub use dolibarr::{
    API_KEY_HEADER, DolibarrClient, UpstreamBody, UpstreamResponse, encode_path, encode_segment,
};
pub use json_store::JsonFile;
pub use notification_store::ReadNotificationStore;
pub use push_notification::{
    DeliveryError, PushConfigResponse, PushNotificationService, PushPayload, PushTransport,
    SendSummary, VapidConfig, WebPushTransport,
};
pub use push_store::{
    NotificationPreferences, NotificationTopic, PreferencesUpdate, PushStore, PushSubscription,
    SubscriptionKeys, SubscriptionRecord,
};
pub use reminder::{ReminderService, ReminderSummary};
