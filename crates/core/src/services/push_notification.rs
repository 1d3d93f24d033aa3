//! Push notification service for Web Push.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, URL_SAFE_NO_PAD, VapidSignature,
    VapidSignatureBuilder, WebPushClient, WebPushError, WebPushMessageBuilder,
};

use fichajes_common::config::PushConfig;
use fichajes_common::{AppError, AppResult};

use super::push_store::{NotificationTopic, PushStore, PushSubscription};

/// How long a push service keeps an undelivered message, in seconds.
const MESSAGE_TTL: u32 = 24 * 60 * 60;

/// Configuration for VAPID (Voluntary Application Server Identification).
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// Public key (base64 URL-safe encoded)
    pub public_key: String,
    /// Private key (base64 URL-safe encoded)
    pub private_key: String,
    /// Subject (typically a mailto: or https: URL)
    pub subject: String,
}

impl VapidConfig {
    /// Build from configuration. `None` unless both keys are set.
    #[must_use]
    pub fn from_config(config: &PushConfig) -> Option<Self> {
        match (&config.vapid_public_key, &config.vapid_private_key) {
            (Some(public_key), Some(private_key))
                if !public_key.is_empty() && !private_key.is_empty() =>
            {
                Some(Self {
                    public_key: public_key.clone(),
                    private_key: private_key.clone(),
                    subject: config.subject.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Push notification payload as read by the service worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl PushPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Outcome of a fan-out to one user's devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SendSummary {
    pub sent: usize,
    pub total: usize,
}

/// Why a single delivery failed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The push service no longer knows the subscription (404/410).
    #[error("subscription expired")]
    Gone,
    #[error("{0}")]
    Failed(String),
}

/// Delivers an encrypted payload to one subscription.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError>;
}

/// Web Push transport signing with VAPID.
pub struct WebPushTransport {
    vapid: VapidConfig,
    client: IsahcWebPushClient,
}

impl WebPushTransport {
    pub fn new(vapid: VapidConfig) -> AppResult<Self> {
        let client = IsahcWebPushClient::new()
            .map_err(|e| AppError::Push(format!("Failed to create push client: {e}")))?;
        Ok(Self { vapid, client })
    }

    /// VAPID signature for one subscription. Keys are URL-safe base64 without padding.
    fn sign(&self, info: &SubscriptionInfo) -> Result<VapidSignature, WebPushError> {
        let mut builder =
            VapidSignatureBuilder::from_base64(&self.vapid.private_key, URL_SAFE_NO_PAD, info)?;
        builder.add_claim("sub", self.vapid.subject.as_str());
        builder.build()
    }

    fn classify(err: WebPushError) -> DeliveryError {
        match err.short_description() {
            "endpoint_not_valid" | "endpoint_not_found" => DeliveryError::Gone,
            _ => DeliveryError::Failed(err.to_string()),
        }
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        let info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        let signature = self.sign(&info).map_err(Self::classify)?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(MESSAGE_TTL);
        let message = builder.build().map_err(Self::classify)?;

        self.client.send(message).await.map_err(Self::classify)
    }
}

/// Push notification service.
#[derive(Clone)]
pub struct PushNotificationService {
    store: PushStore,
    transport: Option<Arc<dyn PushTransport>>,
    public_key: Option<String>,
}

impl PushNotificationService {
    /// Create a service delivering over Web Push. Without VAPID keys it is
    /// disabled and sends nothing.
    pub fn new(store: PushStore, vapid: Option<VapidConfig>) -> AppResult<Self> {
        let Some(vapid) = vapid else {
            tracing::warn!("VAPID keys not configured, push notifications disabled");
            return Ok(Self::disabled(store));
        };

        let public_key = vapid.public_key.clone();
        let transport = WebPushTransport::new(vapid)?;
        Ok(Self::with_transport(store, Arc::new(transport), Some(public_key)))
    }

    /// Create a service with a custom transport.
    #[must_use]
    pub fn with_transport(
        store: PushStore,
        transport: Arc<dyn PushTransport>,
        public_key: Option<String>,
    ) -> Self {
        Self {
            store,
            transport: Some(transport),
            public_key,
        }
    }

    #[must_use]
    pub const fn disabled(store: PushStore) -> Self {
        Self {
            store,
            transport: None,
            public_key: None,
        }
    }

    /// Check if push notifications are enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Get VAPID public key.
    #[must_use]
    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }

    #[must_use]
    pub const fn store(&self) -> &PushStore {
        &self.store
    }

    /// Send `payload` to every subscription of `user_id`.
    ///
    /// Subscriptions the push service reports as gone are removed. Individual
    /// failures are logged and do not fail the call.
    pub async fn send_to_user(&self, user_id: &str, payload: &PushPayload) -> AppResult<SendSummary> {
        let Some(transport) = &self.transport else {
            tracing::warn!(user_id = %user_id, "Push disabled, notification dropped");
            return Ok(SendSummary::default());
        };

        let subscriptions = self.store.subscriptions_for_user(user_id).await;
        let body = serde_json::to_vec(payload)?;
        let mut summary = SendSummary {
            sent: 0,
            total: subscriptions.len(),
        };

        for subscription in &subscriptions {
            match transport.deliver(subscription, &body).await {
                Ok(()) => summary.sent += 1,
                Err(DeliveryError::Gone) => {
                    tracing::info!(
                        user_id = %user_id,
                        endpoint = %subscription.endpoint,
                        "Removing expired push subscription"
                    );
                    self.store.remove_endpoint(&subscription.endpoint).await?;
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        error = %e,
                        "Failed to send push notification"
                    );
                }
            }
        }

        tracing::debug!(user_id = %user_id, sent = summary.sent, total = summary.total, "Push fan-out done");
        Ok(summary)
    }

    /// Send only if the user has `topic` enabled. Returns `None` when muted.
    pub async fn notify_if_enabled(
        &self,
        user_id: &str,
        topic: NotificationTopic,
        payload: &PushPayload,
    ) -> AppResult<Option<SendSummary>> {
        if !self.store.preferences(user_id).await.allows(topic) {
            tracing::debug!(user_id = %user_id, ?topic, "Notification muted by preferences");
            return Ok(None);
        }
        self.send_to_user(user_id, payload).await.map(Some)
    }
}

/// Response for push notification configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfigResponse {
    /// Whether push notifications are available
    pub available: bool,
    /// VAPID public key for subscription
    pub public_key: Option<String>,
}
