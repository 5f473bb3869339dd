use tracing::{debug, error, info, warn};

use crate::codec::{KeyDecodeError, url_base64_to_key};
use crate::config::WorkerConfig;
use crate::ports::api::PushApi;
use crate::ports::platform::PushPlatform;
use crate::preferences::PreferenceStore;
use crate::types::preferences::{NotificationPreferences, PreferencesUpdate};
use crate::types::push::{Permission, TestNotificationRequest};

const UNSUPPORTED: &str = "Push notifications are not supported in this browser";
const STATUS_FAILED: &str = "Failed to check notification status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushStatus {
    pub supported: bool,
    pub permission: Permission,
    pub subscribed: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for PushStatus {
    fn default() -> Self {
        Self {
            supported: false,
            permission: Permission::Default,
            subscribed: false,
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("Push notifications are not supported in this browser")]
    Unsupported,
    #[error("VAPID key not available")]
    MissingKey,
    #[error("Notification permission denied. Please enable in browser settings.")]
    PermissionDenied,
    #[error("Notification permission not granted")]
    PermissionNotGranted,
    #[error("failed to request notification permission: {0}")]
    PermissionRequest(String),
    #[error("invalid application server key: {0}")]
    Key(#[from] KeyDecodeError),
    #[error("failed to register service worker: {0}")]
    Register(String),
    #[error("failed to create push subscription: {0}")]
    Platform(String),
    #[error("Failed to save subscription on server")]
    Server(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UnsubscribeError {
    #[error("Push notifications are not supported in this browser")]
    Unsupported,
    #[error("failed to read push subscription: {0}")]
    Lookup(String),
    #[error("failed to cancel push subscription: {0}")]
    Platform(String),
    #[error("push subscription could not be cancelled")]
    Refused,
}

/// No internal locking: callers must not start a subscribe or unsubscribe while
/// `status().loading` is set.
#[derive(Debug, Clone)]
pub struct SubscriptionManager<P, A> {
    platform: P,
    api: A,
    worker: WorkerConfig,
    status: PushStatus,
    vapid_key: Option<String>,
    preferences: PreferenceStore<A>,
}

impl<P, A> SubscriptionManager<P, A>
where
    P: PushPlatform,
    A: PushApi,
{
    pub fn new(platform: P, api: A, worker: WorkerConfig) -> Self {
        Self {
            platform,
            preferences: PreferenceStore::new(api.clone()),
            api,
            worker,
            status: PushStatus::default(),
            vapid_key: None,
        }
    }

    pub fn status(&self) -> &PushStatus {
        &self.status
    }

    pub fn preferences(&self) -> &NotificationPreferences {
        self.preferences.current()
    }

    pub fn vapid_key(&self) -> Option<&str> {
        self.vapid_key.as_deref()
    }

    /// Detects platform support and loads the server's key, subscription flag
    /// and preferences. The server's `subscribed` value wins over local state.
    pub async fn initialize(&mut self) {
        let capabilities = self.platform.capabilities();
        if !capabilities.is_supported() {
            info!(?capabilities, "push notifications unsupported");
            self.status.supported = false;
            self.status.loading = false;
            self.status.error = Some(UNSUPPORTED.to_string());
            return;
        }

        match self.api.vapid_public_key().await {
            Ok(key) => self.vapid_key = Some(key),
            Err(err) => warn!(error = %err, "failed to fetch VAPID public key"),
        }

        let permission = self.platform.permission();
        match self.api.subscription_status().await {
            Ok(server) => {
                debug!(subscribed = server.subscribed, "loaded subscription status");
                self.status.supported = true;
                self.status.subscribed = server.subscribed;
                self.status.permission = permission;
                self.status.loading = false;
                self.status.error = None;
                self.preferences
                    .replace(server.preferences.unwrap_or_default());
            }
            Err(err) => {
                error!(error = %err, "failed to check notification status");
                self.status.supported = true;
                self.status.permission = permission;
                self.status.loading = false;
                self.status.error = Some(STATUS_FAILED.to_string());
            }
        }
    }

    pub async fn refresh_status(&mut self) {
        self.initialize().await;
    }

    /// Flips `subscribed` only after the server stored the subscription.
    pub async fn subscribe(&mut self) -> Result<(), SubscribeError> {
        if !self.platform.capabilities().is_supported() {
            return Err(self.fail(SubscribeError::Unsupported));
        }
        let Some(key) = self.vapid_key.clone() else {
            return Err(self.fail(SubscribeError::MissingKey));
        };

        self.status.loading = true;
        self.status.error = None;

        match self.try_subscribe(&key).await {
            Ok(()) => {
                info!("push subscription saved");
                self.status.subscribed = true;
                self.status.permission = Permission::Granted;
                self.status.loading = false;
                Ok(())
            }
            Err(err) => {
                if matches!(
                    err,
                    SubscribeError::PermissionDenied | SubscribeError::PermissionNotGranted
                ) {
                    info!(error = %err, "notification permission not granted");
                } else {
                    error!(error = %err, "failed to subscribe to push");
                }
                self.status.subscribed = false;
                self.status.loading = false;
                Err(self.fail(err))
            }
        }
    }

    async fn try_subscribe(&mut self, key: &str) -> Result<(), SubscribeError> {
        let permission = self
            .platform
            .request_permission()
            .await
            .map_err(|err| SubscribeError::PermissionRequest(err.to_string()))?;
        self.status.permission = permission;
        match permission {
            Permission::Granted => {}
            Permission::Denied => return Err(SubscribeError::PermissionDenied),
            Permission::Default => return Err(SubscribeError::PermissionNotGranted),
        }

        self.platform
            .register_worker(&self.worker.script_url, &self.worker.scope)
            .await
            .map_err(|err| SubscribeError::Register(err.to_string()))?;

        let application_server_key = url_base64_to_key(key)?;
        let subscription = self
            .platform
            .subscribe(&application_server_key)
            .await
            .map_err(|err| SubscribeError::Platform(err.to_string()))?;

        self.api
            .subscribe(&subscription)
            .await
            .map_err(|err| SubscribeError::Server(err.to_string()))
    }

    /// Always ends with `subscribed = false` once the platform side is gone,
    /// whether or not the server heard about it.
    pub async fn unsubscribe(&mut self) -> Result<(), UnsubscribeError> {
        if !self.platform.capabilities().is_supported() {
            let err = UnsubscribeError::Unsupported;
            self.status.error = Some(err.to_string());
            return Err(err);
        }

        self.status.loading = true;
        self.status.error = None;

        match self.try_unsubscribe().await {
            Ok(()) => {
                self.status.subscribed = false;
                self.status.loading = false;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "failed to unsubscribe from push");
                self.status.loading = false;
                self.status.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn try_unsubscribe(&self) -> Result<(), UnsubscribeError> {
        let Some(subscription) = self
            .platform
            .current_subscription()
            .await
            .map_err(|err| UnsubscribeError::Lookup(err.to_string()))?
        else {
            debug!("no push subscription to cancel");
            return Ok(());
        };

        let cancelled = self
            .platform
            .unsubscribe(&subscription)
            .await
            .map_err(|err| UnsubscribeError::Platform(err.to_string()))?;
        if !cancelled {
            return Err(UnsubscribeError::Refused);
        }

        if let Err(err) = self.api.unsubscribe(&subscription).await {
            warn!(
                error = %err,
                endpoint = %subscription.endpoint,
                "failed to remove subscription on server"
            );
        }
        info!(endpoint = %subscription.endpoint, "push subscription cancelled");
        Ok(())
    }

    /// Returns whether the server accepted the change.
    pub async fn update_preferences(&mut self, update: &PreferencesUpdate) -> bool {
        self.preferences.update(update).await.is_ok()
    }

    /// Diagnostic round trip through the server; leaves status untouched.
    pub async fn send_test_notification(&self) -> bool {
        match self
            .api
            .send_test_notification(&TestNotificationRequest::default())
            .await
        {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to send test notification");
                false
            }
        }
    }

    fn fail<E: std::fmt::Display>(&mut self, err: E) -> E {
        self.status.error = Some(err.to_string());
        err
    }
}
