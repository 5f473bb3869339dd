use super::PortFuture;
use crate::codec::ApplicationServerKey;
use crate::types::push::{Permission, PushSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub service_worker: bool,
    pub push_manager: bool,
    pub notifications: bool,
}

impl PlatformCapabilities {
    pub fn all() -> Self {
        Self {
            service_worker: true,
            push_manager: true,
            notifications: true,
        }
    }

    pub fn none() -> Self {
        Self {
            service_worker: false,
            push_manager: false,
            notifications: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.service_worker && self.push_manager && self.notifications
    }
}

/// Page-context view of the browser push machinery.
pub trait PushPlatform: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn capabilities(&self) -> PlatformCapabilities;

    fn permission(&self) -> Permission;

    /// Suspends until the user answers the permission prompt.
    fn request_permission(&self) -> PortFuture<'_, Permission, Self::Error>;

    /// Registers the worker script and waits until it is active. Registering an
    /// already registered script succeeds.
    fn register_worker<'a>(&'a self, script_url: &'a str, scope: &'a str)
    -> PortFuture<'a, (), Self::Error>;

    fn subscribe<'a>(
        &'a self,
        application_server_key: &'a ApplicationServerKey,
    ) -> PortFuture<'a, PushSubscription, Self::Error>;

    fn current_subscription(&self) -> PortFuture<'_, Option<PushSubscription>, Self::Error>;

    fn unsubscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, bool, Self::Error>;
}
