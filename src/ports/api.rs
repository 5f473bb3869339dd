use super::PortFuture;
use crate::types::preferences::NotificationPreferences;
use crate::types::push::{
    PushSubscription, QuickCompletion, SubscriptionStatus, TestNotificationRequest,
};

/// Remote server endpoints consumed by the page and the worker. Any non-success
/// response is an error.
pub trait PushApi: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn vapid_public_key(&self) -> PortFuture<'_, String, Self::Error>;

    fn subscription_status(&self) -> PortFuture<'_, SubscriptionStatus, Self::Error>;

    fn subscribe<'a>(&'a self, subscription: &'a PushSubscription)
    -> PortFuture<'a, (), Self::Error>;

    fn unsubscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, (), Self::Error>;

    fn update_preferences<'a>(
        &'a self,
        preferences: &'a NotificationPreferences,
    ) -> PortFuture<'a, (), Self::Error>;

    fn send_test_notification<'a>(
        &'a self,
        request: &'a TestNotificationRequest,
    ) -> PortFuture<'a, (), Self::Error>;

    fn quick_complete<'a>(
        &'a self,
        completion: &'a QuickCompletion,
    ) -> PortFuture<'a, (), Self::Error>;
}
