use super::PortFuture;
use crate::types::push::PushSubscription;

/// Delivers an encrypted payload to a subscription through the push relay.
pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn send<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        payload: &'a [u8],
    ) -> PortFuture<'a, (), Self::Error>;
}
