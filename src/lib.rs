pub mod adapters;
pub mod codec;
pub mod config;
pub mod ports;
pub mod preferences;
pub mod relay;
pub mod subscription;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::url_base64_to_key;
pub use relay::generate_keys;
pub use subscription::{PushStatus, SubscriptionManager};
pub use worker::ServiceWorker;
