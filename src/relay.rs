use base64::{URL_SAFE_NO_PAD, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{info, warn};

use crate::adapters::WebPushSender;
use crate::codec::{KeyDecodeError, url_base64_to_key};
use crate::config::RelayConfig;
use crate::ports::push::PushSender;
use crate::types::notification::{PayloadError, PushPayload};
use crate::types::push::{PushSubscription, VapidConfig};

// A random 32-byte scalar falls outside the P-256 order with negligible odds.
const KEY_ATTEMPTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("VAPID credentials are not configured")]
    Missing,
    #[error("incomplete VAPID configuration: private key, public key and subject are all required")]
    Incomplete,
    #[error("VAPID public key cannot be handed to subscribers: {0}")]
    PublicKey(#[from] KeyDecodeError),
    #[error("VAPID public key is not an uncompressed P-256 point ({0} bytes)")]
    PublicKeyShape(usize),
    #[error("failed to draw a valid P-256 private key")]
    KeyGeneration,
    #[error("failed to init web-push: {0}")]
    Client(#[from] web_push::WebPushError),
    #[error("refusing to send invalid payload: {0}")]
    Payload(#[from] PayloadError),
}

/// A key pair in the URL-safe base64 form the server and subscribers exchange.
#[derive(Debug, Clone)]
pub struct RelayKeys {
    pub private_key: String,
    pub public_key: String,
}

impl RelayKeys {
    pub fn into_config(self, subject: String) -> RelayConfig {
        RelayConfig {
            vapid_private_key: Some(self.private_key),
            vapid_public_key: Some(self.public_key),
            vapid_subject: Some(subject),
        }
    }
}

/// Reads the relay section into signing credentials. Blank values count as
/// unset, and the public key must be one a subscriber could pass to the
/// platform as its application server key.
pub fn vapid_config(config: &RelayConfig) -> Result<VapidConfig, RelayError> {
    let value = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let fields = (
        value(&config.vapid_private_key),
        value(&config.vapid_public_key),
        value(&config.vapid_subject),
    );

    let (private_key, public_key, subject) = match fields {
        (Some(private_key), Some(public_key), Some(subject)) => (private_key, public_key, subject),
        (None, None, None) => return Err(RelayError::Missing),
        _ => return Err(RelayError::Incomplete),
    };
    check_public_key(&public_key)?;

    Ok(VapidConfig {
        private_key,
        public_key,
        subject,
    })
}

fn check_public_key(public_key: &str) -> Result<(), RelayError> {
    let key = url_base64_to_key(public_key)?;
    if !key.is_uncompressed_p256() {
        return Err(RelayError::PublicKeyShape(key.len()));
    }
    Ok(())
}

pub fn sender_from_config(config: &RelayConfig) -> Result<WebPushSender, RelayError> {
    let vapid = vapid_config(config)?;
    Ok(WebPushSender::new(vapid)?)
}

pub fn generate_keys() -> Result<RelayKeys, RelayError> {
    generate_keys_with_rng(&mut OsRng)
}

pub(crate) fn generate_keys_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<RelayKeys, RelayError> {
    let scalar = (0..KEY_ATTEMPTS)
        .find_map(|_| {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            ES256KeyPair::from_bytes(&bytes).ok()
        })
        .ok_or(RelayError::KeyGeneration)?
        .to_bytes();

    let private_key = encode_config(scalar, URL_SAFE_NO_PAD);
    let point = web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
        .get_public_key();
    let public_key = encode_config(point, URL_SAFE_NO_PAD);
    check_public_key(&public_key)?;

    Ok(RelayKeys {
        private_key,
        public_key,
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Endpoints the relay rejected.
    pub failed: Vec<String>,
}

/// Sends `payload` to every subscription. The payload must decode the way the
/// worker will decode it; individual delivery failures are collected.
pub async fn deliver<S: PushSender>(
    sender: &S,
    subscriptions: &[PushSubscription],
    payload: &[u8],
) -> Result<DeliveryReport, RelayError> {
    PushPayload::decode(Some(payload))?;

    let mut report = DeliveryReport::default();
    for subscription in subscriptions {
        match sender.send(subscription, payload).await {
            Ok(()) => {
                info!(endpoint = %subscription.endpoint, "push delivered");
                report.delivered += 1;
            }
            Err(err) => {
                warn!(endpoint = %subscription.endpoint, error = %err, "push delivery failed");
                report.failed.push(subscription.endpoint.clone());
            }
        }
    }
    Ok(report)
}
