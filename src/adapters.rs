use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use reqwest::header::COOKIE;
use time::OffsetDateTime;
use url::Url;

use crate::config::ApiConfig;
use crate::ports::PortFuture;
use crate::ports::api::PushApi;
use crate::ports::cache::{CacheStorage, Network};
use crate::ports::push::PushSender;
use crate::ports::time::TimeProvider;
use crate::types::fetch::{FetchRequest, FetchResponse, RequestMode};
use crate::types::preferences::NotificationPreferences;
use crate::types::push::{
    PublicKeyResponse, PushSubscription, QuickCompletion, SubscriptionStatus,
    TestNotificationRequest, VapidConfig,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),
}

/// Server endpoints over HTTP. Every call forwards the session cookie when one
/// is configured.
#[derive(Debug, Clone)]
pub struct HttpPushApi {
    client: reqwest::Client,
    base_url: Url,
    quick_complete_url: Url,
    session_cookie: Option<String>,
}

impl HttpPushApi {
    pub fn new(config: &ApiConfig, origin: &Url) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let quick_complete_url = origin.join(&config.quick_complete_path)?;

        Ok(Self {
            client,
            base_url,
            quick_complete_url,
            session_cookie: config.session_cookie.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self.session_cookie.as_deref() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(response)
    }

    async fn send_json<T: serde::Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &T,
    ) -> Result<(), ApiError> {
        self.execute(self.request(method, url).json(body)).await?;
        Ok(())
    }
}

impl PushApi for HttpPushApi {
    type Error = ApiError;

    fn vapid_public_key(&self) -> PortFuture<'_, String, Self::Error> {
        Box::pin(async move {
            let url = self.endpoint("push/vapid-public-key")?;
            let response = self.execute(self.request(reqwest::Method::GET, url)).await?;
            let body: PublicKeyResponse = response.json().await?;
            Ok(body.public_key)
        })
    }

    fn subscription_status(&self) -> PortFuture<'_, SubscriptionStatus, Self::Error> {
        Box::pin(async move {
            let url = self.endpoint("push/status")?;
            let response = self.execute(self.request(reqwest::Method::GET, url)).await?;
            Ok(response.json().await?)
        })
    }

    fn subscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = self.endpoint("push/subscribe")?;
            self.send_json(reqwest::Method::POST, url, subscription)
                .await
        })
    }

    fn unsubscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = self.endpoint("push/unsubscribe")?;
            self.send_json(reqwest::Method::DELETE, url, subscription)
                .await
        })
    }

    fn update_preferences<'a>(
        &'a self,
        preferences: &'a NotificationPreferences,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = self.endpoint("push/preferences")?;
            self.send_json(reqwest::Method::PUT, url, preferences).await
        })
    }

    fn send_test_notification<'a>(
        &'a self,
        request: &'a TestNotificationRequest,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = self.endpoint("push/test")?;
            self.send_json(reqwest::Method::POST, url, request).await
        })
    }

    fn quick_complete<'a>(
        &'a self,
        completion: &'a QuickCompletion,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = self.quick_complete_url.clone();
            self.send_json(reqwest::Method::POST, url, completion).await
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid request url '{url}': {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid request method '{0}'")]
    Method(String),
    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Plain network fetch with origin-relative urls resolved against `origin`.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, origin })
    }
}

impl Network for HttpNetwork {
    type Error = NetworkError;

    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> PortFuture<'a, FetchResponse, Self::Error> {
        Box::pin(async move {
            let url = self
                .origin
                .join(&request.url)
                .map_err(|source| NetworkError::Url {
                    url: request.url.clone(),
                    source,
                })?;
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|_| NetworkError::Method(request.method.clone()))?;
            let response = self.client.request(method, url).send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.bytes().await?.to_vec();
            Ok(FetchResponse {
                status,
                headers,
                body,
            })
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("refusing to cache {url}: status {status}")]
    BadStatus { url: String, status: u16 },
    #[error("cache storage lock poisoned")]
    Poisoned,
}

type CacheMap = BTreeMap<String, BTreeMap<String, FetchResponse>>;

/// Named caches kept in process memory, filled through a [`Network`].
#[derive(Debug, Clone)]
pub struct MemoryCacheStorage<N> {
    network: N,
    caches: Arc<Mutex<CacheMap>>,
}

impl<N: Network> MemoryCacheStorage<N> {
    pub fn new(network: N) -> Self {
        Self {
            network,
            caches: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn put(
        &self,
        cache_name: &str,
        url: &str,
        response: FetchResponse,
    ) -> Result<(), CacheError> {
        let mut caches = self.caches.lock().map_err(|_| CacheError::Poisoned)?;
        caches
            .entry(cache_name.to_string())
            .or_default()
            .insert(url.to_string(), response);
        Ok(())
    }
}

impl<N: Network> CacheStorage for MemoryCacheStorage<N> {
    type Error = CacheError;

    fn add_all<'a>(
        &'a self,
        cache_name: &'a str,
        urls: &'a [String],
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            {
                let mut caches = self.caches.lock().map_err(|_| CacheError::Poisoned)?;
                caches.entry(cache_name.to_string()).or_default();
            }

            let mut fetched = Vec::with_capacity(urls.len());
            for url in urls {
                let request = FetchRequest::get(url.clone(), RequestMode::NoCors);
                let response = self
                    .network
                    .fetch(&request)
                    .await
                    .map_err(|err| CacheError::Fetch {
                        url: url.clone(),
                        message: err.to_string(),
                    })?;
                if !response.is_ok() {
                    return Err(CacheError::BadStatus {
                        url: url.clone(),
                        status: response.status,
                    });
                }
                fetched.push((url.clone(), response));
            }

            let mut caches = self.caches.lock().map_err(|_| CacheError::Poisoned)?;
            let cache = caches.entry(cache_name.to_string()).or_default();
            cache.extend(fetched);
            Ok(())
        })
    }

    fn keys(&self) -> PortFuture<'_, Vec<String>, Self::Error> {
        Box::pin(async move {
            let caches = self.caches.lock().map_err(|_| CacheError::Poisoned)?;
            Ok(caches.keys().cloned().collect())
        })
    }

    fn delete<'a>(&'a self, cache_name: &'a str) -> PortFuture<'a, bool, Self::Error> {
        Box::pin(async move {
            let mut caches = self.caches.lock().map_err(|_| CacheError::Poisoned)?;
            Ok(caches.remove(cache_name).is_some())
        })
    }

    fn match_url<'a>(
        &'a self,
        url: &'a str,
    ) -> PortFuture<'a, Option<FetchResponse>, Self::Error> {
        Box::pin(async move {
            let caches = self.caches.lock().map_err(|_| CacheError::Poisoned)?;
            Ok(caches.values().find_map(|cache| cache.get(url).cloned()))
        })
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }
}

impl PushSender for WebPushSender {
    type Error = web_push::WebPushError;

    fn send<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        payload: &'a [u8],
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let subscription_info = web_push::SubscriptionInfo::new(
                subscription.endpoint.clone(),
                subscription.keys.p256dh.clone(),
                subscription.keys.auth.clone(),
            );
            let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
            builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload);
            let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
                &self.vapid.private_key,
                web_push::URL_SAFE_NO_PAD,
                &subscription_info,
            )?;
            signature_builder.add_claim("sub", self.vapid.subject.as_str());
            builder.set_vapid_signature(signature_builder.build()?);
            self.client.send(builder.build()?).await?;
            Ok(())
        })
    }
}
