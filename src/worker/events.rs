use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::types::fetch::{FetchRequest, FetchResponse};
use crate::types::notification::{DisplayNotification, NotificationData};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to cache manifest: {0}")]
    Precache(String),
    #[error("failed to purge stale caches: {0}")]
    CachePurge(String),
}

/// Work the host must await before it may consider the event settled.
pub type WaitUntil<'a> = Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send + 'a>>;

/// Replacement response for an intercepted request. `None` surfaces as a
/// network error to the page.
pub type RespondWith<'a> = Pin<Box<dyn Future<Output = Option<FetchResponse>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    Push(PushEvent),
    NotificationClick(NotificationClickEvent),
    NotificationClose(NotificationCloseEvent),
    Message(MessageEvent),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushEvent {
    pub data: Option<Vec<u8>>,
}

impl PushEvent {
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }
}

/// What the platform hands back about a displayed notification. Handlers read
/// everything they need from here, never from earlier events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSnapshot {
    pub title: String,
    pub tag: String,
    pub data: Option<NotificationData>,
}

impl From<&DisplayNotification> for NotificationSnapshot {
    fn from(notification: &DisplayNotification) -> Self {
        Self {
            title: notification.title.clone(),
            tag: notification.options.tag.clone(),
            data: Some(notification.options.data.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationClickEvent {
    /// Empty when the notification body was clicked.
    pub action: String,
    pub notification: NotificationSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCloseEvent {
    pub notification: NotificationSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub data: serde_json::Value,
}

/// Commands a page may post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    SkipWaiting,
}

pub enum EventResponse<'a> {
    /// Nothing left to do once the handler returned.
    Settled,
    WaitUntil(WaitUntil<'a>),
    RespondWith(RespondWith<'a>),
    /// The request is left to the network untouched.
    Passthrough,
}

impl std::fmt::Debug for EventResponse<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventResponse::Settled => f.write_str("Settled"),
            EventResponse::WaitUntil(_) => f.write_str("WaitUntil(..)"),
            EventResponse::RespondWith(_) => f.write_str("RespondWith(..)"),
            EventResponse::Passthrough => f.write_str("Passthrough"),
        }
    }
}

impl EventResponse<'_> {
    pub fn extends_lifetime(&self) -> bool {
        matches!(
            self,
            EventResponse::WaitUntil(_) | EventResponse::RespondWith(_)
        )
    }

    /// Drives any pending work to completion.
    pub async fn settle(self) -> Result<Option<FetchResponse>, WorkerError> {
        match self {
            EventResponse::Settled | EventResponse::Passthrough => Ok(None),
            EventResponse::WaitUntil(work) => work.await.map(|()| None),
            EventResponse::RespondWith(response) => Ok(response.await),
        }
    }
}
