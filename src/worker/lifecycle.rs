use tracing::{debug, info, warn};

use super::events::{EventResponse, MessageEvent, WaitUntil, WorkerMessage};
use crate::ports::worker::{WindowClients, WorkerScope};

/// Installation, activation and version handoff of the worker itself.
#[derive(Debug, Clone)]
pub struct LifecycleController<S, W> {
    scope: S,
    clients: W,
}

impl<S, W> LifecycleController<S, W>
where
    S: WorkerScope,
    W: WindowClients,
{
    pub fn new(scope: S, clients: W) -> Self {
        Self { scope, clients }
    }

    /// Asks for immediate activation, then holds installation open until
    /// `precache` settles.
    pub fn install<'a>(&'a self, precache: WaitUntil<'a>) -> WaitUntil<'a> {
        Box::pin(async move {
            info!("installing service worker");
            self.skip_waiting().await;
            precache.await
        })
    }

    /// Runs `purge` and takes control of every open window, including ones
    /// loaded before this version activated.
    pub fn activate<'a>(&'a self, purge: WaitUntil<'a>) -> WaitUntil<'a> {
        Box::pin(async move {
            info!("activating service worker");
            let purged = purge.await;
            if let Err(err) = self.clients.claim().await {
                warn!(error = %err, "failed to claim clients");
            }
            purged
        })
    }

    pub fn on_message(&self, event: &MessageEvent) -> EventResponse<'_> {
        match serde_json::from_value::<WorkerMessage>(event.data.clone()) {
            Ok(WorkerMessage::SkipWaiting) => {
                info!("skip waiting requested by page");
                EventResponse::WaitUntil(Box::pin(async move {
                    self.skip_waiting().await;
                    Ok(())
                }))
            }
            Err(_) => {
                debug!(data = %event.data, "ignoring unrecognized message");
                EventResponse::Settled
            }
        }
    }

    async fn skip_waiting(&self) {
        if let Err(err) = self.scope.skip_waiting().await {
            warn!(error = %err, "failed to skip waiting");
        }
    }
}
