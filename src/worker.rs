pub mod cache;
pub mod events;
pub mod lifecycle;
pub mod router;

pub use cache::CacheManager;
pub use events::{EventResponse, WorkerError, WorkerEvent};
pub use lifecycle::LifecycleController;
pub use router::{ClickAction, NotificationRouter};

use url::Url;

use crate::config::AppConfig;
use crate::ports::api::PushApi;
use crate::ports::cache::{CacheStorage, Network};
use crate::ports::time::TimeProvider;
use crate::ports::worker::{NotificationHost, WindowClients, WorkerScope};

/// Host-provided capabilities the worker runs against.
#[derive(Debug, Clone)]
pub struct WorkerPorts<C, N, S, H, W, A, T> {
    pub caches: C,
    pub network: N,
    pub scope: S,
    pub notifications: H,
    pub clients: W,
    pub api: A,
    pub time: T,
}

#[derive(Debug, Clone)]
pub struct ServiceWorker<C, N, S, H, W, A, T> {
    cache: CacheManager<C, N>,
    lifecycle: LifecycleController<S, W>,
    router: NotificationRouter<H, W, A, T>,
}

impl<C, N, S, H, W, A, T> ServiceWorker<C, N, S, H, W, A, T>
where
    C: CacheStorage,
    N: Network,
    S: WorkerScope,
    H: NotificationHost,
    W: WindowClients,
    A: PushApi,
    T: TimeProvider,
{
    pub fn new(config: &AppConfig, origin: Url, ports: WorkerPorts<C, N, S, H, W, A, T>) -> Self {
        let WorkerPorts {
            caches,
            network,
            scope,
            notifications,
            clients,
            api,
            time,
        } = ports;

        Self {
            cache: CacheManager::new(caches, network, config.cache.clone()),
            lifecycle: LifecycleController::new(scope, clients.clone()),
            router: NotificationRouter::new(
                notifications,
                clients,
                api,
                time,
                config.notifications.clone(),
                origin,
            ),
        }
    }

    pub fn cache_name(&self) -> &str {
        self.cache.cache_name()
    }

    pub fn handle<'a>(&'a self, event: &WorkerEvent) -> EventResponse<'a> {
        match event {
            WorkerEvent::Install => {
                EventResponse::WaitUntil(self.lifecycle.install(self.cache.precache()))
            }
            WorkerEvent::Activate => {
                EventResponse::WaitUntil(self.lifecycle.activate(self.cache.purge_stale()))
            }
            WorkerEvent::Fetch(request) => match self.cache.respond_to(request) {
                Some(response) => EventResponse::RespondWith(response),
                None => EventResponse::Passthrough,
            },
            WorkerEvent::Push(push) => EventResponse::WaitUntil(self.router.on_push(push)),
            WorkerEvent::NotificationClick(click) => self.router.on_click(click),
            WorkerEvent::NotificationClose(close) => self.router.on_close(close),
            WorkerEvent::Message(message) => self.lifecycle.on_message(message),
        }
    }
}
