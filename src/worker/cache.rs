use tracing::{debug, info, warn};

use super::events::{RespondWith, WaitUntil, WorkerError};
use crate::config::CacheConfig;
use crate::ports::cache::{CacheStorage, Network};
use crate::types::fetch::FetchRequest;

/// Owns the single versioned resource cache.
#[derive(Debug, Clone)]
pub struct CacheManager<C, N> {
    caches: C,
    network: N,
    config: CacheConfig,
}

impl<C, N> CacheManager<C, N>
where
    C: CacheStorage,
    N: Network,
{
    pub fn new(caches: C, network: N, config: CacheConfig) -> Self {
        Self {
            caches,
            network,
            config,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.config.name
    }

    /// Caches the whole manifest; installation must not finish before this does.
    pub fn precache(&self) -> WaitUntil<'_> {
        Box::pin(async move {
            info!(
                cache = %self.config.name,
                entries = self.config.manifest.len(),
                "caching static assets"
            );
            self.caches
                .add_all(&self.config.name, &self.config.manifest)
                .await
                .map_err(|err| WorkerError::Precache(err.to_string()))
        })
    }

    /// Deletes every cache whose name is not the current version.
    pub fn purge_stale(&self) -> WaitUntil<'_> {
        Box::pin(async move {
            let names = self
                .caches
                .keys()
                .await
                .map_err(|err| WorkerError::CachePurge(err.to_string()))?;

            let mut failures = Vec::new();
            for name in names.iter().filter(|name| **name != self.config.name) {
                match self.caches.delete(name).await {
                    Ok(_) => info!(cache = %name, "deleted stale cache"),
                    Err(err) => {
                        warn!(cache = %name, error = %err, "failed to delete stale cache");
                        failures.push(format!("{name}: {err}"));
                    }
                }
            }

            if failures.is_empty() {
                Ok(())
            } else {
                Err(WorkerError::CachePurge(failures.join(", ")))
            }
        })
    }

    /// Network first for top-level navigations, offline page on network failure.
    /// Every other request is left alone.
    pub fn respond_to(&self, request: &FetchRequest) -> Option<RespondWith<'_>> {
        if !request.is_navigation() {
            return None;
        }

        let request = request.clone();
        Some(Box::pin(async move {
            match self.network.fetch(&request).await {
                Ok(response) => Some(response),
                Err(err) => {
                    warn!(url = %request.url, error = %err, "navigation failed, serving offline page");
                    match self.caches.match_url(&self.config.offline_url).await {
                        Ok(Some(offline)) => Some(offline),
                        Ok(None) => {
                            debug!(url = %self.config.offline_url, "offline page not cached");
                            None
                        }
                        Err(err) => {
                            warn!(error = %err, "failed to read offline page from cache");
                            None
                        }
                    }
                }
            }
        }))
    }
}
