use super::PortFuture;
use crate::types::fetch::{FetchRequest, FetchResponse};

pub trait Network: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Fails only when no response was received; HTTP error statuses are
    /// returned as responses.
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> PortFuture<'a, FetchResponse, Self::Error>;
}

pub trait CacheStorage: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Fetches and stores every url, or stores nothing.
    fn add_all<'a>(&'a self, cache_name: &'a str, urls: &'a [String])
    -> PortFuture<'a, (), Self::Error>;

    fn keys(&self) -> PortFuture<'_, Vec<String>, Self::Error>;

    fn delete<'a>(&'a self, cache_name: &'a str) -> PortFuture<'a, bool, Self::Error>;

    /// Looks the url up across every cache.
    fn match_url<'a>(&'a self, url: &'a str) -> PortFuture<'a, Option<FetchResponse>, Self::Error>;
}
