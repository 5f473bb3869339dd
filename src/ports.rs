use std::future::Future;
use std::pin::Pin;

pub mod api;
pub mod cache;
pub mod platform;
pub mod push;
pub mod time;
pub mod worker;

pub type PortFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;
