use super::PortFuture;
use crate::types::notification::DisplayNotification;

pub trait NotificationHost: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn show_notification<'a>(
        &'a self,
        notification: &'a DisplayNotification,
    ) -> PortFuture<'a, (), Self::Error>;

    fn close_notification(&self, tag: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    pub controlled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientQuery {
    pub include_uncontrolled: bool,
}

pub trait WindowClients: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn match_all(&self, query: ClientQuery) -> PortFuture<'_, Vec<WindowClient>, Self::Error>;

    fn focus<'a>(&'a self, client_id: &'a str) -> PortFuture<'a, (), Self::Error>;

    fn open_window<'a>(&'a self, url: &'a str) -> PortFuture<'a, (), Self::Error>;

    /// Takes control of every open window in scope.
    fn claim(&self) -> PortFuture<'_, (), Self::Error>;
}

pub trait WorkerScope: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Lets a waiting worker version activate without waiting for tabs to close.
    fn skip_waiting(&self) -> PortFuture<'_, (), Self::Error>;
}
