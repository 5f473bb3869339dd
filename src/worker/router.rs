use tracing::{error, info, warn};
use url::Url;

use super::events::{
    EventResponse, NotificationClickEvent, NotificationCloseEvent, PushEvent, WaitUntil,
};
use crate::ports::api::PushApi;
use crate::ports::time::TimeProvider;
use crate::ports::worker::{ClientQuery, NotificationHost, WindowClients};
use crate::types::notification::{
    DisplayNotification, NotificationData, NotificationDefaults, PushPayload,
};
use crate::types::push::QuickCompletion;

const COMPLETE_TITLE: &str = "✅ Habit Completed!";
const COMPLETE_TAG: &str = "complete-success";
const SNOOZE_TITLE: &str = "⏰ Reminder Snoozed";
const SNOOZE_TAG: &str = "snooze-confirm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Complete,
    Snooze,
    Dismiss,
    /// Body click, or any action id without a dedicated handler.
    Open,
}

impl ClickAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "complete" => ClickAction::Complete,
            "snooze" => ClickAction::Snooze,
            "dismiss" => ClickAction::Dismiss,
            _ => ClickAction::Open,
        }
    }
}

/// Turns push messages into notifications and notification interactions into
/// effects. Keeps no state between events.
#[derive(Debug, Clone)]
pub struct NotificationRouter<H, W, A, T> {
    notifications: H,
    clients: W,
    api: A,
    time: T,
    defaults: NotificationDefaults,
    origin: Url,
}

impl<H, W, A, T> NotificationRouter<H, W, A, T>
where
    H: NotificationHost,
    W: WindowClients,
    A: PushApi,
    T: TimeProvider,
{
    pub fn new(
        notifications: H,
        clients: W,
        api: A,
        time: T,
        defaults: NotificationDefaults,
        origin: Url,
    ) -> Self {
        Self {
            notifications,
            clients,
            api,
            time,
            defaults,
            origin,
        }
    }

    /// Always shows exactly one notification; an unreadable payload is replaced
    /// by the defaults.
    pub fn on_push(&self, event: &PushEvent) -> WaitUntil<'_> {
        let received_at = self.time.now();
        let payload = match PushPayload::decode(event.data.as_deref()) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "failed to decode push payload, using defaults");
                PushPayload::default()
            }
        };
        let notification = payload.into_notification(&self.defaults, received_at);

        Box::pin(async move {
            info!(
                title = %notification.title,
                tag = %notification.options.tag,
                "showing push notification"
            );
            self.show(&notification).await;
            Ok(())
        })
    }

    pub fn on_click(&self, event: &NotificationClickEvent) -> EventResponse<'_> {
        let action = ClickAction::parse(&event.action);
        let data = event.notification.data.clone().unwrap_or_default();
        info!(action = %event.action, tag = %event.notification.tag, "notification clicked");

        self.notifications.close_notification(&event.notification.tag);

        match action {
            ClickAction::Dismiss => EventResponse::Settled,
            ClickAction::Complete => EventResponse::WaitUntil(Box::pin(async move {
                self.complete_habit(&data).await;
                Ok(())
            })),
            ClickAction::Snooze => EventResponse::WaitUntil(Box::pin(async move {
                self.acknowledge_snooze(&data).await;
                Ok(())
            })),
            ClickAction::Open => EventResponse::WaitUntil(Box::pin(async move {
                let url = data
                    .url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .unwrap_or(&self.defaults.url);
                self.open_app(url).await;
                Ok(())
            })),
        }
    }

    pub fn on_close(&self, event: &NotificationCloseEvent) -> EventResponse<'_> {
        info!(tag = %event.notification.tag, "notification closed");
        EventResponse::Settled
    }

    /// Records the completion; on any failure the app is opened instead so the
    /// user can finish by hand.
    async fn complete_habit(&self, data: &NotificationData) {
        let completion = QuickCompletion {
            habit_name: data.habit_name.clone(),
            date: self.time.today(),
        };

        match self.api.quick_complete(&completion).await {
            Ok(()) => {
                let habit = habit_label(data).unwrap_or("Your habit");
                let confirmation = DisplayNotification::confirmation(
                    COMPLETE_TITLE,
                    format!("{habit} marked as done!"),
                    &self.defaults.icon,
                    COMPLETE_TAG,
                    self.time.now(),
                );
                self.show(&confirmation).await;
            }
            Err(err) => {
                warn!(
                    error = %err,
                    habit = ?data.habit_name,
                    "failed to complete habit, opening app"
                );
                self.open_app(&self.defaults.url).await;
            }
        }
    }

    // Acknowledges only; rescheduling needs server-side support.
    async fn acknowledge_snooze(&self, data: &NotificationData) {
        let habit = habit_label(data).unwrap_or("your habit");
        let confirmation = DisplayNotification::confirmation(
            SNOOZE_TITLE,
            format!("We'll remind you about {habit} in 10 minutes"),
            &self.defaults.icon,
            SNOOZE_TAG,
            self.time.now(),
        );
        self.show(&confirmation).await;
    }

    /// Focuses a window already showing `url`, otherwise opens a new one.
    async fn open_app(&self, url: &str) {
        let target = self.resolve(url);
        let windows = match self
            .clients
            .match_all(ClientQuery {
                include_uncontrolled: true,
            })
            .await
        {
            Ok(windows) => windows,
            Err(err) => {
                warn!(error = %err, "failed to list windows");
                Vec::new()
            }
        };

        if let Some(window) = windows.iter().find(|window| window.url == target) {
            if let Err(err) = self.clients.focus(&window.id).await {
                error!(error = %err, url = %target, "failed to focus window");
            }
            return;
        }

        if let Err(err) = self.clients.open_window(&target).await {
            error!(error = %err, url = %target, "failed to open window");
        }
    }

    fn resolve(&self, url: &str) -> String {
        match self.origin.join(url) {
            Ok(resolved) => resolved.to_string(),
            Err(err) => {
                warn!(url, error = %err, "invalid notification url, using default route");
                self.origin
                    .join(&self.defaults.url)
                    .unwrap_or_else(|_| self.origin.clone())
                    .to_string()
            }
        }
    }

    async fn show(&self, notification: &DisplayNotification) {
        if let Err(err) = self.notifications.show_notification(notification).await {
            error!(error = %err, title = %notification.title, "failed to show notification");
        }
    }
}

fn habit_label(data: &NotificationData) -> Option<&str> {
    data.habit_name.as_deref().filter(|name| !name.is_empty())
}
