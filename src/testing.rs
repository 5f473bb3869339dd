use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::codec::ApplicationServerKey;
use crate::ports::PortFuture;
use crate::ports::api::PushApi;
use crate::ports::cache::Network;
use crate::ports::platform::{PlatformCapabilities, PushPlatform};
use crate::ports::push::PushSender;
use crate::ports::time::TimeProvider;
use crate::ports::worker::{
    ClientQuery, NotificationHost, WindowClient, WindowClients, WorkerScope,
};
use crate::types::fetch::{FetchRequest, FetchResponse};
use crate::types::notification::DisplayNotification;
use crate::types::preferences::NotificationPreferences;
use crate::types::push::{
    Permission, PushSubscription, QuickCompletion, SubscriptionKeys, SubscriptionStatus,
    TestNotificationRequest,
};

pub(crate) const TEST_PUBLIC_KEY: &str =
    "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct FakeError(pub(crate) String);

fn failure(operation: &str) -> FakeError {
    FakeError(format!("{operation} failed"))
}

pub(crate) fn subscription(endpoint: &str) -> PushSubscription {
    PushSubscription {
        endpoint: endpoint.to_string(),
        expiration_time: None,
        keys: SubscriptionKeys {
            p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM".to_string(),
            auth: "tBHItJI5svbpez7KI4CCXg".to_string(),
        },
    }
}

#[derive(Clone)]
pub(crate) struct FixedTime(pub(crate) OffsetDateTime);

impl FixedTime {
    pub(crate) fn at(rfc3339: &str) -> Self {
        Self(OffsetDateTime::parse(rfc3339, &Rfc3339).expect("valid timestamp"))
    }
}

impl TimeProvider for FixedTime {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[derive(Default)]
struct NetworkState {
    responses: HashMap<String, (u16, String)>,
    offline: bool,
    requests: Vec<String>,
}

/// Serves registered urls; anything else is a 404.
#[derive(Clone, Default)]
pub(crate) struct FakeNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl FakeNetwork {
    pub(crate) fn serve(&self, url: &str, status: u16, body: &str) {
        self.state
            .lock()
            .expect("network lock")
            .responses
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub(crate) fn go_offline(&self) {
        self.state.lock().expect("network lock").offline = true;
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.lock().expect("network lock").requests.clone()
    }
}

impl Network for FakeNetwork {
    type Error = FakeError;

    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> PortFuture<'a, FetchResponse, Self::Error> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("network lock");
            state.requests.push(request.url.clone());
            if state.offline {
                return Err(FakeError("network unreachable".to_string()));
            }
            let (status, body) = state
                .responses
                .get(&request.url)
                .cloned()
                .unwrap_or((404, String::new()));
            Ok(FetchResponse {
                status,
                headers: Vec::new(),
                body: body.into_bytes(),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    VapidPublicKey,
    Status,
    Subscribe(PushSubscription),
    Unsubscribe(PushSubscription),
    UpdatePreferences(NotificationPreferences),
    SendTest(TestNotificationRequest),
    QuickComplete(QuickCompletion),
}

struct ApiState {
    public_key: String,
    status: SubscriptionStatus,
    failing: HashSet<String>,
    calls: Vec<ApiCall>,
}

#[derive(Clone)]
pub(crate) struct FakeApi {
    state: Arc<Mutex<ApiState>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(ApiState {
                public_key: TEST_PUBLIC_KEY.to_string(),
                status: SubscriptionStatus::default(),
                failing: HashSet::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeApi {
    pub(crate) fn with_public_key(&self, key: &str) {
        self.state.lock().expect("api lock").public_key = key.to_string();
    }

    pub(crate) fn with_status(&self, status: SubscriptionStatus) {
        self.state.lock().expect("api lock").status = status;
    }

    /// Makes every later call to `operation` fail.
    pub(crate) fn fail(&self, operation: &str) {
        self.state
            .lock()
            .expect("api lock")
            .failing
            .insert(operation.to_string());
    }

    pub(crate) fn recover(&self, operation: &str) {
        self.state
            .lock()
            .expect("api lock")
            .failing
            .remove(operation);
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().expect("api lock").calls.clone()
    }

    fn record(&self, operation: &str, call: ApiCall) -> Result<(), FakeError> {
        let mut state = self.state.lock().expect("api lock");
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(failure(operation));
        }
        Ok(())
    }
}

impl PushApi for FakeApi {
    type Error = FakeError;

    fn vapid_public_key(&self) -> PortFuture<'_, String, Self::Error> {
        Box::pin(async move {
            self.record("vapid_public_key", ApiCall::VapidPublicKey)?;
            Ok(self.state.lock().expect("api lock").public_key.clone())
        })
    }

    fn subscription_status(&self) -> PortFuture<'_, SubscriptionStatus, Self::Error> {
        Box::pin(async move {
            self.record("subscription_status", ApiCall::Status)?;
            Ok(self.state.lock().expect("api lock").status.clone())
        })
    }

    fn subscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move { self.record("subscribe", ApiCall::Subscribe(subscription.clone())) })
    }

    fn unsubscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record("unsubscribe", ApiCall::Unsubscribe(subscription.clone()))
        })
    }

    fn update_preferences<'a>(
        &'a self,
        preferences: &'a NotificationPreferences,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(
                "update_preferences",
                ApiCall::UpdatePreferences(*preferences),
            )
        })
    }

    fn send_test_notification<'a>(
        &'a self,
        request: &'a TestNotificationRequest,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record("send_test_notification", ApiCall::SendTest(request.clone()))
        })
    }

    fn quick_complete<'a>(
        &'a self,
        completion: &'a QuickCompletion,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record("quick_complete", ApiCall::QuickComplete(completion.clone()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlatformCall {
    RequestPermission,
    RegisterWorker { script_url: String, scope: String },
    Subscribe(Vec<u8>),
    CurrentSubscription,
    Unsubscribe(String),
}

struct PlatformState {
    capabilities: PlatformCapabilities,
    permission: Permission,
    permission_answer: Permission,
    subscription: Option<PushSubscription>,
    unsubscribe_result: bool,
    failing: HashSet<String>,
    calls: Vec<PlatformCall>,
}

#[derive(Clone)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(PlatformState {
                capabilities: PlatformCapabilities::all(),
                permission: Permission::Default,
                permission_answer: Permission::Granted,
                subscription: None,
                unsubscribe_result: true,
                failing: HashSet::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakePlatform {
    pub(crate) fn unsupported() -> Self {
        let platform = Self::default();
        platform.state.lock().expect("platform lock").capabilities = PlatformCapabilities::none();
        platform
    }

    pub(crate) fn with_permission(&self, permission: Permission) {
        self.state.lock().expect("platform lock").permission = permission;
    }

    /// What the user picks when prompted.
    pub(crate) fn answer_prompt_with(&self, permission: Permission) {
        self.state.lock().expect("platform lock").permission_answer = permission;
    }

    pub(crate) fn with_subscription(&self, subscription: PushSubscription) {
        self.state.lock().expect("platform lock").subscription = Some(subscription);
    }

    pub(crate) fn refuse_unsubscribe(&self) {
        self.state.lock().expect("platform lock").unsubscribe_result = false;
    }

    pub(crate) fn fail(&self, operation: &str) {
        self.state
            .lock()
            .expect("platform lock")
            .failing
            .insert(operation.to_string());
    }

    pub(crate) fn subscription(&self) -> Option<PushSubscription> {
        self.state.lock().expect("platform lock").subscription.clone()
    }

    pub(crate) fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().expect("platform lock").calls.clone()
    }

    fn record(&self, operation: &str, call: PlatformCall) -> Result<(), FakeError> {
        let mut state = self.state.lock().expect("platform lock");
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(failure(operation));
        }
        Ok(())
    }
}

impl PushPlatform for FakePlatform {
    type Error = FakeError;

    fn capabilities(&self) -> PlatformCapabilities {
        self.state.lock().expect("platform lock").capabilities
    }

    fn permission(&self) -> Permission {
        self.state.lock().expect("platform lock").permission
    }

    fn request_permission(&self) -> PortFuture<'_, Permission, Self::Error> {
        Box::pin(async move {
            self.record("request_permission", PlatformCall::RequestPermission)?;
            let mut state = self.state.lock().expect("platform lock");
            state.permission = state.permission_answer;
            Ok(state.permission)
        })
    }

    fn register_worker<'a>(
        &'a self,
        script_url: &'a str,
        scope: &'a str,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(
                "register_worker",
                PlatformCall::RegisterWorker {
                    script_url: script_url.to_string(),
                    scope: scope.to_string(),
                },
            )
        })
    }

    fn subscribe<'a>(
        &'a self,
        application_server_key: &'a ApplicationServerKey,
    ) -> PortFuture<'a, PushSubscription, Self::Error> {
        Box::pin(async move {
            self.record(
                "subscribe",
                PlatformCall::Subscribe(application_server_key.as_bytes().to_vec()),
            )?;
            let created = subscription("https://fcm.googleapis.com/fcm/send/fake-endpoint");
            self.state.lock().expect("platform lock").subscription = Some(created.clone());
            Ok(created)
        })
    }

    fn current_subscription(&self) -> PortFuture<'_, Option<PushSubscription>, Self::Error> {
        Box::pin(async move {
            self.record("current_subscription", PlatformCall::CurrentSubscription)?;
            Ok(self.subscription())
        })
    }

    fn unsubscribe<'a>(
        &'a self,
        subscription: &'a PushSubscription,
    ) -> PortFuture<'a, bool, Self::Error> {
        Box::pin(async move {
            self.record(
                "unsubscribe",
                PlatformCall::Unsubscribe(subscription.endpoint.clone()),
            )?;
            let mut state = self.state.lock().expect("platform lock");
            if state.unsubscribe_result {
                state.subscription = None;
            }
            Ok(state.unsubscribe_result)
        })
    }
}

#[derive(Default)]
struct HostState {
    shown: Vec<DisplayNotification>,
    closed: Vec<String>,
    fail_show: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeHost {
    state: Arc<Mutex<HostState>>,
}

impl FakeHost {
    pub(crate) fn fail_show(&self) {
        self.state.lock().expect("host lock").fail_show = true;
    }

    pub(crate) fn shown(&self) -> Vec<DisplayNotification> {
        self.state.lock().expect("host lock").shown.clone()
    }

    pub(crate) fn closed(&self) -> Vec<String> {
        self.state.lock().expect("host lock").closed.clone()
    }
}

impl NotificationHost for FakeHost {
    type Error = FakeError;

    fn show_notification<'a>(
        &'a self,
        notification: &'a DisplayNotification,
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("host lock");
            if state.fail_show {
                return Err(failure("show_notification"));
            }
            state.shown.push(notification.clone());
            Ok(())
        })
    }

    fn close_notification(&self, tag: &str) {
        self.state
            .lock()
            .expect("host lock")
            .closed
            .push(tag.to_string());
    }
}

#[derive(Default)]
struct ClientsState {
    windows: Vec<WindowClient>,
    focused: Vec<String>,
    opened: Vec<String>,
    claim_calls: usize,
    fail_focus: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeClients {
    state: Arc<Mutex<ClientsState>>,
}

impl FakeClients {
    pub(crate) fn add_window(&self, id: &str, url: &str, controlled: bool) {
        self.state
            .lock()
            .expect("clients lock")
            .windows
            .push(WindowClient {
                id: id.to_string(),
                url: url.to_string(),
                controlled,
            });
    }

    pub(crate) fn fail_focus(&self) {
        self.state.lock().expect("clients lock").fail_focus = true;
    }

    pub(crate) fn windows(&self) -> Vec<WindowClient> {
        self.state.lock().expect("clients lock").windows.clone()
    }

    pub(crate) fn focused(&self) -> Vec<String> {
        self.state.lock().expect("clients lock").focused.clone()
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.state.lock().expect("clients lock").opened.clone()
    }

    pub(crate) fn claim_calls(&self) -> usize {
        self.state.lock().expect("clients lock").claim_calls
    }
}

impl WindowClients for FakeClients {
    type Error = FakeError;

    fn match_all(&self, query: ClientQuery) -> PortFuture<'_, Vec<WindowClient>, Self::Error> {
        Box::pin(async move {
            let state = self.state.lock().expect("clients lock");
            Ok(state
                .windows
                .iter()
                .filter(|window| query.include_uncontrolled || window.controlled)
                .cloned()
                .collect())
        })
    }

    fn focus<'a>(&'a self, client_id: &'a str) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("clients lock");
            if state.fail_focus {
                return Err(failure("focus"));
            }
            state.focused.push(client_id.to_string());
            Ok(())
        })
    }

    fn open_window<'a>(&'a self, url: &'a str) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("clients lock");
            state.opened.push(url.to_string());
            let id = format!("opened-{}", state.opened.len());
            state.windows.push(WindowClient {
                id,
                url: url.to_string(),
                controlled: true,
            });
            Ok(())
        })
    }

    fn claim(&self) -> PortFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("clients lock");
            state.claim_calls += 1;
            for window in &mut state.windows {
                window.controlled = true;
            }
            Ok(())
        })
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeScope {
    skip_waiting_calls: Arc<Mutex<usize>>,
}

impl FakeScope {
    pub(crate) fn skip_waiting_calls(&self) -> usize {
        *self.skip_waiting_calls.lock().expect("scope lock")
    }
}

impl WorkerScope for FakeScope {
    type Error = FakeError;

    fn skip_waiting(&self) -> PortFuture<'_, (), Self::Error> {
        Box::pin(async move {
            *self.skip_waiting_calls.lock().expect("scope lock") += 1;
            Ok(())
        })
    }
}

#[derive(Default)]
struct SenderState {
    sent: Vec<(String, Vec<u8>)>,
    failing_endpoints: HashSet<String>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeSender {
    state: Arc<Mutex<SenderState>>,
}

impl FakeSender {
    pub(crate) fn fail_for(&self, endpoint: &str) {
        self.state
            .lock()
            .expect("sender lock")
            .failing_endpoints
            .insert(endpoint.to_string());
    }

    pub(crate) fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.state.lock().expect("sender lock").sent.clone()
    }
}

impl PushSender for FakeSender {
    type Error = FakeError;

    fn send<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        payload: &'a [u8],
    ) -> PortFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("sender lock");
            if state.failing_endpoints.contains(&subscription.endpoint) {
                return Err(failure("send"));
            }
            state
                .sent
                .push((subscription.endpoint.clone(), payload.to_vec()));
            Ok(())
        })
    }
}
