use serde::{Deserialize, Serialize};

/// Snapshot of a platform-issued push subscription in its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(rename = "expirationTime", default)]
    pub expiration_time: Option<i64>,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server view returned by the subscription status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub subscribed: bool,
    #[serde(default)]
    pub preferences: Option<super::preferences::NotificationPreferences>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestNotificationRequest {
    pub title: String,
    pub body: String,
}

impl Default for TestNotificationRequest {
    fn default() -> Self {
        Self {
            title: "🔔 Test Notification".to_string(),
            body: "Push notifications are working! 🎉".to_string(),
        }
    }
}

/// Habit completion recorded from a notification action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCompletion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habit_name: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}
