use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Field-level fallbacks applied to every incoming push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub url: String,
    pub vibrate: Vec<u32>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "Sankalp".to_string(),
            body: "You have a new notification".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/badge-72x72.png".to_string(),
            tag: "default".to_string(),
            url: "/daily".to_string(),
            vibrate: vec![200, 100, 200],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadTimestamp {
    Millis(i64),
    Text(String),
}

impl PayloadTimestamp {
    /// Epoch milliseconds, or `None` when the value cannot be read as a date.
    /// ISO strings without an offset are taken as UTC, and a bare date as UTC
    /// midnight.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            PayloadTimestamp::Millis(millis) => Some(*millis),
            PayloadTimestamp::Text(text) => {
                let text = text.trim();
                let parsed = OffsetDateTime::parse(text, &Rfc3339)
                    .or_else(|_| OffsetDateTime::parse(&format!("{text}Z"), &Rfc3339))
                    .ok()
                    .or_else(|| {
                        Date::parse(text, format_description!("[year]-[month]-[day]"))
                            .ok()
                            .map(|date| date.midnight().assume_utc())
                    })?;
                i64::try_from(parsed.unix_timestamp_nanos() / 1_000_000).ok()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("push payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("push payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Push message content after field-by-field validation. Fields with the wrong
/// type are dropped individually; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub data: Option<NotificationData>,
    pub actions: Option<Vec<NotificationAction>>,
    pub require_interaction: Option<bool>,
    pub silent: Option<bool>,
    pub timestamp: Option<PayloadTimestamp>,
}

impl PushPayload {
    /// An absent body is valid and yields an empty payload.
    pub fn decode(bytes: Option<&[u8]>) -> Result<Self, PayloadError> {
        let Some(bytes) = bytes else {
            return Ok(Self::default());
        };
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let object = match value {
            Value::Object(object) => object,
            Value::Null => return Err(PayloadError::NotAnObject("null")),
            Value::Bool(_) => return Err(PayloadError::NotAnObject("a boolean")),
            Value::Number(_) => return Err(PayloadError::NotAnObject("a number")),
            Value::String(_) => return Err(PayloadError::NotAnObject("a string")),
            Value::Array(_) => return Err(PayloadError::NotAnObject("an array")),
        };
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        // An empty resource reference or tag counts as absent.
        let reference = |key: &str| text(key).filter(|value| !value.is_empty());
        let flag = |key: &str| object.get(key).and_then(Value::as_bool);

        Ok(Self {
            title: text("title"),
            body: text("body"),
            icon: reference("icon"),
            badge: reference("badge"),
            tag: reference("tag"),
            data: object.get("data").and_then(parse_data),
            actions: object.get("actions").and_then(parse_actions),
            require_interaction: flag("requireInteraction"),
            silent: flag("silent"),
            timestamp: object.get("timestamp").and_then(parse_timestamp),
        })
    }

    pub fn into_notification(
        self,
        defaults: &NotificationDefaults,
        received_at: OffsetDateTime,
    ) -> DisplayNotification {
        let received_millis = epoch_millis(received_at);
        let mut data = self.data.unwrap_or_default();
        if data.url.is_none() {
            data.url = Some(defaults.url.clone());
        }

        DisplayNotification {
            title: self.title.unwrap_or_else(|| defaults.title.clone()),
            options: NotificationOptions {
                body: self.body.unwrap_or_else(|| defaults.body.clone()),
                icon: self.icon.unwrap_or_else(|| defaults.icon.clone()),
                badge: Some(self.badge.unwrap_or_else(|| defaults.badge.clone())),
                tag: self.tag.unwrap_or_else(|| defaults.tag.clone()),
                data,
                actions: self.actions.unwrap_or_default(),
                require_interaction: self.require_interaction.unwrap_or(false),
                silent: self.silent.unwrap_or(false),
                vibrate: defaults.vibrate.clone(),
                timestamp: self
                    .timestamp
                    .as_ref()
                    .and_then(PayloadTimestamp::to_millis)
                    .unwrap_or(received_millis),
            },
        }
    }
}

fn parse_data(value: &Value) -> Option<NotificationData> {
    let object = value.as_object()?;
    let field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    Some(NotificationData {
        url: field("url"),
        habit_name: field("habit_name"),
    })
}

fn parse_actions(value: &Value) -> Option<Vec<NotificationAction>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                let object = item.as_object()?;
                Some(NotificationAction {
                    action: object.get("action")?.as_str()?.to_string(),
                    title: object.get("title")?.as_str()?.to_string(),
                    icon: object
                        .get("icon")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect(),
    )
}

fn parse_timestamp(value: &Value) -> Option<PayloadTimestamp> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .map(PayloadTimestamp::Millis),
        Value::String(text) => Some(PayloadTimestamp::Text(text.clone())),
        _ => None,
    }
}

pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Display request handed to the notification host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNotification {
    pub title: String,
    pub options: NotificationOptions,
}

impl DisplayNotification {
    /// Lightweight silent notification acknowledging an action.
    pub fn confirmation(
        title: &str,
        body: String,
        icon: &str,
        tag: &str,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            title: title.to_string(),
            options: NotificationOptions {
                body,
                icon: icon.to_string(),
                badge: None,
                tag: tag.to_string(),
                data: NotificationData::default(),
                actions: Vec::new(),
                require_interaction: false,
                silent: true,
                vibrate: Vec::new(),
                timestamp: epoch_millis(at),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub tag: String,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    pub silent: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vibrate: Vec<u32>,
    pub timestamp: i64,
}
