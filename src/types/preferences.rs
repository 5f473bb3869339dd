use serde::{Deserialize, Serialize};

/// Per-user notification toggles. Keys missing from server data take the
/// all-enabled defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub morning_motivation: bool,
    pub habit_reminders: bool,
    pub streak_alerts: bool,
    pub evening_reminder: bool,
    pub achievement_alerts: bool,
    pub sleep_reminders: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push_enabled: true,
            morning_motivation: true,
            habit_reminders: true,
            streak_alerts: true,
            evening_reminder: true,
            achievement_alerts: true,
            sleep_reminders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_motivation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak_alerts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_reminder: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_alerts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_reminders: Option<bool>,
}

impl PreferencesUpdate {
    pub fn merged_into(&self, current: &NotificationPreferences) -> NotificationPreferences {
        NotificationPreferences {
            push_enabled: self.push_enabled.unwrap_or(current.push_enabled),
            morning_motivation: self
                .morning_motivation
                .unwrap_or(current.morning_motivation),
            habit_reminders: self.habit_reminders.unwrap_or(current.habit_reminders),
            streak_alerts: self.streak_alerts.unwrap_or(current.streak_alerts),
            evening_reminder: self.evening_reminder.unwrap_or(current.evening_reminder),
            achievement_alerts: self
                .achievement_alerts
                .unwrap_or(current.achievement_alerts),
            sleep_reminders: self.sleep_reminders.unwrap_or(current.sleep_reminders),
        }
    }
}
