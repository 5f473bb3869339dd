use tracing::{info, warn};

use crate::ports::api::PushApi;
use crate::types::preferences::{NotificationPreferences, PreferencesUpdate};

/// Local copy of the server-held preference record. Writes go through the
/// server first and only land locally once it accepted them.
#[derive(Debug, Clone)]
pub struct PreferenceStore<A> {
    api: A,
    current: NotificationPreferences,
}

impl<A: PushApi> PreferenceStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            current: NotificationPreferences::default(),
        }
    }

    pub fn current(&self) -> &NotificationPreferences {
        &self.current
    }

    /// Adopts the server's record as-is.
    pub fn replace(&mut self, preferences: NotificationPreferences) {
        self.current = preferences;
    }

    /// Sends the merged record and commits it on success. On failure the
    /// local record is untouched.
    pub async fn update(
        &mut self,
        update: &PreferencesUpdate,
    ) -> Result<&NotificationPreferences, A::Error> {
        let merged = update.merged_into(&self.current);
        match self.api.update_preferences(&merged).await {
            Ok(()) => {
                info!(?update, "notification preferences saved");
                self.current = merged;
                Ok(&self.current)
            }
            Err(err) => {
                warn!(error = %err, "failed to save notification preferences");
                Err(err)
            }
        }
    }
}
