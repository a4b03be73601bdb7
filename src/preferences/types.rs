use serde::{Deserialize, Serialize};

/// Default session length in minutes.
pub const DEFAULT_PREFERRED_DURATION: u32 = 10;

/// Notification toggles. Every key defaults to enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Daily practice reminder.
    pub daily_reminders: bool,
    /// Weekly progress summary.
    pub weekly_progress: bool,
    /// Achievement unlocked alerts.
    pub achievement_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            daily_reminders: true,
            weekly_progress: true,
            achievement_alerts: true,
        }
    }
}

/// Partial notification toggles; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettingsPatch {
    /// See [`NotificationSettings::daily_reminders`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_reminders: Option<bool>,
    /// See [`NotificationSettings::weekly_progress`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_progress: Option<bool>,
    /// See [`NotificationSettings::achievement_alerts`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_alerts: Option<bool>,
}

impl NotificationSettings {
    /// Merge key-wise: only the keys present in `patch` change.
    pub fn apply(&mut self, patch: &NotificationSettingsPatch) {
        if let Some(v) = patch.daily_reminders {
            self.daily_reminders = v;
        }
        if let Some(v) = patch.weekly_progress {
            self.weekly_progress = v;
        }
        if let Some(v) = patch.achievement_alerts {
            self.achievement_alerts = v;
        }
    }
}

/// A user's complete preference set.
///
/// Always fully populated; partial data only ever exists as a
/// [`PreferencesPatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Preferred session length in minutes.
    pub preferred_duration: u32,
    /// Preferred content categories, unique, in the order given.
    pub preferred_categories: Vec<String>,
    /// Notification toggles.
    pub notification_settings: NotificationSettings,
    /// Personality profile chosen during onboarding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_type: Option<String>,
    /// Practice goals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_duration: DEFAULT_PREFERRED_DURATION,
            preferred_categories: Vec::new(),
            notification_settings: NotificationSettings::default(),
            personality_type: None,
            goals: None,
        }
    }
}

/// All-optional preference fields.
///
/// Used both for caller updates and for partially populated stored or remote
/// rows, which are backfilled from defaults via [`Preferences::from_partial`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    /// Replaces the duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_duration: Option<u32>,
    /// Replaces the category list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_categories: Option<Vec<String>>,
    /// Merged key-wise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_settings: Option<NotificationSettingsPatch>,
    /// Replaces the personality type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_type: Option<String>,
    /// Replaces the goals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
}

impl PreferencesPatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the preferred duration.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.preferred_duration = Some(minutes);
        self
    }

    /// Replace the preferred categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Merge notification toggles.
    pub fn with_notifications(mut self, settings: NotificationSettingsPatch) -> Self {
        self.notification_settings = Some(settings);
        self
    }
}

impl Preferences {
    /// Backfill a partial payload from defaults.
    pub fn from_partial(partial: &PreferencesPatch) -> Self {
        Self::default().merge(partial)
    }

    /// Per-field merge.
    ///
    /// Scalars and lists present in `patch` replace the current value;
    /// notification settings merge key-wise.
    pub fn merge(&self, patch: &PreferencesPatch) -> Self {
        let mut merged = self.clone();

        if let Some(duration) = patch.preferred_duration {
            merged.preferred_duration = duration;
        }
        if let Some(categories) = &patch.preferred_categories {
            merged.preferred_categories = dedup_in_order(categories);
        }
        if let Some(settings) = &patch.notification_settings {
            merged.notification_settings.apply(settings);
        }
        if let Some(personality) = &patch.personality_type {
            merged.personality_type = Some(personality.clone());
        }
        if let Some(goals) = &patch.goals {
            merged.goals = Some(goals.clone());
        }

        merged
    }
}

fn dedup_in_order(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

/// Whether the in-memory preferences have been acknowledged by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing loaded yet; defaults are in effect.
    NotLoaded,
    /// In-memory value matches what storage last acknowledged.
    Synced,
    /// A write is in flight.
    Pending,
    /// The last write failed; the in-memory value was kept.
    Failed { error: String },
}

impl SyncStatus {
    /// True when the last write was rejected.
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed { .. })
    }
}
