//! Data models for the presence list.
//!
//! Users are owned by the presence cache; the list only holds transient
//! copies while rendering. Events flow in from two directions: the cache
//! (`PresenceEvent`) and the rendered widget (`UiEvent`).

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Only string values count as a display name; anything else the cache
    /// holds for this field is treated as absent.
    #[serde(default, deserialize_with = "string_or_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub avatar_url: Option<String>,
    /// Presence color assigned by the platform, if any.
    #[serde(default, deserialize_with = "string_or_none")]
    pub avatar_color: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            avatar_url: None,
            avatar_color: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_avatar_color(mut self, color: impl Into<String>) -> Self {
        self.avatar_color = Some(color.into());
        self
    }

    /// The raw display name, or an empty string when none is set.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or("")
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

// ============================================================================
// Events
// ============================================================================

/// Events emitted by the presence cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Join(User),
    Leave(User),
    /// A metadata field changed. `key` is the full key path, e.g.
    /// `/.users/<id>/displayName`.
    Change { user: User, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Enter,
    Tab,
    Escape,
    #[serde(other)]
    Other,
}

/// Interactions with the rendered widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Click on the collapse button.
    Collapse,
    /// Click on the local user's edit affordance.
    Edit,
    /// Keydown inside the name input.
    Keydown { key: Key },
    /// The host typed into the name input.
    Input { value: String },
}
