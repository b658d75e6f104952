//! Construction options for the user list.
//!
//! Hosts hand over a loosely-typed options object (usually JSON). Every key
//! is checked against a fixed set and each value against its expected type
//! before anything else is built.

use serde_json::{Map, Value};

use crate::error::OptionsError;

/// Recognized option keys.
pub const VALID_OPTIONS: &[&str] = &[
    "room",
    "collapsed",
    "position",
    "container",
    "truncateLength",
    "avatars",
    "userOptions",
    "countOnly",
];

pub const DEFAULT_TRUNCATE_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    Left,
    #[default]
    Right,
}

impl Position {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Position::Left),
            "right" => Some(Position::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListOptions {
    pub room: String,
    pub collapsed: bool,
    pub position: Position,
    /// Id of the element to mount into. `None` mounts onto the document body.
    pub container: Option<String>,
    pub truncate_length: usize,
    pub avatars: bool,
    pub user_options: bool,
    pub count_only: bool,
}

impl UserListOptions {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            collapsed: false,
            position: Position::Right,
            container: None,
            truncate_length: DEFAULT_TRUNCATE_LENGTH,
            avatars: true,
            user_options: true,
            count_only: false,
        }
    }

    /// Validate a host-supplied options object.
    ///
    /// Fails on the first violated constraint. A `null` value for an
    /// optional key keeps the default.
    pub fn from_value(value: &Value) -> Result<Self, OptionsError> {
        let opts = value.as_object().ok_or(OptionsError::InvalidOptions)?;

        if let Some(unknown) = opts.keys().find(|k| !VALID_OPTIONS.contains(&k.as_str())) {
            return Err(OptionsError::UnknownOption(unknown.clone()));
        }

        let room = match opts.get("room").and_then(Value::as_str) {
            Some(room) if !room.trim().is_empty() => room.to_string(),
            _ => return Err(OptionsError::InvalidRoom),
        };

        let mut options = Self::new(room);

        if let Some(v) = present(opts, "collapsed") {
            options.collapsed = v.as_bool().ok_or(OptionsError::InvalidCollapsed)?;
        }
        if let Some(v) = present(opts, "container") {
            match v.as_str() {
                Some(id) if !id.trim().is_empty() => options.container = Some(id.to_string()),
                _ => return Err(OptionsError::InvalidContainer),
            }
        }
        if let Some(v) = present(opts, "position") {
            options.position = v
                .as_str()
                .and_then(Position::parse)
                .ok_or(OptionsError::InvalidPosition)?;
        }
        if let Some(v) = present(opts, "truncateLength") {
            let length = v.as_u64().ok_or(OptionsError::InvalidTruncateLength)?;
            options.truncate_length =
                usize::try_from(length).map_err(|_| OptionsError::InvalidTruncateLength)?;
        }
        if let Some(v) = present(opts, "avatars") {
            options.avatars = v.as_bool().ok_or(OptionsError::InvalidAvatars)?;
        }
        if let Some(v) = present(opts, "userOptions") {
            options.user_options = v.as_bool().ok_or(OptionsError::InvalidUserOptions)?;
        }
        if let Some(v) = present(opts, "countOnly") {
            options.count_only = v.as_bool().ok_or(OptionsError::InvalidCountOnly)?;
        }

        Ok(options)
    }

    /// Whether the local user gets the rename affordance. Count-only mode
    /// never renders per-user rows, so it always disables it.
    pub fn editing_enabled(&self) -> bool {
        self.user_options && !self.count_only
    }
}

fn present<'a>(opts: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    opts.get(key).filter(|v| !v.is_null())
}
