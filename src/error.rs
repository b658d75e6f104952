//! Error types for the presence list.
//!
//! Only construction, lifecycle misuse and presence-cache failures reach the
//! host. Write failures and avatar probe failures are recovered internally
//! and never show up here.

use thiserror::Error;

use crate::controller::LifecycleState;

/// Construction-time validation failures, one per violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("UserList: Options was not found or invalid")]
    InvalidOptions,
    #[error("UserList: Invalid argument passed: {0}")]
    UnknownOption(String),
    #[error("UserList: Room was not found or invalid")]
    InvalidRoom,
    #[error("UserList: collapsed value must be a boolean")]
    InvalidCollapsed,
    #[error("UserList: container must be an element id")]
    InvalidContainer,
    #[error("UserList: position can only be \"right\" or \"left\"")]
    InvalidPosition,
    #[error("UserList: truncateLength can only be a number")]
    InvalidTruncateLength,
    #[error("UserList: avatars must be a boolean")]
    InvalidAvatars,
    #[error("UserList: userOptions must be a boolean")]
    InvalidUserOptions,
    #[error("UserList: countOnly must be a boolean")]
    InvalidCountOnly,
}

impl OptionsError {
    /// The option key that failed validation, if the error is about one.
    pub fn option(&self) -> Option<&str> {
        match self {
            OptionsError::InvalidOptions => None,
            OptionsError::UnknownOption(key) => Some(key),
            OptionsError::InvalidRoom => Some("room"),
            OptionsError::InvalidCollapsed => Some("collapsed"),
            OptionsError::InvalidContainer => Some("container"),
            OptionsError::InvalidPosition => Some("position"),
            OptionsError::InvalidTruncateLength => Some("truncateLength"),
            OptionsError::InvalidAvatars => Some("avatars"),
            OptionsError::InvalidUserOptions => Some("userOptions"),
            OptionsError::InvalidCountOnly => Some("countOnly"),
        }
    }
}

/// Failures reported by the presence cache or its key-value writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    #[error("presence cache is not initialized")]
    NotInitialized,
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("write to {key} rejected: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("container element not found: {0}")]
    ContainerNotFound(String),
    #[error("list is already mounted")]
    AlreadyMounted,
}

/// Errors visible to the host application.
#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("{operation}: not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("UserList: failed to mount: {0}")]
    Mount(#[from] SurfaceError),
    #[error("UserList: presence cache failed to initialize: {0}")]
    CacheInit(#[source] PresenceError),
    #[error("UserList: presence cache failed to destroy: {0}")]
    CacheDestroy(#[source] PresenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_error_names_option() {
        assert_eq!(OptionsError::InvalidPosition.option(), Some("position"));
        assert_eq!(
            OptionsError::UnknownOption("fake".to_string()).option(),
            Some("fake")
        );
        assert_eq!(OptionsError::InvalidOptions.option(), None);
        assert!(OptionsError::InvalidTruncateLength
            .to_string()
            .contains("truncateLength"));
    }

    #[test]
    fn test_list_error_wraps_cache_failure() {
        let err = ListError::CacheInit(PresenceError::Backend("offline".to_string()));
        assert_eq!(
            err.to_string(),
            "UserList: presence cache failed to initialize: offline"
        );
    }
}
