//! Presence list - a live list of the collaborators present in a room.
//!
//! The list mirrors a presence cache: users joining, leaving and changing
//! their metadata become idempotent, order-preserving row updates on a
//! rendering surface. The local user is pinned first and may rename
//! themselves inline; the rename only shows once the cache confirms it.
//!
//! - `models`: users and the events flowing into the list
//! - `options`: construction option validation
//! - `presence`: presence cache / key write capabilities and an in-process cache
//! - `surface`: the rendering capability and an in-memory HTML surface
//! - `views`: row and count renderers
//! - `controller`: the list lifecycle, collapse and rename state machines
//! - `handlers`: HTTP handlers for the demo server

pub mod avatar;
pub mod colors;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod models;
pub mod options;
pub mod presence;
pub mod surface;
pub mod templates;
pub mod text;
pub mod views;

// ============================================================================
// Class Names
// ============================================================================

pub const OVERRIDE_CLASS: &str = "gi-override";
pub const WRAPPER_CLASS: &str = "gi-userlist";
pub const INNER_CLASS: &str = "gi-inner";
pub const COLLAPSE_BTN_CLASS: &str = "gi-collapse";
pub const OPTIONS_OVERLAY_CLASS: &str = "gi-options";
pub const EDIT_ICON_CLASS: &str = "gi-icon";
pub const NAME_INPUT_CLASS: &str = "gi-set-name";
pub const ANCHOR_CLASS: &str = "gi-anchor";
pub const RELATIVE_CLASS: &str = "gi-relative";
pub const ALIGN_LEFT_CLASS: &str = "gi-left";
pub const ALIGN_RIGHT_CLASS: &str = "gi-right";
pub const USER_CLASS: &str = "gi-user";
pub const LOCAL_USER_CLASS: &str = "gi-local-user";
pub const COUNT_CLASS: &str = "gi-count";

pub const COLLAPSED_CLASS: &str = "gi-collapsed";
pub const EDITING_CLASS: &str = "gi-editing";
pub const NO_OPTIONS_CLASS: &str = "gi-no-options";
pub const COUNT_ONLY_CLASS: &str = "gi-count-only";

pub const DATA_USER_ID: &str = "data-goinstant-id";
pub const DATA_COUNT: &str = "data-goinstant-count";

// ============================================================================
// Application State
// ============================================================================

/// Shared state for the demo server. The `UserList` itself runs on its own
/// task; handlers reach it through the presence cache and the UI channel,
/// and read what it rendered through a clone of its surface.
#[derive(Clone)]
pub struct AppState {
    pub room: String,
    pub presence: LocalPresence,
    pub surface: MemorySurface,
    pub ui_tx: tokio::sync::mpsc::UnboundedSender<UiEvent>,
}

// Re-export commonly used types
pub use avatar::{HttpImageProbe, ImageProbe, ProbeOutcome};
pub use colors::{ColorAssigner, PaletteColors};
pub use controller::{EditState, LifecycleState, UserList};
pub use error::{ListError, OptionsError, PresenceError, SurfaceError};
pub use models::{Key, PresenceEvent, UiEvent, User};
pub use options::{Position, UserListOptions};
pub use presence::{Delivery, KeyHandle, LocalPresence, PresenceCache, Subscription};
pub use surface::{CountRow, ListSurface, MemorySurface, Placement, Row, RowKey, Scaffold, UserRow};
pub use text::{html_escape, truncate};
pub use views::{CountView, RenderContext, UserView};
