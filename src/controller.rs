//! The user list controller.
//!
//! Owns the mounted widget and keeps it in sync with a presence cache:
//!
//! - lifecycle: `Unmounted -> Initializing -> Mounted -> Destroying -> Unmounted`
//! - collapse: a root modifier class; collapsing cancels a rename
//! - rename: `Idle -> Editing -> Confirming -> Idle`. A successful write does
//!   not end the rename; the confirming `change` event from the cache does.
//!   A failed write drops straight back to `Idle`.
//!
//! Everything runs on one task. Presence events and UI events are handled
//! one at a time, so a user's row is fully replaced before the next event
//! for that user is looked at.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::avatar::{HttpImageProbe, ImageProbe};
use crate::colors::{ColorAssigner, PaletteColors};
use crate::error::{ListError, SurfaceError};
use crate::models::{Key, PresenceEvent, UiEvent, User};
use crate::options::{Position, UserListOptions};
use crate::presence::{Delivery, PresenceCache, Subscription};
use crate::surface::{ListSurface, Scaffold};
use crate::text::html_escape;
use crate::views::{CountView, RenderContext, UserView};
use crate::{
    ALIGN_LEFT_CLASS, ALIGN_RIGHT_CLASS, ANCHOR_CLASS, COLLAPSED_CLASS, COUNT_ONLY_CLASS,
    EDITING_CLASS, NO_OPTIONS_CLASS, OVERRIDE_CLASS, RELATIVE_CLASS, WRAPPER_CLASS,
};

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

// ============================================================================
// States
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unmounted,
    Initializing,
    Mounted,
    Destroying,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Unmounted => "unmounted",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Mounted => "mounted",
            LifecycleState::Destroying => "destroying",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Idle,
    /// The name input is open.
    Editing,
    /// `name` was written; waiting for the cache to echo it back.
    Confirming { name: String },
}

impl EditState {
    pub fn is_editing(&self) -> bool {
        !matches!(self, EditState::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    CollapseClick,
    EditClick,
    NameKeydown,
}

/// Present only while the list is bound to the cache and the UI.
#[derive(Debug)]
struct Bound {
    subscription: Subscription,
    handlers: Vec<Binding>,
}

/// Keys whose change affects a row, besides the presence color.
fn tracked_key_pattern() -> Option<&'static Regex> {
    static TRACKED: OnceLock<Option<Regex>> = OnceLock::new();
    TRACKED
        .get_or_init(|| Regex::new(r"/(displayName|avatarUrl)$").ok())
        .as_ref()
}

// ============================================================================
// Controller
// ============================================================================

pub struct UserList<C, S> {
    options: UserListOptions,
    cache: C,
    surface: S,
    colors: Arc<dyn ColorAssigner>,
    probe: Arc<dyn ImageProbe>,
    lifecycle: LifecycleState,
    collapsed: bool,
    edit: EditState,
    bound: Option<Bound>,
}

impl<C, S> UserList<C, S>
where
    C: PresenceCache,
    S: ListSurface,
{
    pub fn new(options: UserListOptions, cache: C, surface: S) -> Self {
        Self {
            collapsed: options.collapsed,
            options,
            cache,
            surface,
            colors: Arc::new(PaletteColors),
            probe: Arc::new(HttpImageProbe::new()),
            lifecycle: LifecycleState::Unmounted,
            edit: EditState::Idle,
            bound: None,
        }
    }

    /// Validate a host options object and build an unmounted list.
    pub fn from_value(options: &Value, cache: C, surface: S) -> Result<Self, ListError> {
        let options = UserListOptions::from_value(options)?;
        Ok(Self::new(options, cache, surface))
    }

    pub fn with_colors(mut self, colors: Arc<dyn ColorAssigner>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_image_probe(mut self, probe: Arc<dyn ImageProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn options(&self) -> &UserListOptions {
        &self.options
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Mount the widget, initialize the cache, render the current users and
    /// start listening. If the cache fails to initialize the list tears
    /// itself down again and returns the cache's error.
    pub async fn initialize(&mut self) -> Result<(), ListError> {
        if self.lifecycle != LifecycleState::Unmounted {
            return Err(ListError::InvalidState {
                operation: "initialize",
                state: self.lifecycle,
            });
        }
        self.lifecycle = LifecycleState::Initializing;

        if let Err(e) = self.append() {
            self.lifecycle = LifecycleState::Unmounted;
            return Err(e.into());
        }

        if let Err(e) = self.cache.initialize().await {
            warn!(room = %self.options.room, error = %e, "presence cache failed to initialize");
            if let Err(teardown) = self.destroy().await {
                debug!(error = %teardown, "ignoring teardown failure");
            }
            return Err(ListError::CacheInit(e));
        }

        self.render_list().await;
        self.bind();
        self.lifecycle = LifecycleState::Mounted;

        info!(
            room = %self.options.room,
            users = self.cache.get_all().len(),
            count_only = self.options.count_only,
            "user list mounted"
        );
        Ok(())
    }

    fn append(&mut self) -> Result<(), SurfaceError> {
        let editing = self.options.editing_enabled();

        let mut classes = vec![WRAPPER_CLASS.to_string(), OVERRIDE_CLASS.to_string()];
        if !editing {
            classes.push(NO_OPTIONS_CLASS.to_string());
        }
        if self.options.count_only {
            classes.push(COUNT_ONLY_CLASS.to_string());
        }
        match self.options.container {
            Some(_) => classes.push(RELATIVE_CLASS.to_string()),
            None => {
                classes.push(ANCHOR_CLASS.to_string());
                let align = match self.options.position {
                    Position::Right => ALIGN_RIGHT_CLASS,
                    Position::Left => ALIGN_LEFT_CLASS,
                };
                classes.push(align.to_string());
            }
        }

        self.surface.mount(Scaffold {
            container: self.options.container.clone(),
            classes,
            options: editing,
        })?;

        self.collapse(self.collapsed);
        Ok(())
    }

    async fn render_list(&mut self) {
        let users = self.cache.get_all();

        if self.options.count_only {
            CountView::new().render(&mut self.surface, users.len());
        } else {
            for user in &users {
                self.render_user(user).await;
            }
        }

        self.surface.set_visible(true);
    }

    fn bind(&mut self) {
        let mut handlers = vec![Binding::CollapseClick];
        if self.options.editing_enabled() {
            handlers.push(Binding::EditClick);
            handlers.push(Binding::NameKeydown);
        }

        self.bound = Some(Bound {
            subscription: self.cache.subscribe(),
            handlers,
        });
    }

    fn handles(&self, binding: Binding) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|bound| bound.handlers.contains(&binding))
    }

    /// Unbind, detach the widget and destroy the cache. Safe to call on a
    /// list that was never initialized.
    pub async fn destroy(&mut self) -> Result<(), ListError> {
        self.lifecycle = LifecycleState::Destroying;

        if let Some(bound) = self.bound.take() {
            debug!(handlers = ?bound.handlers, "unbinding user list");
            bound.subscription.unsubscribe();
        }

        self.edit = EditState::Idle;
        self.surface.unmount();

        let result = self.cache.destroy().await;
        self.lifecycle = LifecycleState::Unmounted;
        info!(room = %self.options.room, "user list destroyed");

        result.map_err(ListError::CacheDestroy)
    }

    // ------------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------------

    /// Handle presence and UI events until either source closes or the list
    /// is torn down. Presence events are drained first.
    pub async fn run(&mut self, mut ui: mpsc::UnboundedReceiver<UiEvent>) {
        loop {
            let Some(bound) = self.bound.as_mut() else {
                return;
            };

            tokio::select! {
                biased;

                delivery = bound.subscription.recv() => match delivery {
                    Some(delivery) => self.handle_delivery(delivery).await,
                    None => return,
                },
                event = ui.recv() => match event {
                    Some(event) => self.handle_ui(event).await,
                    None => return,
                },
            }
        }
    }

    /// Handle every presence delivery already queued. Returns how many were
    /// handled.
    pub async fn poll_presence(&mut self) -> usize {
        let mut handled = 0;
        while let Some(delivery) = self.bound.as_mut().and_then(|b| b.subscription.try_recv()) {
            self.handle_delivery(delivery).await;
            handled += 1;
        }
        handled
    }

    async fn handle_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Event(event) => self.handle_presence(event).await,
            Delivery::Lagged(skipped) => self.resync(skipped).await,
        }
    }

    /// Rebuild every row from the cache after events were dropped. A rename
    /// awaiting confirmation is abandoned since its echo may be among them.
    async fn resync(&mut self, skipped: u64) {
        if self.bound.is_none() || !self.surface.is_mounted() {
            return;
        }
        warn!(skipped, room = %self.options.room, "presence events dropped, re-rendering list");

        if matches!(self.edit, EditState::Confirming { .. }) {
            self.deactivate_editing();
        }
        for row in self.surface.rows() {
            self.surface.remove_row(&row.id);
        }
        self.render_list().await;
    }

    pub async fn handle_presence(&mut self, event: PresenceEvent) {
        if self.bound.is_none() || !self.surface.is_mounted() {
            debug!(?event, "presence event after teardown ignored");
            return;
        }

        match event {
            PresenceEvent::Join(user) => {
                if self.options.count_only {
                    self.render_count();
                } else {
                    self.render_user(&user).await;
                }
            }
            PresenceEvent::Leave(user) => {
                if self.options.count_only {
                    self.render_count();
                } else {
                    self.surface.remove_row(&user.id);
                }
            }
            PresenceEvent::Change { user, key } => self.handle_change(user, &key).await,
        }
    }

    async fn handle_change(&mut self, user: User, key: &str) {
        let tracked = self.colors.is_user_property(key)
            || tracked_key_pattern().is_some_and(|re| re.is_match(key));
        if !tracked || self.options.count_only {
            return;
        }

        self.render_user(&user).await;

        if self.is_local(&user.id) && self.edit.is_editing() {
            if let EditState::Confirming { name } = &self.edit {
                debug!(name = %name, "rename confirmed");
            }
            self.deactivate_editing();
        }
    }

    pub async fn handle_ui(&mut self, event: UiEvent) {
        if self.bound.is_none() {
            return;
        }

        match event {
            UiEvent::Collapse if self.handles(Binding::CollapseClick) => self.toggle_collapse(),
            UiEvent::Edit if self.handles(Binding::EditClick) => self.click_edit().await,
            UiEvent::Keydown { key } if self.handles(Binding::NameKeydown) => {
                self.keydown(key).await
            }
            UiEvent::Input { value }
                if self.handles(Binding::NameKeydown) && self.edit == EditState::Editing =>
            {
                self.surface.set_input_value(&value)
            }
            other => debug!(?other, "unbound ui event ignored"),
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn is_local(&self, id: &str) -> bool {
        self.cache.local_user().is_some_and(|local| local.id == id)
    }

    fn render_context(&self) -> RenderContext {
        RenderContext {
            truncate_length: self.options.truncate_length,
            avatars: self.options.avatars,
            editing_enabled: self.options.editing_enabled(),
            local_user_id: self.cache.local_user().map(|u| u.id),
        }
    }

    async fn render_user(&mut self, user: &User) {
        let view = UserView::new(
            self.render_context(),
            Arc::clone(&self.colors),
            Arc::clone(&self.probe),
        );
        view.render(&mut self.surface, user).await;
    }

    fn render_count(&mut self) {
        let count = self.cache.get_all().len();
        CountView::new().render(&mut self.surface, count);
    }

    // ------------------------------------------------------------------------
    // Collapse
    // ------------------------------------------------------------------------

    pub fn toggle_collapse(&mut self) {
        self.collapse(!self.collapsed);
    }

    fn collapse(&mut self, collapsed: bool) {
        self.surface.set_class(COLLAPSED_CLASS, collapsed);
        self.collapsed = collapsed;

        if collapsed && self.edit.is_editing() {
            self.deactivate_editing();
        }
    }

    // ------------------------------------------------------------------------
    // Rename
    // ------------------------------------------------------------------------

    async fn click_edit(&mut self) {
        match &self.edit {
            EditState::Idle => self.activate_editing(),
            EditState::Editing => self.submit_name().await,
            EditState::Confirming { .. } => debug!("rename already awaiting confirmation"),
        }
    }

    async fn keydown(&mut self, key: Key) {
        if self.edit != EditState::Editing {
            return;
        }

        match key {
            Key::Enter | Key::Tab => self.submit_name().await,
            Key::Escape => self.deactivate_editing(),
            Key::Other => {}
        }
    }

    fn activate_editing(&mut self) {
        let Some(local) = self.cache.local_user() else {
            warn!("no local user to rename");
            return;
        };

        self.surface.set_input_value(local.title());
        self.surface.focus_input();
        self.surface.set_class(EDITING_CLASS, true);
        self.edit = EditState::Editing;
    }

    async fn submit_name(&mut self) {
        let input = self.surface.input_value();
        let name = html_escape(&input);
        let current = self
            .cache
            .local_user()
            .and_then(|u| u.display_name)
            .unwrap_or_default();

        // The input is pre-filled with the stored name, which is already
        // escaped; submitting it untouched must not escape it a second time.
        if input == current || name == current {
            self.deactivate_editing();
            return;
        }

        let Some(user_key) = self.cache.local_user_key() else {
            warn!("no local user key to write the display name to");
            self.deactivate_editing();
            return;
        };
        let key = user_key.key("displayName");

        match key.set(Value::String(name.clone())).await {
            Ok(()) => {
                debug!(key = key.path(), "display name written, awaiting confirmation");
                self.edit = EditState::Confirming { name };
            }
            Err(e) => {
                warn!(key = key.path(), error = %e, "display name write failed");
                self.deactivate_editing();
            }
        }
    }

    fn deactivate_editing(&mut self) {
        self.edit = EditState::Idle;
        self.surface.set_class(EDITING_CLASS, false);
        self.surface.set_input_value("");
    }
}
