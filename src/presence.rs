//! Presence cache and key-value write capabilities.
//!
//! The list never owns presence state. It reads snapshots from a
//! `PresenceCache`, listens to its events through a `Subscription`, and
//! writes the local user's display name through a `KeyHandle`. The write is
//! confirmed by the cache echoing a `change` event back.
//!
//! `LocalPresence` is an in-process cache used by the demo server and tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::PresenceError;
use crate::models::{PresenceEvent, User};

/// Events buffered per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 256;

// ============================================================================
// Capabilities
// ============================================================================

#[async_trait]
pub trait PresenceCache: Send + Sync {
    async fn initialize(&self) -> Result<(), PresenceError>;

    async fn destroy(&self) -> Result<(), PresenceError>;

    /// Users currently present, in cache order.
    fn get_all(&self) -> Vec<User>;

    fn local_user(&self) -> Option<User>;

    /// Write handle rooted at the local user's key.
    fn local_user_key(&self) -> Option<Box<dyn KeyHandle>>;

    /// Start receiving `join`/`leave`/`change` events. Dropping or
    /// unsubscribing the returned handle stops delivery.
    fn subscribe(&self) -> Subscription;
}

#[async_trait]
pub trait KeyHandle: Send + Sync {
    /// Full key path, e.g. `/.users/<id>/displayName`.
    fn path(&self) -> &str;

    fn key(&self, name: &str) -> Box<dyn KeyHandle>;

    async fn set(&self, value: Value) -> Result<(), PresenceError>;
}

/// What a subscription yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Event(PresenceEvent),
    /// The subscriber fell behind and this many events were dropped.
    /// Anything built from earlier events must be rebuilt from `get_all()`.
    Lagged(u64),
}

/// Handle to a stream of presence events.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<PresenceEvent>,
}

impl Subscription {
    pub fn new(rx: broadcast::Receiver<PresenceEvent>) -> Self {
        Self { rx }
    }

    /// Next delivery, or `None` once the cache has gone away.
    pub async fn recv(&mut self) -> Option<Delivery> {
        match self.rx.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "presence subscription lagged, events dropped");
                Some(Delivery::Lagged(skipped))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Next delivery if one is already queued.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        match self.rx.try_recv() {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "presence subscription lagged, events dropped");
                Some(Delivery::Lagged(skipped))
            }
            Err(_) => None,
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

/// Key path for a field on a user.
pub fn user_key_path(user_id: &str, field: &str) -> String {
    format!("/.users/{}/{}", user_id, field)
}

// ============================================================================
// In-process cache
// ============================================================================

#[derive(Debug, Default)]
struct PresenceState {
    initialized: bool,
    local_id: String,
    /// Users in join order.
    users: Vec<User>,
}

/// A presence cache that lives entirely in this process.
///
/// Cloning yields another handle to the same cache.
#[derive(Debug, Clone)]
pub struct LocalPresence {
    state: Arc<Mutex<PresenceState>>,
    tx: broadcast::Sender<PresenceEvent>,
}

impl LocalPresence {
    /// Create a cache whose local user is already joined.
    pub fn new(local: User) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        let state = PresenceState {
            initialized: false,
            local_id: local.id.clone(),
            users: vec![local],
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PresenceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PresenceEvent) {
        // No receivers just means nobody is listening yet.
        self.tx.send(event).ok();
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.lock().users.iter().find(|u| u.id == id).cloned()
    }

    /// Add a user, or replace one with the same id.
    pub fn join(&self, user: User) {
        {
            let mut state = self.lock();
            match state.users.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user.clone(),
                None => state.users.push(user.clone()),
            }
        }
        debug!(user = %user.id, "presence join");
        self.emit(PresenceEvent::Join(user));
    }

    pub fn leave(&self, id: &str) -> Option<User> {
        let removed = {
            let mut state = self.lock();
            let idx = state.users.iter().position(|u| u.id == id)?;
            state.users.remove(idx)
        };
        debug!(user = %id, "presence leave");
        self.emit(PresenceEvent::Leave(removed.clone()));
        Some(removed)
    }

    /// Update one metadata field and emit the matching `change` event.
    ///
    /// `displayName`, `avatarUrl` and `avatarColor` are reflected on the
    /// user; other fields are only announced.
    pub fn set_field(&self, id: &str, field: &str, value: Value) -> Result<User, PresenceError> {
        let updated = {
            let mut state = self.lock();
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| PresenceError::UnknownUser(id.to_string()))?;
            let text = value.as_str().map(str::to_string);
            match field {
                "displayName" => user.display_name = text,
                "avatarUrl" => user.avatar_url = text,
                "avatarColor" => user.avatar_color = text,
                _ => {}
            }
            user.clone()
        };
        self.emit(PresenceEvent::Change {
            user: updated.clone(),
            key: user_key_path(id, field),
        });
        Ok(updated)
    }
}

#[async_trait]
impl PresenceCache for LocalPresence {
    async fn initialize(&self) -> Result<(), PresenceError> {
        self.lock().initialized = true;
        Ok(())
    }

    async fn destroy(&self) -> Result<(), PresenceError> {
        self.lock().initialized = false;
        Ok(())
    }

    fn get_all(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    fn local_user(&self) -> Option<User> {
        let state = self.lock();
        let local = state.users.iter().find(|u| u.id == state.local_id).cloned();
        local
    }

    fn local_user_key(&self) -> Option<Box<dyn KeyHandle>> {
        let local_id = self.lock().local_id.clone();
        Some(Box::new(LocalKey {
            presence: self.clone(),
            path: format!("/.users/{}", local_id),
            user_id: local_id,
            field: None,
        }))
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }
}

struct LocalKey {
    presence: LocalPresence,
    path: String,
    user_id: String,
    field: Option<String>,
}

#[async_trait]
impl KeyHandle for LocalKey {
    fn path(&self) -> &str {
        &self.path
    }

    fn key(&self, name: &str) -> Box<dyn KeyHandle> {
        let field = match &self.field {
            Some(parent) => format!("{}/{}", parent, name),
            None => name.to_string(),
        };
        Box::new(LocalKey {
            presence: self.presence.clone(),
            path: format!("{}/{}", self.path, name),
            user_id: self.user_id.clone(),
            field: Some(field),
        })
    }

    async fn set(&self, value: Value) -> Result<(), PresenceError> {
        if !self.presence.lock().initialized {
            return Err(PresenceError::NotInitialized);
        }
        let Some(field) = &self.field else {
            return Err(PresenceError::WriteRejected {
                key: self.path.clone(),
                reason: "cannot replace a whole user".to_string(),
            });
        };
        self.presence.set_field(&self.user_id, field, value)?;
        Ok(())
    }
}
