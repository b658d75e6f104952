//! The rendering surface the list draws onto.
//!
//! `ListSurface` is the small set of DOM operations the list needs: mount a
//! scaffold, toggle modifier classes on the root, insert and remove rows,
//! and drive the name input. Every operation on an unmounted surface is a
//! no-op, so late callbacks after teardown cannot touch anything.
//!
//! `MemorySurface` keeps the tree in memory and renders it to HTML.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SurfaceError;
use crate::templates::{count_row_html, render_list, user_row_html};

pub const BODY: &str = "body";
pub const COUNT_ROW_ID: &str = "gi-count";

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    /// Raw, untruncated display name.
    pub title: String,
    pub short_name: String,
    pub color: String,
    /// Present only when the avatar probe succeeded.
    pub avatar_url: Option<String>,
    pub local: bool,
    pub no_options: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    User(UserRow),
    Count(CountRow),
}

impl Row {
    pub fn id(&self) -> &str {
        match self {
            Row::User(row) => &row.id,
            Row::Count(_) => COUNT_ROW_ID,
        }
    }

    pub fn key(&self) -> RowKey {
        match self {
            Row::User(row) => RowKey::new(&row.id, &row.title),
            Row::Count(row) => RowKey::new(COUNT_ROW_ID, &row.count.to_string()),
        }
    }
}

/// The attributes ordering reads off a rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey {
    pub id: String,
    pub title: String,
}

impl RowKey {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    First,
    /// Before the row with this id; appended if that row is gone.
    Before(String),
    Append,
}

/// What gets mounted on `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    /// Element id to mount into; `None` mounts onto the body.
    pub container: Option<String>,
    pub classes: Vec<String>,
    /// Whether the options overlay (edit icon + name input) is included.
    pub options: bool,
}

// ============================================================================
// Capability
// ============================================================================

pub trait ListSurface: Send {
    fn mount(&mut self, scaffold: Scaffold) -> Result<(), SurfaceError>;

    /// Detach the root. Returns whether anything was mounted.
    fn unmount(&mut self) -> bool;

    fn is_mounted(&self) -> bool;

    fn set_class(&mut self, class: &str, enabled: bool);

    fn has_class(&self, class: &str) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Rendered rows in display order.
    fn rows(&self) -> Vec<RowKey>;

    fn insert_row(&mut self, row: Row, placement: Placement);

    fn remove_row(&mut self, id: &str) -> bool;

    /// Replace any row with the same id, then insert.
    fn upsert_row(&mut self, row: Row, placement: Placement) {
        let id = row.id().to_string();
        self.remove_row(&id);
        self.insert_row(row, placement);
    }

    fn input_value(&self) -> String;

    fn set_input_value(&mut self, value: &str);

    fn focus_input(&mut self);
}

// ============================================================================
// In-memory surface
// ============================================================================

#[derive(Debug)]
struct Root {
    container: String,
    classes: Vec<String>,
    visible: bool,
    options: bool,
    rows: Vec<Row>,
    input: String,
    input_focused: bool,
}

#[derive(Debug)]
struct Dom {
    containers: BTreeSet<String>,
    root: Option<Root>,
}

/// In-memory surface. Clones share the same tree, so a host can read the
/// rendered HTML while a `UserList` owns another handle.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    dom: Arc<Mutex<Dom>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        let mut containers = BTreeSet::new();
        containers.insert(BODY.to_string());
        Self {
            dom: Arc::new(Mutex::new(Dom {
                containers,
                root: None,
            })),
        }
    }

    /// Declare an element the list may be mounted into.
    pub fn with_container(self, id: &str) -> Self {
        self.lock().containers.insert(id.to_string());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_root<T>(&self, f: impl FnOnce(&Root) -> T) -> Option<T> {
        self.lock().root.as_ref().map(f)
    }

    fn with_root_mut(&self, f: impl FnOnce(&mut Root)) {
        if let Some(root) = self.lock().root.as_mut() {
            f(root);
        }
    }

    /// The element the root is mounted in.
    pub fn container(&self) -> Option<String> {
        self.with_root(|root| root.container.clone())
    }

    pub fn classes(&self) -> Vec<String> {
        self.with_root(|root| root.classes.clone()).unwrap_or_default()
    }

    pub fn is_visible(&self) -> bool {
        self.with_root(|root| root.visible).unwrap_or(false)
    }

    pub fn has_options(&self) -> bool {
        self.with_root(|root| root.options).unwrap_or(false)
    }

    pub fn input_focused(&self) -> bool {
        self.with_root(|root| root.input_focused).unwrap_or(false)
    }

    /// Full rows in display order.
    pub fn row_contents(&self) -> Vec<Row> {
        self.with_root(|root| root.rows.clone()).unwrap_or_default()
    }

    pub fn row_ids(&self) -> Vec<String> {
        self.rows().into_iter().map(|key| key.id).collect()
    }

    pub fn user_row(&self, id: &str) -> Option<UserRow> {
        self.with_root(|root| {
            root.rows.iter().find_map(|row| match row {
                Row::User(user) if user.id == id => Some(user.clone()),
                _ => None,
            })
        })
        .flatten()
    }

    /// Render the mounted widget, or `None` when nothing is mounted.
    pub fn to_html(&self) -> Option<String> {
        self.with_root(|root| {
            let rows_html: String = root
                .rows
                .iter()
                .map(|row| match row {
                    Row::User(user) => user_row_html(user),
                    Row::Count(count) => count_row_html(count),
                })
                .collect();
            render_list(&root.classes, root.visible, root.options, &root.input, &rows_html)
        })
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSurface for MemorySurface {
    fn mount(&mut self, scaffold: Scaffold) -> Result<(), SurfaceError> {
        let mut dom = self.lock();
        if dom.root.is_some() {
            return Err(SurfaceError::AlreadyMounted);
        }

        let container = scaffold.container.unwrap_or_else(|| BODY.to_string());
        if !dom.containers.contains(&container) {
            return Err(SurfaceError::ContainerNotFound(container));
        }

        let mut classes: Vec<String> = Vec::with_capacity(scaffold.classes.len());
        for class in scaffold.classes {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }

        dom.root = Some(Root {
            container,
            classes,
            visible: false,
            options: scaffold.options,
            rows: Vec::new(),
            input: String::new(),
            input_focused: false,
        });
        Ok(())
    }

    fn unmount(&mut self) -> bool {
        self.lock().root.take().is_some()
    }

    fn is_mounted(&self) -> bool {
        self.lock().root.is_some()
    }

    fn set_class(&mut self, class: &str, enabled: bool) {
        self.with_root_mut(|root| {
            let present = root.classes.iter().any(|c| c == class);
            if enabled && !present {
                root.classes.push(class.to_string());
            } else if !enabled && present {
                root.classes.retain(|c| c != class);
            }
        });
    }

    fn has_class(&self, class: &str) -> bool {
        self.with_root(|root| root.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_visible(&mut self, visible: bool) {
        self.with_root_mut(|root| root.visible = visible);
    }

    fn rows(&self) -> Vec<RowKey> {
        self.with_root(|root| root.rows.iter().map(Row::key).collect())
            .unwrap_or_default()
    }

    fn insert_row(&mut self, row: Row, placement: Placement) {
        self.with_root_mut(|root| {
            let idx = match &placement {
                Placement::First => 0,
                Placement::Append => root.rows.len(),
                Placement::Before(id) => root
                    .rows
                    .iter()
                    .position(|r| r.id() == id.as_str())
                    .unwrap_or(root.rows.len()),
            };
            root.rows.insert(idx, row);
        });
    }

    fn remove_row(&mut self, id: &str) -> bool {
        let mut removed = false;
        self.with_root_mut(|root| {
            let before = root.rows.len();
            root.rows.retain(|r| r.id() != id);
            removed = root.rows.len() != before;
        });
        removed
    }

    fn input_value(&self) -> String {
        self.with_root(|root| root.input.clone()).unwrap_or_default()
    }

    fn set_input_value(&mut self, value: &str) {
        self.with_root_mut(|root| root.input = value.to_string());
    }

    fn focus_input(&mut self) {
        self.with_root_mut(|root| {
            if root.options {
                root.input_focused = true;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scaffold() -> Scaffold {
        Scaffold {
            container: None,
            classes: vec!["gi-userlist".to_string(), "gi-anchor".to_string()],
            options: true,
        }
    }

    fn user_row(id: &str, title: &str) -> Row {
        Row::User(UserRow {
            id: id.to_string(),
            title: title.to_string(),
            short_name: title.to_string(),
            color: "#268bd2".to_string(),
            avatar_url: None,
            local: false,
            no_options: false,
        })
    }

    #[test]
    fn test_mount_and_unmount() {
        let mut surface = MemorySurface::new();
        assert!(!surface.is_mounted());
        assert_eq!(surface.to_html(), None);

        surface.mount(scaffold()).unwrap();
        assert!(surface.is_mounted());
        assert_eq!(surface.container().as_deref(), Some(BODY));
        assert!(!surface.is_visible());
        assert_eq!(surface.mount(scaffold()), Err(SurfaceError::AlreadyMounted));

        assert!(surface.unmount());
        assert!(!surface.unmount());
    }

    #[test]
    fn test_mount_into_unknown_container_fails() {
        let mut surface = MemorySurface::new();
        let mut s = scaffold();
        s.container = Some("sidebar".to_string());
        assert_eq!(
            surface.mount(s.clone()),
            Err(SurfaceError::ContainerNotFound("sidebar".to_string()))
        );

        let mut surface = MemorySurface::new().with_container("sidebar");
        surface.mount(s).unwrap();
        assert_eq!(surface.container().as_deref(), Some("sidebar"));
    }

    #[test]
    fn test_classes_toggle() {
        let mut surface = MemorySurface::new();
        surface.mount(scaffold()).unwrap();

        surface.set_class("gi-collapsed", true);
        surface.set_class("gi-collapsed", true);
        assert_eq!(
            surface.classes(),
            vec!["gi-userlist", "gi-anchor", "gi-collapsed"]
        );

        surface.set_class("gi-collapsed", false);
        assert!(!surface.has_class("gi-collapsed"));
    }

    #[test]
    fn test_row_placement() {
        let mut surface = MemorySurface::new();
        surface.mount(scaffold()).unwrap();

        surface.insert_row(user_row("b", "B"), Placement::Append);
        surface.insert_row(user_row("a", "A"), Placement::First);
        surface.insert_row(user_row("c", "C"), Placement::Before("b".to_string()));
        surface.insert_row(user_row("d", "D"), Placement::Before("gone".to_string()));

        assert_eq!(surface.row_ids(), vec!["a", "c", "b", "d"]);
        assert!(surface.remove_row("c"));
        assert!(!surface.remove_row("c"));
        assert_eq!(surface.row_ids(), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_upsert_replaces_existing_row() {
        let mut surface = MemorySurface::new();
        surface.mount(scaffold()).unwrap();

        surface.upsert_row(user_row("a", "A"), Placement::Append);
        surface.upsert_row(user_row("b", "B"), Placement::Append);
        surface.upsert_row(user_row("a", "Z"), Placement::Append);

        assert_eq!(
            surface.rows(),
            vec![RowKey::new("b", "B"), RowKey::new("a", "Z")]
        );
    }

    #[test]
    fn test_unmounted_operations_are_noops() {
        let mut surface = MemorySurface::new();
        surface.insert_row(user_row("a", "A"), Placement::Append);
        surface.set_class("gi-collapsed", true);
        surface.set_input_value("x");

        assert!(surface.rows().is_empty());
        assert!(!surface.has_class("gi-collapsed"));
        assert_eq!(surface.input_value(), "");
    }

    #[test]
    fn test_clones_share_tree() {
        let mut surface = MemorySurface::new();
        let observer = surface.clone();
        surface.mount(scaffold()).unwrap();
        surface.insert_row(user_row("a", "A"), Placement::Append);

        assert_eq!(observer.row_ids(), vec!["a"]);
        assert!(observer.to_html().unwrap().contains(r#"data-goinstant-id="a""#));
    }
}
