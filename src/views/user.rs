//! Renders one user's row.
//!
//! A render always replaces the user's existing row and re-inserts it at
//! its sorted position, so the same user rendered twice never yields two
//! rows. The local user goes first; everyone else is ordered by raw display
//! name, then id.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::avatar::{ImageProbe, ProbeOutcome};
use crate::colors::ColorAssigner;
use crate::models::User;
use crate::surface::{ListSurface, Placement, Row, RowKey, UserRow};
use crate::text::truncate;

/// The list settings a renderer reads, passed by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub truncate_length: usize,
    pub avatars: bool,
    pub editing_enabled: bool,
    pub local_user_id: Option<String>,
}

pub struct UserView {
    ctx: RenderContext,
    colors: Arc<dyn ColorAssigner>,
    probe: Arc<dyn ImageProbe>,
}

impl UserView {
    pub fn new(
        ctx: RenderContext,
        colors: Arc<dyn ColorAssigner>,
        probe: Arc<dyn ImageProbe>,
    ) -> Self {
        Self { ctx, colors, probe }
    }

    /// Render `user` onto `surface`. Waits for the avatar probe to settle
    /// before touching the surface; never fails.
    pub async fn render<S>(&self, surface: &mut S, user: &User)
    where
        S: ListSurface + ?Sized,
    {
        let loaded = self.avatar_loaded(user).await;
        let row = self.build_row(user, loaded);
        self.place(surface, row);
    }

    async fn avatar_loaded(&self, user: &User) -> bool {
        if !self.ctx.avatars {
            return false;
        }
        let Some(url) = user.avatar_url.as_deref().filter(|u| !u.is_empty()) else {
            return false;
        };

        let outcome = self.probe.probe(url).await;
        if outcome != ProbeOutcome::Loaded {
            debug!(user = %user.id, ?outcome, "avatar omitted");
        }
        outcome.is_loaded()
    }

    fn build_row(&self, user: &User, avatar_loaded: bool) -> UserRow {
        let title = user.title().to_string();
        UserRow {
            id: user.id.clone(),
            short_name: truncate(&title, self.ctx.truncate_length),
            title,
            color: self.colors.get(user),
            avatar_url: if avatar_loaded {
                user.avatar_url.clone()
            } else {
                None
            },
            local: self.is_local(&user.id),
            no_options: !self.ctx.editing_enabled,
        }
    }

    fn is_local(&self, id: &str) -> bool {
        self.ctx.local_user_id.as_deref() == Some(id)
    }

    fn place<S>(&self, surface: &mut S, row: UserRow)
    where
        S: ListSurface + ?Sized,
    {
        surface.remove_row(&row.id);

        let placement = if row.local {
            Placement::First
        } else {
            let key = RowKey::new(&row.id, &row.title);
            placement_for(
                &surface.rows(),
                &key,
                self.ctx.local_user_id.as_deref(),
            )
        };

        surface.insert_row(Row::User(row), placement);
    }
}

/// Order two rows by `(title, id)`, comparing UTF-16 code units so names
/// sort the way browsers compare strings.
pub fn order(a: &RowKey, b: &RowKey) -> Ordering {
    utf16_cmp(&a.title, &b.title).then_with(|| utf16_cmp(&a.id, &b.id))
}

fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Where a non-local row belongs among `rows`: before the first sibling
/// that sorts after it, skipping the local user's row.
pub fn placement_for(rows: &[RowKey], key: &RowKey, local_user_id: Option<&str>) -> Placement {
    rows.iter()
        .filter(|sibling| Some(sibling.id.as_str()) != local_user_id)
        .find(|sibling| order(key, sibling) != Ordering::Greater)
        .map(|sibling| Placement::Before(sibling.id.clone()))
        .unwrap_or(Placement::Append)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::PaletteColors;
    use crate::surface::{MemorySurface, Scaffold};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Loads urls ending in `/ok.png`, aborts those ending in `/abort.png`,
    /// fails the rest. Records what it was asked.
    #[derive(Default)]
    struct FakeProbe {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageProbe for FakeProbe {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            self.seen.lock().unwrap().push(url.to_string());
            if url.ends_with("/ok.png") {
                ProbeOutcome::Loaded
            } else if url.ends_with("/abort.png") {
                ProbeOutcome::Aborted
            } else {
                ProbeOutcome::Failed
            }
        }
    }

    fn ctx() -> RenderContext {
        RenderContext {
            truncate_length: 10,
            avatars: true,
            editing_enabled: true,
            local_user_id: Some("me".to_string()),
        }
    }

    fn surface() -> MemorySurface {
        let mut surface = MemorySurface::new();
        surface
            .mount(Scaffold {
                container: None,
                classes: vec![],
                options: true,
            })
            .unwrap();
        surface
    }

    fn view_with(ctx: RenderContext, probe: Arc<FakeProbe>) -> UserView {
        UserView::new(ctx, Arc::new(PaletteColors), probe)
    }

    fn view() -> UserView {
        view_with(ctx(), Arc::new(FakeProbe::default()))
    }

    #[test]
    fn test_order_uses_utf16_code_units() {
        // U+FF21 sits above the surrogate range an emoji encodes to, so it
        // sorts after it even though its UTF-8 bytes sort before.
        let fullwidth = RowKey::new("1", "\u{FF21}");
        let emoji = RowKey::new("2", "\u{1F600}");
        assert_eq!(order(&fullwidth, &emoji), Ordering::Greater);
        assert_eq!(order(&emoji, &fullwidth), Ordering::Less);
    }

    #[test]
    fn test_order_by_title_then_id() {
        let a = RowKey::new("2", "Ann");
        let b = RowKey::new("1", "Bob");
        let c = RowKey::new("3", "Ann");
        assert_eq!(order(&a, &b), Ordering::Less);
        assert_eq!(order(&a, &c), Ordering::Less);
        assert_eq!(order(&c, &a), Ordering::Greater);
        // Case-sensitive on the raw title.
        assert_eq!(order(&RowKey::new("1", "bob"), &RowKey::new("2", "Zed")), Ordering::Greater);
    }

    #[test]
    fn test_placement_skips_local_row() {
        let rows = vec![
            RowKey::new("me", "Zelda"),
            RowKey::new("a", "Ann"),
            RowKey::new("c", "Cat"),
        ];
        assert_eq!(
            placement_for(&rows, &RowKey::new("b", "Bob"), Some("me")),
            Placement::Before("c".to_string())
        );
        assert_eq!(
            placement_for(&rows, &RowKey::new("z", "Zoe"), Some("me")),
            Placement::Append
        );
        assert_eq!(
            placement_for(&rows, &RowKey::new("0", "Aaron"), Some("me")),
            Placement::Before("a".to_string())
        );
    }

    #[tokio::test]
    async fn test_rows_sorted_with_local_first() {
        let mut surface = surface();
        let view = view();

        for user in [
            User::new("u3").with_display_name("Carol"),
            User::new("u1").with_display_name("Alice"),
            User::new("me").with_display_name("Zed"),
            User::new("u2").with_display_name("Bob"),
            User::new("u0").with_display_name("Bob"),
        ] {
            view.render(&mut surface, &user).await;
        }

        assert_eq!(surface.row_ids(), vec!["me", "u1", "u0", "u2", "u3"]);
        assert!(surface.user_row("me").unwrap().local);
        assert!(!surface.user_row("u1").unwrap().local);
    }

    #[tokio::test]
    async fn test_rerender_replaces_row() {
        let mut surface = surface();
        let view = view();

        view.render(&mut surface, &User::new("u1").with_display_name("Alice")).await;
        view.render(&mut surface, &User::new("u2").with_display_name("Bob")).await;
        view.render(&mut surface, &User::new("u1").with_display_name("Zara")).await;
        view.render(&mut surface, &User::new("u1").with_display_name("Zara")).await;

        assert_eq!(surface.row_ids(), vec!["u2", "u1"]);
        assert_eq!(surface.user_row("u1").unwrap().title, "Zara");
    }

    #[tokio::test]
    async fn test_row_fields() {
        let mut surface = surface();
        let mut c = ctx();
        c.truncate_length = 5;
        c.editing_enabled = false;
        let view = view_with(c, Arc::new(FakeProbe::default()));

        let user = User::new("u1").with_display_name("Guest 1").with_avatar_color("#abcdef");
        view.render(&mut surface, &user).await;

        let row = surface.user_row("u1").unwrap();
        assert_eq!(row.title, "Guest 1");
        assert_eq!(row.short_name, "Guest");
        assert_eq!(row.color, "#abcdef");
        assert!(row.no_options);
    }

    #[tokio::test]
    async fn test_missing_display_name_renders_empty() {
        let mut surface = surface();
        view().render(&mut surface, &User::new("u1")).await;

        let row = surface.user_row("u1").unwrap();
        assert_eq!(row.title, "");
        assert_eq!(row.short_name, "");
    }

    #[tokio::test]
    async fn test_avatar_only_when_probe_loads() {
        let mut surface = surface();
        let probe = Arc::new(FakeProbe::default());
        let view = view_with(ctx(), probe.clone());

        view.render(&mut surface, &User::new("a").with_avatar_url("https://x/ok.png")).await;
        view.render(&mut surface, &User::new("b").with_avatar_url("https://x/broken.png")).await;
        view.render(&mut surface, &User::new("c").with_avatar_url("https://x/abort.png")).await;
        view.render(&mut surface, &User::new("d")).await;

        assert_eq!(
            surface.user_row("a").unwrap().avatar_url.as_deref(),
            Some("https://x/ok.png")
        );
        assert_eq!(surface.user_row("b").unwrap().avatar_url, None);
        assert_eq!(surface.user_row("c").unwrap().avatar_url, None);
        assert_eq!(surface.user_row("d").unwrap().avatar_url, None);
        assert_eq!(probe.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_avatars_disabled_skips_probe() {
        let mut surface = surface();
        let probe = Arc::new(FakeProbe::default());
        let mut c = ctx();
        c.avatars = false;
        let view = view_with(c, probe.clone());

        view.render(&mut surface, &User::new("a").with_avatar_url("https://x/ok.png")).await;

        assert_eq!(surface.user_row("a").unwrap().avatar_url, None);
        assert!(probe.seen.lock().unwrap().is_empty());
    }
}
