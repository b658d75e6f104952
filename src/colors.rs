//! Presence color assignment.
//!
//! Every row carries a color swatch. The platform may assign a color through
//! the user's `avatarColor` field; otherwise one is picked from a fixed
//! palette so the same user always gets the same swatch.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::User;

/// Predefined avatar colors (solarized palette).
pub const AVATAR_COLORS: &[&str] = &[
    "#268bd2", // blue
    "#d33682", // magenta
    "#859900", // green
    "#cb4b16", // orange
    "#6c71c4", // violet
    "#2aa198", // cyan
    "#b58900", // yellow
    "#dc322f", // red
];

pub trait ColorAssigner: Send + Sync {
    /// Color token for this user's swatch.
    fn get(&self, user: &User) -> String;

    /// Whether a change to `key` means the user's presence color changed.
    fn is_user_property(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteColors;

impl PaletteColors {
    fn pick(id: &str) -> &'static str {
        // FNV-1a so the pick is stable across builds and platforms.
        let hash = id
            .bytes()
            .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
        AVATAR_COLORS[hash as usize % AVATAR_COLORS.len()]
    }
}

impl ColorAssigner for PaletteColors {
    fn get(&self, user: &User) -> String {
        match user.avatar_color.as_deref() {
            Some(color) if !color.is_empty() => color.to_string(),
            _ => Self::pick(&user.id).to_string(),
        }
    }

    fn is_user_property(&self, key: &str) -> bool {
        static AVATAR_COLOR_KEY: OnceLock<Option<Regex>> = OnceLock::new();
        AVATAR_COLOR_KEY
            .get_or_init(|| Regex::new(r"/avatarColor$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_color_wins() {
        let user = User::new("u1").with_avatar_color("#123456");
        assert_eq!(PaletteColors.get(&user), "#123456");
    }

    #[test]
    fn test_palette_pick_is_stable() {
        let user = User::new("u1");
        let first = PaletteColors.get(&user);
        assert_eq!(PaletteColors.get(&user), first);
        assert!(AVATAR_COLORS.contains(&first.as_str()));
    }

    #[test]
    fn test_palette_colors_are_hex() {
        for color in AVATAR_COLORS {
            assert!(color.starts_with('#'));
            assert_eq!(color.len(), 7);
        }
    }

    #[test]
    fn test_is_user_property() {
        assert!(PaletteColors.is_user_property("/.users/abc/avatarColor"));
        assert!(!PaletteColors.is_user_property("/.users/abc/avatarColor/x"));
        assert!(!PaletteColors.is_user_property("/.users/abc/displayName"));
    }
}
