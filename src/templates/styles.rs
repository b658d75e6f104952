//! CSS for the user list widget.
//!
//! Hosts style the widget through the fixed class names; this is the default
//! look (solarized, like the rest of the palette).

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
:root {
    --base02: #073642;
    --base01: #586e75;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;
    --blue: #268bd2;
}

.gi-userlist.gi-override {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
    font-size: 13px;
    color: var(--base02);
    background: var(--base3);
    border: 1px solid var(--base2);
    border-radius: 4px;
    width: 160px;
    box-sizing: border-box;
}

.gi-userlist.gi-anchor { position: fixed; top: 20px; z-index: 1000; }
.gi-userlist.gi-anchor.gi-right { right: 20px; }
.gi-userlist.gi-anchor.gi-left { left: 20px; }
.gi-userlist.gi-relative { position: relative; }

.gi-userlist .gi-collapse {
    cursor: pointer;
    height: 14px;
    background: var(--base2);
    text-align: center;
}
.gi-userlist .gi-arrow::before { content: "\25B2"; font-size: 9px; color: var(--base01); }
.gi-userlist.gi-collapsed .gi-arrow::before { content: "\25BC"; }

.gi-userlist .gi-inner { list-style: none; margin: 0; padding: 4px 0; }
.gi-userlist.gi-collapsed .gi-inner,
.gi-userlist.gi-collapsed .gi-options { display: none; }

.gi-userlist .gi-user {
    display: flex;
    align-items: center;
    gap: 6px;
    padding: 3px 8px;
    white-space: nowrap;
}
.gi-userlist .gi-local-user { font-weight: 600; }

.gi-userlist .gi-color {
    width: 18px;
    height: 18px;
    border-radius: 3px;
    overflow: hidden;
    flex-shrink: 0;
}
.gi-userlist .gi-avatar-img { width: 100%; height: 100%; object-fit: cover; }

.gi-userlist .gi-options { padding: 4px 8px; border-bottom: 1px solid var(--base2); }
.gi-userlist .gi-icon { cursor: pointer; }
.gi-userlist .gi-icon::before { content: "\270E"; color: var(--blue); }
.gi-userlist .gi-set-name { display: none; width: 110px; font-size: 12px; }
.gi-userlist.gi-editing .gi-set-name { display: inline-block; }

.gi-userlist.gi-count-only .gi-count { padding: 4px 8px; text-align: center; }
.gi-userlist .gi-count-number { font-weight: 600; }
"#;
