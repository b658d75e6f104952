//! Markup for the list scaffold and its rows.

use crate::surface::{CountRow, UserRow};
use crate::text::html_escape;
use crate::{
    COLLAPSE_BTN_CLASS, COUNT_CLASS, DATA_COUNT, DATA_USER_ID, EDIT_ICON_CLASS, INNER_CLASS,
    LOCAL_USER_CLASS, NAME_INPUT_CLASS, NO_OPTIONS_CLASS, OPTIONS_OVERLAY_CLASS, USER_CLASS,
};

// ============================================================================
// Scaffold
// ============================================================================

pub fn render_list(
    classes: &[String],
    visible: bool,
    options: bool,
    input: &str,
    rows_html: &str,
) -> String {
    let display = if visible { "block" } else { "none" };
    let options_html = if options {
        format!(
            r#"<div class="{overlay}">
            <span class="{icon}" title="Edit your name"></span>
            <input class="{input_class}" type="text" value="{value}">
        </div>"#,
            overlay = OPTIONS_OVERLAY_CLASS,
            icon = EDIT_ICON_CLASS,
            input_class = NAME_INPUT_CLASS,
            value = html_escape(input),
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="{classes}" style="display: {display}">
        <div class="{collapse}"><span class="gi-arrow"></span></div>
        {options_html}
        <ul class="{inner}">{rows_html}</ul>
    </div>"#,
        classes = html_escape(&classes.join(" ")),
        collapse = COLLAPSE_BTN_CLASS,
        inner = INNER_CLASS,
    )
}

// ============================================================================
// Rows
// ============================================================================

pub fn user_row_html(row: &UserRow) -> String {
    let class = if row.local {
        format!("{} {}", USER_CLASS, LOCAL_USER_CLASS)
    } else {
        USER_CLASS.to_string()
    };
    let name_class = if row.no_options {
        format!("gi-name {}", NO_OPTIONS_CLASS)
    } else {
        "gi-name".to_string()
    };
    let avatar = match &row.avatar_url {
        Some(url) => format!(r#"<img class="gi-avatar-img" src="{}">"#, html_escape(url)),
        None => String::new(),
    };

    format!(
        r#"<li class="{class}" title="{title}" {attr}="{id}">
            <div class="gi-color" style="background-color: {color}">{avatar}</div>
            <div class="{name_class}">{name}</div>
        </li>"#,
        title = html_escape(&row.title),
        attr = DATA_USER_ID,
        id = html_escape(&row.id),
        color = html_escape(&row.color),
        name = html_escape(&row.short_name),
    )
}

pub fn count_row_html(row: &CountRow) -> String {
    let label = if row.count == 1 { "user" } else { "users" };
    format!(
        r#"<li class="{class}" {attr}="{count}">
            <span class="gi-count-number">{count}</span> <span class="gi-count-label">{label}</span>
        </li>"#,
        class = COUNT_CLASS,
        attr = DATA_COUNT,
        count = row.count,
    )
}
