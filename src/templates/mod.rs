//! HTML templates and styling for the user list.
//!
//! ## Module Structure
//!
//! - `styles` - default widget CSS
//! - `list` - the scaffold, user rows and the count row
//! - `components` - page shell for the demo server

mod components;
mod list;
mod styles;

pub use components::base_html;
pub use list::{count_row_html, render_list, user_row_html};
pub use styles::STYLE;
