//! Renderers that turn presence state into rows.

mod count;
mod user;

pub use count::CountView;
pub use user::{order, placement_for, RenderContext, UserView};
