pub mod diff_utils;
pub mod footer;
pub mod render_ui;
pub mod unified_diff;

pub use render_ui::{diff_viewport_height, ui};
