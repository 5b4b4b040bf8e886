//! Commands exposed by the command-line front end

pub mod processing;

pub use processing::{build_timeline_file, render_effects, smooth_cursor_file, TimelineSource};
