pub mod commands;
pub mod progress;
pub mod ui;
pub mod util;

pub use progress::{ConsoleRenderer, format_duration, format_size, render_progress_bar};
pub use ui::Output;
pub use util::{CommandOptions, inputs_or_root};
