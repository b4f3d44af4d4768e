//! Console Progress Rendering
//!
//! Draws the snapshots published by the pipeline's progress tracker on a
//! single terminal line. The tracker never prints; this is the only place
//! that turns snapshots into text.

use std::io::{self, Write};

use console::{Term, style};

use crate::pipeline::{ProgressReceiver, ProgressSnapshot};

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const BAR_WIDTH: usize = 30;

/// Renders progress snapshots on stderr
pub struct ConsoleRenderer {
    term: Term,
    frame: usize,
    model: String,
    drawn: bool,
}

impl ConsoleRenderer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            term: Term::stderr(),
            frame: 0,
            model: model.into(),
            drawn: false,
        }
    }

    /// Draw until the sender is dropped or the call resolves
    ///
    /// The executor resets the channel to `None` once the provider call
    /// returns; that ends rendering after at least one frame was drawn. Runs
    /// that fail before dispatch never draw, so callers drop the sender to
    /// stop the renderer.
    pub async fn follow(mut self, mut rx: ProgressReceiver) {
        while rx.changed().await.is_ok() {
            let current = *rx.borrow_and_update();
            match current {
                Some(snapshot) => self.draw(&snapshot),
                None if self.drawn => break,
                None => {}
            }
        }
        self.clear();
    }

    fn draw(&mut self, snapshot: &ProgressSnapshot) {
        let line = self.render_line(snapshot);
        self.frame = self.frame.wrapping_add(1);
        if self.term.is_term() {
            let _ = self.term.clear_line();
            let _ = write!(&self.term, "{}", line);
            let _ = io::stderr().flush();
        } else if !self.drawn {
            // no cursor control; one line is enough for logs
            let _ = self.term.write_line(&line);
        }
        self.drawn = true;
    }

    fn clear(&self) {
        if self.drawn && self.term.is_term() {
            let _ = self.term.clear_line();
        }
    }

    fn render_line(&self, snapshot: &ProgressSnapshot) -> String {
        let spinner = SPINNER[self.frame % SPINNER.len()];
        let completed = (snapshot.fraction_complete * 1000.0) as usize;
        format!(
            "{} Waiting for {} {} {:>3.0}% | {} elapsed | ETA {} | {}",
            style(spinner).cyan(),
            style(&self.model).bold(),
            render_progress_bar(completed, 1000, BAR_WIDTH),
            snapshot.percent(),
            format_duration(snapshot.elapsed_seconds as u64),
            format_duration(snapshot.remaining_seconds().ceil() as u64),
            format_size(snapshot.content_chars),
        )
    }
}

/// Render a progress bar
pub fn render_progress_bar(completed: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return format!("[{}]", " ".repeat(width));
    }

    let progress = (completed as f32 / total as f32).min(1.0);
    let filled = (progress * width as f32) as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format duration as human-readable string
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Character count with a k/M suffix
pub fn format_size(chars: usize) -> String {
    match chars {
        0..1_000 => format!("{} chars", chars),
        1_000..1_000_000 => format!("{:.1}k chars", chars as f64 / 1_000.0),
        _ => format!("{:.1}M chars", chars as f64 / 1_000_000.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_progress_bar() {
        assert_eq!(render_progress_bar(0, 10, 10), "[░░░░░░░░░░]");
        assert_eq!(render_progress_bar(5, 10, 10), "[█████░░░░░]");
        assert_eq!(render_progress_bar(10, 10, 10), "[██████████]");
        assert_eq!(render_progress_bar(15, 10, 4), "[████]");
        assert_eq!(render_progress_bar(0, 0, 3), "[   ]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3725), "1h 2m");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(999), "999 chars");
        assert_eq!(format_size(12_345), "12.3k chars");
        assert_eq!(format_size(2_500_000), "2.5M chars");
    }

    #[test]
    fn test_render_line_contents() {
        let renderer = ConsoleRenderer::new("gpt-4o");
        let snapshot = ProgressSnapshot {
            elapsed_seconds: 30.0,
            estimated_total_seconds: 60.0,
            fraction_complete: 0.5,
            content_chars: 48_000,
        };
        let line = renderer.render_line(&snapshot);
        assert!(line.contains("gpt-4o"));
        assert!(line.contains(" 50%"));
        assert!(line.contains("30s elapsed"));
        assert!(line.contains("ETA 30s"));
        assert!(line.contains("48.0k chars"));
    }
}
