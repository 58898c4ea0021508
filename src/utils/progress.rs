//! Step spinners using indicatif
//!
//! Spinners are only drawn when stderr is a terminal. When output is piped or
//! captured the finishing message is printed as a plain line instead, so logs
//! keep one line per completed step.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Create a spinner for a step of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("    {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(TICK_INTERVAL);
    pb
}

/// Finish a step spinner with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    finish_step(pb, format!("✅ {}", message));
}

/// Finish a step spinner with a warning message
pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    finish_step(pb, format!("⚠️  {}", message));
}

fn finish_step(pb: &ProgressBar, line: String) {
    if pb.is_hidden() {
        pb.finish();
        println!("    {}", line);
    } else {
        pb.finish_with_message(line);
    }
}
