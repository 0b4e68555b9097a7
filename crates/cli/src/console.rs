//! Terminal progress display.

use indicatif::{ProgressBar, ProgressStyle};

use mediaconv_core::executor::{ProgressSink, ProgressUpdate};
use mediaconv_core::media::format_duration;

const TEMPLATE: &str = "{bar:30.cyan/blue} {pos:>3}% {msg}";

/// Longest status shown next to the bar.
const MAX_STATUS_CHARS: usize = 48;

/// Draws conversion progress as a bar on stderr.
///
/// A batch reuses one bar; its position restarts with each job.
pub struct ConsoleSink {
    bar: ProgressBar,
}

impl ConsoleSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    /// Removes the bar so later output starts on a clean line.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Text shown after the bar: optional ETA, then the truncated status.
pub fn render_message(update: &ProgressUpdate) -> String {
    let status: String = update.status.chars().take(MAX_STATUS_CHARS).collect();
    match update.eta_secs {
        Some(secs) if secs > 0.0 => format!("ETA {} {}", format_duration(secs), status),
        _ => status,
    }
}

/// Bar position for a percentage.
pub fn position(percent: f64) -> u64 {
    percent.clamp(0.0, 100.0).round() as u64
}

impl ProgressSink for ConsoleSink {
    fn report(&self, update: &ProgressUpdate) {
        self.bar.set_position(position(update.percent));
        self.bar.set_message(render_message(update));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaconv_core::JobId;

    fn update(percent: f64, status: &str, eta_secs: Option<f64>) -> ProgressUpdate {
        ProgressUpdate {
            job_id: JobId::new(),
            percent,
            status: status.to_string(),
            eta_secs,
        }
    }

    #[test]
    fn test_message_with_eta() {
        let update = update(42.0, "speed=2.1x", Some(75.0));
        assert_eq!(render_message(&update), "ETA 01:15 speed=2.1x");
    }

    #[test]
    fn test_message_truncates_status() {
        let update = update(100.0, &"x".repeat(200), None);
        assert_eq!(render_message(&update).len(), MAX_STATUS_CHARS);
    }

    #[test]
    fn test_position_rounds_and_clamps() {
        assert_eq!(position(42.4), 42);
        assert_eq!(position(99.6), 100);
        assert_eq!(position(-3.0), 0);
        assert_eq!(position(250.0), 100);
    }

    #[test]
    fn test_report_moves_bar() {
        let sink = ConsoleSink::new();
        sink.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());

        sink.report(&update(25.0, "converting", None));
        assert_eq!(sink.bar.position(), 25);
        assert_eq!(sink.bar.message(), "converting");

        sink.report(&update(100.0, "done", None));
        assert_eq!(sink.bar.position(), 100);

        sink.finish();
        assert!(sink.bar.is_finished());
    }
}
