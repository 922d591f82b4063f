use colored::*;
use indicatif::ProgressStyle;
use sonar_common::models::ProbeResult;
use sonar_core::scanner::{SweepObserver, SweepStatus};
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} [{bar:32.green/bright_black}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
        .progress_chars("━╸━")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// A spinner shown while the returned span is entered.
pub fn spinner(msg: &str) -> Span {
    let span = info_span!("task", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message(msg);
    span
}

/// Drives the sweep progress bar from the engine's throttled callbacks.
pub struct SweepProgress {
    span: Span,
}

impl SweepProgress {
    pub fn new(total: usize) -> Self {
        let span = info_span!("sweep", indicatif.pb_show = true);
        span.pb_set_style(&bar_style());
        span.pb_set_length(total as u64);
        span.pb_set_message(&format!("{}", "press 'q' to stop early".italic()));
        Self { span }
    }

    /// The span carrying the bar; instrument the sweep with it.
    pub fn span(&self) -> Span {
        self.span.clone()
    }
}

impl SweepObserver for SweepProgress {
    fn on_progress(&mut self, completed: usize, _total: usize, latest: &ProbeResult) {
        self.span.pb_set_position(completed as u64);
        if latest.is_reachable() {
            self.span.pb_set_message(&format!("last reply from {}", latest.address().to_string().green()));
        }
    }

    fn on_finish(&mut self, status: &SweepStatus, results: &[ProbeResult]) {
        self.span.pb_set_position(results.len() as u64);
        if let SweepStatus::Cancelled = status {
            self.span.pb_set_message("cancelled");
        }
    }
}
