use std::time::Duration;

use tokio::time::Instant;

pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(150);
pub const PROGRESS_BATCH: usize = 20;

/// Decides which completed results are worth a progress callback.
///
/// Fires on the first result, then whenever [`PROGRESS_INTERVAL`] has passed
/// or [`PROGRESS_BATCH`] results have piled up, and always on the last one.
#[derive(Debug)]
pub struct ProgressThrottle {
    total: usize,
    last_emit: Option<Instant>,
    last_count: usize,
}

impl ProgressThrottle {
    pub fn new(total: usize) -> Self {
        Self { total, last_emit: None, last_count: 0 }
    }

    pub fn should_emit(&mut self, completed: usize) -> bool {
        let now = Instant::now();
        let due = completed >= self.total
            || completed.saturating_sub(self.last_count) >= PROGRESS_BATCH
            || self
                .last_emit
                .is_none_or(|last| now.duration_since(last) >= PROGRESS_INTERVAL);
        if due {
            self.last_emit = Some(now);
            self.last_count = completed;
        }
        due
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
