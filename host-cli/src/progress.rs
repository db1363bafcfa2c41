//! Single-line progress reporting for long page transfers.

use std::io::{self, Write};
use std::time::Instant;

/// Rewrites one terminal line with elapsed time and completion percentage,
/// e.g. `[01:23] Reading page 17/512 (3%)`.
pub struct ProgressLine {
    started: Instant,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn update(&self, verb: &str, index: u32, total: u32) {
        let seconds = self.started.elapsed().as_secs();
        print!(
            "\r[{minutes:02}:{seconds:02}] {verb} page {done}/{total} ({percent}%)",
            minutes = seconds / 60,
            seconds = seconds % 60,
            done = index + 1,
            percent = 100 * (index + 1) / total,
        );
        let _ = io::stdout().flush();
    }

    /// Terminate the progress line once the transfer is complete.
    pub fn finish(&self) {
        println!();
    }
}

impl Default for ProgressLine {
    fn default() -> Self {
        Self::new()
    }
}
