use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success,
    SkippedExisting,
    Failed,
}

/// Per-run counters behind the final summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadTally {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadTally {
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success => self.success += 1,
            DownloadOutcome::SkippedExisting => self.skipped += 1,
            DownloadOutcome::Failed => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.success + self.skipped + self.failed
    }

    /// Whether `limit` successful downloads have been made; 0 never stops.
    pub fn limit_reached(&self, limit: usize) -> bool {
        limit > 0 && self.success >= limit
    }
}

impl fmt::Display for DownloadTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Summary ==")?;
        writeln!(f, "Successful: {}", self.success)?;
        writeln!(f, "Skipped:    {}", self.skipped)?;
        write!(f, "Failed:     {}", self.failed)
    }
}
