use crate::index::Algorithm;
use crate::util::format::{format_bytes, format_timestamp};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// How a hashing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    InProgress,
    Completed,
    Interrupted,
    Aborted,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::InProgress => "in_progress",
            RunOutcome::Completed => "completed",
            RunOutcome::Interrupted => "interrupted",
            RunOutcome::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counters for one hashing run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    pub algorithm: Algorithm,
    pub file_count: u64,
    /// Directory transitions observed in walk order.
    pub dir_count: u64,
    pub total_bytes: u64,
    pub skipped_files: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub elapsed_secs: f64,
    pub outcome: RunOutcome,
    /// Why an aborted run stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip)]
    clock: Instant,
}

impl RunStatistics {
    pub fn start(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            file_count: 0,
            dir_count: 0,
            total_bytes: 0,
            skipped_files: 0,
            started_at: Local::now(),
            finished_at: None,
            elapsed_secs: 0.0,
            outcome: RunOutcome::InProgress,
            failure: None,
            clock: Instant::now(),
        }
    }

    pub fn record_file(&mut self, bytes: u64, new_dir: bool) {
        self.file_count += 1;
        self.total_bytes += bytes;
        if new_dir {
            self.dir_count += 1;
        }
    }

    pub fn record_skip(&mut self) {
        self.skipped_files += 1;
    }

    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.failure = Some(reason.into());
    }

    pub fn finish(&mut self, outcome: RunOutcome) {
        self.finished_at = Some(Local::now());
        self.elapsed_secs = self.clock.elapsed().as_secs_f64();
        self.outcome = outcome;
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// The trailing block appended to the mirror and echoed to the console.
    pub fn render(&self) -> String {
        let end = self
            .finished_at
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());

        let mut block = format!(
            "Statistics:\n\
             Hash algorithm:        {}\n\
             Total files:           {}\n\
             Total directories:     {}\n\
             Total bytes:           {} ({})\n\
             Skipped files:         {}\n\
             Start date and time:   {}\n\
             End date and time:     {}\n\
             Time elapsed(seconds): {:.3}\n\
             Run outcome:           {}\n",
            self.algorithm,
            self.file_count,
            self.dir_count,
            self.total_bytes,
            format_bytes(self.total_bytes),
            self.skipped_files,
            format_timestamp(&self.started_at),
            end,
            self.elapsed_secs,
            self.outcome,
        );
        if let Some(reason) = &self.failure {
            block.push_str(&format!("Failure:               {}\n", reason));
        }
        block
    }
}
