use std::path::Path;
use std::time::Duration;

use tokio::time::{self, Instant};

use super::recording::{LogError, ReplayLog};
use super::timeline::Timeline;
use crate::config::ReplayConfig;
use crate::net::{Sink, SinkError};

/// Lines emitted later than this past their due time count as late.
const LATE_TOLERANCE: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl ReplayError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ReplayError::Sink(SinkError::Disconnected))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub lines_sent: u64,
    pub bytes_sent: u64,
    pub late_lines: u64,
    pub max_lag: Duration,
}

impl SessionStats {
    fn record(&mut self, bytes: usize, lag: Duration) {
        self.lines_sent += 1;
        self.bytes_sent += bytes as u64;
        if lag > LATE_TOLERANCE {
            self.late_lines += 1;
        }
        self.max_lag = self.max_lag.max(lag);
    }

    fn merge(&mut self, other: &SessionStats) {
        self.lines_sent += other.lines_sent;
        self.bytes_sent += other.bytes_sent;
        self.late_lines += other.late_lines;
        self.max_lag = self.max_lag.max(other.max_lag);
    }
}

/// Re-emits a recording with its original spacing.
///
/// Each session pins the first line to the moment the session starts; line
/// `i` is then due at `start + (t[i] - t[0])`. Lines are never sent early.
/// A line whose due time has already passed goes out immediately, with no
/// attempt to catch up on the ones after it.
#[derive(Debug, Clone)]
pub struct Replayer {
    timeline: Timeline,
    wire: Vec<Vec<u8>>,
    config: ReplayConfig,
}

impl Replayer {
    pub fn new(log: ReplayLog, config: ReplayConfig) -> Self {
        let timeline = Timeline::new(&log);
        let wire = log.lines().iter().map(|line| line.to_wire()).collect();

        Self {
            timeline,
            wire,
            config,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P, config: ReplayConfig) -> Result<Self, ReplayError> {
        Ok(Self::new(ReplayLog::open(path)?, config))
    }

    /// Recorded length of one session.
    pub fn span(&self) -> Duration {
        self.timeline.span()
    }

    /// Runs one session, or sessions back to back when repeating.
    ///
    /// In repeat mode this only returns on a sink error.
    pub async fn run<S: Sink>(&self, sink: &mut S) -> Result<SessionStats, ReplayError> {
        let mut total = SessionStats::default();
        let mut pass = 1u64;

        loop {
            let stats = self.play_once(sink).await?;
            total.merge(&stats);

            if !self.config.repeat {
                return Ok(total);
            }

            pass += 1;
            log::info!(
                "Pass complete ({} lines, {} late), starting pass {}",
                stats.lines_sent,
                stats.late_lines,
                pass
            );
        }
    }

    /// One pass through the log with a freshly computed time offset.
    pub async fn play_once<S: Sink>(&self, sink: &mut S) -> Result<SessionStats, ReplayError> {
        let start = Instant::now();
        let mut stats = SessionStats::default();

        log::info!(
            "Replaying {} lines spanning {:.3}s",
            self.wire.len(),
            self.span().as_secs_f64()
        );

        for (index, bytes) in self.wire.iter().enumerate() {
            let due = start + self.timeline.due_after(index);
            let now = Instant::now();

            let lag = if due > now {
                time::sleep_until(due).await;
                Instant::now().saturating_duration_since(due)
            } else {
                now - due
            };

            sink.send(bytes).await?;
            stats.record(bytes.len(), lag);
            log::trace!("Sent line {} ({} bytes, lag {:?})", index + 1, bytes.len(), lag);
        }

        log::info!(
            "Session complete: {} lines, {} bytes, {} late (max lag {:?})",
            stats.lines_sent,
            stats.bytes_sent,
            stats.late_lines,
            stats.max_lag
        );

        Ok(stats)
    }
}
