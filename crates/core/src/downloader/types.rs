//! Types for the downloader module.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::source::FetchPlan;

/// Elapsed time is floored to this before computing rates.
const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// Progress snapshot for one download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub bytes_written: u64,
    /// Declared content length; `None` when the server omitted it.
    pub total_bytes: Option<u64>,
    pub elapsed: Duration,
    /// Average bytes per second since the session started.
    pub rate_bytes_per_sec: f64,
    /// True for the final event of a finished transfer.
    pub complete: bool,
}

impl ProgressEvent {
    /// Percentage in `[0, 100]`, or `None` when the total is unknown.
    pub fn percent(&self) -> Option<f32> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some(((self.bytes_written as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as f32)
            }
            Some(_) if self.complete => Some(100.0),
            _ => None,
        }
    }

    /// Estimated time remaining, when both total and rate are known.
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total_bytes?;
        if self.rate_bytes_per_sec <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.bytes_written);
        Some(Duration::from_secs_f64(
            remaining as f64 / self.rate_bytes_per_sec,
        ))
    }
}

/// State of one in-flight download.
///
/// `bytes_written` only grows; [`DownloadSession::record`] is its only
/// mutator.
#[derive(Debug)]
pub struct DownloadSession {
    plan: FetchPlan,
    destination: PathBuf,
    total_bytes: Option<u64>,
    bytes_written: u64,
    chunks_written: u64,
    started_at: Instant,
}

impl DownloadSession {
    pub fn new(plan: FetchPlan, destination: PathBuf, total_bytes: Option<u64>) -> Self {
        Self {
            plan,
            destination,
            total_bytes,
            bytes_written: 0,
            chunks_written: 0,
            started_at: Instant::now(),
        }
    }

    /// Accounts for one chunk written to disk and returns the chunk count.
    pub fn record(&mut self, len: usize) -> u64 {
        self.bytes_written += len as u64;
        self.chunks_written += 1;
        self.chunks_written
    }

    pub fn plan(&self) -> &FetchPlan {
        &self.plan
    }

    pub fn destination(&self) -> &PathBuf {
        &self.destination
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn snapshot(&self, complete: bool) -> ProgressEvent {
        let elapsed = self.elapsed();
        let secs = elapsed.max(MIN_ELAPSED).as_secs_f64();
        ProgressEvent {
            bytes_written: self.bytes_written,
            total_bytes: self.total_bytes,
            elapsed,
            rate_bytes_per_sec: self.bytes_written as f64 / secs,
            complete,
        }
    }
}

/// Outcome of a finished download.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub total_bytes: Option<u64>,
    /// File name announced by the server via `Content-Disposition`.
    pub suggested_name: Option<String>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn event(bytes: u64, total: Option<u64>) -> ProgressEvent {
        ProgressEvent {
            bytes_written: bytes,
            total_bytes: total,
            elapsed: Duration::from_secs(2),
            rate_bytes_per_sec: bytes as f64 / 2.0,
            complete: false,
        }
    }

    #[test]
    fn test_percent_known_total() {
        assert_eq!(event(50, Some(200)).percent(), Some(25.0));
        assert_eq!(event(200, Some(200)).percent(), Some(100.0));
    }

    #[test]
    fn test_percent_clamped_when_server_understates_length() {
        assert_eq!(event(300, Some(200)).percent(), Some(100.0));
    }

    #[test]
    fn test_percent_unknown_total() {
        assert_eq!(event(50, None).percent(), None);
        assert_eq!(event(0, Some(0)).percent(), None);
    }

    #[test]
    fn test_eta() {
        let e = event(100, Some(300));
        // 50 B/s, 200 B remaining
        assert_eq!(e.eta(), Some(Duration::from_secs(4)));
        assert_eq!(event(100, None).eta(), None);
        assert_eq!(event(0, Some(10)).eta(), None);
    }

    #[test]
    fn test_session_rate_right_after_start_is_finite() {
        let plan = FetchPlan::direct(Url::parse("https://example.com/x").unwrap());
        let mut session = DownloadSession::new(plan, PathBuf::from("/tmp/x"), Some(10));
        session.record(10);
        let snapshot = session.snapshot(true);
        assert!(snapshot.rate_bytes_per_sec.is_finite());
        assert_eq!(snapshot.percent(), Some(100.0));
    }

    #[test]
    fn test_session_record_is_monotonic() {
        let plan = FetchPlan::direct(Url::parse("https://example.com/x").unwrap());
        let mut session = DownloadSession::new(plan, PathBuf::from("/tmp/x"), None);
        let mut last = 0;
        for len in [5usize, 0, 7, 1] {
            session.record(len);
            assert!(session.bytes_written() >= last);
            last = session.bytes_written();
        }
        assert_eq!(session.bytes_written(), 13);
    }
}
