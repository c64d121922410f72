use crate::robots::CachedRobots;
use chrono::{DateTime, Utc};

/// Per-domain state persisted across the crawl: success/error accounting
/// feeding the frontier's priority score, plus the cached robots.txt entry.
///
/// Live rate limiting itself belongs to [`crate::delay::DomainDelayManager`];
/// this type is the disk-durable complement, rebuilt from storage on resume.
#[derive(Debug, Clone)]
pub struct DomainState {
    pub success_count: u32,
    pub error_count: u32,
    pub avg_download_ms: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_event_is_error: bool,
    pub robots: Option<CachedRobots>,
}

impl DomainState {
    pub fn new() -> Self {
        Self {
            success_count: 0,
            error_count: 0,
            avg_download_ms: 0,
            last_success_at: None,
            last_error_at: None,
            last_event_is_error: false,
            robots: None,
        }
    }

    /// Total requests this domain state has observed.
    pub fn total_requests(&self) -> u32 {
        self.success_count + self.error_count
    }

    /// Fraction of observed requests that ended in error, in `[0.0, 1.0]`.
    pub fn error_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.error_count as f64 / total as f64
        }
    }

    /// Rolls a new successful download's time into the running average and
    /// marks the domain's last event as a success.
    pub fn record_success(&mut self, download_ms: u64) {
        let total_before = self.total_requests() as u64;
        self.avg_download_ms = if total_before == 0 {
            download_ms
        } else {
            (self.avg_download_ms * total_before + download_ms) / (total_before + 1)
        };
        self.success_count += 1;
        self.last_success_at = Some(Utc::now());
        self.last_event_is_error = false;
    }

    /// Records a failed request and marks the domain's last event as an
    /// error, used by the frontier's anti-thrash penalty.
    pub fn record_error(&mut self) {
        self.error_count += 1;
        self.last_error_at = Some(Utc::now());
        self.last_event_is_error = true;
    }

    /// Checks if the cached robots.txt entry is missing or stale.
    pub fn needs_robots_refresh(&self) -> bool {
        match &self.robots {
            Some(cached) => cached.is_stale(),
            None => true,
        }
    }

    /// Replaces the cached robots.txt entry for this domain.
    pub fn update_robots(&mut self, robots: crate::robots::ParsedRobots) {
        self.robots = Some(CachedRobots::new(robots));
    }
}

impl Default for DomainState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::ParsedRobots;

    #[test]
    fn test_new_domain_state() {
        let state = DomainState::new();
        assert_eq!(state.total_requests(), 0);
        assert_eq!(state.error_rate(), 0.0);
        assert!(state.robots.is_none());
    }

    #[test]
    fn test_record_success_tracks_running_average() {
        let mut state = DomainState::new();
        state.record_success(100);
        assert_eq!(state.avg_download_ms, 100);
        state.record_success(200);
        assert_eq!(state.avg_download_ms, 150);
        assert!(!state.last_event_is_error);
    }

    #[test]
    fn test_record_error_updates_rate_and_last_event() {
        let mut state = DomainState::new();
        state.record_success(50);
        state.record_error();
        assert_eq!(state.total_requests(), 2);
        assert_eq!(state.error_rate(), 0.5);
        assert!(state.last_event_is_error);
        assert!(state.last_error_at.is_some());
    }

    #[test]
    fn test_needs_robots_refresh_when_absent() {
        let state = DomainState::new();
        assert!(state.needs_robots_refresh());
    }

    #[test]
    fn test_needs_robots_refresh_after_update() {
        let mut state = DomainState::new();
        state.update_robots(ParsedRobots::allow_all());
        assert!(!state.needs_robots_refresh());
        assert!(state.robots.is_some());
    }

    #[test]
    fn test_default() {
        let state = DomainState::default();
        assert_eq!(state.success_count, 0);
        assert_eq!(state.error_count, 0);
    }
}
