//! Domain Delay Manager: adaptive, per-(domain, request type) polite delay
//! plus per-domain concurrency limiting.
//!
//! Generalizes the old single fixed `minimum_time_on_page` check into a
//! widen-on-trouble / narrow-on-success delay per domain and content kind,
//! and (unlike the source this was lifted from) actually enforces a
//! concurrency cap per domain via a semaphore rather than just tracking one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

/// Coarse content kind used to key delay state separately per request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Html,
    Pdf,
    Image,
    Api,
    Default,
}

#[derive(Debug, Clone)]
pub struct DelayBounds {
    pub default_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for DelayBounds {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_secs(1),
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

struct DelayState {
    current_delay: Duration,
    last_access: Option<Instant>,
}

/// Per-domain, per-request-type adaptive delay and concurrency control.
pub struct DomainDelayManager {
    bounds: DelayBounds,
    max_concurrent_per_domain: usize,
    overrides: HashMap<RequestType, Duration>,
    states: Mutex<HashMap<(String, RequestType), DelayState>>,
    permits: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl DomainDelayManager {
    pub fn new(bounds: DelayBounds, max_concurrent_per_domain: usize, overrides: HashMap<RequestType, Duration>) -> Self {
        Self {
            bounds,
            max_concurrent_per_domain,
            overrides,
            states: Mutex::new(HashMap::new()),
            permits: Mutex::new(HashMap::new()),
        }
    }

    fn default_for(&self, request_type: RequestType) -> Duration {
        self.overrides
            .get(&request_type)
            .copied()
            .unwrap_or(self.bounds.default_delay)
    }

    fn clamp(&self, delay: Duration) -> Duration {
        delay.clamp(self.bounds.min_delay, self.bounds.max_delay)
    }

    /// Whether a request to `domain` of `request_type` can proceed right now
    /// given the elapsed time since the last access.
    pub async fn can_process(&self, domain: &str, request_type: RequestType, now: Instant) -> bool {
        let states = self.states.lock().await;
        match states.get(&(domain.to_string(), request_type)) {
            Some(state) => match state.last_access {
                Some(last) => now.duration_since(last) >= state.current_delay,
                None => true,
            },
            None => true,
        }
    }

    /// Records that a request to `domain` of `request_type` was just made.
    pub async fn record_access(&self, domain: &str, request_type: RequestType, now: Instant) {
        let mut states = self.states.lock().await;
        let entry = states
            .entry((domain.to_string(), request_type))
            .or_insert_with(|| DelayState {
                current_delay: self.default_for(request_type),
                last_access: None,
            });
        entry.last_access = Some(now);
    }

    /// Sets an explicit delay for `(domain, request_type)`, clamped to bounds.
    pub async fn set_delay(&self, domain: &str, request_type: RequestType, delay: Duration) {
        let clamped = self.clamp(delay);
        let mut states = self.states.lock().await;
        let entry = states
            .entry((domain.to_string(), request_type))
            .or_insert_with(|| DelayState {
                current_delay: self.default_for(request_type),
                last_access: None,
            });
        entry.current_delay = clamped;
    }

    /// Widens the delay by 1.2x, clamped to `max_delay`. Call after a
    /// rate-limit or anti-bot signal from this domain.
    pub async fn increase_delay(&self, domain: &str, request_type: RequestType) {
        let mut states = self.states.lock().await;
        let entry = states
            .entry((domain.to_string(), request_type))
            .or_insert_with(|| DelayState {
                current_delay: self.default_for(request_type),
                last_access: None,
            });
        entry.current_delay = self.clamp(entry.current_delay.mul_f64(1.2));
    }

    /// Narrows the delay by 0.9x, clamped to `min_delay`. Call after a
    /// sustained run of successful requests to this domain.
    pub async fn decrease_delay(&self, domain: &str, request_type: RequestType) {
        let mut states = self.states.lock().await;
        let entry = states
            .entry((domain.to_string(), request_type))
            .or_insert_with(|| DelayState {
                current_delay: self.default_for(request_type),
                last_access: None,
            });
        entry.current_delay = self.clamp(entry.current_delay.mul_f64(0.9));
    }

    pub async fn current_delay(&self, domain: &str, request_type: RequestType) -> Duration {
        let states = self.states.lock().await;
        states
            .get(&(domain.to_string(), request_type))
            .map(|s| s.current_delay)
            .unwrap_or_else(|| self.default_for(request_type))
    }

    async fn semaphore_for(&self, domain: &str) -> Arc<Semaphore> {
        let mut permits = self.permits.lock().await;
        permits
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_concurrent_per_domain)))
            .clone()
    }

    /// Acquires a concurrency permit for `domain`, waiting until one is free.
    /// The permit releases the slot automatically when dropped.
    pub async fn acquire_concurrency_permit(&self, domain: &str) -> tokio::sync::OwnedSemaphorePermit {
        let semaphore = self.semaphore_for(domain).await;
        semaphore
            .acquire_owned()
            .await
            .expect("domain semaphore never closed")
    }

    /// Non-blocking variant: returns `None` if the domain is already at its
    /// concurrency limit instead of waiting.
    pub async fn try_acquire_concurrency_permit(&self, domain: &str) -> Option<tokio::sync::OwnedSemaphorePermit> {
        let semaphore = self.semaphore_for(domain).await;
        semaphore.try_acquire_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> DomainDelayManager {
        DomainDelayManager::new(DelayBounds::default(), 2, HashMap::new())
    }

    #[tokio::test]
    async fn allows_first_request_immediately() {
        let mgr = manager();
        assert!(mgr.can_process("example.com", RequestType::Html, Instant::now()).await);
    }

    #[tokio::test]
    async fn blocks_until_delay_elapses() {
        let mgr = manager();
        let t0 = Instant::now();
        mgr.record_access("example.com", RequestType::Html, t0).await;
        assert!(!mgr.can_process("example.com", RequestType::Html, t0 + Duration::from_millis(500)).await);
        assert!(mgr.can_process("example.com", RequestType::Html, t0 + Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn increase_delay_widens_by_1_2x_and_clamps() {
        let mgr = manager();
        mgr.set_delay("example.com", RequestType::Html, Duration::from_secs(9)).await;
        mgr.increase_delay("example.com", RequestType::Html).await;
        let delay = mgr.current_delay("example.com", RequestType::Html).await;
        assert_eq!(delay, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn decrease_delay_narrows_by_0_9x_and_clamps() {
        let mgr = manager();
        mgr.set_delay("example.com", RequestType::Html, Duration::from_millis(105)).await;
        mgr.decrease_delay("example.com", RequestType::Html).await;
        let delay = mgr.current_delay("example.com", RequestType::Html).await;
        assert_eq!(delay, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn set_delay_clamps_to_bounds() {
        let mgr = manager();
        mgr.set_delay("example.com", RequestType::Html, Duration::from_secs(999)).await;
        assert_eq!(mgr.current_delay("example.com", RequestType::Html).await, Duration::from_secs(10));

        mgr.set_delay("example.com", RequestType::Html, Duration::from_millis(1)).await;
        assert_eq!(mgr.current_delay("example.com", RequestType::Html).await, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn request_types_track_independent_state() {
        let mgr = manager();
        mgr.set_delay("example.com", RequestType::Html, Duration::from_secs(5)).await;
        let pdf_delay = mgr.current_delay("example.com", RequestType::Pdf).await;
        assert_eq!(pdf_delay, DelayBounds::default().default_delay);
    }

    #[tokio::test]
    async fn concurrency_permits_are_capped_per_domain() {
        let mgr = manager();
        let p1 = mgr.try_acquire_concurrency_permit("example.com").await;
        let p2 = mgr.try_acquire_concurrency_permit("example.com").await;
        let p3 = mgr.try_acquire_concurrency_permit("example.com").await;
        assert!(p1.is_some());
        assert!(p2.is_some());
        assert!(p3.is_none());
        drop(p1);
        let p4 = mgr.try_acquire_concurrency_permit("example.com").await;
        assert!(p4.is_some());
    }

    #[tokio::test]
    async fn different_domains_have_independent_permits() {
        let mgr = manager();
        let _a1 = mgr.try_acquire_concurrency_permit("a.com").await;
        let _a2 = mgr.try_acquire_concurrency_permit("a.com").await;
        let b1 = mgr.try_acquire_concurrency_permit("b.com").await;
        assert!(b1.is_some());
    }
}
