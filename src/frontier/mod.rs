//! URL Frontier: the priority-ordered, dedup-guaranteeing work queue that
//! feeds the worker pool.
//!
//! Keeps the source scheduler's `BinaryHeap`-of-`Ord`-wrapper idiom but
//! replaces its fixed "lowest value first" comparator with the full
//! priority-scoring formula, and splits dedup out into its own seen-set so
//! `enqueue` is a single cheap lookup instead of a heap scan.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

/// Inputs to the priority-scoring formula for one frontier request.
#[derive(Debug, Clone)]
pub struct ScoringInput {
    pub base_priority: i64,
    pub depth: u32,
    pub path: String,
    pub domain: String,
    pub high_priority_domains: Vec<String>,
    pub avg_download_ms: u64,
    pub error_rate: f64,
    pub last_event_is_error: bool,
    pub error_count: u32,
    pub queued_at: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

/// Computes a request's priority score per the frontier's scoring formula.
/// Higher scores dequeue first. The result is always at least 1.
pub fn score_priority(input: &ScoringInput) -> i64 {
    let mut score = input.base_priority;

    score -= (input.depth as i64) * 10;

    let path_lower = input.path.to_lowercase();
    if ["/article/", "/news/", "/blog/"].iter().any(|p| path_lower.contains(p)) {
        score += 10;
    } else if ["/category/", "/tag/"].iter().any(|p| path_lower.contains(p)) {
        score += 5;
    } else if [".pdf", ".doc", ".docx"].iter().any(|p| path_lower.ends_with(p)) {
        score += 8;
    }

    if input.high_priority_domains.iter().any(|d| d == &input.domain) {
        score += 15;
    }

    let speed_bonus = (1000i64.saturating_sub(input.avg_download_ms.min(1000) as i64)) / 100;
    score += speed_bonus;

    score -= (input.error_rate * 20.0) as i64;

    if input.last_event_is_error && input.error_count > 3 {
        score -= 5;
    }

    let waited_secs = (input.now - input.queued_at).num_seconds().max(0);
    score += waited_secs / 10;

    score.max(1)
}

/// Generates task IDs shaped `task_{machine}_{domain_with_underscores}_{ticks}_{counter}`.
pub struct TaskIdGenerator {
    machine: String,
    counter: AtomicU64,
}

impl TaskIdGenerator {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn next(&self, domain: &str, now: DateTime<Utc>) -> String {
        let counter = self.counter.fetch_add(1, AtomicOrdering::Relaxed);
        let domain_part = domain.replace('.', "_");
        format!("task_{}_{}_{}_{}", self.machine, domain_part, now.timestamp_nanos_opt().unwrap_or(0), counter)
    }
}

#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub task_id: String,
    pub url: String,
    pub domain: String,
    pub depth: u32,
    pub priority: i64,
    pub queued_at: DateTime<Utc>,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}
impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority-ordered work queue with concurrent-safe dedup.
///
/// `enqueue` rejects a URL it has already seen (by its normalized-for-frontier
/// form); `try_dequeue` pops the highest-scoring entry still in the heap.
pub struct Frontier {
    seen: Mutex<HashSet<String>>,
    heap: Mutex<BinaryHeap<FrontierEntry>>,
    task_ids: TaskIdGenerator,
}

impl Frontier {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
            heap: Mutex::new(BinaryHeap::new()),
            task_ids: TaskIdGenerator::new(machine),
        }
    }

    /// Enqueues `normalized_url` if it hasn't been seen before. Returns
    /// `false` without inserting if it's a duplicate.
    pub fn enqueue(&self, normalized_url: &str, domain: &str, depth: u32, priority: i64, now: DateTime<Utc>) -> bool {
        let mut seen = self.seen.lock().expect("frontier seen-set poisoned");
        if !seen.insert(normalized_url.to_string()) {
            return false;
        }
        drop(seen);

        let task_id = self.task_ids.next(domain, now);
        let mut heap = self.heap.lock().expect("frontier heap poisoned");
        heap.push(FrontierEntry {
            task_id,
            url: normalized_url.to_string(),
            domain: domain.to_string(),
            depth,
            priority,
            queued_at: now,
        });
        true
    }

    /// Pops the highest-priority entry, or `None` if the frontier is empty.
    /// A dequeued entry's score is not recomputed or decayed afterward.
    pub fn try_dequeue(&self) -> Option<FrontierEntry> {
        self.heap.lock().expect("frontier heap poisoned").pop()
    }

    pub fn len(&self) -> usize {
        self.heap.lock().expect("frontier heap poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_seen(&self, normalized_url: &str) -> bool {
        self.seen.lock().expect("frontier seen-set poisoned").contains(normalized_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> ScoringInput {
        ScoringInput {
            base_priority: 50,
            depth: 0,
            path: "/".to_string(),
            domain: "example.com".to_string(),
            high_priority_domains: vec![],
            avg_download_ms: 0,
            error_rate: 0.0,
            last_event_is_error: false,
            error_count: 0,
            queued_at: Utc::now(),
            now: Utc::now(),
        }
    }

    #[test]
    fn depth_penalty_subtracts_ten_per_level() {
        let mut input = base_input();
        input.depth = 2;
        let score = score_priority(&input);
        assert_eq!(score, 50 - 20 + 10);
    }

    #[test]
    fn article_path_gets_highest_content_bonus() {
        let mut input = base_input();
        input.path = "/article/my-story".to_string();
        let score = score_priority(&input);
        assert_eq!(score, 50 + 10 + 10);
    }

    #[test]
    fn category_path_gets_medium_bonus() {
        let mut input = base_input();
        input.path = "/category/tech".to_string();
        let score = score_priority(&input);
        assert_eq!(score, 50 + 5 + 10);
    }

    #[test]
    fn pdf_path_gets_document_bonus() {
        let mut input = base_input();
        input.path = "/files/report.pdf".to_string();
        let score = score_priority(&input);
        assert_eq!(score, 50 + 8 + 10);
    }

    #[test]
    fn high_priority_domain_adds_fifteen() {
        let mut input = base_input();
        input.high_priority_domains = vec!["example.com".to_string()];
        let score = score_priority(&input);
        assert_eq!(score, 50 + 15 + 10);
    }

    #[test]
    fn error_penalty_and_recent_error_stack() {
        let mut input = base_input();
        input.error_rate = 0.5;
        input.last_event_is_error = true;
        input.error_count = 4;
        let score = score_priority(&input);
        assert_eq!(score, 50 - 10 - 5 + 10);
    }

    #[test]
    fn anti_starvation_grows_with_wait_time() {
        let mut input = base_input();
        input.queued_at = Utc::now() - chrono::Duration::seconds(95);
        let score = score_priority(&input);
        assert_eq!(score, 50 + 9 + 10);
    }

    #[test]
    fn score_is_clamped_to_at_least_one() {
        let mut input = base_input();
        input.base_priority = 0;
        input.depth = 50;
        let score = score_priority(&input);
        assert_eq!(score, 1);
    }

    #[test]
    fn task_id_has_expected_shape() {
        let gen = TaskIdGenerator::new("worker-1");
        let id = gen.next("sub.example.com", Utc::now());
        assert!(id.starts_with("task_worker-1_sub_example_com_"));
    }

    #[test]
    fn task_id_counter_increments() {
        let gen = TaskIdGenerator::new("worker-1");
        let now = Utc::now();
        let a = gen.next("example.com", now);
        let b = gen.next("example.com", now);
        assert_ne!(a, b);
    }

    #[test]
    fn enqueue_rejects_duplicates() {
        let frontier = Frontier::new("worker-1");
        let now = Utc::now();
        assert!(frontier.enqueue("https://example.com/a", "example.com", 0, 10, now));
        assert!(!frontier.enqueue("https://example.com/a", "example.com", 0, 10, now));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn dequeue_returns_highest_priority_first() {
        let frontier = Frontier::new("worker-1");
        let now = Utc::now();
        frontier.enqueue("https://example.com/low", "example.com", 0, 5, now);
        frontier.enqueue("https://example.com/high", "example.com", 0, 50, now);
        let first = frontier.try_dequeue().unwrap();
        assert_eq!(first.url, "https://example.com/high");
    }

    #[test]
    fn dequeue_on_empty_frontier_returns_none() {
        let frontier = Frontier::new("worker-1");
        assert!(frontier.try_dequeue().is_none());
    }
}
