//! Engine: constructs and owns every collaborator, and drives the worker
//! pool through a `Stopped -> Running -> {Paused <-> Running} -> Stopping ->
//! Stopped` lifecycle.
//!
//! Everything lives here as a direct field -- no service locator, no
//! back-references between collaborators. A worker needing the delay
//! manager and the frontier just reaches through `Arc<Engine>` for both.

pub mod fetcher;
pub mod parser;

use crate::antibot::AntiBotSignal;
use crate::config::Config;
use crate::delay::{DelayBounds, DomainDelayManager, RequestType};
use crate::frontier::{score_priority, Frontier, ScoringInput};
use crate::http_pool::{HttpClientPool, HttpClientPoolConfig as PoolConfig};
use crate::output::traits::{CrawlError, CrawlSummary, OutputHandler, ProcessedPage};
use crate::output::SqliteOutputHandler;
use crate::proxy::{ProxyPool, RotationStrategy};
use crate::retry::{ErrorKind, RetryClassifier};
use crate::state::{DomainState, PageState};
use crate::storage::{SqliteStorage, Storage};
use crate::url::{classify_domain, extract_domain, DomainClassification, UrlFilter};
use crate::CrawlerError;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use url::Url as ParsedUrl;

/// Base score every freshly-discovered page starts from before the
/// frontier's depth/content/error adjustments are applied.
const BASE_PRIORITY: i64 = 50;
const EVENT_CHANNEL_CAPACITY: usize = 256;
const WORKER_IDLE_POLL: Duration = Duration::from_millis(200);

/// The engine's lifecycle state. Serializable so it can be written alongside
/// the crawl's on-disk resume state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Stopped,
    Running,
    Paused,
    Stopping,
}

/// Events broadcast to anyone watching the crawl via [`Engine::subscribe`].
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Started,
    Paused,
    Resumed,
    Stopping,
    Stopped,
    PageProcessed { url: String, status_code: u16 },
    PageFailed { url: String, state: PageState },
}

/// On-disk snapshot of engine progress, written on pause/stop so a later run
/// can resume instead of re-crawling from the seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    pub run_id: i64,
    pub status: EngineStatus,
    pub processed_count: u64,
}

pub struct Engine {
    config: Config,
    run_id: i64,
    storage: Arc<StdMutex<dyn Storage + Send>>,
    output: Arc<dyn OutputHandler + Send + Sync>,
    frontier: Frontier,
    delay_manager: DomainDelayManager,
    http_pool: Arc<HttpClientPool>,
    proxy_pool: ProxyPool,
    retry_classifier: RetryClassifier,
    url_filter: UrlFilter,
    domain_states: StdMutex<HashMap<String, DomainState>>,
    status: StdRwLock<EngineStatus>,
    pause_notify: Notify,
    events: broadcast::Sender<EngineEvent>,
    user_agent: String,
    idle_since: StdMutex<Option<Instant>>,
    processed_count: AtomicU64,
    worker_handles: AsyncMutex<Vec<JoinHandle<()>>>,
    janitor_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Builds every collaborator from `config`, opens (or creates) a run
    /// against `storage`, and seeds nothing yet -- call
    /// [`Engine::add_seed_urls`] once construction succeeds.
    pub fn new(config: Config, config_hash: &str, mut storage: SqliteStorage) -> Result<Self, CrawlerError> {
        let run_id = storage.create_run(config_hash)?;

        let domain_states = storage.load_domain_states()?;
        let proxy_records = storage.load_proxy_stats()?;

        let storage: Arc<StdMutex<dyn Storage + Send>> = Arc::new(StdMutex::new(storage));
        let output: Arc<dyn OutputHandler + Send + Sync> =
            Arc::new(SqliteOutputHandler::new(storage.clone(), run_id));

        let user_agent = format!(
            "{}/{} (+{}; {})",
            config.user_agent.crawler_name,
            config.user_agent.crawler_version,
            config.user_agent.contact_url,
            config.user_agent.contact_email,
        );

        let url_filter = UrlFilter::new(
            config.engine.allowed_domains.clone(),
            &config.engine.blocked_patterns,
        )
        .map_err(CrawlerError::Config)?;

        let delay_manager = DomainDelayManager::new(
            build_delay_bounds(&config.domain_delay),
            config.engine.max_concurrent_per_domain,
            build_delay_overrides(&config.domain_delay),
        );

        let http_pool = Arc::new(HttpClientPool::new(
            build_pool_config(&config.http_client_pool),
            user_agent.clone(),
        ));

        let proxy_urls = if config.proxy.enabled {
            config.proxy.proxy_urls.clone()
        } else {
            Vec::new()
        };
        let proxy_pool = ProxyPool::new(parse_rotation_strategy(&config.proxy.rotation_strategy), proxy_urls);
        for record in proxy_records {
            if !record.enabled {
                // Re-seed failure accounting so an already-disabled proxy
                // stays disabled across a resume rather than starting fresh.
                for _ in 0..record.fail_count {
                    proxy_pool.record_failure(&record.url);
                }
            }
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            run_id,
            storage,
            output,
            frontier: Frontier::new("engine"),
            delay_manager,
            http_pool,
            proxy_pool,
            retry_classifier: RetryClassifier::new(),
            url_filter,
            domain_states: StdMutex::new(domain_states),
            status: StdRwLock::new(EngineStatus::Stopped),
            pause_notify: Notify::new(),
            events,
            user_agent,
            idle_since: StdMutex::new(None),
            processed_count: AtomicU64::new(0),
            worker_handles: AsyncMutex::new(Vec::new()),
            janitor_handle: StdMutex::new(None),
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.read().expect("engine status lock poisoned")
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// Seeds the frontier from every configured quality domain's seed URLs,
    /// at depth 0 with the quality-domain priority bonus already baked in by
    /// [`score_priority`].
    pub fn add_seed_urls(&self) -> Result<(), CrawlerError> {
        for quality in &self.config.quality {
            for seed in &quality.seeds {
                self.enqueue_url(seed, 0, &quality.domain)?;
            }
        }
        Ok(())
    }

    /// Normalizes, classifies, filters, records, and enqueues one URL at
    /// `depth` relative to `quality_origin`. A no-op (not an error) if the
    /// URL is a duplicate, filtered out, or belongs to a terminal domain.
    fn enqueue_url(&self, raw_url: &str, depth: u32, quality_origin: &str) -> Result<(), CrawlerError> {
        let parsed = match ParsedUrl::parse(raw_url) {
            Ok(u) => u,
            Err(_) => return Ok(()),
        };
        if !self.url_filter.is_allowed(&parsed) {
            return Ok(());
        }

        let Some(domain) = extract_domain(&parsed) else {
            return Ok(());
        };

        let classification = classify_domain(&domain, &self.config);
        let normalized = crate::url::normalize_for_frontier(raw_url);

        match classification {
            DomainClassification::Blacklisted => {
                let mut storage = self.storage.lock().expect("storage lock poisoned");
                storage.record_blacklisted(&normalized, quality_origin, self.run_id)?;
                return Ok(());
            }
            DomainClassification::Stubbed => {
                let mut storage = self.storage.lock().expect("storage lock poisoned");
                storage.record_stubbed(&normalized, quality_origin, self.run_id)?;
                return Ok(());
            }
            DomainClassification::Quality | DomainClassification::Discovered => {}
        }

        if depth > self.config.engine.max_depth {
            self.output.record_page(&ProcessedPage {
                url: normalized.clone(),
                domain: domain.clone(),
                title: None,
                status_code: None,
                content_type: None,
                state: PageState::DepthExceeded,
                depths: vec![(quality_origin.to_string(), depth)],
            })?;
            return Ok(());
        }

        if self.frontier.has_seen(&normalized) {
            return Ok(());
        }

        self.output.record_page(&ProcessedPage {
            url: normalized.clone(),
            domain: domain.clone(),
            title: None,
            status_code: None,
            content_type: None,
            state: PageState::Queued,
            depths: vec![(quality_origin.to_string(), depth)],
        })?;

        let priority = self.score_for(&domain, depth, parsed.path(), Utc::now());
        self.frontier.enqueue(&normalized, &domain, depth, priority, Utc::now());
        Ok(())
    }

    fn score_for(&self, domain: &str, depth: u32, path: &str, now: chrono::DateTime<Utc>) -> i64 {
        let states = self.domain_states.lock().expect("domain state lock poisoned");
        let state = states.get(domain).cloned().unwrap_or_default();
        score_priority(&ScoringInput {
            base_priority: BASE_PRIORITY,
            depth,
            path: path.to_string(),
            domain: domain.to_string(),
            high_priority_domains: self.config.engine.high_priority_domains.clone(),
            avg_download_ms: state.avg_download_ms,
            error_rate: state.error_rate(),
            last_event_is_error: state.last_event_is_error,
            error_count: state.error_count,
            queued_at: now,
            now,
        })
    }

    /// Starts the worker pool and background client-pool janitor. `self`
    /// must be wrapped in an `Arc` so workers can hold their own clone.
    pub async fn start(self: &Arc<Self>) -> Result<(), CrawlerError> {
        {
            let mut status = self.status.write().expect("engine status lock poisoned");
            if *status != EngineStatus::Stopped {
                return Err(CrawlerError::InvalidEngineState(format!("{:?}", *status)));
            }
            *status = EngineStatus::Running;
        }
        self.emit(EngineEvent::Started);

        let janitor = crate::http_pool::spawn_janitor(self.http_pool.clone());
        *self.janitor_handle.lock().expect("janitor handle lock poisoned") = Some(janitor);

        let worker_count = self.config.engine.max_concurrent_tasks.max(1);
        let mut handles = self.worker_handles.lock().await;
        for _ in 0..worker_count {
            let engine = self.clone();
            handles.push(tokio::spawn(async move {
                engine.worker_loop().await;
            }));
        }
        Ok(())
    }

    pub fn pause(&self) -> Result<(), CrawlerError> {
        let mut status = self.status.write().expect("engine status lock poisoned");
        if *status != EngineStatus::Running {
            return Err(CrawlerError::InvalidEngineState(format!("{:?}", *status)));
        }
        *status = EngineStatus::Paused;
        drop(status);
        self.emit(EngineEvent::Paused);
        Ok(())
    }

    pub fn resume(&self) -> Result<(), CrawlerError> {
        let mut status = self.status.write().expect("engine status lock poisoned");
        if *status != EngineStatus::Paused {
            return Err(CrawlerError::InvalidEngineState(format!("{:?}", *status)));
        }
        *status = EngineStatus::Running;
        drop(status);
        self.pause_notify.notify_waiters();
        self.emit(EngineEvent::Resumed);
        Ok(())
    }

    /// Signals every worker to stop, waits for them to drain, and finalizes
    /// the run's storage record.
    pub async fn stop(&self) -> Result<(), CrawlerError> {
        {
            let mut status = self.status.write().expect("engine status lock poisoned");
            if *status == EngineStatus::Stopped {
                return Ok(());
            }
            *status = EngineStatus::Stopping;
        }
        self.pause_notify.notify_waiters();
        self.emit(EngineEvent::Stopping);

        let mut handles = self.worker_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        if let Some(janitor) = self.janitor_handle.lock().expect("janitor handle lock poisoned").take() {
            janitor.abort();
        }

        self.output.finalize(crate::storage::RunStatus::Completed)?;
        *self.status.write().expect("engine status lock poisoned") = EngineStatus::Stopped;
        self.emit(EngineEvent::Stopped);
        Ok(())
    }

    /// Convenience driver for CLI use: starts the engine, waits until the
    /// frontier drains and (if auto-stop is enabled) stays idle past the
    /// configured timeout, then stops and returns the run's summary.
    pub async fn run_to_completion(self: Arc<Self>) -> Result<CrawlSummary, CrawlerError> {
        self.start().await?;

        loop {
            tokio::time::sleep(WORKER_IDLE_POLL).await;
            if self.status() != EngineStatus::Running {
                continue;
            }
            if !self.frontier.is_empty() {
                *self.idle_since.lock().expect("idle marker lock poisoned") = None;
                continue;
            }
            if !self.config.engine.enable_auto_stop {
                continue;
            }
            let idle_for = {
                let mut idle_since = self.idle_since.lock().expect("idle marker lock poisoned");
                let now = Instant::now();
                let started = *idle_since.get_or_insert(now);
                now.duration_since(started)
            };
            if idle_for >= Duration::from_secs(self.config.engine.auto_stop_timeout_secs) {
                break;
            }
        }

        self.stop().await?;
        self.get_statistics()
    }

    pub fn get_statistics(&self) -> Result<CrawlSummary, CrawlerError> {
        let storage = self.storage.lock().expect("storage lock poisoned");
        crate::output::generate_summary(&*storage, self.run_id)
    }

    async fn worker_loop(self: Arc<Self>) {
        loop {
            match self.status() {
                EngineStatus::Stopping | EngineStatus::Stopped => return,
                EngineStatus::Paused => {
                    self.pause_notify.notified().await;
                    continue;
                }
                EngineStatus::Running => {}
            }

            if self.max_pages_reached() {
                tokio::time::sleep(WORKER_IDLE_POLL).await;
                continue;
            }

            let Some(entry) = self.frontier.try_dequeue() else {
                tokio::time::sleep(WORKER_IDLE_POLL).await;
                continue;
            };

            self.process_entry(entry).await;
        }
    }

    fn max_pages_reached(&self) -> bool {
        let max_pages = self.config.engine.max_pages;
        max_pages > 0 && self.processed_count.load(Ordering::Relaxed) >= max_pages
    }

    async fn process_entry(&self, entry: crate::frontier::FrontierEntry) {
        let domain = entry.domain.clone();

        if self.config.engine.respect_robots_txt {
            match self.robots_allowed(&domain, &entry.url).await {
                Ok(true) => {}
                Ok(false) => {
                    self.record_terminal(&entry.url, &domain, PageState::Blacklisted, None);
                    return;
                }
                Err(_) => {}
            }
        }

        let _domain_permit = self.delay_manager.acquire_concurrency_permit(&domain).await;
        loop {
            if self
                .delay_manager
                .can_process(&domain, RequestType::Html, Instant::now())
                .await
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.delay_manager.record_access(&domain, RequestType::Html, Instant::now()).await;

        let proxy_url = self.proxy_pool.next();
        let client = match self.http_pool.acquire(&domain, proxy_url.as_deref()).await {
            Ok(client) => client,
            Err(err) => {
                self.record_terminal(&entry.url, &domain, PageState::Failed, Some(err.to_string()));
                return;
            }
        };

        let Ok(url) = ParsedUrl::parse(&entry.url) else {
            self.record_terminal(&entry.url, &domain, PageState::Failed, Some("unparsable URL".to_string()));
            return;
        };

        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0u32;
        loop {
            let fetch_started = Instant::now();
            let outcome = fetcher::fetch(&client, &url, &self.user_agent, None).await;

            match outcome {
                fetcher::FetchOutcome::Success {
                    final_url,
                    status_code,
                    content_type,
                    body,
                } => {
                    let download_ms = fetch_started.elapsed().as_millis() as u64;
                    self.delay_manager.decrease_delay(&domain, RequestType::Html).await;
                    if let Some(proxy) = &proxy_url {
                        self.proxy_pool.record_success(proxy);
                    }
                    self.handle_success(&entry, &final_url, status_code, &content_type, &body, download_ms);
                    return;
                }
                other => {
                    let kind = classify_outcome(&other);
                    let retry_after = outcome_retry_after(&other);
                    if self.retry_classifier.should_retry(kind, attempt, max_retries, false) {
                        if let Some(proxy) = &proxy_url {
                            self.proxy_pool.record_failure(proxy);
                        }
                        let delay = self.retry_classifier.delay_for(kind, attempt, retry_after);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    self.delay_manager.increase_delay(&domain, RequestType::Html).await;
                    if let Some(proxy) = &proxy_url {
                        self.proxy_pool.record_failure(proxy);
                    }
                    self.handle_failure(&entry, &domain, &other);
                    return;
                }
            }
        }
    }

    async fn robots_allowed(&self, domain: &str, url: &str) -> Result<bool, CrawlerError> {
        let needs_refresh = {
            let states = self.domain_states.lock().expect("domain state lock poisoned");
            states.get(domain).map(|s| s.needs_robots_refresh()).unwrap_or(true)
        };

        if needs_refresh {
            let client = self
                .http_pool
                .acquire(domain, self.proxy_pool.next().as_deref())
                .await
                .map_err(|e| CrawlerError::Fetch {
                    kind: ErrorKind::Network,
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            let robots = crate::robots::fetch_robots(&client, domain, &self.user_agent).await?;
            let mut states = self.domain_states.lock().expect("domain state lock poisoned");
            states.entry(domain.to_string()).or_default().update_robots(robots);
        }

        let states = self.domain_states.lock().expect("domain state lock poisoned");
        let allowed = states
            .get(domain)
            .and_then(|s| s.robots.as_ref())
            .map(|cached| cached.is_allowed(url, &self.user_agent))
            .unwrap_or(true);
        Ok(allowed)
    }

    fn handle_success(
        &self,
        entry: &crate::frontier::FrontierEntry,
        final_url: &ParsedUrl,
        status_code: u16,
        content_type: &str,
        body: &str,
        download_ms: u64,
    ) {
        let kind = parser::ContentKind::classify(content_type);
        let parsed = parser::parse_content(kind, body, final_url);

        {
            let mut states = self.domain_states.lock().expect("domain state lock poisoned");
            states.entry(entry.domain.clone()).or_default().record_success(download_ms);
        }

        let _ = self.output.record_page(&ProcessedPage {
            url: entry.url.clone(),
            domain: entry.domain.clone(),
            title: parsed.title.clone(),
            status_code: Some(status_code),
            content_type: Some(content_type.to_string()),
            state: PageState::Processed,
            depths: Vec::new(),
        });

        self.processed_count.fetch_add(1, Ordering::Relaxed);
        self.emit(EngineEvent::PageProcessed {
            url: entry.url.clone(),
            status_code,
        });

        for link in &parsed.links {
            let _ = self.enqueue_url(link, entry.depth + 1, &entry.domain);
            let _ = self.output.record_link(&entry.url, link);
        }
    }

    fn handle_failure(&self, entry: &crate::frontier::FrontierEntry, domain: &str, outcome: &fetcher::FetchOutcome) {
        let state = page_state_for_failure(outcome);
        let message = failure_message(outcome);

        {
            let mut states = self.domain_states.lock().expect("domain state lock poisoned");
            states.entry(domain.to_string()).or_default().record_error();
        }

        let _ = self.output.record_error(&CrawlError {
            url: entry.url.clone(),
            state,
            message: message.clone(),
            retry_count: 0,
        });

        self.emit(EngineEvent::PageFailed {
            url: entry.url.clone(),
            state,
        });
    }

    fn record_terminal(&self, url: &str, domain: &str, state: PageState, message: Option<String>) {
        let _ = self.output.record_page(&ProcessedPage {
            url: url.to_string(),
            domain: domain.to_string(),
            title: None,
            status_code: None,
            content_type: None,
            state,
            depths: Vec::new(),
        });
        if let Some(message) = message {
            let _ = self.output.record_error(&CrawlError {
                url: url.to_string(),
                state,
                message,
                retry_count: 0,
            });
        }
    }
}

fn classify_outcome(outcome: &fetcher::FetchOutcome) -> ErrorKind {
    match outcome {
        fetcher::FetchOutcome::Success { .. } => ErrorKind::Other,
        fetcher::FetchOutcome::AntiBot { .. } => ErrorKind::AntiBot,
        fetcher::FetchOutcome::HttpError { status_code, .. } if *status_code >= 500 => ErrorKind::Network,
        fetcher::FetchOutcome::HttpError { .. } => ErrorKind::Other,
        fetcher::FetchOutcome::Network(_) => ErrorKind::Network,
        fetcher::FetchOutcome::Timeout => ErrorKind::Timeout,
        fetcher::FetchOutcome::TooManyRedirects | fetcher::FetchOutcome::RedirectLoop => ErrorKind::Other,
    }
}

fn outcome_retry_after(outcome: &fetcher::FetchOutcome) -> Option<Duration> {
    match outcome {
        fetcher::FetchOutcome::HttpError { retry_after, .. } => *retry_after,
        fetcher::FetchOutcome::AntiBot { retry_after, .. } => *retry_after,
        _ => None,
    }
}

fn page_state_for_failure(outcome: &fetcher::FetchOutcome) -> PageState {
    match outcome {
        fetcher::FetchOutcome::HttpError { status_code, .. } => match status_code {
            404 | 410 => PageState::DeadLink,
            429 => PageState::RateLimited,
            _ => PageState::Failed,
        },
        fetcher::FetchOutcome::AntiBot { signal, .. } => match signal {
            AntiBotSignal::RateLimit => PageState::RateLimited,
            _ => PageState::Failed,
        },
        fetcher::FetchOutcome::Network(_) | fetcher::FetchOutcome::Timeout => PageState::Unreachable,
        fetcher::FetchOutcome::TooManyRedirects | fetcher::FetchOutcome::RedirectLoop => PageState::Failed,
        fetcher::FetchOutcome::Success { .. } => PageState::Processed,
    }
}

fn failure_message(outcome: &fetcher::FetchOutcome) -> String {
    match outcome {
        fetcher::FetchOutcome::HttpError { status_code, .. } => format!("HTTP {status_code}"),
        fetcher::FetchOutcome::AntiBot { signal, status_code, .. } => {
            format!("anti-bot signal {signal:?} (HTTP {status_code})")
        }
        fetcher::FetchOutcome::Network(message) => message.clone(),
        fetcher::FetchOutcome::Timeout => "request timed out".to_string(),
        fetcher::FetchOutcome::TooManyRedirects => "too many redirects".to_string(),
        fetcher::FetchOutcome::RedirectLoop => "redirect loop detected".to_string(),
        fetcher::FetchOutcome::Success { .. } => String::new(),
    }
}

fn build_delay_bounds(cfg: &crate::config::DomainDelayConfig) -> DelayBounds {
    DelayBounds {
        default_delay: Duration::from_millis(cfg.default_delay_ms),
        min_delay: Duration::from_millis(cfg.min_delay_ms),
        max_delay: Duration::from_millis(cfg.max_delay_ms),
    }
}

fn build_delay_overrides(cfg: &crate::config::DomainDelayConfig) -> HashMap<RequestType, Duration> {
    cfg.request_type_delays_ms
        .iter()
        .map(|(k, v)| (parse_request_type(k), Duration::from_millis(*v)))
        .collect()
}

fn build_pool_config(cfg: &crate::config::HttpClientPoolConfig) -> PoolConfig {
    PoolConfig {
        max_clients: cfg.max_clients,
        max_clients_per_domain: cfg.max_clients_per_domain,
        max_client_lifetime: Duration::from_secs(cfg.max_client_lifetime_secs),
        max_idle_time: Duration::from_secs(cfg.max_idle_time_secs),
        enable_domain_isolation: cfg.enable_domain_isolation,
        cleanup_interval: Duration::from_secs(cfg.cleanup_interval_secs),
    }
}

fn parse_request_type(label: &str) -> RequestType {
    match label.to_ascii_lowercase().as_str() {
        "html" => RequestType::Html,
        "pdf" => RequestType::Pdf,
        "image" => RequestType::Image,
        "api" => RequestType::Api,
        _ => RequestType::Default,
    }
}

fn parse_rotation_strategy(label: &str) -> RotationStrategy {
    match label.to_ascii_lowercase().as_str() {
        "random" => RotationStrategy::Random,
        "by-success-rate" => RotationStrategy::BySuccessRate,
        "by-usage" => RotationStrategy::ByUsage,
        _ => RotationStrategy::RoundRobin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DomainEntry, EngineConfig, OutputConfig, QualityEntry, UserAgentConfig};

    fn test_config() -> Config {
        Config {
            engine: EngineConfig::default(),
            user_agent: UserAgentConfig {
                crawler_name: "ripcrawl-test".to_string(),
                crawler_version: "0.1".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "crawler@example.com".to_string(),
            },
            output: OutputConfig {
                database_path: ":memory:".to_string(),
                summary_path: "./summary.md".to_string(),
            },
            retry: Default::default(),
            proxy: Default::default(),
            http_client_pool: Default::default(),
            domain_delay: Default::default(),
            quality: vec![QualityEntry {
                domain: "example.com".to_string(),
                seeds: vec!["https://example.com/".to_string()],
            }],
            blacklist: vec![DomainEntry {
                domain: "bad.com".to_string(),
            }],
            stub: vec![],
        }
    }

    fn test_engine() -> Engine {
        let storage = SqliteStorage::new_in_memory().unwrap();
        Engine::new(test_config(), "test-hash", storage).unwrap()
    }

    #[test]
    fn new_engine_starts_stopped() {
        let engine = test_engine();
        assert_eq!(engine.status(), EngineStatus::Stopped);
    }

    #[test]
    fn add_seed_urls_populates_frontier() {
        let engine = test_engine();
        engine.add_seed_urls().unwrap();
        assert_eq!(engine.frontier.len(), 1);
    }

    #[test]
    fn blacklisted_seed_is_recorded_not_queued() {
        let mut config = test_config();
        config.quality.push(QualityEntry {
            domain: "bad.com".to_string(),
            seeds: vec!["https://bad.com/".to_string()],
        });
        let storage = SqliteStorage::new_in_memory().unwrap();
        let engine = Engine::new(config, "test-hash", storage).unwrap();
        engine.add_seed_urls().unwrap();
        assert_eq!(engine.frontier.len(), 1);
    }

    #[test]
    fn pause_requires_running_state() {
        let engine = test_engine();
        assert!(engine.pause().is_err());
    }

    #[test]
    fn resume_requires_paused_state() {
        let engine = test_engine();
        assert!(engine.resume().is_err());
    }

    #[test]
    fn request_type_parsing_falls_back_to_default() {
        assert_eq!(parse_request_type("html"), RequestType::Html);
        assert_eq!(parse_request_type("unknown"), RequestType::Default);
    }

    #[test]
    fn rotation_strategy_parsing_falls_back_to_round_robin() {
        assert_eq!(parse_rotation_strategy("random"), RotationStrategy::Random);
        assert_eq!(parse_rotation_strategy("nonsense"), RotationStrategy::RoundRobin);
    }

    #[tokio::test]
    async fn start_transitions_to_running_and_stop_returns_to_stopped() {
        let engine = Arc::new(test_engine());
        engine.add_seed_urls().unwrap();
        engine.start().await.unwrap();
        assert_eq!(engine.status(), EngineStatus::Running);
        engine.stop().await.unwrap();
        assert_eq!(engine.status(), EngineStatus::Stopped);
    }
}
