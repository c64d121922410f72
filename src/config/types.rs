use serde::Deserialize;
use std::collections::HashMap;

/// Top-level configuration, loaded from a kebab-case TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    pub output: OutputConfig,

    #[serde(default)]
    pub retry: RetryPolicyConfig,

    #[serde(default)]
    pub proxy: ProxySettingsConfig,

    #[serde(rename = "http-client-pool", default)]
    pub http_client_pool: HttpClientPoolConfig,

    #[serde(rename = "domain-delay", default)]
    pub domain_delay: DomainDelayConfig,

    /// Domains that should be fully crawled, seeded from these URLs.
    #[serde(default)]
    pub quality: Vec<QualityEntry>,

    /// Domains to record but never fetch.
    #[serde(default)]
    pub blacklist: Vec<DomainEntry>,

    /// Domains to note on discovery but never visit.
    #[serde(default)]
    pub stub: Vec<DomainEntry>,
}

fn default_max_concurrent_tasks() -> u32 {
    5
}
fn default_max_depth() -> u32 {
    3
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_auto_stop_timeout_secs() -> u64 {
    30
}
fn default_max_concurrent_per_domain() -> usize {
    2
}

/// Crawl-wide behavior: concurrency, depth/page limits, the URL Filter
/// surface, and the engine's auto-stop/anti-starvation knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(rename = "max-concurrent-tasks", default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,

    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// 0 means unlimited.
    #[serde(rename = "max-pages", default)]
    pub max_pages: u64,

    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(rename = "timeout-seconds", default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    #[serde(rename = "blocked-patterns", default)]
    pub blocked_patterns: Vec<String>,

    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots_txt: bool,

    #[serde(rename = "follow-redirects", default = "default_true")]
    pub follow_redirects: bool,

    #[serde(rename = "enable-anti-bot-detection", default = "default_true")]
    pub enable_anti_bot_detection: bool,

    /// Auto-stop requires BOTH this flag and the idle timeout below: an
    /// idle frontier alone never stops the engine unless the operator opted
    /// in here.
    #[serde(rename = "enable-auto-stop", default)]
    pub enable_auto_stop: bool,

    #[serde(rename = "auto-stop-timeout-secs", default = "default_auto_stop_timeout_secs")]
    pub auto_stop_timeout_secs: u64,

    #[serde(rename = "max-concurrent-per-domain", default = "default_max_concurrent_per_domain")]
    pub max_concurrent_per_domain: usize,

    /// Domains that earn the frontier's high-priority scoring bonus.
    #[serde(rename = "high-priority-domains", default)]
    pub high_priority_domains: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
            max_depth: default_max_depth(),
            max_pages: 0,
            request_delay_ms: default_request_delay_ms(),
            timeout_seconds: default_timeout_seconds(),
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            respect_robots_txt: true,
            follow_redirects: true,
            enable_anti_bot_detection: true,
            enable_auto_stop: false,
            auto_stop_timeout_secs: default_auto_stop_timeout_secs(),
            max_concurrent_per_domain: default_max_concurrent_per_domain(),
            high_priority_domains: Vec::new(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "database-path")]
    pub database_path: String,

    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    2000
}
fn default_backoff_multiplier() -> f64 {
    1.5
}
fn default_max_delay_ms() -> u64 {
    60_000
}

/// Retry Classifier tuning: how many attempts and how the backoff grows.
/// The per-`ErrorKind` base delays themselves are fixed (§7), this only
/// governs the shared multiplier/cap/attempt-count.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicyConfig {
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(rename = "initial-delay-ms", default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(rename = "backoff-multiplier", default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_rotation_strategy() -> String {
    "round-robin".to_string()
}

/// Proxy Pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettingsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(rename = "proxy-urls", default)]
    pub proxy_urls: Vec<String>,

    #[serde(rename = "rotation-strategy", default = "default_rotation_strategy")]
    pub rotation_strategy: String,
}

impl Default for ProxySettingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            proxy_urls: Vec::new(),
            rotation_strategy: default_rotation_strategy(),
        }
    }
}

fn default_max_clients() -> usize {
    50
}
fn default_max_clients_per_domain() -> usize {
    4
}
fn default_max_client_lifetime_secs() -> u64 {
    600
}
fn default_max_idle_time_secs() -> u64 {
    90
}
fn default_cleanup_interval_secs() -> u64 {
    60
}

/// HTTP Client Pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientPoolConfig {
    #[serde(rename = "max-clients", default = "default_max_clients")]
    pub max_clients: usize,

    #[serde(rename = "max-clients-per-domain", default = "default_max_clients_per_domain")]
    pub max_clients_per_domain: usize,

    #[serde(rename = "max-client-lifetime-secs", default = "default_max_client_lifetime_secs")]
    pub max_client_lifetime_secs: u64,

    #[serde(rename = "max-idle-time-secs", default = "default_max_idle_time_secs")]
    pub max_idle_time_secs: u64,

    #[serde(rename = "enable-domain-isolation", default = "default_true")]
    pub enable_domain_isolation: bool,

    #[serde(rename = "cleanup-interval-secs", default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for HttpClientPoolConfig {
    fn default() -> Self {
        Self {
            max_clients: default_max_clients(),
            max_clients_per_domain: default_max_clients_per_domain(),
            max_client_lifetime_secs: default_max_client_lifetime_secs(),
            max_idle_time_secs: default_max_idle_time_secs(),
            enable_domain_isolation: true,
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_domain_default_delay_ms() -> u64 {
    1000
}
fn default_domain_min_delay_ms() -> u64 {
    100
}
fn default_domain_max_delay_ms() -> u64 {
    10_000
}

/// Domain Delay Manager configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainDelayConfig {
    #[serde(rename = "default-delay-ms", default = "default_domain_default_delay_ms")]
    pub default_delay_ms: u64,

    #[serde(rename = "min-delay-ms", default = "default_domain_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_domain_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-request-type delay overrides, keyed by "html"/"pdf"/"image"/"api".
    #[serde(rename = "request-type-delays-ms", default)]
    pub request_type_delays_ms: HashMap<String, u64>,
}

impl Default for DomainDelayConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: default_domain_default_delay_ms(),
            min_delay_ms: default_domain_min_delay_ms(),
            max_delay_ms: default_domain_max_delay_ms(),
            request_type_delays_ms: HashMap::new(),
        }
    }
}

/// Quality domain entry with seed URLs
#[derive(Debug, Clone, Deserialize)]
pub struct QualityEntry {
    pub domain: String,
    pub seeds: Vec<String>,
}

/// Simple domain entry for blacklist and stub lists
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    pub domain: String,
}
