//! Ripcrawl: a polite, concurrent web crawler framework.
//!
//! Coordinates a priority-aware URL frontier, per-domain adaptive delay,
//! proxy rotation, retry classification, anti-bot detection, and a worker
//! pool driving fetch -> parse -> discover -> enqueue under bounded
//! concurrency with pause/resume/stop lifecycle control.

pub mod antibot;
pub mod config;
pub mod delay;
pub mod engine;
pub mod frontier;
pub mod http_pool;
pub mod output;
pub mod proxy;
pub mod retry;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

pub use config::Config;
pub use retry::ErrorKind;
pub use state::{DomainState, PageState};
pub use url::{classify_domain, extract_domain, DomainClassification};

/// Top-level crate error, composed from each module's own error enum.
///
/// Mirrors the error-handling taxonomy: a single tagged value per failure
/// site rather than an inheritance hierarchy of exception subclasses.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error(transparent)]
    UrlParse(#[from] ::url::ParseError),

    #[error("robots.txt error: {0}")]
    Robots(#[from] RobotsError),

    #[error("fetch error ({kind:?}) for {url}: {message}")]
    Fetch {
        kind: ErrorKind,
        url: String,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: PageState, to: PageState },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine is {0}, operation not permitted")]
    InvalidEngineState(String),
}

pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Configuration-layer errors (load, parse, validate).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("invalid domain pattern: {0}")]
    InvalidPattern(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// URL parsing/normalization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("failed to parse URL: {0}")]
    Parse(String),

    #[error("unsupported scheme: {0}")]
    InvalidScheme(String),

    #[error("URL has no domain")]
    MissingDomain,

    #[error("malformed URL: {0}")]
    Malformed(String),
}

pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Robots.txt fetch/parse errors.
///
/// Network failures and non-2xx responses resolve to a permissive
/// [`robots::ParsedRobots::allow_all`] rather than an error (a site with no
/// reachable robots.txt imposes no restrictions); this type only covers
/// caller-side misuse.
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),
}
