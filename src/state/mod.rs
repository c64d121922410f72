//! State module for tracking crawl progress
//!
//! This module provides state management for pages and domains during the crawl process.
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual pages (discovered, queued, fetching, processed, etc.)
//! - `DomainState`: Tracks per-domain success/error accounting and robots.txt cache

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::DomainState;
pub use page_state::PageState;
