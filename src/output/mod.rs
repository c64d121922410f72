//! Output module for generating crawl summaries and reports
//!
//! This module handles:
//! - Generating markdown summaries of crawl results
//! - Exporting data in various formats
//! - Recording crawl statistics and metrics

mod markdown;
mod sqlite_output;
mod stats;
pub mod traits;

pub use markdown::generate_markdown_summary;
pub use sqlite_output::SqliteOutputHandler;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlError, CrawlSummary, OutputError, OutputHandler, OutputResult, ProcessedPage};

use crate::state::PageState;
use crate::storage::Storage;
use crate::CrawlerError;

/// Generates a crawl summary directly from a storage handle.
///
/// This mirrors [`SqliteOutputHandler::generate_summary`] but operates on a
/// borrowed `&dyn Storage` rather than an `Arc<Mutex<dyn Storage>>`, for
/// callers (such as `--stats`/`--export-summary`) that already hold a run's
/// storage without needing the handler's recording side.
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `run_id` - The run to summarize
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Successfully generated summary
/// * `Err(CrawlerError)` - Failed to generate summary
pub fn generate_summary(storage: &dyn Storage, run_id: i64) -> Result<CrawlSummary, CrawlerError> {
    let run = storage.get_run(run_id)?;

    let mut summary = CrawlSummary::new();
    summary.run_id = run.id;
    summary.started_at = run.started_at;
    summary.finished_at = run.finished_at;
    summary.status = run.status.to_db_string().to_string();
    summary.config_hash = run.config_hash;

    summary.total_pages = storage.count_total_pages()?;
    summary.unique_domains = storage.count_unique_domains()?;
    summary.total_links = storage.count_links()?;

    summary.pages_discovered = storage.count_pages_by_state(PageState::Discovered)?;
    summary.pages_queued = storage.count_pages_by_state(PageState::Queued)?;
    summary.pages_processed = storage.count_pages_by_state(PageState::Processed)?;
    summary.pages_blacklisted = storage.count_pages_by_state(PageState::Blacklisted)?;
    summary.pages_stubbed = storage.count_pages_by_state(PageState::Stubbed)?;
    summary.pages_dead_link = storage.count_pages_by_state(PageState::DeadLink)?;
    summary.pages_unreachable = storage.count_pages_by_state(PageState::Unreachable)?;
    summary.pages_rate_limited = storage.count_pages_by_state(PageState::RateLimited)?;
    summary.pages_failed = storage.count_pages_by_state(PageState::Failed)?;
    summary.pages_depth_exceeded = storage.count_pages_by_state(PageState::DepthExceeded)?;
    summary.pages_request_limit_hit = storage.count_pages_by_state(PageState::RequestLimitHit)?;
    summary.pages_content_mismatch = storage.count_pages_by_state(PageState::ContentMismatch)?;

    summary.error_summary = storage.get_error_summary()?;
    summary.total_errors = summary.error_summary.values().sum();

    summary.top_blacklisted = storage.get_blacklisted_urls()?;
    summary.top_stubbed = storage.get_stubbed_urls()?;
    summary.rate_limited_domains = storage.get_rate_limited_domains()?;
    summary.depth_breakdown = storage
        .get_depth_breakdown()?
        .into_iter()
        .map(|(depth, count)| (depth, count as u64))
        .collect();
    summary.discovered_domains = storage.get_discovered_domains()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_generate_summary_from_fresh_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();

        let summary = generate_summary(&storage, run_id).unwrap();

        assert_eq!(summary.run_id, run_id);
        assert_eq!(summary.config_hash, "test_hash");
        assert_eq!(summary.total_pages, 0);
    }

    #[test]
    fn test_generate_summary_counts_pages() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/", "example.com", run_id)
            .unwrap();
        storage
            .update_page_state(page_id, PageState::Processed, None, Some(200), None, None)
            .unwrap();

        let summary = generate_summary(&storage, run_id).unwrap();

        assert_eq!(summary.total_pages, 1);
        assert_eq!(summary.pages_processed, 1);
    }
}
