//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use crate::RobotsError;
use reqwest::Client;

/// Fetches and parses robots.txt for a domain via `https://{domain}/robots.txt`.
///
/// A non-2xx response, a fetch error, or a network failure all resolve to a
/// permissive [`ParsedRobots::allow_all`] rather than an error: a site with
/// no reachable robots.txt imposes no restrictions, it doesn't block the
/// crawl. Only a malformed `domain` is a hard error.
///
/// # Arguments
///
/// * `client` - HTTP client to use for the fetch
/// * `domain` - The domain to fetch robots.txt from
/// * `user_agent` - The user agent string to send with the request
pub async fn fetch_robots(client: &Client, domain: &str, user_agent: &str) -> Result<ParsedRobots, RobotsError> {
    if domain.trim().is_empty() {
        return Err(RobotsError::InvalidOrigin(domain.to_string()));
    }
    fetch_robots_from_origin(client, &format!("https://{domain}"), user_agent).await
}

/// Same as [`fetch_robots`] but takes a full origin (scheme + host, no
/// trailing slash) instead of assuming https. Split out so tests can point
/// it at a local mock server without TLS.
async fn fetch_robots_from_origin(client: &Client, origin: &str, user_agent: &str) -> Result<ParsedRobots, RobotsError> {
    let url = format!("{origin}/robots.txt");
    let response = match client.get(&url).header("User-Agent", user_agent).send().await {
        Ok(resp) => resp,
        Err(_) => return Ok(ParsedRobots::allow_all()),
    };

    if !response.status().is_success() {
        return Ok(ParsedRobots::allow_all());
    }

    match response.text().await {
        Ok(body) => Ok(ParsedRobots::from_content(&body)),
        Err(_) => Ok(ParsedRobots::allow_all()),
    }
}

/// Checks if a URL is allowed by robots.txt
///
/// # Arguments
///
/// * `robots` - The parsed robots.txt data
/// * `url` - The URL to check
/// * `user_agent` - The user agent string
///
/// # Returns
///
/// * `true` - If the URL is allowed
/// * `false` - If the URL is disallowed
pub fn is_allowed(robots: &ParsedRobots, url: &str, user_agent: &str) -> bool {
    robots.is_allowed(url, user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_parses_real_robots_txt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
            .mount(&server)
            .await;

        let client = Client::new();
        let robots = fetch_robots_from_origin(&client, &server.uri(), "TestBot").await.unwrap();
        assert!(!robots.is_allowed("/admin", "TestBot"));
        assert!(robots.is_allowed("/page", "TestBot"));
    }

    #[tokio::test]
    async fn missing_robots_txt_is_permissive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new();
        let robots = fetch_robots_from_origin(&client, &server.uri(), "TestBot").await.unwrap();
        assert!(robots.is_allowed("/anything", "TestBot"));
    }

    #[tokio::test]
    async fn unreachable_origin_is_permissive() {
        let client = Client::new();
        let robots = fetch_robots_from_origin(&client, "http://127.0.0.1:1", "TestBot").await.unwrap();
        assert!(robots.is_allowed("/anything", "TestBot"));
    }

    #[tokio::test]
    async fn rejects_empty_domain() {
        let client = Client::new();
        let result = fetch_robots(&client, "", "TestBot").await;
        assert!(matches!(result, Err(RobotsError::InvalidOrigin(_))));
    }
}
