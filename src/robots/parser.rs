//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's types, providing a simplified
/// interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// A ParsedRobots instance that can be used to check URL permissions
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL path to check (e.g., "/page.html")
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            // Empty content or explicit allow-all means allow all
            return true;
        }

        // Parse and check on-demand
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns the raw robots.txt content, empty for a permissive entry.
    /// Used to persist the cache entry; reload it with [`ParsedRobots::from_content`].
    pub fn raw_content(&self) -> &str {
        &self.content
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }
        parse_crawl_delay(&self.content, user_agent)
    }
}

/// A single `User-agent:` group and whatever `Crawl-delay:` it carries. The
/// `robotstxt` crate only exposes allow/disallow matching, not crawl delay,
/// so groups are parsed by hand following the same grouping rule robots.txt
/// itself uses: consecutive `User-agent:` lines join one group until the
/// first non-`User-agent` directive is seen.
struct RobotsGroup {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_groups(content: &str) -> Vec<RobotsGroup> {
    let mut groups = Vec::new();
    let mut current_agents: Vec<String> = Vec::new();
    let mut current_delay: Option<f64> = None;
    let mut directive_seen = false;

    for raw_line in content.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        if let Some(rest) = lower.strip_prefix("user-agent:") {
            if directive_seen {
                groups.push(RobotsGroup {
                    agents: std::mem::take(&mut current_agents),
                    crawl_delay: current_delay.take(),
                });
                directive_seen = false;
            }
            current_agents.push(rest.trim().to_string());
        } else if let Some(rest) = lower.strip_prefix("crawl-delay:") {
            if let Ok(value) = rest.trim().parse::<f64>() {
                current_delay = Some(value);
            }
            directive_seen = true;
        } else {
            directive_seen = true;
        }
    }

    if !current_agents.is_empty() {
        groups.push(RobotsGroup {
            agents: current_agents,
            crawl_delay: current_delay,
        });
    }

    groups
}

/// Looks up the crawl delay for `user_agent`, preferring a group naming it
/// specifically over the wildcard (`*`) group.
fn parse_crawl_delay(content: &str, user_agent: &str) -> Option<f64> {
    let groups = parse_groups(content);
    let user_agent_lower = user_agent.to_lowercase();

    for group in &groups {
        if group.agents.iter().any(|a| a != "*" && user_agent_lower.contains(a.as_str())) {
            if let Some(delay) = group.crawl_delay {
                return Some(delay);
            }
        }
    }

    for group in &groups {
        if group.agents.iter().any(|a| a == "*") {
            if let Some(delay) = group.crawl_delay {
                return Some(delay);
            }
        }
    }

    None
}
