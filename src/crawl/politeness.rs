//! Per-origin robots.txt cache
//!
//! Each origin's robots.txt is fetched at most a handful of times (once in
//! the common case), parsed into a directive, and kept for the lifetime of
//! the crawl. A failed fetch caches an allow-all directive so one
//! unreachable robots.txt neither blocks its origin nor triggers a refetch
//! storm.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use crate::config::PolitenessConfig;

/// Parsed robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct RobotsDirective {
    /// Disallow patterns applying to our user agent
    disallow_patterns: Vec<String>,
    /// Allow patterns applying to our user agent
    allow_patterns: Vec<String>,
    /// When this directive was fetched
    fetched_at: Instant,
}

impl RobotsDirective {
    /// Parse robots.txt content for the given user agent
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let (disallow_patterns, allow_patterns) = Self::parse_rules(content, user_agent);
        Self {
            disallow_patterns,
            allow_patterns,
            fetched_at: Instant::now(),
        }
    }

    /// Directive for origins whose robots.txt could not be fetched
    pub fn allow_all() -> Self {
        Self {
            disallow_patterns: Vec::new(),
            allow_patterns: Vec::new(),
            fetched_at: Instant::now(),
        }
    }

    /// Check whether a path is allowed. Longer match wins; ties allow.
    pub fn is_allowed(&self, path: &str) -> bool {
        let mut longest_allow = 0;
        for pattern in &self.allow_patterns {
            if Self::path_matches(path, pattern) {
                longest_allow = longest_allow.max(pattern.len());
            }
        }

        let mut longest_disallow = 0;
        for pattern in &self.disallow_patterns {
            if Self::path_matches(path, pattern) {
                longest_disallow = longest_disallow.max(pattern.len());
            }
        }

        longest_allow >= longest_disallow
    }

    /// Age of this directive
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Collect allow/disallow rules from the agent groups that apply to us.
    /// A group naming our agent specifically overrides wildcard rules.
    fn parse_rules(content: &str, user_agent: &str) -> (Vec<String>, Vec<String>) {
        let mut disallow = Vec::new();
        let mut allow = Vec::new();

        let ua_lower = user_agent.to_lowercase();
        let mut current_agent_applies = false;
        let mut found_specific_agent = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    let agent = value.to_lowercase();
                    if agent == "*" {
                        current_agent_applies = !found_specific_agent;
                    } else if ua_lower.contains(&agent) || agent.contains(&ua_lower) {
                        current_agent_applies = true;
                        found_specific_agent = true;
                        disallow.clear();
                        allow.clear();
                    } else {
                        current_agent_applies = false;
                    }
                }
                "disallow" if current_agent_applies => {
                    if !value.is_empty() {
                        disallow.push(value.to_string());
                    }
                }
                "allow" if current_agent_applies => {
                    if !value.is_empty() {
                        allow.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        (disallow, allow)
    }

    /// Check a path against a robots.txt pattern (`*` wildcard, `$` anchor)
    fn path_matches(path: &str, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }

        let (pattern, must_end_match) = match pattern.strip_suffix('$') {
            Some(stripped) => (stripped, true),
            None => (pattern, false),
        };

        if pattern.contains('*') {
            let parts: Vec<&str> = pattern.split('*').collect();
            let mut pos = 0;

            for (i, part) in parts.iter().enumerate() {
                if part.is_empty() {
                    continue;
                }

                if let Some(found_pos) = path[pos..].find(part) {
                    if i == 0 && found_pos != 0 {
                        return false;
                    }
                    pos += found_pos + part.len();
                } else {
                    return false;
                }
            }

            if must_end_match {
                return pos == path.len();
            }
            return true;
        }

        if must_end_match {
            return path == pattern;
        }

        path.starts_with(pattern)
    }
}

/// Cache of per-origin robots directives
pub struct RobotsCache {
    /// Directives keyed by ASCII origin ("https://host:port")
    cache: Mutex<LruCache<String, Arc<RobotsDirective>>>,
    /// HTTP client for robots.txt fetches
    http_client: reqwest::Client,
    config: PolitenessConfig,
}

impl RobotsCache {
    pub fn new(config: PolitenessConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let cache_capacity = NonZeroUsize::new(config.cache_size.max(1))
            .expect("cache_size.max(1) guarantees non-zero");

        Ok(Self {
            cache: Mutex::new(LruCache::new(cache_capacity)),
            http_client,
            config,
        })
    }

    /// Check whether the URL may be fetched under its origin's robots rules.
    ///
    /// The first call for an origin fetches and caches its robots.txt.
    /// Concurrent first calls may race a redundant fetch; robots fetches are
    /// idempotent so the last insert simply wins.
    pub async fn can_fetch(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();

        let cached = {
            let mut cache = self.cache.lock().await;
            cache.get(&origin).cloned()
        };

        let directive = match cached {
            Some(d) => {
                tracing::trace!("robots directive for {} cached {:?} ago", origin, d.age());
                d
            }
            None => self.fetch_and_cache(&origin).await,
        };

        directive.is_allowed(url.path())
    }

    /// Fetch, parse, and cache the directive for an origin
    async fn fetch_and_cache(&self, origin: &str) -> Arc<RobotsDirective> {
        let robots_url = format!("{}/robots.txt", origin);

        let directive = match self.fetch_robots(&robots_url).await {
            Ok(content) => RobotsDirective::parse(&content, &self.config.user_agent),
            Err(e) => {
                tracing::debug!("robots.txt fetch failed for {}: {}; allowing all", origin, e);
                RobotsDirective::allow_all()
            }
        };

        let directive = Arc::new(directive);
        let mut cache = self.cache.lock().await;
        cache.put(origin.to_string(), directive.clone());
        directive
    }

    async fn fetch_robots(&self, robots_url: &str) -> Result<String, reqwest::Error> {
        let response = self.http_client.get(robots_url).send().await?;

        if response.status().is_success() {
            response.text().await
        } else {
            // Non-200 robots.txt means no restrictions
            Ok(String::new())
        }
    }

    /// Number of origins with a cached directive
    pub async fn cached_origins(&self) -> usize {
        self.cache.lock().await.len()
    }
}
