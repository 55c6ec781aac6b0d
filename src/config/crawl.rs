//! Crawl scope, politeness, fetch, dedup, and report configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::DEFAULT_USER_AGENT;

/// Crawl scope and frontier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Seed URLs added at depth 0 on a fresh start
    pub seed_urls: Vec<String>,
    /// Domain suffixes a URL's host must match to be crawled
    pub allowed_domains: Vec<String>,
    /// Directory holding the persisted frontier store
    pub data_dir: PathBuf,
    /// Number of concurrent crawl workers
    pub worker_count: usize,
    /// Maximum discovery depth; URLs beyond this are never enqueued
    pub depth_alert: u32,
    /// How long an idle worker sleeps before polling the frontier again (milliseconds)
    pub idle_poll_ms: u64,
    /// How long a worker stays idle before retiring (seconds)
    pub max_idle_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_urls: vec!["https://www.ics.uci.edu".to_string()],
            allowed_domains: vec![
                ".ics.uci.edu".to_string(),
                ".cs.uci.edu".to_string(),
                ".informatics.uci.edu".to_string(),
                ".stat.uci.edu".to_string(),
            ],
            data_dir: PathBuf::from(".scopecrawl"),
            worker_count: 4,
            depth_alert: 5,
            idle_poll_ms: 500,
            max_idle_secs: 10,
        }
    }
}

/// Politeness (robots.txt) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolitenessConfig {
    /// User agent string presented to robots.txt evaluation
    pub user_agent: String,
    /// Maximum number of per-origin robots directives to cache
    pub cache_size: usize,
    /// Timeout for robots.txt fetches (seconds)
    pub request_timeout_secs: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_size: 10_000,
            request_timeout_secs: 10,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent string for page fetches
    pub user_agent: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_content_size: 10 * 1024 * 1024,
            max_redirects: 10,
        }
    }
}

/// Near-duplicate detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Maximum Hamming distance (exclusive) for two fingerprints to count
    /// as near-duplicates, out of 64 bits
    pub distance_threshold: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 5,
        }
    }
}

/// Run report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Where to write the plain-text report
    pub output_path: PathBuf,
    /// How many top tokens to include
    pub top_words: usize,
    /// Domain suffix whose subdomains are counted individually.
    /// Falls back to the first allowed domain when empty.
    pub subdomain_suffix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("report.txt"),
            top_words: 50,
            subdomain_suffix: String::new(),
        }
    }
}
