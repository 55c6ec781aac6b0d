//! Configuration for scopecrawl

mod crawl;
mod logging;

pub use crawl::{CrawlConfig, DedupConfig, FetchConfig, PolitenessConfig, ReportConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default user agent for all HTTP requests (page fetches and robots.txt)
pub const DEFAULT_USER_AGENT: &str = "ScopeCrawlBot/0.1 (+https://github.com/scopecrawl)";

/// Main configuration for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Crawl scope and frontier configuration
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Politeness (robots.txt) configuration
    #[serde(default)]
    pub politeness: PolitenessConfig,
    /// HTTP fetch configuration
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Near-duplicate detection configuration
    #[serde(default)]
    pub dedup: DedupConfig,
    /// Run report configuration
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            politeness: PolitenessConfig::default(),
            fetch: FetchConfig::default(),
            dedup: DedupConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Crawl scope validation
        if self.crawl.seed_urls.is_empty() {
            errors.push("at least one seed URL is required".to_string());
        }
        for seed in &self.crawl.seed_urls {
            if Url::parse(seed).is_err() {
                errors.push(format!("seed URL '{}' is not a valid URL", seed));
            }
        }
        if self.crawl.allowed_domains.is_empty() {
            errors.push("at least one allowed domain suffix is required".to_string());
        }
        if self.crawl.worker_count == 0 {
            errors.push("worker_count must be positive".to_string());
        }
        if self.crawl.depth_alert == 0 {
            errors.push("depth_alert must be positive".to_string());
        }
        if self.crawl.data_dir.as_os_str().is_empty() {
            errors.push("data_dir must not be empty".to_string());
        }
        if self.crawl.idle_poll_ms == 0 {
            errors.push("idle_poll_ms must be positive".to_string());
        }

        // Dedup validation
        if self.dedup.distance_threshold > 64 {
            errors.push("dedup distance_threshold must be <= 64".to_string());
        }

        // Fetch validation
        if self.fetch.timeout_secs == 0 {
            errors.push("fetch timeout_secs must be positive".to_string());
        }
        if self.fetch.max_content_size == 0 {
            errors.push("fetch max_content_size must be positive".to_string());
        }

        // Politeness validation
        if self.politeness.cache_size == 0 {
            errors.push("politeness cache_size must be positive".to_string());
        }
        if self.politeness.user_agent.is_empty() {
            errors.push("politeness user_agent must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
