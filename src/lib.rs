//! scopecrawl: a scoped, crash-resumable web crawler
//!
//! The crawl is driven by a persistent URL frontier that guarantees each
//! canonical URL is processed at most once across restarts. Workers fetch
//! pages concurrently under per-origin robots.txt rules, drop near-duplicate
//! content via 64-bit text fingerprints, and keep discovery within the
//! configured domain suffixes and depth bound. A plain-text report
//! summarizes the run.

pub mod config;
pub mod crawl;
pub mod report;

pub use config::Config;
pub use crawl::{CrawlStats, CrawlerPool};
