//! Crawling subsystem
//!
//! The frontier hands URLs to a pool of workers; each worker fetches the
//! page, screens it against previously seen content, feeds the reporter,
//! and enqueues outlinks one depth level down once they pass the scope
//! filter and the origin's robots.txt.

pub mod dedup;
pub mod extractor;
pub mod fetcher;
pub mod frontier;
pub mod politeness;
pub mod url_filter;
pub mod worker;

pub use dedup::NearDuplicateDetector;
pub use fetcher::{FetchError, Fetcher, PageResponse};
pub use frontier::{Frontier, FrontierError};
pub use politeness::{RobotsCache, RobotsDirective};
pub use worker::{CrawlStats, CrawlerPool};
