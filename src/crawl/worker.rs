//! Crawl worker pool
//!
//! Workers share one frontier, robots cache, duplicate detector, fetcher,
//! and reporter through an `Arc<CrawlContext>`. Each worker loops popping
//! URLs; an empty frontier is polled with backoff until either new work
//! appears or the idle limit retires the worker. The run ends when every
//! worker has retired or a stop is requested.

use anyhow::Context as _;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::crawl::dedup::{fingerprint, NearDuplicateDetector};
use crate::crawl::extractor;
use crate::crawl::fetcher::Fetcher;
use crate::crawl::frontier::Frontier;
use crate::crawl::politeness::RobotsCache;
use crate::crawl::url_filter;
use crate::report::Reporter;

/// Counters accumulated across the run
#[derive(Debug, Default, Clone)]
pub struct CrawlStats {
    /// Pages fetched, parsed, and reported
    pub pages_processed: u64,
    /// Fetch errors, non-200s, empty bodies, non-HTML responses
    pub fetch_failures: u64,
    /// URLs skipped because robots.txt disallowed them
    pub robots_denied: u64,
    /// Pages whose content near-duplicated an earlier page
    pub near_duplicates: u64,
}

/// Shared state for all workers in one crawl run
pub struct CrawlContext {
    pub config: Config,
    pub frontier: Frontier,
    pub robots: RobotsCache,
    pub dedup: NearDuplicateDetector,
    pub fetcher: Fetcher,
    pub reporter: Reporter,
    pub stats: Mutex<CrawlStats>,
    stop: AtomicBool,
}

impl CrawlContext {
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Owns the shared context and drives the worker tasks
pub struct CrawlerPool {
    context: Arc<CrawlContext>,
}

impl CrawlerPool {
    /// Build the pool, opening or resuming the frontier per `restart`
    pub fn new(config: Config, restart: bool) -> anyhow::Result<Self> {
        let frontier = Frontier::open(&config.crawl, restart).context("opening frontier")?;
        let robots =
            RobotsCache::new(config.politeness.clone()).context("building robots http client")?;
        let dedup = NearDuplicateDetector::new(config.dedup.distance_threshold);
        let fetcher = Fetcher::new(&config.fetch).context("building http client")?;

        let fallback_suffix = config
            .crawl
            .allowed_domains
            .first()
            .map(String::as_str)
            .unwrap_or("");
        let reporter = Reporter::new(config.report.clone(), fallback_suffix);

        Ok(Self {
            context: Arc::new(CrawlContext {
                config,
                frontier,
                robots,
                dedup,
                fetcher,
                reporter,
                stats: Mutex::new(CrawlStats::default()),
                stop: AtomicBool::new(false),
            }),
        })
    }

    pub fn context(&self) -> Arc<CrawlContext> {
        self.context.clone()
    }

    /// Run workers until the frontier drains or a stop is requested, then
    /// return the final stats.
    pub async fn run(&self) -> anyhow::Result<CrawlStats> {
        let worker_count = self.context.config.crawl.worker_count;
        tracing::info!("starting {} crawl workers", worker_count);

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let ctx = self.context.clone();
            handles.push(tokio::spawn(worker_loop(ctx, worker_id)));
        }

        let mut first_failure = None;
        for handle in handles {
            if let Err(e) = handle.await.context("worker task panicked")? {
                tracing::error!("worker failed: {:#}", e);
                self.context.request_stop();
                first_failure.get_or_insert(e);
            }
        }
        if let Some(e) = first_failure {
            return Err(e);
        }

        let stats = self.context.stats.lock().clone();
        tracing::info!(
            "crawl finished: {} pages processed, {} failures, {} robots-denied, {} near-duplicates",
            stats.pages_processed,
            stats.fetch_failures,
            stats.robots_denied,
            stats.near_duplicates
        );
        Ok(stats)
    }

    /// Ask all workers to retire after their current page
    pub fn shutdown(&self) {
        self.context.request_stop();
    }
}

/// One worker's main loop
async fn worker_loop(ctx: Arc<CrawlContext>, worker_id: usize) -> anyhow::Result<()> {
    let poll_interval = Duration::from_millis(ctx.config.crawl.idle_poll_ms);
    let max_idle = Duration::from_secs(ctx.config.crawl.max_idle_secs);
    let mut idle = Duration::ZERO;

    loop {
        if ctx.stop_requested() {
            tracing::debug!("worker {} stopping on request", worker_id);
            return Ok(());
        }

        let Some((url, depth)) = ctx.frontier.get_next() else {
            if idle >= max_idle {
                tracing::debug!("worker {} retiring after {:?} idle", worker_id, idle);
                return Ok(());
            }
            tokio::time::sleep(poll_interval).await;
            idle += poll_interval;
            continue;
        };
        idle = Duration::ZERO;

        process_page(&ctx, &url, depth)
            .await
            .with_context(|| format!("processing {}", url))?;
    }
}

/// Fetch one URL, analyze it, enqueue its outlinks, and mark it complete.
///
/// Only frontier store failures are errors; everything that can go wrong
/// with the page itself just completes the URL and moves on.
async fn process_page(ctx: &CrawlContext, url: &Url, depth: u32) -> anyhow::Result<()> {
    let page = match ctx.fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("fetch failed for {}: {}", url, e);
            ctx.stats.lock().fetch_failures += 1;
            ctx.frontier.mark_complete(url)?;
            return Ok(());
        }
    };

    if page.status != 200 || page.body.is_empty() || !page.is_html() {
        tracing::debug!(
            "skipping {} (status {}, {} bytes, {:?})",
            url,
            page.status,
            page.body.len(),
            page.content_type
        );
        ctx.stats.lock().fetch_failures += 1;
        ctx.frontier.mark_complete(url)?;
        return Ok(());
    }

    let text = extractor::extract_text(&page.body);
    let fp = fingerprint(&text);
    if ctx.dedup.check_and_record(url.as_str(), fp) {
        ctx.stats.lock().near_duplicates += 1;
        ctx.reporter.record_url(url);
        ctx.frontier.mark_complete(url)?;
        return Ok(());
    }

    ctx.reporter.record_page(url, &text);

    // Outlinks are screened here, before they ever reach the frontier:
    // scope rules first, then the origin's robots.txt.
    let links = extractor::extract_links(&page.body, &page.final_url);
    for link in links {
        if !url_filter::is_valid(&link, &ctx.config.crawl.allowed_domains) {
            continue;
        }
        if !ctx.robots.can_fetch(&link).await {
            tracing::debug!("robots.txt disallows {}", link);
            ctx.stats.lock().robots_denied += 1;
            continue;
        }
        ctx.frontier.add(&link, depth + 1)?;
        ctx.reporter.record_url(&link);
    }

    ctx.frontier.mark_complete(url)?;
    ctx.stats.lock().pages_processed += 1;
    Ok(())
}
