//! Persistent crawl frontier
//!
//! The frontier is the crawl's ledger: every canonical URL ever accepted
//! gets exactly one durable record, flushed before `add` returns, so a
//! crash loses at most work in flight and never re-discovers a URL twice.
//! A restartable in-memory stack holds the not-yet-completed subset and
//! hands URLs to workers in LIFO order.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl::url_filter;

/// Errors from frontier persistence
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("frontier store error: {0}")]
    Store(#[from] sled::Error),
    #[error("frontier record encoding error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("frontier io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed url {url}: {source}")]
    Seed {
        url: String,
        source: url::ParseError,
    },
}

/// One durable frontier record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrontierEntry {
    /// Canonical URL, the record's identity
    url: String,
    /// Whether a worker has finished processing this URL
    completed: bool,
    /// Link distance from the seed at which this URL was discovered
    depth: u32,
}

struct FrontierInner {
    db: sled::Db,
    /// Not-yet-completed URLs, popped LIFO
    pending: Vec<(String, u32)>,
}

/// Exactly-once, depth-bounded, crash-resumable URL frontier
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    depth_alert: u32,
}

impl Frontier {
    /// Open the frontier, resuming or restarting per the flag.
    ///
    /// With `restart` the on-disk store is discarded and the seeds are
    /// enqueued at depth 0. Otherwise an existing store is scanned and the
    /// pending queue rebuilt from its incomplete records; a missing store
    /// behaves like a restart.
    pub fn open(config: &CrawlConfig, restart: bool) -> Result<Self, FrontierError> {
        let store_path = config.data_dir.join("frontier");

        if restart {
            Self::discard_store(&store_path)?;
        }
        let fresh = !store_path.exists();

        let db = sled::open(&store_path)?;
        let frontier = Self {
            inner: Mutex::new(FrontierInner {
                db,
                pending: Vec::new(),
            }),
            depth_alert: config.depth_alert,
        };

        if restart || fresh {
            for seed in &config.seed_urls {
                let url = Url::parse(seed).map_err(|source| FrontierError::Seed {
                    url: seed.clone(),
                    source,
                })?;
                frontier.add(&url, 0)?;
            }
        } else {
            frontier.rebuild_pending()?;
        }

        Ok(frontier)
    }

    /// Record a discovered URL if it is new and within the depth bound.
    ///
    /// First writer wins: a URL already in the store is left untouched, at
    /// its original depth, regardless of the depth offered here. The record
    /// is flushed before this returns.
    pub fn add(&self, url: &Url, depth: u32) -> Result<(), FrontierError> {
        if depth > self.depth_alert {
            tracing::debug!("dropping {} at depth {}", url, depth);
            return Ok(());
        }

        let canonical = url_filter::normalize(url);
        let key = entry_key(&canonical);

        let mut inner = self.inner.lock();
        if inner.db.contains_key(key)? {
            return Ok(());
        }

        let entry = FrontierEntry {
            url: canonical.clone(),
            completed: false,
            depth,
        };
        inner.db.insert(key, bincode::serialize(&entry)?)?;
        inner.db.flush()?;
        inner.pending.push((canonical, depth));
        Ok(())
    }

    /// Pop the next pending URL, most recently enqueued first.
    ///
    /// Returns None when no work is pending right now; more may appear as
    /// other workers finish pages.
    pub fn get_next(&self) -> Option<(Url, u32)> {
        let mut inner = self.inner.lock();
        while let Some((canonical, depth)) = inner.pending.pop() {
            match Url::parse(&canonical) {
                Ok(url) => return Some((url, depth)),
                Err(e) => {
                    tracing::warn!("dropping unparseable pending url {}: {}", canonical, e);
                }
            }
        }
        None
    }

    /// Durably mark a URL's record completed.
    ///
    /// Completing an unknown URL is logged and ignored; completing an
    /// already-completed one is a no-op. Either way the store state is
    /// flushed before this returns.
    pub fn mark_complete(&self, url: &Url) -> Result<(), FrontierError> {
        let canonical = url_filter::normalize(url);
        let key = entry_key(&canonical);

        let inner = self.inner.lock();
        let Some(raw) = inner.db.get(key)? else {
            tracing::error!("mark_complete for unknown url {}", canonical);
            return Ok(());
        };

        let mut entry: FrontierEntry = match bincode::deserialize(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("rebuilding undecodable record for {}: {}", canonical, e);
                FrontierEntry {
                    url: canonical.clone(),
                    completed: true,
                    depth: 0,
                }
            }
        };
        entry.completed = true;

        inner.db.insert(key, bincode::serialize(&entry)?)?;
        inner.db.flush()?;
        Ok(())
    }

    /// Number of URLs waiting to be processed
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Total URLs ever recorded, completed or not
    pub fn discovered_count(&self) -> usize {
        self.inner.lock().db.len()
    }

    /// Scan the store and refill the pending queue from incomplete records.
    ///
    /// Records past the depth bound stay in the store for dedup but are not
    /// re-queued; undecodable records from older layouts are skipped.
    fn rebuild_pending(&self) -> Result<(), FrontierError> {
        let mut inner = self.inner.lock();
        let mut total = 0usize;

        for item in inner.db.iter() {
            let (_, raw) = item?;
            total += 1;

            let entry: FrontierEntry = match bincode::deserialize(&raw) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping undecodable frontier record: {}", e);
                    continue;
                }
            };

            if !entry.completed && entry.depth < self.depth_alert {
                inner.pending.push((entry.url, entry.depth));
            }
        }

        tracing::info!(
            "Found {} urls to be downloaded from {} total urls discovered.",
            inner.pending.len(),
            total
        );
        Ok(())
    }

    fn discard_store(store_path: &Path) -> Result<(), FrontierError> {
        if store_path.exists() {
            tracing::info!("restart requested, discarding {}", store_path.display());
            std::fs::remove_dir_all(store_path)?;
        }
        Ok(())
    }
}

/// Fixed-width store key for a canonical URL
fn entry_key(canonical: &str) -> [u8; 8] {
    xxhash_rust::xxh3::xxh3_64(canonical.as_bytes()).to_be_bytes()
}
