//! End-to-end crawl tests against a local HTTP server

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use scopecrawl::config::Config;
use scopecrawl::crawl::CrawlerPool;

/// Minimal HTTP server backed by a path -> (status, content type, body) map.
/// Every served request path is appended to the shared log.
struct TestSite {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestSite {
    async fn serve(pages: HashMap<&'static str, (u16, &'static str, String)>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let pages = pages.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let Ok(n) = stream.read(&mut buf).await else {
                        return;
                    };
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    log.lock().push(path.clone());

                    let reply = match pages.get(path.as_str()) {
                        Some((status, content_type, body)) => format!(
                            "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            content_type,
                            body.len(),
                            body
                        ),
                        None => {
                            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                                .to_string()
                        }
                    };
                    let _ = stream.write_all(reply.as_bytes()).await;
                });
            }
        });

        Self { addr, requests }
    }

    fn requested(&self, path: &str) -> bool {
        self.requests.lock().iter().any(|p| p == path)
    }
}

fn html(body: &str) -> (u16, &'static str, String) {
    (200, "text/html", format!("<html><body>{}</body></html>", body))
}

fn test_config(site: &TestSite, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawl.seed_urls = vec![format!("http://{}/seed", site.addr)];
    config.crawl.allowed_domains = vec!["127.0.0.1".to_string()];
    config.crawl.data_dir = dir.path().to_path_buf();
    config.crawl.worker_count = 2;
    config.crawl.idle_poll_ms = 50;
    config.crawl.max_idle_secs = 1;
    config.fetch.timeout_secs = 5;
    config.fetch.connect_timeout_secs = 2;
    config.politeness.request_timeout_secs = 2;
    config.report.output_path = dir.path().join("report.txt");
    config
}

/// Distinctive filler so pages are far apart in fingerprint space
const SEED_TEXT: &str = "frontier ledger persists canonical records durably across \
    restarts while workers drain pending entries in stack order";
const B_TEXT: &str = "zebra quartz jungle vivid maple ocean thunder crimson galaxy \
    whisper granite meadow copper lantern velvet horizon";

#[tokio::test]
async fn crawl_visits_scope_and_skips_near_duplicates() {
    let mut pages = HashMap::new();
    pages.insert(
        "/seed",
        html(&format!(
            r#"<p>{}</p><a href="/a">next</a><a href="/b">other</a>"#,
            SEED_TEXT
        )),
    );
    // Same visible text as the seed; its link to /c adds no text, so the
    // page fingerprints identically and /c must never be enqueued.
    pages.insert(
        "/a",
        html(&format!(
            r#"<p>{}</p><a href="/a">next</a><a href="/b">other</a><a href="/c"></a>"#,
            SEED_TEXT
        )),
    );
    pages.insert("/b", html(&format!("<p>{}</p>", B_TEXT)));
    pages.insert("/c", html("<p>should never be fetched</p>"));

    let site = TestSite::serve(pages).await;
    let dir = TempDir::new().unwrap();
    let pool = CrawlerPool::new(test_config(&site, &dir), false).unwrap();

    let stats = pool.run().await.unwrap();

    assert_eq!(stats.pages_processed, 2, "seed and /b");
    assert_eq!(stats.near_duplicates, 1, "/a duplicates the seed");
    assert_eq!(stats.fetch_failures, 0);
    assert!(site.requested("/seed"));
    assert!(site.requested("/a"));
    assert!(site.requested("/b"));
    assert!(!site.requested("/c"), "/c was linked only from the near-duplicate");

    let ctx = pool.context();
    assert_eq!(ctx.frontier.pending_count(), 0);
    // seed, /a, /b discovered; /c never made it into the frontier
    assert_eq!(ctx.frontier.discovered_count(), 3);

    ctx.reporter.write().unwrap();
    let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
    assert!(report.contains("Total unique pages: 3"));
    // Accepted outlinks reach the reporter too, so the host's count covers
    // every discovered page, not just the fully analyzed ones
    assert!(report.contains("127.0.0.1: 3"));
}

#[tokio::test]
async fn robots_rules_are_honored() {
    let mut pages = HashMap::new();
    pages.insert(
        "/robots.txt",
        (
            200,
            "text/plain",
            "User-agent: *\nDisallow: /private/\n".to_string(),
        ),
    );
    pages.insert(
        "/seed",
        html(&format!(
            r#"<p>{}</p><a href="/private/page">hidden</a><a href="/b">ok</a>"#,
            SEED_TEXT
        )),
    );
    pages.insert("/private/page", html("<p>never served</p>"));
    pages.insert("/b", html(&format!("<p>{}</p>", B_TEXT)));

    let site = TestSite::serve(pages).await;
    let dir = TempDir::new().unwrap();
    let pool = CrawlerPool::new(test_config(&site, &dir), false).unwrap();

    let stats = pool.run().await.unwrap();

    assert_eq!(stats.pages_processed, 2);
    assert_eq!(stats.robots_denied, 1);
    assert!(site.requested("/robots.txt"));
    assert!(!site.requested("/private/page"));
}

#[tokio::test]
async fn discovery_stops_at_the_depth_bound() {
    let mut pages = HashMap::new();
    pages.insert(
        "/seed",
        html(r#"<p>alpha origin station</p><a href="/hop1">on</a>"#),
    );
    pages.insert(
        "/hop1",
        html(r#"<p>bravo relay tunnel</p><a href="/hop2">on</a>"#),
    );
    pages.insert(
        "/hop2",
        html(r#"<p>charlie summit ridge</p><a href="/hop3">on</a>"#),
    );
    pages.insert("/hop3", html("<p>delta beyond the bound</p>"));

    let site = TestSite::serve(pages).await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&site, &dir);
    config.crawl.depth_alert = 2;
    let pool = CrawlerPool::new(config, false).unwrap();

    pool.run().await.unwrap();

    assert!(site.requested("/hop2"));
    assert!(!site.requested("/hop3"), "depth 3 exceeds the bound of 2");
}

#[tokio::test]
async fn resumed_run_does_not_refetch_completed_pages() {
    let mut pages = HashMap::new();
    pages.insert(
        "/seed",
        html(&format!(r#"<p>{}</p><a href="/b">b</a>"#, SEED_TEXT)),
    );
    pages.insert("/b", html(&format!("<p>{}</p>", B_TEXT)));

    let site = TestSite::serve(pages).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&site, &dir);

    {
        let pool = CrawlerPool::new(config.clone(), false).unwrap();
        let stats = pool.run().await.unwrap();
        assert_eq!(stats.pages_processed, 2);
    }
    let first_run_requests = site.requests.lock().len();

    // Resume against the same store: everything is complete, so no page
    // requests go out.
    let pool = CrawlerPool::new(config, false).unwrap();
    let stats = pool.run().await.unwrap();
    assert_eq!(stats.pages_processed, 0);
    assert_eq!(site.requests.lock().len(), first_run_requests);
}

#[tokio::test]
async fn restart_discards_progress_and_recrawls() {
    let mut pages = HashMap::new();
    pages.insert("/seed", html(&format!("<p>{}</p>", SEED_TEXT)));

    let site = TestSite::serve(pages).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&site, &dir);

    {
        let pool = CrawlerPool::new(config.clone(), false).unwrap();
        assert_eq!(pool.run().await.unwrap().pages_processed, 1);
    }

    let pool = CrawlerPool::new(config, true).unwrap();
    let stats = pool.run().await.unwrap();
    assert_eq!(stats.pages_processed, 1, "restart recrawls the seed");
    assert_eq!(pool.context().frontier.discovered_count(), 1);
}
