//! Crawl run report
//!
//! Accumulates per-page statistics as workers finish pages and writes one
//! plain-text summary at the end of the run: unique page count, longest
//! page by token count, top words excluding stopwords, and per-subdomain
//! page counts under the configured suffix.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use url::Url;

use crate::config::ReportConfig;
use crate::crawl::url_filter;

/// English stopwords excluded from the word frequency table
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's",
    "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own",
    "same", "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some",
    "such", "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then",
    "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we",
    "we'd", "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's",
    "where", "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with",
    "won't", "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

#[derive(Default)]
struct ReportState {
    unique_urls: HashSet<String>,
    longest_page: String,
    longest_page_tokens: usize,
    word_counts: HashMap<String, u64>,
    subdomains: BTreeMap<String, u64>,
}

/// Thread-safe accumulator for the end-of-run report
pub struct Reporter {
    state: Mutex<ReportState>,
    config: ReportConfig,
    /// Suffix whose subdomains get individual counts
    subdomain_suffix: String,
}

impl Reporter {
    pub fn new(config: ReportConfig, fallback_suffix: &str) -> Self {
        let subdomain_suffix = if config.subdomain_suffix.is_empty() {
            fallback_suffix.to_string()
        } else {
            config.subdomain_suffix.clone()
        };
        Self {
            state: Mutex::new(ReportState::default()),
            config,
            subdomain_suffix,
        }
    }

    /// Record a successfully processed page and its extracted text
    pub fn record_page(&self, url: &Url, text: &str) {
        let tokens = tokenize(text);
        let mut state = self.state.lock();

        if tokens.len() > state.longest_page_tokens {
            state.longest_page = url.to_string();
            state.longest_page_tokens = tokens.len();
        }

        for token in tokens {
            if !STOP_WORDS.contains(&token.as_str()) {
                *state.word_counts.entry(token).or_insert(0) += 1;
            }
        }

        self.record_url_locked(&mut state, url);
    }

    /// Record a URL without its page text: outlinks accepted into the
    /// frontier and pages whose content near-duplicated an earlier page
    pub fn record_url(&self, url: &Url) {
        let mut state = self.state.lock();
        self.record_url_locked(&mut state, url);
    }

    /// URLs are keyed canonically so an outlink event and a later page
    /// event for the same page count once
    fn record_url_locked(&self, state: &mut ReportState, url: &Url) {
        if !state.unique_urls.insert(url_filter::normalize(url)) {
            return;
        }

        if let Some(host) = url.host_str() {
            let bare = format!("www{}", self.subdomain_suffix);
            if host.ends_with(&self.subdomain_suffix) && host != bare {
                *state.subdomains.entry(host.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Number of unique pages recorded so far
    pub fn unique_pages(&self) -> usize {
        self.state.lock().unique_urls.len()
    }

    /// Write the report to the configured path
    pub fn write(&self) -> std::io::Result<()> {
        let state = self.state.lock();
        let mut file = std::fs::File::create(&self.config.output_path)?;

        writeln!(file, "Total unique pages: {}\n", state.unique_urls.len())?;
        writeln!(
            file,
            "Longest page: {} with {} words\n",
            state.longest_page, state.longest_page_tokens
        )?;

        writeln!(file, "Most common words:")?;
        let mut words: Vec<(&String, &u64)> = state.word_counts.iter().collect();
        words.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (word, count) in words.into_iter().take(self.config.top_words) {
            writeln!(file, "{}: {}", word, count)?;
        }
        writeln!(file)?;

        writeln!(file, "Subdomains in {}:", self.subdomain_suffix.trim_start_matches('.'))?;
        for (subdomain, count) in &state.subdomains {
            writeln!(file, "{}: {}", subdomain, count)?;
        }

        tracing::info!("report written to {}", self.config.output_path.display());
        Ok(())
    }
}

/// Split text into lowercased ASCII alphanumeric runs
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c.to_ascii_lowercase());
        } else if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reporter_in(dir: &TempDir) -> Reporter {
        Reporter::new(
            ReportConfig {
                output_path: dir.path().join("report.txt"),
                ..ReportConfig::default()
            },
            ".ics.uci.edu",
        )
    }

    #[test]
    fn tokenize_splits_and_lowercases() {
        assert_eq!(
            tokenize("Hello, World-2024!"),
            vec!["hello", "world", "2024"]
        );
    }

    #[test]
    fn longest_page_is_by_token_count() {
        let dir = TempDir::new().unwrap();
        let reporter = reporter_in(&dir);

        let short = Url::parse("https://www.ics.uci.edu/short").unwrap();
        let long = Url::parse("https://www.ics.uci.edu/long").unwrap();
        reporter.record_page(&short, "just a few words");
        reporter.record_page(&long, "this page has quite a lot more words than the other one");

        reporter.write().unwrap();
        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.contains("Longest page: https://www.ics.uci.edu/long"));
    }

    #[test]
    fn stopwords_are_excluded_from_word_counts() {
        let dir = TempDir::new().unwrap();
        let reporter = reporter_in(&dir);

        let url = Url::parse("https://www.ics.uci.edu/p").unwrap();
        reporter.record_page(&url, "the the the crawler crawler");

        reporter.write().unwrap();
        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.contains("crawler: 2"));
        assert!(!report.contains("the: 3"));
    }

    #[test]
    fn subdomains_exclude_the_bare_www_host() {
        let dir = TempDir::new().unwrap();
        let reporter = reporter_in(&dir);

        reporter.record_url(&Url::parse("https://www.ics.uci.edu/a").unwrap());
        reporter.record_url(&Url::parse("https://vision.ics.uci.edu/a").unwrap());
        reporter.record_url(&Url::parse("https://vision.ics.uci.edu/b").unwrap());

        reporter.write().unwrap();
        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.contains("vision.ics.uci.edu: 2"));
        assert!(!report.contains("www.ics.uci.edu: "));
    }

    #[test]
    fn outlink_and_page_events_for_one_url_count_once() {
        let dir = TempDir::new().unwrap();
        let reporter = reporter_in(&dir);

        // Outlink recorded at discovery, then the fetched page under its
        // canonical form
        let outlink = Url::parse("https://vision.ics.uci.edu/page/").unwrap();
        let fetched = Url::parse("https://vision.ics.uci.edu/page").unwrap();
        reporter.record_url(&outlink);
        reporter.record_page(&fetched, "computer vision research group");

        assert_eq!(reporter.unique_pages(), 1);

        reporter.write().unwrap();
        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.contains("vision.ics.uci.edu: 1"));
    }

    #[test]
    fn repeated_urls_count_once() {
        let dir = TempDir::new().unwrap();
        let reporter = reporter_in(&dir);

        let url = Url::parse("https://www.ics.uci.edu/p").unwrap();
        reporter.record_url(&url);
        reporter.record_url(&url);

        assert_eq!(reporter.unique_pages(), 1);
    }
}
