//! Page fetching over HTTP
//!
//! A thin wrapper around one shared reqwest client. Fetches are single-shot
//! with no retry: a failed page is simply marked complete by the caller and
//! the crawl moves on.

use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

/// Errors from fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// A fetched page, before any parsing
#[derive(Debug)]
pub struct PageResponse {
    /// URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header, if present
    pub content_type: Option<String>,
    /// Raw body text
    pub body: String,
}

impl PageResponse {
    /// Whether the response claims to carry HTML.
    /// A missing Content-Type is treated as HTML; the extractor copes.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => ct.to_lowercase().contains("text/html"),
            None => true,
        }
    }
}

/// HTTP fetcher shared by all workers
pub struct Fetcher {
    client: reqwest::Client,
    max_content_size: usize,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_content_size: config.max_content_size,
        })
    }

    /// Fetch a page once. Non-2xx statuses are returned, not errors; the
    /// caller decides what a 404 means for the crawl.
    pub async fn fetch(&self, url: &Url) -> Result<PageResponse, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if let Some(length) = response.content_length() {
            if length as usize > self.max_content_size {
                return Err(FetchError::TooLarge {
                    limit: self.max_content_size,
                });
            }
        }

        let body = response.text().await?;
        if body.len() > self.max_content_size {
            return Err(FetchError::TooLarge {
                limit: self.max_content_size,
            });
        }

        Ok(PageResponse {
            final_url,
            status,
            content_type,
            body,
        })
    }
}
