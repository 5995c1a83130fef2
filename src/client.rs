use crate::error::{AdError, Result};
use crate::models::{Ad, AdResponse};
use crate::parser;
use log::{debug, warn};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Request timeout for ad tag and wrapper fetches
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Options forwarded with an ad tag request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Whether the request carries credentials; meaningful for browser-side
    /// transports, recorded but unused by the plain HTTP client
    pub with_credentials: bool,

    /// Maximum wrapper redirection depth
    pub wrapper_limit: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            with_credentials: true,
            wrapper_limit: 10,
        }
    }
}

/// The ad server client consumed by the session core.
///
/// `get` resolves a remote ad tag, following wrapper redirections up to
/// `wrapper_limit` hops. `parse_document` parses an inline document without
/// touching the network.
#[allow(async_fn_in_trait)]
pub trait VastClient {
    async fn get(&self, url: &str, options: &FetchOptions) -> Result<AdResponse>;

    fn parse_document(&self, xml: &str) -> Result<AdResponse>;
}

/// HTTP-backed ad server client
pub struct HttpVastClient {
    http: reqwest::Client,
}

impl HttpVastClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Fetch one XML document from a URL
    async fn fetch_document(&self, url: &str) -> Result<String> {
        // Short request ID to correlate log lines of one fetch
        let req_id: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        let url = url::Url::parse(url)?;

        debug!("[{req_id}] fetching ad tag: {url}");
        let start_time = Instant::now();

        let response = self.http.get(url).send().await.map_err(|e| {
            warn!("[{req_id}] request failed after {:?}", start_time.elapsed());
            AdError::Fetch(format!("failed to fetch ad tag: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(AdError::Fetch(format!(
                "ad server returned HTTP status {}",
                response.status()
            )));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| AdError::Fetch(format!("failed to read response body: {e}")))?;

        debug!(
            "[{req_id}] received {} bytes in {:?}",
            xml.len(),
            start_time.elapsed()
        );

        Ok(xml)
    }

    /// Replace wrapper ads with the inline ads they redirect to.
    ///
    /// Breadth-first over the wrapper chain: each hop is bounded by
    /// `wrapper_limit`, already-visited tag URLs are skipped to break cycles,
    /// and a failed hop drops that ad rather than the whole response.
    async fn resolve_wrappers(
        &self,
        root: AdResponse,
        options: &FetchOptions,
    ) -> Result<AdResponse> {
        let mut resolved: Vec<Ad> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Ad, u32)> = root.ads.into_iter().map(|ad| (ad, 0)).collect();
        let mut error = root.error;

        while let Some((ad, depth)) = queue.pop_front() {
            if ad.inline.is_some() {
                resolved.push(ad);
                continue;
            }

            let Some(wrapper) = ad.wrapper else {
                continue;
            };
            let tag_uri = wrapper.vast_ad_tag_uri;

            if depth >= options.wrapper_limit {
                warn!("wrapper depth limit ({}) reached at {tag_uri}", options.wrapper_limit);
                error.get_or_insert_with(|| "wrapper depth limit reached".to_string());
                continue;
            }

            if !visited.insert(tag_uri.clone()) {
                warn!("cycle detected in wrapper chain, skipping: {tag_uri}");
                continue;
            }

            debug!("following wrapper: {tag_uri}");

            let next = match self.fetch_document(&tag_uri).await {
                Ok(xml) => match parser::parse_response(&xml) {
                    Ok(next) => next,
                    Err(e) => {
                        warn!("failed to parse wrapped response from {tag_uri}: {e}");
                        continue;
                    }
                },
                Err(e) => {
                    warn!("failed to fetch wrapped response from {tag_uri}: {e}");
                    continue;
                }
            };

            queue.extend(next.ads.into_iter().map(|ad| (ad, depth + 1)));
        }

        Ok(AdResponse {
            version: root.version,
            ads: resolved,
            error,
        })
    }
}

impl VastClient for HttpVastClient {
    async fn get(&self, url: &str, options: &FetchOptions) -> Result<AdResponse> {
        if options.with_credentials {
            debug!("withCredentials requested; plain HTTP transport has no credential store");
        }

        let xml = self.fetch_document(url).await?;
        let root =
            parser::parse_response(&xml).map_err(|e| AdError::Fetch(e.to_string()))?;

        self.resolve_wrappers(root, options).await
    }

    fn parse_document(&self, xml: &str) -> Result<AdResponse> {
        parser::parse_response(xml)
    }
}
