use super::{FetchError, ImageHostFilter, Listing, ListingSource};
use crate::config::{
    Settings, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_IMAGE_HOSTS, DEFAULT_LISTING_LIMIT,
    DEFAULT_REDDIT_BASE_URL,
};
use anyhow::{anyhow, Context, Result};
use reqwest::header::{LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client as HttpClient, Url};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Options for building a [`RedditClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Listing host, e.g. `https://www.reddit.com`
    pub base_url: String,
    /// Accepted image providers
    pub filter: ImageHostFilter,
    /// `limit` query parameter
    pub limit: u32,
    /// Per-request timeout
    pub timeout: Duration,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REDDIT_BASE_URL.to_string(),
            filter: ImageHostFilter::new(DEFAULT_IMAGE_HOSTS.split(',')),
            limit: DEFAULT_LISTING_LIMIT,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: format!("subreddit-relay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&Settings> for ClientOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            base_url: settings.reddit_base_url.clone(),
            filter: ImageHostFilter::new(settings.image_hosts()),
            limit: settings.listing_limit,
            timeout: settings.http_timeout(),
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// HTTP-backed [`ListingSource`] for Reddit-style `.json` listings
#[derive(Debug, Clone)]
pub struct RedditClient {
    http: HttpClient,
    base_url: Url,
    filter: ImageHostFilter,
    limit: u32,
    user_agent: String,
}

impl RedditClient {
    /// Create a client from options.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base_url = Url::parse(&options.base_url)
            .with_context(|| format!("Invalid listing base URL: {}", options.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Listing base URL cannot be a base: {base_url}"));
        }

        // A missing subreddit is answered with a redirect to the search listing
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .redirect(Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            filter: options.filter,
            limit: options.limit,
            user_agent: options.user_agent,
        })
    }

    /// Build `<base>/r/<subreddit>.json?limit=<limit>`.
    ///
    /// The subreddit is pushed as a single path segment, so only URL escaping
    /// is applied to it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NetworkOrNotFound`] if the URL cannot be built.
    pub fn listing_url(&self, subreddit: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::NetworkOrNotFound("base URL has no path".to_string()))?
            .pop_if_empty()
            .push("r")
            .push(&format!("{subreddit}.json"));
        url.query_pairs_mut()
            .clear()
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ListingSource for RedditClient {
    async fn fetch(&self, subreddit: &str) -> Result<Vec<String>, FetchError> {
        let url = self.listing_url(subreddit)?;
        debug!(subreddit = %subreddit, url = %url, "Requesting listing");

        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(subreddit = %subreddit, error = %e, "Listing request failed");
                FetchError::NetworkOrNotFound(e.to_string())
            })?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            warn!(subreddit = %subreddit, status = %status, location = %location, "Listing redirected; subreddit likely missing");
            return Err(FetchError::NetworkOrNotFound(format!(
                "status {status}, redirected to {location}"
            )));
        }
        if !status.is_success() {
            warn!(subreddit = %subreddit, status = %status, "Listing returned non-success status");
            return Err(FetchError::NetworkOrNotFound(format!("status {status}")));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(subreddit = %subreddit, error = %e, "Failed to read listing body");
            FetchError::NetworkOrNotFound(e.to_string())
        })?;

        let listing: Listing = serde_json::from_slice(&body).map_err(|e| {
            error!(subreddit = %subreddit, error = %e, "Listing body did not match schema");
            FetchError::ParseFailure(e.to_string())
        })?;

        let urls = self.filter.apply(listing.into_urls());
        debug!(subreddit = %subreddit, accepted = urls.len(), "Listing filtered");
        Ok(urls)
    }
}
