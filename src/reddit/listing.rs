//! Listing document schema and image-host filtering.

use serde::Deserialize;

/// Top-level listing document: `{ data: { children: [...] } }`
#[derive(Debug, Deserialize)]
pub struct Listing {
    /// Listing payload
    pub data: ListingData,
}

/// Payload of a listing
#[derive(Debug, Deserialize)]
pub struct ListingData {
    /// Posts in upstream order
    pub children: Vec<ListingChild>,
}

/// Wrapper around a single post
#[derive(Debug, Deserialize)]
pub struct ListingChild {
    /// Post fields
    pub data: RawListingEntry,
}

/// The only post field the relay cares about.
///
/// Some post kinds carry no `url`; those are dropped during filtering.
#[derive(Debug, Deserialize)]
pub struct RawListingEntry {
    /// Link target of the post
    #[serde(default)]
    pub url: Option<String>,
}

impl Listing {
    /// Consumes the listing, yielding post URLs in listing order
    pub fn into_urls(self) -> impl Iterator<Item = String> {
        self.data
            .children
            .into_iter()
            .filter_map(|child| child.data.url)
    }
}

/// Allow-list of direct-image providers.
///
/// A URL is accepted when it contains any of the configured substrings.
#[derive(Debug, Clone, Default)]
pub struct ImageHostFilter {
    hosts: Vec<String>,
}

impl ImageHostFilter {
    /// Create a filter from host substrings such as `i.redd.it`
    #[must_use]
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(Into::into)
                .filter(|h: &String| !h.is_empty())
                .collect(),
        }
    }

    /// Configured substrings
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Whether `url` points at an accepted provider
    #[must_use]
    pub fn accepts(&self, url: &str) -> bool {
        self.hosts.iter().any(|host| url.contains(host.as_str()))
    }

    /// Keep accepted URLs, preserving order
    #[must_use]
    pub fn apply<I>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter().filter(|url| self.accepts(url)).collect()
    }
}
