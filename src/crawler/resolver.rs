//! Download link resolution
//!
//! Topic URLs end in `/<id>-t.html`; the torrent file for a topic lives at a
//! fixed location on the file host. The content identifier published in the
//! table is a magnet-style token over the SHA-1 of the torrent file bytes.

use crate::crawler::fetcher::{Fetcher, RequestProfile};
use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};
use std::fmt;

static TOPIC_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)-t\.html$").expect("topic id pattern is valid"));

/// What ended up in the `Link` column for a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLink {
    /// Magnet token derived from the torrent file bytes
    Derived(String),

    /// The torrent file could not be fetched; its URL is kept instead
    Fallback(String),

    /// The topic URL carried no topic id, so there is no torrent URL
    Missing,
}

impl ContentLink {
    /// Builds the magnet token for a torrent file's bytes
    pub fn from_torrent_bytes(bytes: &[u8]) -> Self {
        let digest = Sha1::digest(bytes);
        ContentLink::Derived(format!("magnet:?xt=urn:btih:{}", hex::encode(digest)))
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, ContentLink::Derived(_))
    }

    /// Text written to the CSV table
    pub fn as_str(&self) -> &str {
        match self {
            ContentLink::Derived(magnet) => magnet,
            ContentLink::Fallback(url) => url,
            ContentLink::Missing => "",
        }
    }
}

impl fmt::Display for ContentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts the numeric topic id from a topic URL
///
/// # Example
///
/// ```
/// use forum_harvester::crawler::extract_topic_id;
///
/// assert_eq!(extract_topic_id("https://site/1234-t.html").as_deref(), Some("1234"));
/// assert_eq!(extract_topic_id("https://site/no-id.html"), None);
/// ```
pub fn extract_topic_id(url: &str) -> Option<String> {
    let topic_id = TOPIC_ID.captures(url).map(|caps| caps[1].to_string());
    tracing::debug!("Topic id: url={}, id={:?}", url, topic_id);
    topic_id
}

/// Builds the torrent file URL for a topic, or an empty string without an id
pub fn build_torrent_url(download_base_url: &str, topic_id: Option<&str>) -> String {
    match topic_id {
        Some(id) => format!("{}{}.torrent", download_base_url, id),
        None => String::new(),
    }
}

/// Turns topic ids into content links
#[derive(Debug, Clone)]
pub struct LinkResolver {
    fetcher: Fetcher,
    download_base_url: String,
}

impl LinkResolver {
    pub fn new(fetcher: Fetcher, download_base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            download_base_url: download_base_url.into(),
        }
    }

    pub fn torrent_url(&self, topic_id: Option<&str>) -> String {
        build_torrent_url(&self.download_base_url, topic_id)
    }

    /// Fetches a torrent file and derives its content link
    ///
    /// Never fails: a fetch error degrades to [`ContentLink::Fallback`] with
    /// the torrent URL, and an empty URL gives [`ContentLink::Missing`].
    pub async fn resolve_content_id(&self, torrent_url: &str) -> ContentLink {
        if torrent_url.is_empty() {
            return ContentLink::Missing;
        }

        match self
            .fetcher
            .get_bytes(torrent_url, RequestProfile::Torrent)
            .await
        {
            Ok(bytes) => {
                let link = ContentLink::from_torrent_bytes(&bytes);
                tracing::debug!("Derived content id for {}: {}", torrent_url, link);
                link
            }
            Err(e) => {
                tracing::warn!("Could not convert torrent {}: {}", torrent_url, e);
                ContentLink::Fallback(torrent_url.to_string())
            }
        }
    }

    /// Resolves the content link for a topic id in one step
    pub async fn resolve(&self, topic_id: Option<&str>) -> ContentLink {
        let torrent_url = self.torrent_url(topic_id);
        self.resolve_content_id(&torrent_url).await
    }
}
