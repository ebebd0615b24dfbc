//! HTML parser for forum listing pages
//!
//! This module handles parsing listing HTML to extract:
//! - One raw row per listed topic (title, topic link, publisher)
//! - The highest page number referenced by the pagination bar

use crate::crawler::resolver::extract_topic_id;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Placeholder publisher for rows without an author link
pub const UNKNOWN_PUBLISHER: &str = "Unknown";

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"tr[id^="tr-"]"#));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("a.torTopic.bold.tt-text"));
static PUBLISHER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("div.topicAuthor a.topicAuthor"));
static PAGINATION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector(r#"#pagination a[href*="/page/"]"#));
static PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/page/(\d+)/").expect("page number pattern is valid"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("built-in selector is valid")
}

/// A listing row as found on the page, before title cleaning and link resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Title text exactly as displayed
    pub raw_title: String,

    /// Absolute topic URL
    pub topic_url: String,

    /// Author name, or [`UNKNOWN_PUBLISHER`]
    pub publisher: String,

    /// Numeric topic id taken from the topic URL
    pub topic_id: Option<String>,
}

/// URL of a listing page
///
/// Page 1 is the forum URL itself, later pages live under `page/<n>/`.
pub fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        format!("{}page/{}/", base_url, page)
    }
}

/// Parses a listing page into raw rows
///
/// Rows without a title link are skipped. A page without any listing rows
/// yields an empty vector and a warning; it is not an error.
///
/// # Example
///
/// ```
/// use forum_harvester::crawler::parse_listing_page;
/// use url::Url;
///
/// let html = r#"<table><tr id="tr-1">
///     <td><a class="torTopic bold tt-text" href="/t/42-t.html">Title</a></td>
/// </tr></table>"#;
/// let base = Url::parse("https://forum.example.com/forum-1/").unwrap();
/// let rows = parse_listing_page(html, 1, &base);
/// assert_eq!(rows[0].topic_id.as_deref(), Some("42"));
/// ```
pub fn parse_listing_page(html: &str, page: u32, base_url: &Url) -> Vec<RawRow> {
    let document = Html::parse_document(html);

    let rows: Vec<ElementRef> = document.select(&ROW_SELECTOR).collect();
    if rows.is_empty() {
        tracing::warn!(
            "Page {}: no listing rows found (selector 'tr[id^=\"tr-\"]')",
            page
        );
        return Vec::new();
    }

    rows.into_iter()
        .filter_map(|row| parse_row(row, page, base_url))
        .collect()
}

fn parse_row(row: ElementRef, page: u32, base_url: &Url) -> Option<RawRow> {
    let Some(title_elem) = row.select(&TITLE_SELECTOR).next() else {
        tracing::debug!("Page {}: row without title link, skipping", page);
        return None;
    };

    let raw_title = element_text(title_elem);

    let Some(href) = title_elem.value().attr("href") else {
        tracing::debug!("Page {}: title link without href, skipping", page);
        return None;
    };
    let topic_url = match base_url.join(href) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Page {}: unusable topic link '{}': {}", page, href, e);
            return None;
        }
    };

    let publisher = row
        .select(&PUBLISHER_SELECTOR)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string());

    let topic_id = extract_topic_id(&topic_url);

    Some(RawRow {
        raw_title,
        topic_url,
        publisher,
        topic_id,
    })
}

/// Text of an element with every text node trimmed, like `get_text(strip=True)`
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// Finds the highest page number linked from the pagination bar
///
/// Returns 1 when the page has no pagination links.
pub fn parse_max_page(html: &str) -> u32 {
    let document = Html::parse_document(html);

    document
        .select(&PAGINATION_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| PAGE_NUMBER.captures(href))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .fold(1, u32::max)
}
