use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::feed::xml::{ParseError, XmlDocument, XmlElement};
use crate::util::{parse_pub_date, truncate_chars};

/// A display-ready article built from one feed `<item>`.
///
/// String fields are never missing: an absent source element becomes `""`.
/// `published_at_utc` is `None` when the item had no `pubDate` or it could
/// not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    /// At most the configured limit plus a trailing `…` when cut.
    pub description: String,
    pub link: String,
    pub image_url: String,
    pub published_at_utc: Option<DateTime<Utc>>,
}

/// Longest title, link or image URL accepted, in bytes.
///
/// Descriptions are truncated instead, so they have no cap.
pub const MAX_FIELD_BYTES: usize = 16 * 1024;

/// Why a single item was dropped. The rest of the feed is unaffected.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("<{field}> is {len} bytes, exceeding the {MAX_FIELD_BYTES} byte limit")]
    FieldTooLong { field: &'static str, len: usize },
}

/// The child elements of one `<item>`, borrowed from the document.
///
/// Only lives while the item is being mapped.
#[derive(Debug)]
struct RawFeedItem<'a> {
    title: Option<&'a XmlElement>,
    description: Option<&'a XmlElement>,
    link: Option<&'a XmlElement>,
    image: Option<&'a XmlElement>,
    pub_date: Option<&'a XmlElement>,
}

impl<'a> RawFeedItem<'a> {
    fn from_element(item: &'a XmlElement) -> Self {
        Self {
            title: item.child("title"),
            description: item.child("description"),
            link: item.child("link"),
            image: item.child("image"),
            pub_date: item.child("pubDate"),
        }
    }
}

/// Parses a feed body into articles, newest first.
///
/// Every `<item>` element in the document is considered, however deeply it
/// is nested. Items that cannot be mapped are logged and skipped. Items
/// without a usable publish date come last, keeping their feed order.
///
/// # Errors
///
/// Returns [`ParseError`] only when the document itself is malformed.
pub fn parse_articles(
    bytes: &[u8],
    description_limit: usize,
) -> Result<Vec<ArticleRecord>, ParseError> {
    let doc = XmlDocument::parse(bytes)?;

    let mut articles: Vec<ArticleRecord> = doc
        .descendants("item")
        .enumerate()
        .filter_map(|(index, item)| match map_item(item, description_limit) {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::warn!(item = index, error = %e, "Skipping feed item that could not be mapped");
                None
            }
        })
        .collect();

    sort_newest_first(&mut articles);
    Ok(articles)
}

/// Maps one `<item>` element into an [`ArticleRecord`].
///
/// # Errors
///
/// Returns [`ItemError::FieldTooLong`] if the title, link or image URL is
/// longer than [`MAX_FIELD_BYTES`].
pub fn map_item(item: &XmlElement, description_limit: usize) -> Result<ArticleRecord, ItemError> {
    let raw = RawFeedItem::from_element(item);

    let title = capped_text(raw.title, "title")?;
    let link = capped_text(raw.link, "link")?;
    let image_url = capped_text(raw.image, "image")?;
    let description = raw.description.map(XmlElement::text).unwrap_or_default();
    let published_at_utc = raw
        .pub_date
        .and_then(|el| parse_pub_date(&el.text()));

    let description = truncate_chars(&description, description_limit).into_owned();

    Ok(ArticleRecord {
        title,
        description,
        link,
        image_url,
        published_at_utc,
    })
}

/// Stable sort, descending by publish date, undated records last.
pub fn sort_newest_first(articles: &mut [ArticleRecord]) {
    // `None < Some(_)`, so reversing the comparison puts undated records at the end
    articles.sort_by(|a, b| b.published_at_utc.cmp(&a.published_at_utc));
}

fn capped_text(element: Option<&XmlElement>, field: &'static str) -> Result<String, ItemError> {
    let text = element.map(XmlElement::text).unwrap_or_default();
    if text.len() > MAX_FIELD_BYTES {
        return Err(ItemError::FieldTooLong {
            field,
            len: text.len(),
        });
    }
    Ok(text)
}
