//! Fetch an RSS feed and turn it into a short, newest-first list of articles.
//!
//! The entry point is [`feed::NewsFeedService`], used through the
//! [`feed::ArticleSource`] trait. It never returns an error: unreachable
//! feeds, bad status codes and malformed XML all produce an empty list, and
//! a single broken item is dropped without affecting the others.

pub mod config;
pub mod feed;
pub mod util;
