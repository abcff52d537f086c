//! Utility functions shared by the feed pipeline and its callers.
//!
//! - **URL validation**: blank, parse and scheme checks
//! - **Text processing**: character-based truncation with an ellipsis marker
//! - **Dates**: lenient publish date parsing and ordinal display formatting
//!
//! # Examples
//!
//! ```
//! use newsfeed::util::{format_with_ordinal, parse_pub_date, truncate_chars, validate_url};
//!
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(url.scheme(), "https");
//!
//! let date = parse_pub_date("Wed, 02 Oct 2024 10:00:00 GMT");
//! assert_eq!(format_with_ordinal(date), "2nd October 2024");
//!
//! assert_eq!(truncate_chars("Long article summary", 4), "Long\u{2026}");
//! ```

mod date;
mod text;
mod url_validator;

pub use date::{format_with_ordinal, ordinal_suffix, parse_pub_date};
pub use text::{truncate_chars, ELLIPSIS};
pub use url_validator::{validate_url, UrlValidationError};
