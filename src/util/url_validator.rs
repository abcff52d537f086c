use thiserror::Error;
use url::Url;

/// Errors that can occur during feed URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL was empty or whitespace-only.
    #[error("Feed URL is empty")]
    Empty,
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Checks a feed URL before any network I/O happens.
///
/// Rejects blank input, unparsable or relative URLs and non-HTTP(S) schemes.
/// Any host is accepted, including localhost and private networks. Surrounding
/// whitespace is ignored.
///
/// # Errors
///
/// Returns [`UrlValidationError`] describing the first rule that failed.
///
/// # Examples
///
/// ```
/// use newsfeed::util::validate_url;
///
/// let url = validate_url("https://example.com/feed.xml").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("   ").is_err());
/// assert!(validate_url("http://localhost:8080/feed").is_ok());
/// assert!(validate_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(trimmed)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rejected() {
        assert!(matches!(validate_url(""), Err(UrlValidationError::Empty)));
        assert!(matches!(validate_url(" \t\n"), Err(UrlValidationError::Empty)));
    }

    #[test]
    fn test_unparsable_rejected() {
        assert!(matches!(
            validate_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("/relative/feed.xml"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let url = validate_url("  https://example.com/rss  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/rss");
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(s)) if s == "file"
        ));
        assert!(validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_local_and_private_hosts_accepted() {
        assert!(validate_url("http://localhost/feed").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/feed").is_ok());
        assert!(validate_url("http://[::1]/feed").is_ok());
        assert!(validate_url("http://192.168.1.1/feed").is_ok());
        assert!(validate_url("http://10.0.0.1:3000/feed").is_ok());
    }

    #[test]
    fn test_valid_public_urls_accepted() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
        assert!(validate_url("http://news.example.org").is_ok());
        assert!(validate_url("https://example.com:443/feed.xml").is_ok());
    }
}
