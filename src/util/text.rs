use std::borrow::Cow;

/// Marker appended to text that was cut short.
pub const ELLIPSIS: char = '\u{2026}';

/// Truncates a string to at most `limit` characters, appending [`ELLIPSIS`]
/// when anything was removed.
///
/// Counts Unicode scalar values rather than bytes, so multi-byte text is never
/// split mid-character. A string of exactly `limit` characters is returned
/// unchanged.
///
/// # Returns
///
/// - `Cow::Borrowed(s)` if `s` fits (no allocation)
/// - `Cow::Owned` holding the first `limit` characters followed by `…`
///
/// # Examples
///
/// ```
/// use newsfeed::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 5), "Hello\u{2026}");
/// assert_eq!(truncate_chars("héllo wörld", 7), "héllo w\u{2026}");
/// ```
pub fn truncate_chars(s: &str, limit: usize) -> Cow<'_, str> {
    // Byte offset of the first character past the limit, if there is one
    match s.char_indices().nth(limit) {
        None => Cow::Borrowed(s),
        Some((byte_end, _)) => {
            let mut out = String::with_capacity(byte_end + ELLIPSIS.len_utf8());
            out.push_str(&s[..byte_end]);
            out.push(ELLIPSIS);
            Cow::Owned(out)
        }
    }
}
