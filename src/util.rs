use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

// RFC 3986 unreserved characters stay as they are, everything else is encoded.
// This is stricter than what the url crate uses for query strings, and it is
// what OAuth1 signatures are computed over.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encodes the given string slice for an OAuth1 signature or a URL path segment.
pub fn percent_encode(src: &str) -> String {
    utf8_percent_encode(src, UNRESERVED).to_string()
}

/// Joins `base` and `segments`, encoding each segment on its own so blog
/// identifiers such as custom domains cannot alter the path.
pub fn build_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();

    for segment in segments {
        url.push('/');
        url.push_str(&percent_encode(segment));
    }

    url
}
