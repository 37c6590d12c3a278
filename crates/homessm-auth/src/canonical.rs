//! Canonical request construction for AWS Signature Version 4.
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};

/// Bytes left untouched in the canonical URI: unreserved characters plus `/`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Build the full canonical request string.
///
/// `headers` may contain the same name more than once; values are joined with
/// `,` in the order given.
///
/// # Examples
///
/// ```
/// use homessm_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request(
///     "POST",
///     "/",
///     "",
///     &[("host".to_owned(), "localhost:9080".to_owned())],
///     &["host"],
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// );
/// assert!(canonical.starts_with("POST\n/\n\nhost:localhost:9080\n\nhost\n"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &[(String, String)],
    signed_headers: &[&str],
    payload_hash: &str,
) -> String {
    let canonical_uri = build_canonical_uri(path);
    let canonical_query = build_canonical_query_string(query);
    let canonical_headers = build_canonical_headers(headers, signed_headers);
    let signed_headers_str = build_signed_headers_string(signed_headers);

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers_str}\n{payload_hash}"
    )
}

/// Percent-decode the path and re-encode it byte by byte.
///
/// Multi-byte UTF-8 characters become one `%XX` escape per byte.
///
/// # Examples
///
/// ```
/// use homessm_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri(""), "/");
/// assert_eq!(build_canonical_uri("/a b/c"), "/a%20b/c");
/// assert_eq!(build_canonical_uri("/caf%C3%A9"), "/caf%C3%A9");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }
    let decoded: Vec<u8> = percent_decode_str(path).collect();
    percent_encode(&decoded, PATH_ENCODE_SET).to_string()
}

/// The raw query string with `+` rewritten to `%20`. Parameter order is kept.
///
/// # Examples
///
/// ```
/// use homessm_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string("a=1+2&b=3"), "a=1%202&b=3");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    query.replace('+', "%20")
}

/// Build the canonical headers block without its trailing newline.
///
/// Only names listed in `signed_headers` are emitted, sorted, one
/// `name:value` line each.
#[must_use]
pub fn build_canonical_headers(headers: &[(String, String)], signed_headers: &[&str]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = collapse_whitespace(value.trim());
        header_map
            .entry(name.to_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let mut sorted_signed: Vec<&str> = signed_headers.to_vec();
    sorted_signed.sort_unstable();

    sorted_signed
        .iter()
        .filter_map(|name| header_map.get(*name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sorted, lowercase, `;`-joined signed header names.
///
/// ```
/// use homessm_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(build_signed_headers_string(&["x-amz-date", "host"]), "host;x-amz-date");
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<String> = signed_headers.iter().map(|h| h.to_lowercase()).collect();
    sorted.sort_unstable();
    sorted.join(";")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
