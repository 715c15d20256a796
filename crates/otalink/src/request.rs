use std::fmt::Write;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Standard URL escaping: everything but the unreserved characters
/// (`A-Z a-z 0-9 - _ . ~`) is percent-encoded.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn slash_end(s: &str) -> &str {
    if s.len() > 1 && s.ends_with('/') {
        &s[..s.len() - 1]
    } else {
        s
    }
}

/// A name/value pair appended as a query parameter to the
/// check-for-updates and report requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Parameter name, appended as given.
    pub name: String,
    /// Parameter value, percent-encoded when the URL is built.
    pub value: String,
}

impl Filter {
    /// Creates a [`Filter`] from a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Builds an absolute endpoint URL from the base URL, verbatim path
/// segments, and an ordered list of query filters.
///
/// Path segments are inserted as given: the GUIDs and endpoint names that
/// end up there are plain ASCII identifiers and already URL-safe. Filter
/// values are percent-encoded. The `?` appears only when at least one
/// filter exists, and the query parameters keep their input order.
pub(crate) fn build_url(base: &str, segments: &[&str], filters: &[Filter]) -> String {
    let mut url = String::from(slash_end(base));

    for segment in segments {
        url.push('/');
        url.push_str(segment);
    }

    for (i, filter) in filters.iter().enumerate() {
        let separator = if i == 0 { '?' } else { '&' };
        // Writing to a `String` cannot fail.
        let _ = write!(
            url,
            "{separator}{}={}",
            filter.name,
            utf8_percent_encode(&filter.value, QUERY_VALUE)
        );
    }

    url
}
