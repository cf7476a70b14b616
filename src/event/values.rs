//! Single- and multi-valued map reconciliation.
//!
//! A proxy event carries every header and query parameter twice: once as a
//! list of all values and once as a single value. The single-valued entry is
//! always the first element of the list, and a key whose list is empty has no
//! single-valued entry at all.

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Key to a single value.
pub type SingleValueMap = HashMap<String, String>;

/// Key to every value, in arrival order.
pub type MultiValueMap = HashMap<String, Vec<String>>;

/// Collapse a multi-valued map, first value wins.
pub fn single_value(multi: &MultiValueMap) -> SingleValueMap {
    multi
        .iter()
        .filter_map(|(key, values)| values.first().map(|first| (key.clone(), first.clone())))
        .collect()
}

/// Collect request headers under their canonical names.
pub fn multi_value_headers(headers: &HeaderMap) -> MultiValueMap {
    let mut multi = MultiValueMap::with_capacity(headers.keys_len());
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        multi.insert(canonical_header_name(name.as_str()), values);
    }
    multi
}

/// Decode an `application/x-www-form-urlencoded` query string.
pub fn multi_value_query(query: Option<&str>) -> MultiValueMap {
    let mut multi = MultiValueMap::new();
    let Some(query) = query else {
        return multi;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        multi
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    multi
}

/// `content-type` → `Content-Type`, `x_custom` → `X_custom`.
///
/// The first byte and every byte after a `-` are upper-cased, the rest
/// lower-cased. Names holding a byte that is not a valid header token
/// character are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut canonical = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            canonical.push(c.to_ascii_uppercase());
        } else {
            canonical.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    canonical
}

/// RFC 9110 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
