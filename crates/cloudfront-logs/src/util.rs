// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Utility functions for object keys.

/// Extracts the CloudFront distribution id from a log object key.
///
/// CloudFront names its log files `<optional prefix/><distribution id>.<date-hour>.<unique id>.gz`.
/// The distribution id is everything in the file name before the first period.
///
/// # Returns
///
/// * `Some(String)` - The distribution id
/// * `None` - If the key has no file name or the file name starts with a period
///
/// # Examples
///
/// ```
/// use cloudfront_logs::util::distribution_id;
///
/// assert_eq!(
///     distribution_id("E2ABCDEF123456.2019-12-04-21.a1b2c3d4.gz"),
///     Some("E2ABCDEF123456".to_string())
/// );
/// assert_eq!(
///     distribution_id("logs/cdn/E2ABCDEF123456.2019-12-04-21.a1b2c3d4.gz"),
///     Some("E2ABCDEF123456".to_string())
/// );
/// assert_eq!(distribution_id("logs/"), None);
/// ```
pub fn distribution_id(key: &str) -> Option<String> {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let id = file_name.split('.').next().unwrap_or(file_name);
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

/// Decodes an object key as delivered in S3 event notifications.
///
/// Keys are form-encoded: spaces arrive as `+` and other reserved bytes as
/// `%XX` escapes. Returns `None` if the escapes do not decode to UTF-8.
///
/// # Examples
///
/// ```
/// use cloudfront_logs::util::decode_object_key;
///
/// assert_eq!(decode_object_key("my+logs/E2AB.gz"), Some("my logs/E2AB.gz".to_string()));
/// assert_eq!(decode_object_key("a%2Bb%3D.gz"), Some("a+b=.gz".to_string()));
/// ```
pub fn decode_object_key(key: &str) -> Option<String> {
    let spaced = key.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            tracing::error!("Object key '{}' is not valid UTF-8 once decoded: {}", key, e);
            None
        }
    }
}
