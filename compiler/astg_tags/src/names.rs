//! Tag names recognized by the analyzer and the client renderer.

pub const JSON_RPC_SERVER: &str = "jsonRPC-server";
pub const HTTP_SERVER: &str = "http-server";
pub const HTTP_METHOD: &str = "http-method";
pub const HTTP_PREFIX: &str = "http-prefix";
pub const HTTP_PATH: &str = "http-path";
pub const HTTP_SUCCESS: &str = "http-success";
pub const HTTP_ARGS: &str = "http-args";
pub const HTTP_HEADERS: &str = "http-headers";
pub const HTTP_COOKIES: &str = "http-cookies";
pub const REQUEST_CONTENT_TYPE: &str = "requestContentType";
pub const RESPONSE_CONTENT_TYPE: &str = "responseContentType";
pub const HTTP_MULTIPART: &str = "http-multipart";
pub const HTTP_PART_NAME: &str = "http-part-name";
pub const HTTP_PART_CONTENT: &str = "http-part-content";
pub const ENABLE_INLINE_SINGLE: &str = "enableInlineSingle";
pub const HANDLER: &str = "handler";
pub const HTTP_RESPONSE: &str = "http-response";
pub const TAG_OMITEMPTY_ALL: &str = "tagOmitemptyAll";
pub const METRICS: &str = "metrics";
pub const PACKAGE_JSON: &str = "packageJSON";
pub const DEFAULT_ERROR: &str = "defaultError";
pub const DESC: &str = "desc";
pub const SUMMARY: &str = "summary";

/// Prefix of per-variable struct tag overrides: `tag:<varName>:<tagName>`.
pub const STRUCT_TAG_PREFIX: &str = "tag:";

/// Value of an HTTP-code tag that disables the mapping.
pub const SKIP: &str = "skip";

/// Default HTTP verb when `http-method` is absent or invalid.
pub const DEFAULT_HTTP_METHOD: &str = "POST";

/// Default success status when `http-success` is absent or invalid.
pub const DEFAULT_HTTP_SUCCESS: i64 = 200;

/// HTTP verbs accepted by `http-method`.
pub const HTTP_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "CONNECT", "OPTIONS", "TRACE",
];

/// Status range that may be used as a tag name for error mapping.
pub const ERROR_CODE_RANGE: std::ops::RangeInclusive<u16> = 400..=599;

/// Parse a tag name as an HTTP error code in [`ERROR_CODE_RANGE`].
pub fn error_code(tag: &str) -> Option<u16> {
    let code: u16 = tag.parse().ok()?;
    ERROR_CODE_RANGE.contains(&code).then_some(code)
}

/// Split a `tag:<varName>:<tagName>` tag into `(varName, tagName)`.
pub fn struct_tag_target(tag: &str) -> Option<(&str, &str)> {
    let rest = tag.strip_prefix(STRUCT_TAG_PREFIX)?;
    let (var, name) = rest.split_once(':')?;
    if var.is_empty() || name.is_empty() {
        return None;
    }
    Some((var, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_accepts_range() {
        assert_eq!(error_code("404"), Some(404));
        assert_eq!(error_code("599"), Some(599));
        assert_eq!(error_code("399"), None);
        assert_eq!(error_code("600"), None);
        assert_eq!(error_code("http-method"), None);
    }

    #[test]
    fn struct_tag_target_splits() {
        assert_eq!(struct_tag_target("tag:id:validate"), Some(("id", "validate")));
        assert_eq!(struct_tag_target("tag::validate"), None);
        assert_eq!(struct_tag_target("tag:id"), None);
        assert_eq!(struct_tag_target("http-path"), None);
    }
}
