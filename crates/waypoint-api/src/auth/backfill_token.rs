//! Shared-secret authorization of the backfill endpoint

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;
use waypoint_core::AppError;

pub const BACKFILL_TOKEN_HEADER: &str = "x-backfill-token";

/// Token presented by the caller: `x-backfill-token` header, then
/// `Authorization: Bearer`, then the `token` query parameter.
pub fn presented_token<'a>(headers: &'a HeaderMap, query_token: Option<&'a str>) -> Option<&'a str> {
    let from_header = headers
        .get(BACKFILL_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let from_bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    from_header
        .or_else(from_bearer)
        .or_else(|| query_token.map(str::trim).filter(|v| !v.is_empty()))
}

/// Check the presented token against the configured one.
///
/// A missing server-side token is a configuration error, reported before the
/// caller's token is even looked at.
pub fn authorize_backfill(
    configured: Option<&str>,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<(), AppError> {
    let expected = configured
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Configuration("backfill token not configured".to_string()))?;

    match presented_token(headers, query_token) {
        Some(token) if secure_compare(token, expected) => Ok(()),
        Some(_) => Err(AppError::Unauthorized("Invalid backfill token".to_string())),
        None => Err(AppError::Unauthorized("Missing backfill token".to_string())),
    }
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_token_sources_in_order() {
        let h = headers(&[
            ("x-backfill-token", "from-header"),
            ("authorization", "Bearer from-bearer"),
        ]);
        assert_eq!(presented_token(&h, Some("from-query")), Some("from-header"));

        let h = headers(&[("authorization", "Bearer from-bearer")]);
        assert_eq!(presented_token(&h, Some("from-query")), Some("from-bearer"));

        assert_eq!(
            presented_token(&HeaderMap::new(), Some("from-query")),
            Some("from-query")
        );
        assert_eq!(presented_token(&HeaderMap::new(), Some("  ")), None);
    }

    #[test]
    fn test_authorize() {
        let h = headers(&[("x-backfill-token", "s3cret")]);
        assert!(authorize_backfill(Some("s3cret"), &h, None).is_ok());
        assert!(matches!(
            authorize_backfill(Some("s3cret"), &HeaderMap::new(), Some("wrong!")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_backfill(Some("s3cret"), &HeaderMap::new(), None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_backfill(None, &h, None),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("abc", "abc"));
        assert!(!secure_compare("abc", "abd"));
        assert!(!secure_compare("abc", "abcd"));
    }
}
