use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::TokenError;

/// Extract the `exp` claim (Unix seconds) from a JWT payload.
///
/// The signature is NOT verified. The claims are trusted only to decide when a
/// token we already received over an authenticated channel should be refreshed;
/// never use this for authentication decisions.
pub fn jwt_expiry(token: &str) -> Result<i64, TokenError> {
    // header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 2 {
        return Err(TokenError::MalformedToken);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(TokenError::DecodeFailure)?;

    let claims: Map<String, Value> =
        serde_json::from_slice(&payload).map_err(TokenError::InvalidPayload)?;

    claims
        .get("exp")
        .and_then(Value::as_f64)
        .map(|exp| exp as i64)
        .ok_or(TokenError::MissingExpiry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        format!("{}.{}.sig", header, URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn extracts_integer_exp() {
        let token = token_with_payload(r#"{"sub":"svc","exp":1782462021}"#);
        assert_eq!(jwt_expiry(&token).unwrap(), 1782462021);
    }

    #[test]
    fn truncates_fractional_exp() {
        let token = token_with_payload(r#"{"exp":1700000000.9}"#);
        assert_eq!(jwt_expiry(&token).unwrap(), 1700000000);
    }

    #[test]
    fn two_segments_are_enough() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = URL_SAFE_NO_PAD.encode(r#"{"exp":42}"#);
        assert_eq!(jwt_expiry(&format!("{header}.{payload}")).unwrap(), 42);
    }

    #[test]
    fn rejects_single_segment() {
        assert!(matches!(jwt_expiry("not-a-jwt"), Err(TokenError::MalformedToken)));
        assert!(matches!(jwt_expiry(""), Err(TokenError::MalformedToken)));
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert!(matches!(
            jwt_expiry("header.***.sig"),
            Err(TokenError::DecodeFailure(_))
        ));
    }

    #[test]
    fn rejects_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let padded = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":12}"#);
        assert!(padded.ends_with('='));
        assert!(matches!(
            jwt_expiry(&format!("{header}.{padded}.sig")),
            Err(TokenError::DecodeFailure(_))
        ));
    }

    #[test]
    fn rejects_non_json_payload() {
        let token = token_with_payload("definitely not json");
        assert!(matches!(jwt_expiry(&token), Err(TokenError::InvalidPayload(_))));
    }

    #[test]
    fn rejects_json_that_is_not_an_object() {
        let token = token_with_payload("[1,2,3]");
        assert!(matches!(jwt_expiry(&token), Err(TokenError::InvalidPayload(_))));
    }

    #[test]
    fn rejects_missing_or_non_numeric_exp() {
        let missing = token_with_payload(r#"{"sub":"svc"}"#);
        assert!(matches!(jwt_expiry(&missing), Err(TokenError::MissingExpiry)));

        let as_string = token_with_payload(r#"{"exp":"1700000000"}"#);
        assert!(matches!(jwt_expiry(&as_string), Err(TokenError::MissingExpiry)));

        let as_null = token_with_payload(r#"{"exp":null}"#);
        assert!(matches!(jwt_expiry(&as_null), Err(TokenError::MissingExpiry)));
    }

    #[test]
    fn malformed_errors_are_classified() {
        let err = jwt_expiry("x").unwrap_err();
        assert!(err.is_malformed_token());
    }
}
