// tests/common/mod.rs
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde_json::json;

/// Unsigned JWT carrying only the `exp` claim; the signature segment is junk.
pub fn jwt_expiring_at(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "RS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(
        json!({"iss": "https://sso.example.com/realms/workloads", "sub": "svc", "exp": exp})
            .to_string(),
    );
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Unsigned JWT expiring `secs` from now (negative for already expired).
pub fn jwt_expiring_in(secs: i64) -> String {
    jwt_expiring_at(Utc::now().timestamp() + secs)
}
