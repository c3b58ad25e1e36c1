//! Unverified bearer-token claim decoding
//! --------------------------------------
//! Splits a structured token on its dot delimiter, base64url-decodes the
//! middle segment and lifts the payload into a typed `Claims` value.
//! Signature trust is delegated to the remote authority; nothing here
//! validates one. Any malformed input decodes to `None`: a bad token is
//! "no usable token", never a fatal error.

use base64::Engine;
use serde_json::Value;

/// Decoded token payload. Produced once at decode time and consumed
/// everywhere else; callers never poke at raw claim maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub usertype: String,
    /// Epoch seconds. Optional: expiry evaluation owns the fail-closed call.
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

/// String or numeric scalar -> owned string. Authorities disagree on whether
/// ids are numbers or strings.
fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode the claims segment of a bearer token. Returns `None` on wrong
/// segment count, invalid base64url, non-object payload or missing
/// identity fields.
pub fn decode(token: &str) -> Option<Claims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].as_bytes())
        .ok()?;
    let payload: Value = serde_json::from_slice(&raw).ok()?;
    let obj = payload.as_object()?;

    let id = obj.get("id").and_then(scalar_string)?;
    let email = obj.get("email").and_then(|v| v.as_str()).filter(|s| !s.is_empty())?.to_string();
    let usertype = obj.get("usertype").and_then(|v| v.as_str()).filter(|s| !s.is_empty())?.to_string();
    let iat = obj.get("iat").and_then(|v| v.as_i64());
    let exp = obj.get("exp").and_then(|v| v.as_i64());

    Some(Claims { id, email, usertype, iat, exp })
}

/// Mint a structurally valid three-segment token around the given claims,
/// with a placeholder signature. Dev and test tooling only; production
/// tokens are issued by the authority.
pub fn encode_unsigned(claims: &Claims) -> String {
    let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let mut payload = serde_json::json!({
        "id": claims.id,
        "email": claims.email,
        "usertype": claims.usertype,
    });
    if let Some(iat) = claims.iat {
        payload["iat"] = iat.into();
    }
    if let Some(exp) = claims.exp {
        payload["exp"] = exp.into();
    }
    let body = engine.encode(payload.to_string());
    format!("{}.{}.unsigned", header, body)
}
