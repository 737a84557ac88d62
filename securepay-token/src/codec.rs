// Three-segment token codec
//
// header.body.signature, each of the first two segments base64url encoded
// JSON. The signature is carried through untouched; it is verified by the
// gateway or by the merchant's backend, never on the device.

use crate::{Result, TokenError};
use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use jsonwebtoken::{EncodingKey, Header, encode as jwt_encode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// A token split into its decoded parts
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken<T> {
    pub header: Value,
    pub claims: T,
    pub signature: String,
}

/// Split a token into exactly three segments.
pub fn split(token: &str) -> Result<[&str; 3]> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [header, body, signature] => Ok([*header, *body, *signature]),
        _ => Err(TokenError::MalformedToken {
            segments: parts.len(),
        }),
    }
}

/// Decode one base64url segment, padding it to a 4-byte boundary first.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    let mut padded = segment.to_string();
    let remainder = padded.len() % 4;
    if remainder > 0 {
        padded.push_str(&"=".repeat(4 - remainder));
    }

    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|_| TokenError::InvalidEncoding)
}

/// Decode a token into typed claims without verifying its signature.
pub fn decode<T: DeserializeOwned>(token: &str) -> Result<DecodedToken<T>> {
    let [header, body, signature] = split(token)?;

    let header_bytes = decode_segment(header)?;
    let body_bytes = decode_segment(body)?;

    let header: Value = serde_json::from_slice(&header_bytes)
        .map_err(|e| TokenError::InvalidPayload(e.to_string()))?;
    let claims: T = serde_json::from_slice(&body_bytes)
        .map_err(|e| TokenError::InvalidPayload(e.to_string()))?;

    Ok(DecodedToken {
        header,
        claims,
        signature: signature.to_string(),
    })
}

/// Decode only the claims.
pub fn decode_claims<T: DeserializeOwned>(token: &str) -> Result<T> {
    decode(token).map(|decoded| decoded.claims)
}

/// Assemble a token from a header, claims and an opaque signature segment.
pub fn encode<T: Serialize>(header: &Value, claims: &T, signature: &str) -> Result<String> {
    let header = serde_json::to_vec(header).map_err(|e| TokenError::Serialization(e.to_string()))?;
    let body = serde_json::to_vec(claims).map_err(|e| TokenError::Serialization(e.to_string()))?;

    Ok(format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(body),
        signature
    ))
}

/// Sign claims with HS256, the way a merchant backend issues request tokens.
pub fn sign<T: Serialize>(claims: &T, secret: &[u8]) -> Result<String> {
    let header = Header::default();
    jwt_encode(&header, claims, &EncodingKey::from_secret(secret)).map_err(TokenError::from)
}
