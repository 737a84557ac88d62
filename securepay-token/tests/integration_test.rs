//! Integration tests for securepay-token

use securepay_token::*;
use serde_json::json;

fn merchant_claims() -> MerchantClaims {
    let payload = MerchantPayload {
        request_types: Some(vec![TypeDescription::ThreeDQuery, TypeDescription::Auth]),
        site_reference: Some("test_site12345".to_string()),
        account_type: Some("ECOM".to_string()),
        currency_iso3a: Some("GBP".to_string()),
        base_amount: Some(1050),
        term_url: Some("https://payments.example.com/term".to_string()),
        billing: BillingDetails {
            first_name: Some("Jane".to_string()),
            postcode: Some("LL57 1UT".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    Claims::new(StandardClaims::issued_by("merchant@example.com"), payload)
}

#[test]
fn test_signed_merchant_token_round_trip() {
    let claims = merchant_claims();
    let token = sign(&claims, b"merchant-secret").unwrap();

    let decoded = MerchantClaims::from_token(&token).unwrap();
    assert_eq!(decoded, claims);
    assert_eq!(decoded.payload.site_reference.as_deref(), Some("test_site12345"));
    assert_eq!(decoded.payload.main_amount, None);
}

#[test]
fn test_unsigned_encode_round_trip() {
    let claims = merchant_claims();
    let token = encode(&json!({"alg": "HS256", "typ": "JWT"}), &claims, "signature").unwrap();

    let decoded: DecodedToken<MerchantClaims> = decode(&token).unwrap();
    assert_eq!(decoded.claims, claims);
    assert_eq!(decoded.signature, "signature");
}

#[test]
fn test_short_tokens_are_malformed() {
    for token in ["", "onlyone", "two.parts"] {
        let error = MerchantClaims::from_token(token).unwrap_err();
        assert!(
            matches!(error, TokenError::MalformedToken { .. }),
            "{:?} gave {:?}",
            token,
            error
        );
        assert_eq!(error.code(), 17300);
    }
}

#[test]
fn test_bad_body_encoding() {
    let error = MerchantClaims::from_token("eyJhbGciOiJIUzI1NiJ9.!!!.sig").unwrap_err();
    assert!(matches!(error, TokenError::InvalidEncoding));
}

#[test]
fn test_response_token() {
    let body = json!({
        "iss": "webservices.securetrading.net",
        "iat": 1_700_000_000,
        "payload": {
            "jwt": "next.request.token",
            "requestreference": "W23-abcd",
            "response": [{
                "errorcode": "0",
                "errormessage": "Ok",
                "requesttypedescription": "JSINIT",
                "threedinit": "init-token",
                "cachetoken": "cache-123"
            }]
        }
    });
    let token = encode(&json!({"alg": "HS256"}), &body, "sig").unwrap();

    let claims = ResponseClaims::from_token(&token).unwrap();
    assert_eq!(claims.next_jwt(), "next.request.token");
    assert_eq!(claims.payload.request_reference.as_deref(), Some("W23-abcd"));

    let response = &claims.payload.responses[0];
    assert!(response.is_request_type(&TypeDescription::JsInit));
    assert_eq!(response.three_d_init.as_deref(), Some("init-token"));
    assert_eq!(response.cache_token.as_deref(), Some("cache-123"));
}

#[test]
fn test_response_without_next_jwt() {
    let token = encode(&json!({}), &json!({"payload": {"response": []}}), "sig").unwrap();
    let claims = ResponseClaims::from_token(&token).unwrap();
    assert_eq!(claims.next_jwt(), "");
    assert!(claims.payload.responses.is_empty());
}

#[test]
fn test_transaction_response_from_token() {
    let body = json!({
        "payload": {
            "response": [{
                "errorcode": "30000",
                "errormessage": "Invalid field",
                "errordata": ["securitycode"],
                "requesttypedescription": "AUTH"
            }]
        }
    });
    let token = encode(&json!({}), &body, "sig").unwrap();

    let summary = TransactionResponse::from_token(&token).unwrap();
    let error = summary.error.unwrap();
    assert_eq!(error.code(), 12502);
    assert_eq!(error.to_string(), "Invalid field: securitycode");
}
