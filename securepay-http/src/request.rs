//! Gateway request and response bodies.

use serde::{Deserialize, Serialize};
use securepay_token::{ResponseClaims, ResponseObject};

use crate::{GatewayError, Result};

/// Value of the `version` request field.
pub const API_VERSION: &str = "1.00";

/// Value of the `acceptcustomeroutput` request field.
pub const ACCEPT_CUSTOMER_OUTPUT: &str = "2.00";

/// Body posted to the token exchange endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayRequest<'a, R> {
    pub alias: &'a str,
    pub jwt: &'a str,
    pub version: &'static str,
    #[serde(rename = "versioninfo")]
    pub version_info: &'a str,
    #[serde(rename = "acceptcustomeroutput")]
    pub accept_customer_output: &'static str,
    pub request: &'a [R],
}

impl<'a, R: Serialize> GatewayRequest<'a, R> {
    pub fn new(alias: &'a str, jwt: &'a str, version_info: &'a str, request: &'a [R]) -> Self {
        Self {
            alias,
            jwt,
            version: API_VERSION,
            version_info,
            accept_customer_output: ACCEPT_CUSTOMER_OUTPUT,
            request,
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| GatewayError::RequestBuild(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    jwt: String,
}

/// Decoded gateway answer.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// The response token as received
    pub jwt: String,
    /// Token to send with the next request, empty when none was issued
    pub new_jwt: String,
    pub responses: Vec<ResponseObject>,
    pub request_reference: Option<String>,
}

impl GatewayResponse {
    /// Decode a response body.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.is_empty() {
            return Err(GatewayError::MissingData("empty response body".to_string()));
        }
        let wire: WireResponse =
            serde_json::from_slice(body).map_err(|e| GatewayError::ResponseParse(e.to_string()))?;
        let claims = ResponseClaims::from_token(&wire.jwt)
            .map_err(|e| GatewayError::ResponseParse(e.to_string()))?;

        Ok(Self {
            new_jwt: claims.next_jwt().to_string(),
            responses: claims.payload.responses,
            request_reference: claims.payload.request_reference,
            jwt: wire.jwt,
        })
    }

    /// First response for the given request type.
    pub fn response_for(
        &self,
        request_type: &securepay_token::TypeDescription,
    ) -> Option<&ResponseObject> {
        self.responses.iter().find(|r| r.is_request_type(request_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use securepay_token::{TypeDescription, encode};
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let requests = [json!({"requesttypedescriptions": ["JSINIT"], "requestid": "J-abcdefgh"})];
        let request = GatewayRequest::new("merchant", "a.b.c", "MSDK::rust::0.1.1::linux", &requests);

        let body: serde_json::Value = serde_json::from_slice(&request.to_vec().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "alias": "merchant",
                "jwt": "a.b.c",
                "version": "1.00",
                "versioninfo": "MSDK::rust::0.1.1::linux",
                "acceptcustomeroutput": "2.00",
                "request": [{"requesttypedescriptions": ["JSINIT"], "requestid": "J-abcdefgh"}]
            })
        );
    }

    #[test]
    fn test_response_decoding() {
        let token = encode(
            &json!({"alg": "HS256"}),
            &json!({"payload": {
                "jwt": "next.jwt.token",
                "requestreference": "W1-abc",
                "response": [{"errorcode": "0", "requesttypedescription": "JSINIT"}]
            }}),
            "sig",
        )
        .unwrap();
        let body = serde_json::to_vec(&json!({"jwt": token})).unwrap();

        let response = GatewayResponse::from_body(&body).unwrap();
        assert_eq!(response.jwt, token);
        assert_eq!(response.new_jwt, "next.jwt.token");
        assert_eq!(response.request_reference.as_deref(), Some("W1-abc"));
        assert!(response.response_for(&TypeDescription::JsInit).is_some());
        assert!(response.response_for(&TypeDescription::Auth).is_none());
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(
            GatewayResponse::from_body(b""),
            Err(GatewayError::MissingData(_))
        ));
        assert!(matches!(
            GatewayResponse::from_body(br#"{"token": "x"}"#),
            Err(GatewayError::ResponseParse(_))
        ));
        assert!(matches!(
            GatewayResponse::from_body(br#"{"jwt": "only.two"}"#),
            Err(GatewayError::ResponseParse(_))
        ));
    }
}
