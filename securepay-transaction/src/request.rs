//! Request objects sent with each gateway call.
//!
//! Every builder omits a field whose source value is absent or empty.

use serde::Serialize;

use securepay_token::TypeDescription;

use crate::Card;

/// Wallet a wallet transaction's token comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSource {
    ApplePay,
}

impl WalletSource {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ApplePay => "APPLEPAY",
        }
    }
}

/// Alternative payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apm {
    Zip,
    Ata,
}

impl Apm {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zip => "ZIP",
            Self::Ata => "ATA",
        }
    }
}

/// Challenge artifact forwarded with a follow-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengePayload {
    /// Server token of a native (version 2) session
    ThreeDResponse(String),
    /// `PaRes` of a web (version 1) session
    Pares(String),
}

/// One element of the gateway request list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestObject {
    #[serde(rename = "requesttypedescriptions", skip_serializing_if = "Vec::is_empty")]
    pub type_descriptions: Vec<TypeDescription>,

    #[serde(rename = "requestid", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,

    #[serde(rename = "securitycode", skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,

    #[serde(rename = "expirydate", skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,

    #[serde(rename = "threedresponse", skip_serializing_if = "Option::is_none")]
    pub three_d_response: Option<String>,

    #[serde(rename = "cachetoken", skip_serializing_if = "Option::is_none")]
    pub cache_token: Option<String>,

    #[serde(rename = "walletsource", skip_serializing_if = "Option::is_none")]
    pub wallet_source: Option<String>,

    #[serde(rename = "wallettoken", skip_serializing_if = "Option::is_none")]
    pub wallet_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pares: Option<String>,

    #[serde(rename = "paymenttypedescription", skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,

    #[serde(rename = "fraudcontroltransactionid", skip_serializing_if = "Option::is_none")]
    pub fraud_control_transaction_id: Option<String>,
}

impl RequestObject {
    /// Device-init request
    pub fn js_init(request_id: &str) -> Self {
        Self {
            type_descriptions: vec![TypeDescription::JsInit],
            request_id: present(Some(request_id)),
            ..Default::default()
        }
    }

    /// Primary card request; the request types come from the token
    pub fn card(
        request_id: &str,
        card: Option<&Card>,
        cache_token: Option<&str>,
        fingerprint: Option<&str>,
    ) -> Self {
        Self {
            request_id: present(Some(request_id)),
            pan: present(card.and_then(Card::pan)),
            security_code: present(card.and_then(Card::security_code)),
            expiry_date: present(card.and_then(Card::expiry_date)),
            cache_token: present(cache_token),
            fraud_control_transaction_id: present(fingerprint),
            ..Default::default()
        }
    }

    /// Follow-up after a validated challenge.
    ///
    /// The artifact goes into exactly one of `threedresponse` and `pares`.
    pub fn follow_up(
        request_id: &str,
        card: Option<&Card>,
        payload: &ChallengePayload,
        cache_token: Option<&str>,
        fingerprint: Option<&str>,
    ) -> Self {
        let mut request = Self::card(request_id, card, cache_token, fingerprint);
        match payload {
            ChallengePayload::ThreeDResponse(jwt) => request.three_d_response = present(Some(jwt)),
            ChallengePayload::Pares(pares) => request.pares = present(Some(pares)),
        }
        request
    }

    pub fn wallet(
        request_id: &str,
        source: WalletSource,
        wallet_token: &str,
        fingerprint: Option<&str>,
    ) -> Self {
        Self {
            request_id: present(Some(request_id)),
            wallet_source: present(Some(source.code())),
            wallet_token: present(Some(wallet_token)),
            fraud_control_transaction_id: present(fingerprint),
            ..Default::default()
        }
    }

    /// The return URL travels in the token, not in the request
    pub fn apm(request_id: &str, apm: Apm) -> Self {
        Self {
            request_id: present(Some(request_id)),
            payment_type: present(Some(apm.code())),
            ..Default::default()
        }
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(request: &RequestObject) -> serde_json::Value {
        serde_json::to_value(request).unwrap()
    }

    #[test]
    fn test_js_init_request() {
        assert_eq!(
            body(&RequestObject::js_init("J-abcdefgh")),
            json!({"requesttypedescriptions": ["JSINIT"], "requestid": "J-abcdefgh"})
        );
    }

    #[test]
    fn test_card_request_omits_empty_fields() {
        let card = Card::new("4111111111111111", "", "12/30");
        let request = RequestObject::card("J-abcdefgh", Some(&card), Some(""), Some("fp-1"));
        assert_eq!(
            body(&request),
            json!({
                "requestid": "J-abcdefgh",
                "pan": "4111111111111111",
                "expirydate": "12/30",
                "fraudcontroltransactionid": "fp-1"
            })
        );

        let request = RequestObject::card("J-abcdefgh", None, Some("cache-1"), None);
        assert_eq!(
            body(&request),
            json!({"requestid": "J-abcdefgh", "cachetoken": "cache-1"})
        );
    }

    #[test]
    fn test_follow_up_carries_one_artifact() {
        let card = Card::new("4111111111111111", "123", "12/30");

        let v2 = RequestObject::follow_up(
            "J-abcdefgh",
            Some(&card),
            &ChallengePayload::ThreeDResponse("server.jwt".to_string()),
            Some("cache-1"),
            None,
        );
        assert_eq!(v2.three_d_response.as_deref(), Some("server.jwt"));
        assert_eq!(v2.pares, None);
        assert_eq!(v2.security_code.as_deref(), Some("123"));

        let v1 = RequestObject::follow_up(
            "J-abcdefgh",
            None,
            &ChallengePayload::Pares("pares-value".to_string()),
            None,
            None,
        );
        assert_eq!(
            body(&v1),
            json!({"requestid": "J-abcdefgh", "pares": "pares-value"})
        );
    }

    #[test]
    fn test_wallet_and_apm_requests() {
        assert_eq!(
            body(&RequestObject::wallet("J-abcdefgh", WalletSource::ApplePay, "wallet-token", None)),
            json!({
                "requestid": "J-abcdefgh",
                "walletsource": "APPLEPAY",
                "wallettoken": "wallet-token"
            })
        );
        assert_eq!(
            body(&RequestObject::apm("J-abcdefgh", Apm::Ata)),
            json!({"requestid": "J-abcdefgh", "paymenttypedescription": "ATA"})
        );
    }
}
