// Gateway response model

use crate::{
    AcquirerRecommendedAction, Claims, CustomerOutput, ErrorDetail, ResponseErrorCode,
    SettleStatus, ShieldStatusCode, TypeDescription,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One response object per requested operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseObject {
    #[serde(rename = "errorcode")]
    pub error_code: ResponseErrorCode,

    #[serde(rename = "errormessage", default)]
    pub error_message: String,

    #[serde(rename = "errordata", skip_serializing_if = "Option::is_none")]
    pub error_data: Option<Vec<String>>,

    #[serde(rename = "customeroutput", skip_serializing_if = "Option::is_none")]
    pub customer_output: Option<CustomerOutput>,

    #[serde(rename = "requesttypedescription", skip_serializing_if = "Option::is_none")]
    pub request_type: Option<TypeDescription>,

    #[serde(rename = "settlestatus", skip_serializing_if = "Option::is_none")]
    pub settle_status: Option<SettleStatus>,

    #[serde(rename = "transactionreference", skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,

    #[serde(rename = "maskedpan", skip_serializing_if = "Option::is_none")]
    pub masked_pan: Option<String>,

    #[serde(rename = "paymenttypedescription", skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,

    /// JSINIT only: token for the challenge session setup
    #[serde(rename = "threedinit", skip_serializing_if = "Option::is_none")]
    pub three_d_init: Option<String>,

    #[serde(rename = "cachetoken", skip_serializing_if = "Option::is_none")]
    pub cache_token: Option<String>,

    #[serde(rename = "enrolled", skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<String>,

    /// Authentication status; "N" comes with error code 60022
    #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(rename = "threedpayload", skip_serializing_if = "Option::is_none")]
    pub three_d_payload: Option<String>,

    #[serde(rename = "threedversion", skip_serializing_if = "Option::is_none")]
    pub three_d_version: Option<String>,

    #[serde(rename = "acsurl", skip_serializing_if = "Option::is_none")]
    pub acs_url: Option<String>,

    #[serde(rename = "acquirertransactionreference", skip_serializing_if = "Option::is_none")]
    pub acquirer_transaction_reference: Option<String>,

    #[serde(rename = "fraudcontrolshieldstatuscode", skip_serializing_if = "Option::is_none")]
    pub shield_status_code: Option<ShieldStatusCode>,

    #[serde(rename = "fraudcontrolreference", skip_serializing_if = "Option::is_none")]
    pub fraud_control_reference: Option<String>,

    #[serde(rename = "fraudcontrolresponsecode", skip_serializing_if = "Option::is_none")]
    pub fraud_control_response_code: Option<String>,

    #[serde(rename = "acquirerrecommendedaction", skip_serializing_if = "Option::is_none")]
    pub acquirer_recommended_action: Option<AcquirerRecommendedAction>,

    #[serde(rename = "rulecategoryflag", skip_serializing_if = "Option::is_none")]
    pub rule_category_flag: Option<String>,

    #[serde(rename = "rulecategorymessage", skip_serializing_if = "Option::is_none")]
    pub rule_category_message: Option<String>,

    /// APM only: page the customer is sent to
    #[serde(rename = "redirecturl", skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl ResponseObject {
    /// A response with the given code and no optional fields
    pub fn new(error_code: impl Into<ResponseErrorCode>, error_message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
            error_data: None,
            customer_output: None,
            request_type: None,
            settle_status: None,
            transaction_reference: None,
            masked_pan: None,
            payment_type: None,
            three_d_init: None,
            cache_token: None,
            enrolled: None,
            status: None,
            three_d_payload: None,
            three_d_version: None,
            acs_url: None,
            acquirer_transaction_reference: None,
            shield_status_code: None,
            fraud_control_reference: None,
            fraud_control_response_code: None,
            acquirer_recommended_action: None,
            rule_category_flag: None,
            rule_category_message: None,
            redirect_url: None,
        }
    }

    pub fn is_request_type(&self, request_type: &TypeDescription) -> bool {
        self.request_type.as_ref() == Some(request_type)
    }

    /// Whether this response asks for a 3-D Secure challenge
    pub fn requires_challenge(&self) -> bool {
        self.is_request_type(&TypeDescription::ThreeDQuery)
            && self.customer_output == Some(CustomerOutput::ThreeDRedirect)
    }

    /// Major component of `threedversion` ("2.1.0" gives "2")
    pub fn three_d_major_version(&self) -> Option<&str> {
        self.three_d_version
            .as_deref()
            .and_then(|version| version.split('.').next())
            .filter(|major| !major.is_empty())
    }

    /// Field detail, meaningful for 30000 field errors only
    pub fn error_detail(&self) -> ErrorDetail {
        if self.error_code == ResponseErrorCode::FieldError {
            ErrorDetail::from_field(self.first_error_data())
        } else {
            ErrorDetail::Unknown
        }
    }

    /// "errormessage: errordata[0]" when error data is present
    pub fn localized_error(&self) -> Option<String> {
        self.first_error_data()
            .map(|data| format!("{}: {}", self.error_message, data))
    }

    /// Reusable card reference, present when both the masked PAN and brand are
    pub fn card_reference(&self) -> Option<CardReference> {
        match (&self.masked_pan, &self.payment_type) {
            (Some(masked_pan), Some(card_type)) => Some(CardReference {
                transaction_reference: self.transaction_reference.clone(),
                card_type: card_type.clone(),
                masked_pan: masked_pan.clone(),
            }),
            _ => None,
        }
    }

    /// Error declared by the gateway, if any
    pub fn payment_error(&self) -> Option<PaymentError> {
        if self.error_code.is_successful() {
            None
        } else {
            Some(PaymentError::compose(self))
        }
    }

    fn first_error_data(&self) -> Option<&str> {
        self.error_data
            .as_ref()
            .and_then(|data| data.first())
            .map(String::as_str)
    }
}

/// A card the gateway has stored, reusable as a parent transaction reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardReference {
    pub transaction_reference: Option<String>,
    pub card_type: String,
    pub masked_pan: String,
}

/// Error declared by the gateway inside a response object
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("An error occurred: {message}")]
    Gateway {
        code: ResponseErrorCode,
        message: String,
    },

    #[error("{message}")]
    InvalidField { detail: ErrorDetail, message: String },
}

impl PaymentError {
    /// Classify a failed response as a field error or a general gateway error
    pub fn compose(response: &ResponseObject) -> Self {
        let localized = response.localized_error();
        if response.error_code == ResponseErrorCode::FieldError {
            let detail = response.error_detail();
            PaymentError::InvalidField {
                detail,
                message: localized.unwrap_or_else(|| detail.message().to_string()),
            }
        } else {
            PaymentError::Gateway {
                code: response.error_code.clone(),
                message: localized.unwrap_or_else(|| response.error_message.clone()),
            }
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            PaymentError::Gateway { code, .. } => code.code(),
            PaymentError::InvalidField { detail, .. } => i64::from(detail.code()),
        }
    }
}

/// Body of a gateway response token
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponsePayload {
    /// Token to use for the next request
    #[serde(rename = "jwt", skip_serializing_if = "Option::is_none")]
    pub next_jwt: Option<String>,

    #[serde(rename = "response", default)]
    pub responses: Vec<ResponseObject>,

    #[serde(rename = "requestreference", skip_serializing_if = "Option::is_none")]
    pub request_reference: Option<String>,
}

/// Response token claims as authored by the gateway
pub type ResponseClaims = Claims<ResponsePayload>;

impl ResponseClaims {
    pub fn from_token(token: &str) -> crate::Result<Self> {
        crate::decode_claims(token)
    }

    /// Next request token, empty when the gateway did not issue one
    pub fn next_jwt(&self) -> &str {
        self.payload.next_jwt.as_deref().unwrap_or_default()
    }
}

/// Summary of one response token for the merchant's own classification
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResponse {
    /// First response with a recognised customer output, else the last response
    pub customer_output: Option<ResponseObject>,
    pub responses: Vec<ResponseObject>,
    /// Card reference of the last response
    pub card_reference: Option<CardReference>,
    /// Error of the first unsuccessful response
    pub error: Option<PaymentError>,
}

impl TransactionResponse {
    pub fn from_token(token: &str) -> crate::Result<Self> {
        let claims = ResponseClaims::from_token(token)?;
        Ok(Self::from_responses(claims.payload.responses))
    }

    pub fn from_responses(responses: Vec<ResponseObject>) -> Self {
        let customer_output = responses
            .iter()
            .find(|r| r.customer_output.as_ref().is_some_and(|o| !o.is_unknown()))
            .or_else(|| responses.last())
            .cloned();
        let card_reference = responses.last().and_then(ResponseObject::card_reference);
        let error = responses.iter().find_map(ResponseObject::payment_error);

        Self {
            customer_output,
            responses,
            card_reference,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> ResponseObject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_three_d_query_response() {
        let r = response(json!({
            "errorcode": "0",
            "errormessage": "Ok",
            "requesttypedescription": "THREEDQUERY",
            "customeroutput": "THREEDREDIRECT",
            "threedversion": "2.1.0",
            "threedpayload": "payload",
            "acquirertransactionreference": "tx-1",
            "enrolled": "Y"
        }));

        assert!(r.requires_challenge());
        assert_eq!(r.three_d_major_version(), Some("2"));
        assert!(r.payment_error().is_none());
    }

    #[test]
    fn test_non_redirect_output_does_not_require_challenge() {
        let r = response(json!({
            "errorcode": "0",
            "requesttypedescription": "THREEDQUERY",
            "customeroutput": "RESULT"
        }));
        assert!(!r.requires_challenge());
        assert_eq!(r.three_d_major_version(), None);
    }

    #[test]
    fn test_field_error_composition() {
        let r = response(json!({
            "errorcode": "30000",
            "errormessage": "Invalid field",
            "errordata": ["pan"]
        }));

        let error = r.payment_error().unwrap();
        assert_eq!(error.code(), 12501);
        assert_eq!(error.to_string(), "Invalid field: pan");
        assert!(matches!(
            error,
            PaymentError::InvalidField {
                detail: ErrorDetail::InvalidPan,
                ..
            }
        ));
    }

    #[test]
    fn test_field_error_without_data_uses_detail_message() {
        let r = response(json!({"errorcode": "30000", "errormessage": "Invalid field"}));
        let error = r.payment_error().unwrap();
        assert_eq!(error.to_string(), "Invalid field: Unknown");
        assert_eq!(error.code(), 12500);
    }

    #[test]
    fn test_gateway_error_composition() {
        let r = response(json!({"errorcode": "70000", "errormessage": "Decline"}));
        let error = r.payment_error().unwrap();
        assert_eq!(error.code(), 70000);
        assert_eq!(
            error,
            PaymentError::Gateway {
                code: ResponseErrorCode::DeclinedByIssuingBank,
                message: "Decline".to_string()
            }
        );
    }

    #[test]
    fn test_card_reference_requires_pan_and_brand() {
        let with_both = response(json!({
            "errorcode": "0",
            "transactionreference": "1-2-3",
            "maskedpan": "411111######1111",
            "paymenttypedescription": "VISA"
        }));
        assert_eq!(
            with_both.card_reference(),
            Some(CardReference {
                transaction_reference: Some("1-2-3".to_string()),
                card_type: "VISA".to_string(),
                masked_pan: "411111######1111".to_string(),
            })
        );

        let pan_only = response(json!({"errorcode": "0", "maskedpan": "411111######1111"}));
        assert_eq!(pan_only.card_reference(), None);
    }

    #[test]
    fn test_missing_error_code_fails_to_decode() {
        let result: Result<ResponseObject, _> =
            serde_json::from_value(json!({"errormessage": "Ok"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_transaction_response_summary() {
        let responses = vec![
            response(json!({
                "errorcode": "0",
                "requesttypedescription": "THREEDQUERY"
            })),
            response(json!({
                "errorcode": "70000",
                "errormessage": "Decline",
                "requesttypedescription": "AUTH",
                "customeroutput": "RESULT",
                "maskedpan": "411111######1111",
                "paymenttypedescription": "VISA"
            })),
        ];

        let summary = TransactionResponse::from_responses(responses);
        assert_eq!(
            summary.customer_output.and_then(|r| r.request_type),
            Some(TypeDescription::Auth)
        );
        assert!(summary.card_reference.is_some());
        assert_eq!(summary.error.map(|e| e.code()), Some(70000));
    }
}
