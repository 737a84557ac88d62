//! What a completed transaction hands back to the caller.

use securepay_token::{CardReference, PaymentError, TransactionResponse};

use crate::{ChallengePayload, TransactionError};

/// Artifacts produced by a challenge or an APM redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionalTransactionResult {
    /// `PaRes` of a version 1 challenge
    pub pares: Option<String>,
    /// Server token of a version 2 challenge
    pub three_d_response: Option<String>,
    pub settle_status: Option<String>,
    pub transaction_reference: Option<String>,
}

impl AdditionalTransactionResult {
    pub fn settlement(settle_status: impl Into<String>, transaction_reference: impl Into<String>) -> Self {
        Self {
            settle_status: Some(settle_status.into()),
            transaction_reference: Some(transaction_reference.into()),
            ..Default::default()
        }
    }
}

impl From<&ChallengePayload> for AdditionalTransactionResult {
    fn from(payload: &ChallengePayload) -> Self {
        match payload {
            ChallengePayload::Pares(pares) => Self {
                pares: Some(pares.clone()),
                ..Default::default()
            },
            ChallengePayload::ThreeDResponse(jwt) => Self {
                three_d_response: Some(jwt.clone()),
                ..Default::default()
            },
        }
    }
}

/// Completion of one transaction attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// Response tokens, in the order they were received
    pub jwts: Vec<String>,
    pub additional: Option<AdditionalTransactionResult>,
    pub error: Option<TransactionError>,
}

impl TransactionOutcome {
    pub fn new(
        jwts: Vec<String>,
        additional: Option<AdditionalTransactionResult>,
        error: Option<TransactionError>,
    ) -> Self {
        Self {
            jwts,
            additional,
            error,
        }
    }

    pub(crate) fn failed(jwts: Vec<String>, error: impl Into<TransactionError>) -> Self {
        Self::new(jwts, None, Some(error.into()))
    }

    /// Summaries of the returned tokens; tokens that fail to decode are skipped
    pub fn responses(&self) -> Vec<TransactionResponse> {
        self.jwts
            .iter()
            .filter_map(|jwt| TransactionResponse::from_token(jwt).ok())
            .collect()
    }

    /// Errors the gateway declared in any returned response
    pub fn payment_errors(&self) -> Vec<PaymentError> {
        self.responses()
            .iter()
            .flat_map(|r| r.responses.iter().filter_map(|o| o.payment_error()))
            .collect()
    }

    /// Stored cards the gateway returned
    pub fn card_references(&self) -> Vec<CardReference> {
        self.responses()
            .iter()
            .flat_map(|r| r.responses.iter().filter_map(|o| o.card_reference()))
            .collect()
    }

    /// No local error and no gateway-declared error
    pub fn is_successful(&self) -> bool {
        self.error.is_none() && self.payment_errors().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use securepay_token::{ResponseErrorCode, encode};
    use serde_json::{Value, json};

    fn token(responses: Value) -> String {
        encode(
            &json!({"alg": "HS256"}),
            &json!({"payload": {"response": responses}}),
            "sig",
        )
        .unwrap()
    }

    #[test]
    fn test_payment_errors_and_card_references() {
        let outcome = TransactionOutcome::new(
            vec![
                token(json!([{"errorcode": "0", "requesttypedescription": "THREEDQUERY"}])),
                token(json!([{
                    "errorcode": "70000",
                    "errormessage": "Decline",
                    "requesttypedescription": "AUTH",
                    "maskedpan": "411111######1111",
                    "paymenttypedescription": "VISA",
                    "transactionreference": "1-2-3"
                }])),
                "not-a-token".to_string(),
            ],
            None,
            None,
        );

        let errors = outcome.payment_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            PaymentError::Gateway { code: ResponseErrorCode::DeclinedByIssuingBank, .. }
        ));

        let cards = outcome.card_references();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].card_type, "VISA");
        assert_eq!(cards[0].transaction_reference.as_deref(), Some("1-2-3"));
        assert!(!outcome.is_successful());
    }

    #[test]
    fn test_additional_result_from_payload() {
        let result = AdditionalTransactionResult::from(&ChallengePayload::Pares("pares".to_string()));
        assert_eq!(result.pares.as_deref(), Some("pares"));
        assert_eq!(result.three_d_response, None);

        let result = AdditionalTransactionResult::settlement("0", "1-2-3");
        assert_eq!(result.settle_status.as_deref(), Some("0"));
        assert_eq!(result.pares, None);
    }
}
