// Signed token handling for SecurePay gateway requests and responses
//
// Request tokens are authored and signed by the merchant's backend; response
// tokens are signed by the gateway. The SDK decodes both into typed claims
// but never verifies signatures: that is the merchant backend's job.

pub mod claims;
pub mod codec;
pub mod codes;
pub mod error;
pub mod response;

pub use claims::{
    BillingDetails, Claims, DeliveryDetails, MerchantClaims, MerchantPayload, StandardClaims,
};
pub use codec::{DecodedToken, decode, decode_claims, decode_segment, encode, sign, split};
pub use codes::{
    AcquirerRecommendedAction, CustomerOutput, ErrorDetail, ResponseErrorCode, SettleStatus,
    ShieldStatusCode, TypeDescription,
};
pub use error::{Result, TokenError};
pub use response::{
    CardReference, PaymentError, ResponseClaims, ResponseObject, ResponsePayload,
    TransactionResponse,
};
