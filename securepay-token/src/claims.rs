// Token claims structures

use crate::TypeDescription;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard JWT claims (RFC 7519)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StandardClaims {
    /// Issuer (the merchant's username)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl StandardClaims {
    /// Claims issued now by `issuer`
    pub fn issued_by(issuer: impl Into<String>) -> Self {
        Self {
            iss: Some(issuer.into()),
            iat: Some(Utc::now().timestamp()),
            ..Default::default()
        }
    }

    /// Set expiration (from now + duration in seconds)
    pub fn with_expiration(mut self, seconds: i64) -> Self {
        self.exp = Some(Utc::now().timestamp() + seconds);
        self
    }

    /// A token is expired once `exp` is reached
    pub fn is_expired(&self) -> bool {
        self.exp
            .map(|exp| exp <= Utc::now().timestamp())
            .unwrap_or(false)
    }
}

/// Standard claims plus a typed `payload` object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims<T> {
    #[serde(flatten)]
    pub standard: StandardClaims,

    pub payload: T,
}

impl<T> Claims<T> {
    pub fn new(standard: StandardClaims, payload: T) -> Self {
        Self { standard, payload }
    }
}

/// Billing address and contact
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BillingDetails {
    #[serde(rename = "billingfirstname", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "billinglastname", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "billingpremise", skip_serializing_if = "Option::is_none")]
    pub premise: Option<String>,
    #[serde(rename = "billingstreet", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(rename = "billingtown", skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(rename = "billingcounty", skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(rename = "billingcountryiso2a", skip_serializing_if = "Option::is_none")]
    pub country_iso2a: Option<String>,
    #[serde(rename = "billingpostcode", skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(rename = "billingemail", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "billingtelephone", skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

/// Delivery address and contact
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryDetails {
    #[serde(rename = "customerfirstname", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "customerlastname", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "customerpremise", skip_serializing_if = "Option::is_none")]
    pub premise: Option<String>,
    #[serde(rename = "customerstreet", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(rename = "customertown", skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(rename = "customercounty", skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(rename = "customercountryiso2a", skip_serializing_if = "Option::is_none")]
    pub country_iso2a: Option<String>,
    #[serde(rename = "customerpostcode", skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(rename = "customeremail", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "customertelephone", skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

/// Merchant-authored request parameters
///
/// Claims the SDK does not model are kept in `extra` so a decoded token can be
/// re-encoded without losing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MerchantPayload {
    #[serde(rename = "requesttypedescriptions", skip_serializing_if = "Option::is_none")]
    pub request_types: Option<Vec<TypeDescription>>,

    #[serde(rename = "sitereference", skip_serializing_if = "Option::is_none")]
    pub site_reference: Option<String>,

    #[serde(rename = "accounttypedescription", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,

    #[serde(rename = "currencyiso3a", skip_serializing_if = "Option::is_none")]
    pub currency_iso3a: Option<String>,

    /// Amount in minor units
    #[serde(rename = "baseamount", skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<i64>,

    /// Amount in major units
    #[serde(rename = "mainamount", skip_serializing_if = "Option::is_none")]
    pub main_amount: Option<f64>,

    /// Where the ACS posts the 3-D Secure v1 result
    #[serde(rename = "termurl", skip_serializing_if = "Option::is_none")]
    pub term_url: Option<String>,

    /// Where an APM redirects after settlement
    #[serde(rename = "returnurl", skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,

    #[serde(rename = "parenttransactionreference", skip_serializing_if = "Option::is_none")]
    pub parent_transaction_reference: Option<String>,

    #[serde(rename = "fraudcontroltransactionid", skip_serializing_if = "Option::is_none")]
    pub fraud_control_transaction_id: Option<String>,

    #[serde(rename = "cachetoken", skip_serializing_if = "Option::is_none")]
    pub cache_token: Option<String>,

    #[serde(flatten)]
    pub billing: BillingDetails,

    #[serde(flatten)]
    pub delivery: DeliveryDetails,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MerchantPayload {
    /// Request types, empty when the claim is absent
    pub fn request_types(&self) -> &[TypeDescription] {
        self.request_types.as_deref().unwrap_or_default()
    }

    pub fn contains_request_type(&self, request_type: &TypeDescription) -> bool {
        self.request_types().contains(request_type)
    }
}

/// Request token claims as authored by the merchant
pub type MerchantClaims = Claims<MerchantPayload>;

impl MerchantClaims {
    /// Decode the merchant view of a token
    pub fn from_token(token: &str) -> crate::Result<Self> {
        crate::decode_claims(token)
    }
}
