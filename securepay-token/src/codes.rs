// Gateway code families
//
// Every family carries an `Unknown` variant holding the raw value, so codes
// introduced by the gateway later decode instead of failing the response.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! string_code {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $code:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value not known to this SDK version
            Unknown(String),
        }

        impl $name {
            /// Wire representation
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(raw) => raw,
                }
            }

            pub fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown(_))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from(value.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

string_code! {
    /// Operation requested from the gateway
    pub enum TypeDescription {
        Auth => "AUTH",
        ThreeDQuery => "THREEDQUERY",
        AccountCheck => "ACCOUNTCHECK",
        JsInit => "JSINIT",
        Subscription => "SUBSCRIPTION",
        RiskDec => "RISKDEC",
        CacheTokenise => "CACHETOKENISE",
    }
}

string_code! {
    /// What the caller should do next with a response
    pub enum CustomerOutput {
        /// Stop and report the result
        Result => "RESULT",
        /// Ask the customer to start over
        TryAgain => "TRYAGAIN",
        /// Perform step-up authentication
        ThreeDRedirect => "THREEDREDIRECT",
    }
}

string_code! {
    /// Gateway error code, string-encoded on the wire
    pub enum ResponseErrorCode {
        Successful => "0",
        TransactionNotAuthorised => "60022",
        DeclinedByIssuingBank => "70000",
        FieldError => "30000",
        BankSystemError => "60010",
        ManualInvestigationRequired => "60034",
        Bypass => "22000",
        /// The gateway's own catch-all code
        GatewayUnknown => "99999",
    }
}

impl ResponseErrorCode {
    /// Numeric value, or -1 when the raw value is not an integer
    pub fn code(&self) -> i64 {
        self.as_str().parse().unwrap_or(-1)
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }
}

string_code! {
    /// Settlement state of a transaction
    pub enum SettleStatus {
        PendingAutomaticSettlement => "0",
        PendingManualSettlement => "1",
        SettlementInProgress => "10",
        InstantSettlement => "100",
        AuthorisedButSuspended => "2",
        Cancelled => "3",
    }
}

string_code! {
    /// Acquirer advice returned with RISKDEC
    pub enum AcquirerRecommendedAction {
        Continue => "C",
        Stop => "S",
    }
}

string_code! {
    /// Fraud-control verdict returned with RISKDEC
    pub enum ShieldStatusCode {
        Accept => "ACCEPT",
        Challenge => "CHALLENGE",
        Deny => "DENY",
        NoScore => "NOSCORE",
    }
}

/// Field named by a 30000 field error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDetail {
    InvalidPan,
    InvalidSecurityCode,
    InvalidJwt,
    InvalidExpiryDate,
    InvalidTermUrl,
    InvalidParentTransactionReference,
    InvalidSiteReference,
    InvalidSubscriptionNumber,
    InvalidTypeDescriptions,
    Unknown,
}

impl ErrorDetail {
    /// Map the first `errordata` element to a detail
    pub fn from_field(field: Option<&str>) -> Self {
        match field {
            Some("pan") => Self::InvalidPan,
            Some("securitycode") => Self::InvalidSecurityCode,
            Some("jwt") => Self::InvalidJwt,
            Some("expirydate") => Self::InvalidExpiryDate,
            Some("termurl") => Self::InvalidTermUrl,
            Some("parenttransactionreference") => Self::InvalidParentTransactionReference,
            Some("sitereference") => Self::InvalidSiteReference,
            Some("subscriptionnumber") => Self::InvalidSubscriptionNumber,
            Some("requesttypedescriptions") => Self::InvalidTypeDescriptions,
            _ => Self::Unknown,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidPan => 12501,
            Self::InvalidSecurityCode => 12502,
            Self::InvalidJwt => 12503,
            Self::InvalidExpiryDate => 12504,
            Self::InvalidTermUrl => 12505,
            Self::InvalidParentTransactionReference => 12506,
            Self::InvalidSiteReference => 12507,
            Self::InvalidSubscriptionNumber => 12508,
            Self::InvalidTypeDescriptions => 12509,
            Self::Unknown => 12500,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidPan => "Invalid field: PAN",
            Self::InvalidSecurityCode => "Invalid field: CVV",
            Self::InvalidJwt => "Invalid field: JWT",
            Self::InvalidExpiryDate => "Invalid field: Expiry date",
            Self::InvalidTermUrl => "Invalid field: Term URL",
            Self::InvalidParentTransactionReference => {
                "Invalid field: Parent transaction reference"
            }
            Self::InvalidSiteReference => "Invalid field: Site reference",
            Self::InvalidSubscriptionNumber => "Invalid field: Subscription number",
            Self::InvalidTypeDescriptions => "Invalid field: Type descriptions",
            Self::Unknown => "Invalid field: Unknown",
        }
    }
}
