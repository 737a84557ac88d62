//! Gateway targets.

use serde::{Deserialize, Serialize};
use std::fmt;

const EU_HOST: &str = "webservices.securetrading.net";
const EU_BACKUP_HOST: &str = "webservices2.securetrading.net";
const US_HOST: &str = "webservices.securetrading.us";

const EU_PINS: &[&str] = &[
    "kCv4KV+TUcfQ7XFk1Hk4oF2JlFRk9fObpVuZCKCZ/mk=",
    "yMZhDu5hIsQaSd5wdC0kIxImZ2BpJPz5YGXasZe0IGQ=",
];
const EU_BACKUP_PINS: &[&str] = &[
    "ZUx6EfJmVvDvoioQBPfjlWssKuu4S4Wkn8KOXQEeQSo=",
    "wjB7efUO9ZRnXsL673AxMVCsN5jdBp238hNJPPHgwZo=",
];
const US_PINS: &[&str] = &[
    "3yBX4bueFPIjR7Ek9Wkf1WQsUA91ITX3okf2IMkyBGc=",
    "fyUrn+zMzGnqPkwp5GQbxEhWtwoxzivyd3g+TucBgdc=",
];

/// Regional gateway a merchant account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayType {
    Eu,
    EuBackup,
    Us,
    /// Development target: EU host, no pinning, no monitoring
    Devbox,
}

impl GatewayType {
    /// Host name, subdomains of which share the same pins.
    pub fn host(&self) -> &'static str {
        match self {
            Self::Eu | Self::Devbox => EU_HOST,
            Self::EuBackup => EU_BACKUP_HOST,
            Self::Us => US_HOST,
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://{}", self.host())
    }

    /// Base64 SHA-256 digests of the accepted public keys.
    pub fn pins(&self) -> &'static [&'static str] {
        match self {
            Self::Eu => EU_PINS,
            Self::EuBackup => EU_BACKUP_PINS,
            Self::Us => US_PINS,
            Self::Devbox => &[],
        }
    }

    pub fn is_pinned(&self) -> bool {
        !self.pins().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eu => "eu",
            Self::EuBackup => "euBackup",
            Self::Us => "us",
            Self::Devbox => "devbox",
        }
    }

    /// Parse a gateway name, ignoring case.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "eu" => Some(Self::Eu),
            "eubackup" | "eu_backup" | "eu-backup" => Some(Self::EuBackup),
            "us" => Some(Self::Us),
            "devbox" => Some(Self::Devbox),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
