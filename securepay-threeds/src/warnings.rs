//! Device security warnings and the policy deciding whether a session may start.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable that marks automated test runs.
pub const INTEGRATION_TESTS_ENV: &str = "SECUREPAY_INTEGRATION_TESTS";

/// Warning raised by the challenge SDK when it inspects the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityWarning {
    Jailbroken,
    IntegrityTampered,
    EmulatorBeingUsed,
    DebuggerAttached,
    OsNotSupported,
    AppFromNotTrustedSource,
}

/// Raw warning as reported by the vendor SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorWarning {
    pub id: String,
    pub message: String,
}

impl VendorWarning {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

impl SecurityWarning {
    pub const ALL: [SecurityWarning; 6] = [
        Self::Jailbroken,
        Self::IntegrityTampered,
        Self::EmulatorBeingUsed,
        Self::DebuggerAttached,
        Self::OsNotSupported,
        Self::AppFromNotTrustedSource,
    ];

    /// Vendor warning identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Jailbroken => "SW01",
            Self::IntegrityTampered => "SW02",
            Self::EmulatorBeingUsed => "SW03",
            Self::DebuggerAttached => "SW04",
            Self::OsNotSupported => "SW05",
            Self::AppFromNotTrustedSource => "SW06",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|warning| warning.id() == id)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Jailbroken => "jailbroken",
            Self::IntegrityTampered => "integrity tampered",
            Self::EmulatorBeingUsed => "emulator being used",
            Self::DebuggerAttached => "debugger attached",
            Self::OsNotSupported => "os not supported",
            Self::AppFromNotTrustedSource => "app from not trusted source",
        }
    }

    /// Map vendor warnings to known warnings, in identifier order, once each.
    pub fn from_vendor(warnings: &[VendorWarning]) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|known| warnings.iter().any(|w| w.id == known.id()))
            .collect()
    }

    /// Tolerated outside production.
    fn is_development_artifact(&self) -> bool {
        matches!(
            self,
            Self::EmulatorBeingUsed | Self::DebuggerAttached | Self::AppFromNotTrustedSource
        )
    }
}

impl fmt::Display for SecurityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Whether a session may start with the given warnings present.
///
/// Live configurations tolerate no warning; test configurations tolerate
/// emulator, debugger and untrusted-source warnings; automated test runs
/// tolerate everything.
pub fn can_proceed(warnings: &[SecurityWarning], is_live: bool, is_testing: bool) -> bool {
    if is_testing {
        return true;
    }
    warnings
        .iter()
        .all(|warning| !is_live && warning.is_development_artifact())
}

/// Warnings that block a session under the same policy.
pub fn blocking_warnings(
    warnings: &[SecurityWarning],
    is_live: bool,
    is_testing: bool,
) -> Vec<SecurityWarning> {
    warnings
        .iter()
        .copied()
        .filter(|warning| !can_proceed(&[*warning], is_live, is_testing))
        .collect()
}

/// Whether the automated test flag is set.
pub fn is_integration_testing() -> bool {
    std::env::var(INTEGRATION_TESTS_ENV).is_ok_and(|value| value == "YES")
}
