// Challenge session lifecycle

use std::fmt;

/// Where a challenge session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeState {
    Idle,
    DeviceInitPending,
    DeviceInitDone,
    ChallengeSetupPending,
    ChallengeReady,
    ChallengeInProgress,
    Validated,
    Failed,
}

impl ChallengeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Validated | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DeviceInitPending => "device-init-pending",
            Self::DeviceInitDone => "device-init-done",
            Self::ChallengeSetupPending => "challenge-setup-pending",
            Self::ChallengeReady => "challenge-ready",
            Self::ChallengeInProgress => "challenge-in-progress",
            Self::Validated => "validated",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal signal of a challenge, native or web.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeResult {
    /// Server token (native) or PaRes (web) to forward to the gateway
    Validated(String),
    Failed,
}

impl ChallengeResult {
    pub fn is_validated(&self) -> bool {
        matches!(self, Self::Validated(_))
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Validated(payload) => Some(payload),
            Self::Failed => None,
        }
    }
}
