//! # SecurePay 3-D Secure
//!
//! Challenge handling for card transactions:
//!
//! - [`ThreeDSecureManager`] wraps the vendor challenge SDK used for
//!   version 2 sessions and turns its callbacks into awaited results
//! - [`WebChallengeFallback`] runs version 1 challenges in an embedded
//!   browser supplied through [`WebTransport`]
//! - [`can_proceed`] decides whether the device's security warnings allow a
//!   session at all

mod config;
mod error;
mod manager;
mod sdk;
mod state;
mod warnings;
pub mod web;

pub use config::{
    ButtonCustomization, ChallengeConfig, DEFAULT_CANCEL_TEXT, DEFAULT_HEADER_TEXT,
    DeploymentEnvironment, Font, LabelCustomization, RenderType, TextBoxCustomization,
    ToolbarCustomization, UiCustomization, UiType,
};
pub use error::{ChallengeError, Result};
pub use manager::{ThreeDSecureManager, challenge_result};
pub use sdk::{
    ActionCode, ChallengeSdk, SetupCallback, SetupOutcome, ValidateResponse, ValidationCallback,
};
pub use state::{ChallengeResult, ChallengeState};
pub use warnings::{
    INTEGRATION_TESTS_ENV, SecurityWarning, VendorWarning, blocking_warnings, can_proceed,
    is_integration_testing,
};
pub use web::{
    WebChallengeFallback, WebChallengeRequest, WebEvent, WebMethod, WebPage, WebTransport,
    strip_target,
};
