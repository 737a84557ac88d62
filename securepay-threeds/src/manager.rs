//! Native challenge adapter.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    ActionCode, ChallengeConfig, ChallengeError, ChallengeResult, ChallengeSdk, ChallengeState,
    Result, SecurityWarning, SetupOutcome, ValidateResponse,
};

/// Drives one vendor challenge session at a time.
///
/// Vendor callbacks are bridged to `async` with oneshot channels, so the
/// caller simply awaits the single terminal signal.
pub struct ThreeDSecureManager {
    sdk: Arc<dyn ChallengeSdk>,
    config: ChallengeConfig,
    state: Mutex<ChallengeState>,
    session_id: Mutex<Option<String>>,
}

impl ThreeDSecureManager {
    /// Configure the vendor SDK and start idle.
    pub fn new(sdk: Arc<dyn ChallengeSdk>, config: ChallengeConfig) -> Self {
        let config = config.resolved();
        sdk.configure(&config);
        Self {
            sdk,
            config,
            state: Mutex::new(ChallengeState::Idle),
            session_id: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    pub fn state(&self) -> ChallengeState {
        *self.state.lock()
    }

    /// Session id from the last successful setup.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    /// Warnings the vendor raised while inspecting the device.
    pub fn warnings(&self) -> Vec<SecurityWarning> {
        SecurityWarning::from_vendor(&self.sdk.warnings())
    }

    /// Forget the previous session; called at the start of every attempt.
    pub fn reset(&self) {
        *self.state.lock() = ChallengeState::Idle;
        *self.session_id.lock() = None;
    }

    /// Device-init request sent.
    pub fn begin_device_init(&self) -> Result<()> {
        self.transition(&[ChallengeState::Idle], ChallengeState::DeviceInitPending)
    }

    /// Device-init response received.
    pub fn complete_device_init(&self) -> Result<()> {
        self.transition(
            &[ChallengeState::DeviceInitPending],
            ChallengeState::DeviceInitDone,
        )
    }

    /// Set the session up from the device-init token; one-shot.
    pub async fn setup(&self, jwt: &str) -> Result<String> {
        self.transition(
            &[ChallengeState::Idle, ChallengeState::DeviceInitDone],
            ChallengeState::ChallengeSetupPending,
        )?;

        let (tx, rx) = oneshot::channel();
        self.sdk.setup(
            jwt,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );

        match rx.await {
            Ok(SetupOutcome::Completed { session_id }) => {
                debug!("Challenge session set up");
                *self.session_id.lock() = Some(session_id.clone());
                self.set_state(ChallengeState::ChallengeReady);
                Ok(session_id)
            }
            Ok(SetupOutcome::Failed(response)) => {
                warn!(
                    action = %response.action_code,
                    error_number = response.error_number,
                    "Challenge session setup rejected"
                );
                self.set_state(ChallengeState::Failed);
                Err(ChallengeError::Setup(setup_failure_message(&response)))
            }
            Err(_) => {
                warn!("Challenge SDK dropped the setup callback");
                self.set_state(ChallengeState::Failed);
                Err(ChallengeError::Setup(
                    "setup finished without an outcome".to_string(),
                ))
            }
        }
    }

    /// Run the issuer challenge and wait for its terminal signal.
    pub async fn run_challenge(
        &self,
        transaction_id: &str,
        payload: &str,
    ) -> Result<ChallengeResult> {
        self.transition(
            &[ChallengeState::ChallengeReady],
            ChallengeState::ChallengeInProgress,
        )?;

        let (tx, rx) = oneshot::channel();
        self.sdk.continue_challenge(
            transaction_id,
            payload,
            Box::new(move |response, server_jwt| {
                let _ = tx.send((response, server_jwt));
            }),
        );

        let result = match rx.await {
            Ok((response, server_jwt)) => challenge_result(&response, server_jwt),
            Err(_) => {
                warn!("Challenge SDK dropped the validation callback");
                ChallengeResult::Failed
            }
        };

        self.set_state(if result.is_validated() {
            ChallengeState::Validated
        } else {
            ChallengeState::Failed
        });
        Ok(result)
    }

    fn transition(&self, allowed: &[ChallengeState], next: ChallengeState) -> Result<()> {
        let mut state = self.state.lock();
        if !allowed.contains(&*state) {
            return Err(ChallengeError::InvalidState {
                expected: allowed[0],
                actual: *state,
            });
        }
        *state = next;
        Ok(())
    }

    fn set_state(&self, next: ChallengeState) {
        *self.state.lock() = next;
    }
}

impl fmt::Debug for ThreeDSecureManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreeDSecureManager")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

/// Map a vendor outcome to the terminal signal.
///
/// Success and no-action forward the server token; without one there is
/// nothing to forward and the challenge counts as failed.
pub fn challenge_result(response: &ValidateResponse, server_jwt: Option<String>) -> ChallengeResult {
    match (&response.action_code, server_jwt) {
        (ActionCode::Success | ActionCode::NoAction, Some(jwt)) if !jwt.is_empty() => {
            ChallengeResult::Validated(jwt)
        }
        _ => ChallengeResult::Failed,
    }
}

fn setup_failure_message(response: &ValidateResponse) -> String {
    if response.error_description.is_empty() {
        format!("{} ({})", response.action_code, response.error_number)
    } else {
        format!(
            "{} ({}): {}",
            response.action_code, response.error_number, response.error_description
        )
    }
}
