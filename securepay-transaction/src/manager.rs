//! Transaction orchestration.
//!
//! A card transaction runs through these steps:
//!
//! 1. device-init (JSINIT), only when the token asks for THREEDQUERY
//! 2. the primary request carrying the card
//! 3. a 3-D Secure challenge when the THREEDQUERY response redirects
//! 4. a follow-up request carrying the challenge artifact, when the token
//!    names further request types
//!
//! Every exit path completes through one place, which restores the token the
//! attempt started with.

use std::fmt;
use std::sync::Arc;

use securepay_http::{
    GatewayClient, GatewayClientConfig, GatewayResponse, GatewayTransport,
};
use securepay_log::{Monitor, Severity, debug, info, warn};
use securepay_threeds::{
    ChallengeResult, ChallengeSdk, ThreeDSecureManager, WebChallengeFallback,
    WebChallengeRequest, WebTransport, can_proceed, is_integration_testing,
};
use securepay_token::{MerchantClaims, ResponseObject, TypeDescription};
use url::Url;
use uuid::Uuid;

use crate::apm::{ApmRedirect, ApmResult, ApmWebFlow};
use crate::fingerprint::attempt_fingerprint;
use crate::{
    AdditionalTransactionResult, Apm, Card, ChallengePayload, FingerprintProvider, InitError,
    RequestObject, ResponseValidationError, SdkConfig, TransactionError, TransactionOutcome,
    WalletSource,
};

/// Settle status an APM provider reports for a cancelled payment.
const APM_CANCELLED_SETTLE_STATUS: &str = "3";

/// Where a transaction attempt currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Created,
    DeviceInit,
    AwaitingPrimaryResponse,
    AwaitingChallenge,
    ChallengeRunning,
    AwaitingFollowupResponse,
    Complete,
}

/// Collaborators of a [`PaymentTransactionManager`].
///
/// The challenge SDK and the web transport are the platform's; the rest has
/// working defaults.
#[derive(Clone)]
pub struct TransactionDeps {
    pub challenge_sdk: Arc<dyn ChallengeSdk>,
    pub web_transport: Arc<dyn WebTransport>,
    /// Defaults to the web transport
    pub apm_transport: Option<Arc<dyn WebTransport>>,
    /// Defaults to `reqwest` with pinned TLS
    pub transport: Option<Arc<dyn GatewayTransport>>,
    pub fingerprint: Option<Arc<dyn FingerprintProvider>>,
    /// Defaults to a monitor writing through the logging layer
    pub monitor: Option<Monitor>,
}

impl TransactionDeps {
    pub fn new(challenge_sdk: Arc<dyn ChallengeSdk>, web_transport: Arc<dyn WebTransport>) -> Self {
        Self {
            challenge_sdk,
            web_transport,
            apm_transport: None,
            transport: None,
            fingerprint: None,
            monitor: None,
        }
    }

    pub fn with_apm_transport(mut self, transport: Arc<dyn WebTransport>) -> Self {
        self.apm_transport = Some(transport);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn GatewayTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_fingerprint(mut self, provider: Arc<dyn FingerprintProvider>) -> Self {
        self.fingerprint = Some(provider);
        self
    }

    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = Some(monitor);
        self
    }
}

/// Per-attempt state
struct Attempt {
    request_id: String,
    card: Option<Card>,
    cache_token: Option<String>,
    fingerprint: Option<String>,
}

impl Attempt {
    fn new(card: Option<Card>) -> Self {
        Self {
            request_id: request_id(),
            card,
            cache_token: None,
            fingerprint: None,
        }
    }
}

/// `J-` followed by 8 random alphanumerics
fn request_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("J-{}", &id[..8])
}

/// Runs card, wallet and APM transactions against the gateway.
///
/// One attempt runs at a time: every entry point takes `&mut self`.
pub struct PaymentTransactionManager {
    client: GatewayClient,
    threeds: ThreeDSecureManager,
    web_challenge: WebChallengeFallback,
    apm_web: ApmWebFlow,
    fingerprint: Option<Arc<dyn FingerprintProvider>>,
    monitor: Monitor,
    is_live: bool,
    state: TransactionState,
    jwt: Option<String>,
    original_jwt: Option<String>,
}

impl PaymentTransactionManager {
    /// Validate the configuration, build the collaborators and apply the
    /// device security gate.
    pub fn new(config: SdkConfig, jwt: Option<String>, deps: TransactionDeps) -> Result<Self, InitError> {
        let mut monitor = deps
            .monitor
            .map(|m| m.with_context(config.monitoring_context()))
            .unwrap_or_else(|| Monitor::with_log_sink(config.monitoring_context()));
        monitor.set_enabled(config.monitoring_enabled);

        let (username, gateway, environment) = match config.validate() {
            Ok(fields) => fields,
            Err(e) => {
                monitor.log(Severity::Info, &e.to_string(), &[]);
                return Err(e);
            }
        };
        let is_live = environment.is_live();

        let mut builder = GatewayClientConfig::builder(gateway, username).retry(config.retry.policy());
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.clone());
        }
        let client_config = builder.build()?;
        let client = match deps.transport {
            Some(transport) => GatewayClient::with_transport(client_config, transport)?,
            None => GatewayClient::new(client_config)?,
        };

        let threeds = ThreeDSecureManager::new(deps.challenge_sdk, config.challenge_config());
        let warnings = threeds.warnings();
        if !can_proceed(&warnings, is_live, is_integration_testing()) {
            let error = InitError::SecurityWarnings(warnings);
            monitor.log(Severity::Info, &error.to_string(), &[]);
            return Err(error);
        }

        let toolbar = threeds.config().toolbar();
        let web_challenge =
            WebChallengeFallback::new(deps.web_transport.clone(), toolbar.clone(), monitor.clone());
        let apm_transport = deps.apm_transport.unwrap_or(deps.web_transport);
        let apm_web = ApmWebFlow::new(apm_transport, toolbar, monitor.clone());

        debug!("Transaction manager ready for {} ({})", username, gateway);

        Ok(Self {
            client,
            threeds,
            web_challenge,
            apm_web,
            fingerprint: deps.fingerprint,
            monitor,
            is_live,
            state: TransactionState::Created,
            original_jwt: jwt.clone(),
            jwt,
        })
    }

    /// Token the next attempt starts from
    pub fn jwt(&self) -> Option<&str> {
        self.jwt.as_deref()
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }

    /// Run a card transaction.
    ///
    /// A given `jwt` replaces the token held since construction.
    pub async fn perform_transaction(&mut self, jwt: Option<&str>, card: Option<Card>) -> TransactionOutcome {
        if let Some(jwt) = jwt {
            self.reset_jwt(jwt);
        }
        let outcome = self.card_flow(Attempt::new(card)).await;
        self.complete(outcome)
    }

    /// Run a wallet transaction; there is no device-init and no challenge.
    pub async fn perform_wallet_transaction(
        &mut self,
        source: WalletSource,
        wallet_token: &str,
        jwt: &str,
    ) -> TransactionOutcome {
        self.reset_jwt(jwt);
        let outcome = self.wallet_flow(Attempt::new(None), source, wallet_token).await;
        self.complete(outcome)
    }

    /// Run an APM transaction, presenting the provider's page when the
    /// gateway redirects.
    pub async fn perform_apm_transaction(&mut self, jwt: Option<&str>, apm: Apm) -> TransactionOutcome {
        if let Some(jwt) = jwt {
            self.reset_jwt(jwt);
        }
        let outcome = self.apm_flow(Attempt::new(None), apm).await;
        self.complete(outcome)
    }

    async fn card_flow(&mut self, mut attempt: Attempt) -> TransactionOutcome {
        self.set_state(TransactionState::Created);
        self.threeds.reset();

        if self.jwt.is_none() {
            self.monitor.log(Severity::Error, "Missing JWT in request body", &[]);
            return TransactionOutcome::failed(Vec::new(), TransactionError::JwtMissing);
        }
        let claims = match self.claims_with_request_types() {
            Ok(claims) => claims,
            Err(outcome) => return outcome,
        };
        attempt.fingerprint = attempt_fingerprint(Some(&claims), self.fingerprint.as_deref());

        if claims.payload.contains_request_type(&TypeDescription::ThreeDQuery) {
            if let Err(outcome) = self.device_init(&mut attempt).await {
                return outcome;
            }
        }

        self.set_state(TransactionState::AwaitingPrimaryResponse);
        let request = RequestObject::card(
            &attempt.request_id,
            attempt.card.as_ref(),
            attempt.cache_token.as_deref(),
            attempt.fingerprint.as_deref(),
        );
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(e) => return TransactionOutcome::failed(Vec::new(), e),
        };

        let query = response
            .response_for(&TypeDescription::ThreeDQuery)
            .filter(|r| r.requires_challenge())
            .cloned();
        let Some(query) = query else {
            return TransactionOutcome::new(vec![response.jwt], None, None);
        };

        self.set_state(TransactionState::AwaitingChallenge);
        self.authenticate(&attempt, response, &query).await
    }

    /// JSINIT, then the challenge session setup from its `threedinit`.
    async fn device_init(&mut self, attempt: &mut Attempt) -> Result<(), TransactionOutcome> {
        self.set_state(TransactionState::DeviceInit);
        self.threeds
            .begin_device_init()
            .map_err(|e| TransactionOutcome::failed(Vec::new(), e))?;

        let response = self
            .send(RequestObject::js_init(&attempt.request_id))
            .await
            .map_err(|e| TransactionOutcome::failed(Vec::new(), e))?;

        let Some(first) = response.responses.first() else {
            self.log_with_reference(Severity::Info, "Missing response for JSINIT", &response);
            return Err(TransactionOutcome::failed(
                vec![response.jwt],
                TransactionError::missing_data(),
            ));
        };
        self.threeds
            .complete_device_init()
            .map_err(|e| TransactionOutcome::failed(vec![response.jwt.clone()], e))?;

        if !first.error_code.is_successful() {
            return Err(TransactionOutcome::new(vec![response.jwt], None, None));
        }

        let Some(cache_token) = first.cache_token.clone() else {
            self.log_with_reference(Severity::Error, "Missing cacheToken in JSINIT response", &response);
            return Err(TransactionOutcome::failed(
                vec![response.jwt],
                TransactionError::missing_data(),
            ));
        };
        attempt.cache_token = Some(cache_token);

        let Some(three_d_init) = first.three_d_init.clone() else {
            self.log_with_reference(Severity::Error, "Missing threeDInit in response", &response);
            return Err(TransactionOutcome::failed(
                vec![response.jwt],
                TransactionError::missing_data(),
            ));
        };

        match self.threeds.setup(&three_d_init).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Challenge session setup failed: {}", e);
                Err(TransactionOutcome::failed(vec![response.jwt], e))
            }
        }
    }

    /// Run the challenge the THREEDQUERY response asked for, then the follow-up.
    async fn authenticate(
        &mut self,
        attempt: &Attempt,
        response: GatewayResponse,
        query: &ResponseObject,
    ) -> TransactionOutcome {
        let jwt = response.jwt.clone();

        let Some(version) = query.three_d_major_version() else {
            self.log_with_reference(Severity::Info, "Incorrect 3DS version returned", &response);
            return TransactionOutcome::failed(vec![jwt], TransactionError::missing_data());
        };
        let is_v1 = version == "1";
        let payload = query.three_d_payload.clone().unwrap_or_default();

        let result = if is_v1 {
            let Some(term_url) = self.current_claims().and_then(|c| c.payload.term_url) else {
                self.log_with_reference(Severity::Error, "Missing termUrl", &response);
                return TransactionOutcome::failed(vec![jwt], ResponseValidationError::MissingTermUrl);
            };
            let request = WebChallengeRequest::new(
                payload,
                term_url,
                query.acs_url.clone().unwrap_or_default(),
                query.acquirer_transaction_reference.clone().unwrap_or_default(),
            );
            self.set_state(TransactionState::ChallengeRunning);
            self.web_challenge.run(&request).await
        } else {
            let Some(transaction_id) = query.acquirer_transaction_reference.as_deref() else {
                self.log_with_reference(
                    Severity::Error,
                    "Missing acquirerTransactionReference",
                    &response,
                );
                return TransactionOutcome::failed(vec![jwt], TransactionError::missing_data());
            };
            self.set_state(TransactionState::ChallengeRunning);
            self.threeds.run_challenge(transaction_id, &payload).await
        };

        let artifact = match result {
            Ok(ChallengeResult::Validated(artifact)) => artifact,
            Ok(ChallengeResult::Failed) => {
                info!("Challenge not validated");
                return TransactionOutcome::failed(vec![jwt], TransactionError::ChallengeAuthentication);
            }
            Err(e) => return TransactionOutcome::failed(vec![jwt], e),
        };
        let payload = if is_v1 {
            ChallengePayload::Pares(artifact)
        } else {
            ChallengePayload::ThreeDResponse(artifact)
        };
        let additional = AdditionalTransactionResult::from(&payload);

        let has_more_request_types = self
            .current_claims()
            .is_some_and(|c| !c.payload.request_types().is_empty());
        if !has_more_request_types {
            return TransactionOutcome::new(vec![jwt], Some(additional), None);
        }

        self.set_state(TransactionState::AwaitingFollowupResponse);
        let request = RequestObject::follow_up(
            &attempt.request_id,
            attempt.card.as_ref(),
            &payload,
            attempt.cache_token.as_deref(),
            attempt.fingerprint.as_deref(),
        );
        let mut jwts = vec![jwt];
        let error = match self.send(request).await {
            Ok(follow_up) => {
                jwts.push(follow_up.jwt);
                None
            }
            Err(e) => Some(e),
        };
        TransactionOutcome::new(jwts, Some(additional), error)
    }

    async fn wallet_flow(
        &mut self,
        mut attempt: Attempt,
        source: WalletSource,
        wallet_token: &str,
    ) -> TransactionOutcome {
        self.set_state(TransactionState::Created);
        let claims = match self.claims_with_request_types() {
            Ok(claims) => claims,
            Err(outcome) => return outcome,
        };
        attempt.fingerprint = attempt_fingerprint(Some(&claims), self.fingerprint.as_deref());

        self.set_state(TransactionState::AwaitingPrimaryResponse);
        let request = RequestObject::wallet(
            &attempt.request_id,
            source,
            wallet_token,
            attempt.fingerprint.as_deref(),
        );
        match self.send(request).await {
            Ok(response) => TransactionOutcome::new(vec![response.jwt], None, None),
            Err(e) => TransactionOutcome::failed(Vec::new(), e),
        }
    }

    async fn apm_flow(&mut self, attempt: Attempt, apm: Apm) -> TransactionOutcome {
        self.set_state(TransactionState::Created);
        let claims = match self.claims_with_request_types() {
            Ok(claims) => claims,
            Err(outcome) => return outcome,
        };
        let return_url = claims
            .payload
            .return_url
            .filter(|url| Url::parse(url).is_ok());
        let Some(return_url) = return_url else {
            self.monitor.log(Severity::Info, "Empty or incorrect return url", &[]);
            return TransactionOutcome::failed(Vec::new(), ResponseValidationError::MissingReturnUrl);
        };

        self.set_state(TransactionState::AwaitingPrimaryResponse);
        let response = match self.send(RequestObject::apm(&attempt.request_id, apm)).await {
            Ok(response) => response,
            Err(e) => return TransactionOutcome::failed(Vec::new(), e),
        };

        let redirect_url = response
            .response_for(&TypeDescription::Auth)
            .and_then(|r| r.redirect_url.as_deref())
            .filter(|url| !url.is_empty())
            .map(Url::parse);
        let redirect_url = match redirect_url {
            None => return TransactionOutcome::new(vec![response.jwt], None, None),
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                warn!("APM redirect URL is invalid: {}", e);
                return TransactionOutcome::failed(vec![response.jwt], TransactionError::Unknown);
            }
        };

        self.set_state(TransactionState::ChallengeRunning);
        let redirect = ApmRedirect::new(redirect_url, return_url);
        match self.apm_web.run(&redirect).await {
            Ok(ApmResult::Settled {
                settle_status,
                transaction_reference,
            }) => {
                let error = (settle_status == APM_CANCELLED_SETTLE_STATUS)
                    .then_some(TransactionError::ApmSettleStatus);
                let additional =
                    AdditionalTransactionResult::settlement(settle_status, transaction_reference);
                TransactionOutcome::new(vec![response.jwt], Some(additional), error)
            }
            Ok(ApmResult::Failed) => {
                TransactionOutcome::failed(vec![response.jwt], TransactionError::Unknown)
            }
            Err(e) => {
                warn!("APM page could not be presented: {}", e);
                TransactionOutcome::failed(vec![response.jwt], TransactionError::Unknown)
            }
        }
    }

    /// Post one request object with the current token, then move to the token
    /// the gateway issued.
    async fn send(&mut self, request: RequestObject) -> Result<GatewayResponse, TransactionError> {
        let Some(jwt) = self.jwt.as_deref() else {
            self.monitor.log(Severity::Error, "Missing JWT in request body", &[]);
            return Err(TransactionError::JwtMissing);
        };

        debug!("Sending request {:?}", request.request_id);
        let response = self.client.send(jwt, std::slice::from_ref(&request)).await?;
        self.jwt = Some(response.new_jwt.clone());
        Ok(response)
    }

    /// Decoded current token, when it names at least one request type
    fn claims_with_request_types(&self) -> Result<MerchantClaims, TransactionOutcome> {
        match self.current_claims() {
            Some(claims) if !claims.payload.request_types().is_empty() => Ok(claims),
            _ => {
                self.monitor.log(Severity::Info, "Incorrect request types: empty", &[]);
                Err(TransactionOutcome::failed(
                    Vec::new(),
                    ResponseValidationError::MissingTypeDescriptions,
                ))
            }
        }
    }

    fn current_claims(&self) -> Option<MerchantClaims> {
        self.jwt
            .as_deref()
            .and_then(|jwt| MerchantClaims::from_token(jwt).ok())
    }

    fn log_with_reference(&self, severity: Severity, message: &str, response: &GatewayResponse) {
        let site_reference = self.current_claims().and_then(|c| c.payload.site_reference);
        self.monitor.log(
            severity,
            message,
            &[
                ("reference", response.request_reference.as_deref()),
                ("siteReference", site_reference.as_deref()),
            ],
        );
    }

    fn reset_jwt(&mut self, jwt: &str) {
        self.jwt = Some(jwt.to_string());
        self.original_jwt = self.jwt.clone();
    }

    fn set_state(&mut self, state: TransactionState) {
        self.state = state;
    }

    /// Restore the original token and hand the outcome back.
    fn complete(&mut self, outcome: TransactionOutcome) -> TransactionOutcome {
        self.jwt = self.original_jwt.clone();
        self.set_state(TransactionState::Complete);
        if let Some(error) = &outcome.error {
            debug!("Transaction completed with error {}: {}", error.code(), error);
        }
        outcome
    }
}

impl fmt::Debug for PaymentTransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentTransactionManager")
            .field("state", &self.state)
            .field("is_live", &self.is_live)
            .field("endpoint", &self.client.endpoint().as_str())
            .finish()
    }
}
