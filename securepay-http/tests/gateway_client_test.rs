//! Integration tests for the gateway client

use async_trait::async_trait;
use bytes::Bytes;
use securepay_http::*;
use securepay_token::encode;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn response_token() -> String {
    encode(
        &json!({"alg": "HS256", "typ": "JWT"}),
        &json!({
            "iss": "webservices.securetrading.net",
            "payload": {
                "jwt": "next.request.token",
                "requestreference": "W23-fj9fs8",
                "response": [{
                    "errorcode": "0",
                    "errormessage": "Ok",
                    "requesttypedescription": "JSINIT",
                    "threedinit": "init-token",
                    "cachetoken": "cache-123"
                }]
            }
        }),
        "gateway-signature",
    )
    .unwrap()
}

fn config(base_url: &str, retry: RetryPolicy) -> GatewayClientConfig {
    GatewayClientConfig::builder(GatewayType::Devbox, "merchant@example.com")
        .base_url(base_url)
        .retry(retry)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_token_exchange_against_mock_server() {
    let server = MockServer::start().await;
    let token = response_token();

    Mock::given(method("POST"))
        .and(path("/jwt/"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "alias": "merchant@example.com",
            "jwt": "merchant.request.token",
            "version": "1.00",
            "acceptcustomeroutput": "2.00",
            "request": [{"requesttypedescriptions": ["JSINIT"]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": token})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(config(&server.uri(), RetryPolicy::default())).unwrap();
    let requests = [json!({"requesttypedescriptions": ["JSINIT"]})];
    let response = client.send("merchant.request.token", &requests).await.unwrap();

    assert_eq!(response.jwt, token);
    assert_eq!(response.new_jwt, "next.request.token");
    assert_eq!(response.request_reference.as_deref(), Some("W23-fj9fs8"));
    assert_eq!(response.responses[0].cache_token.as_deref(), Some("cache-123"));
}

#[tokio::test]
async fn test_server_error_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jwt/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(config(&server.uri(), RetryPolicy::default())).unwrap();
    let error = client.send("token", &[json!({})]).await.unwrap_err();

    assert!(matches!(error, GatewayError::UnacceptableStatusCode(503)));
    assert_eq!(error.code(), 12400);
}

#[tokio::test]
async fn test_body_without_jwt_is_a_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jwt/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client = GatewayClient::new(config(&server.uri(), RetryPolicy::default())).unwrap();
    let error = client.send("token", &[json!({})]).await.unwrap_err();

    assert!(matches!(error, GatewayError::ResponseParse(_)));
    assert_eq!(error.code(), 13000);
}

/// Fails with the scripted errors in order, then answers with a valid body
struct ScriptedTransport {
    attempts: AtomicU32,
    failures: u32,
    kind: TransportErrorKind,
    latency: Duration,
}

impl ScriptedTransport {
    fn failing(failures: u32, kind: TransportErrorKind) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            failures,
            kind,
            latency: Duration::ZERO,
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayTransport for ScriptedTransport {
    async fn send(&self, _url: &Url, _body: Bytes) -> Result<Bytes> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if attempt < self.failures {
            return Err(TransportError::new(self.kind, "scripted failure").into());
        }
        let body = serde_json::to_vec(&json!({"jwt": response_token()})).unwrap();
        Ok(Bytes::from(body))
    }
}

fn scripted_client(transport: Arc<ScriptedTransport>, retry: RetryPolicy) -> GatewayClient {
    GatewayClient::with_transport(config("https://webservices.securetrading.net", retry), transport)
        .unwrap()
}

#[tokio::test]
async fn test_always_transient_transport_is_attempted_max_retries_plus_one_times() {
    let transport = Arc::new(ScriptedTransport::failing(u32::MAX, TransportErrorKind::TimedOut));
    let client = scripted_client(transport.clone(), RetryPolicy::new(3, Duration::from_secs(40)));

    let error = client.send("token", &[json!({})]).await.unwrap_err();

    assert_eq!(transport.attempts(), 4);
    match error {
        GatewayError::Transport(e) => assert_eq!(e.kind, TransportErrorKind::TimedOut),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    let transport = Arc::new(ScriptedTransport::failing(
        2,
        TransportErrorKind::NetworkConnectionLost,
    ));
    let client = scripted_client(transport.clone(), RetryPolicy::default());

    let response = client.send("token", &[json!({})]).await.unwrap();

    assert_eq!(transport.attempts(), 3);
    assert_eq!(response.new_jwt, "next.request.token");
}

#[tokio::test]
async fn test_non_transient_failure_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::failing(u32::MAX, TransportErrorKind::Other));
    let client = scripted_client(transport.clone(), RetryPolicy::default());

    let error = client.send("token", &[json!({})]).await.unwrap_err();

    assert_eq!(transport.attempts(), 1);
    assert!(!error.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_retry_window_closes() {
    let transport = Arc::new(
        ScriptedTransport::failing(u32::MAX, TransportErrorKind::CannotConnectToHost)
            .with_latency(Duration::from_secs(15)),
    );
    let retry = RetryPolicy::new(20, Duration::from_secs(40))
        .with_max_request_time(Duration::from_secs(600));
    let client = scripted_client(transport.clone(), retry);

    let error = client.send("token", &[json!({})]).await.unwrap_err();

    // failures land at 15s, 30s and 45s; the third is past the window
    assert_eq!(transport.attempts(), 3);
    assert!(error.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_request_ceiling() {
    let transport = Arc::new(
        ScriptedTransport::failing(0, TransportErrorKind::Other)
            .with_latency(Duration::from_secs(3600)),
    );
    let client = scripted_client(transport, RetryPolicy::default());

    let error = client.send("token", &[json!({})]).await.unwrap_err();

    assert!(matches!(error, GatewayError::Timeout(d) if d == Duration::from_secs(60)));
    assert!(error.is_timeout());
    assert_eq!(error.code(), 11000);
}

#[test]
fn test_blocking_exchange_with_tokio_test() {
    let transport = Arc::new(ScriptedTransport::failing(0, TransportErrorKind::Other));
    let client = scripted_client(transport, RetryPolicy::no_retry());

    let response = tokio_test::block_on(client.send("token", &[json!({})])).unwrap();
    assert_eq!(response.responses.len(), 1);
}
