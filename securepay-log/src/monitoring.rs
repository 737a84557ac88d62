//! Monitoring events.
//!
//! A [`Monitor`] turns a checkpoint in the payment flow (a missing token,
//! an unexpected gateway answer, a rejected security check) into a
//! [`MonitoringEvent`] tagged with the merchant and gateway context, and
//! hands it to an [`EventSink`].

use crate::Level;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Placeholder for context values the merchant has not configured.
pub const UNDEFINED: &str = "undefined";

/// Gateway type for which events are never captured.
const DEVELOPMENT_GATEWAY: &str = "devbox";

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }

    fn level(&self) -> Level {
        match self {
            Severity::Info => Level::Info,
            Severity::Error => Level::Error,
        }
    }
}

/// Merchant and gateway details attached to every event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitoringContext {
    pub environment: Option<String>,
    pub gateway_type: Option<String>,
    pub gateway_url: Option<String>,
    pub username: Option<String>,
}

impl MonitoringContext {
    fn username_or_undefined(&self) -> String {
        self.username.clone().unwrap_or_else(|| UNDEFINED.to_string())
    }
}

/// A captured monitoring event
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonitoringEvent {
    pub level: Severity,
    pub message: String,
    pub logger: String,
    pub timestamp: String,
    pub tags: BTreeMap<String, String>,
    pub user: String,
    pub breadcrumbs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub release: String,
}

/// Destination for monitoring events
pub trait EventSink: Send + Sync {
    fn capture(&self, event: &MonitoringEvent);
}

const TARGET: &str = "securepay::monitoring";

/// Writes events as JSON through the logging layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn capture(&self, event: &MonitoringEvent) {
        match serde_json::to_value(event) {
            Ok(value) => crate::log_event(event.level.level(), TARGET, &event.message, value),
            Err(e) => crate::log(
                Level::Error,
                TARGET,
                &format!("Failed to serialize monitoring event: {}", e),
            ),
        }
    }
}

/// Keeps events in memory; used by tests to assert on checkpoints.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<MonitoringEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured events
    pub fn events(&self) -> Vec<MonitoringEvent> {
        self.events.lock().clone()
    }

    /// Messages of the captured events, in capture order
    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn capture(&self, event: &MonitoringEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Builds and dispatches monitoring events.
#[derive(Clone)]
pub struct Monitor {
    context: MonitoringContext,
    sink: Arc<dyn EventSink>,
    enabled: bool,
}

impl Monitor {
    /// Create a monitor that captures into the given sink
    pub fn new(context: MonitoringContext, sink: Arc<dyn EventSink>) -> Self {
        Self {
            context,
            sink,
            enabled: true,
        }
    }

    /// Create a monitor that writes through the logging layer
    pub fn with_log_sink(context: MonitoringContext) -> Self {
        Self::new(context, Arc::new(LogSink))
    }

    /// Create a monitor that drops every event
    pub fn disabled() -> Self {
        Self {
            context: MonitoringContext::default(),
            sink: Arc::new(LogSink),
            enabled: false,
        }
    }

    pub fn context(&self) -> &MonitoringContext {
        &self.context
    }

    /// Replace the context, e.g. once the configuration has been validated
    pub fn with_context(mut self, context: MonitoringContext) -> Self {
        self.context = context;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether events reach the sink
    pub fn is_capturing(&self) -> bool {
        self.enabled && self.context.gateway_type.as_deref() != Some(DEVELOPMENT_GATEWAY)
    }

    /// Report a checkpoint.
    ///
    /// `additionals` with a `None` value are left out of the breadcrumb data.
    pub fn log(&self, severity: Severity, message: &str, additionals: &[(&str, Option<&str>)]) {
        if !self.is_capturing() {
            return;
        }
        let event = self.build_event(severity, message, additionals);
        self.sink.capture(&event);
    }

    /// Build the event without dispatching it
    pub fn build_event(
        &self,
        severity: Severity,
        message: &str,
        additionals: &[(&str, Option<&str>)],
    ) -> MonitoringEvent {
        let now = Utc::now().to_rfc3339();
        let username = self.context.username_or_undefined();

        let mut tags = BTreeMap::new();
        tags.insert("level".to_string(), severity.as_str().to_string());
        tags.insert("os.name".to_string(), std::env::consts::OS.to_string());
        if let Some(gateway_type) = &self.context.gateway_type {
            tags.insert("gateway.type".to_string(), gateway_type.clone());
        }
        if let Some(gateway_url) = &self.context.gateway_url {
            tags.insert("gateway.url".to_string(), gateway_url.clone());
        }

        let mut breadcrumbs: BTreeMap<String, String> = additionals
            .iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string())))
            .collect();
        breadcrumbs.insert("username".to_string(), username.clone());
        breadcrumbs.insert("timestamp".to_string(), now.clone());

        MonitoringEvent {
            level: severity,
            message: message.to_string(),
            logger: message.to_string(),
            timestamp: now,
            tags,
            user: username,
            breadcrumbs,
            environment: self.context.environment.clone(),
            release: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("context", &self.context)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::with_log_sink(MonitoringContext::default())
    }
}
