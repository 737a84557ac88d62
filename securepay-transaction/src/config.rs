//! SDK configuration.
//!
//! A [`SdkConfig`] can be built in code, loaded from a JSON, TOML or env
//! file with [`ConfigLoader`], or read from `SECUREPAY_*` environment
//! variables with [`EnvLoader`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use securepay_http::{GatewayType, RetryPolicy};
use securepay_log::MonitoringContext;
use securepay_threeds::{ChallengeConfig, UiCustomization};

use crate::{ConfigError, InitError};

/// Prefix of the environment variables read by [`EnvLoader`].
pub const ENV_PREFIX: &str = "SECUREPAY";

type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Merchant account environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" | "live" => Some(Self::Production),
            "staging" | "test" => Some(Self::Staging),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Retry bounds in file-friendly units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub max_retry_interval_secs: u64,
    pub max_request_time_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            max_retry_interval_secs: policy.max_retry_interval.as_secs(),
            max_request_time_secs: policy.max_request_time.as_secs(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.max_retry_interval_secs),
        )
        .with_max_request_time(Duration::from_secs(self.max_request_time_secs))
    }
}

/// SDK configuration
///
/// The account fields are optional so that an incomplete configuration is
/// reported by [`SdkConfig::validate`] rather than rejected while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Site alias the gateway knows the merchant by
    pub username: Option<String>,
    pub gateway: Option<GatewayType>,
    pub environment: Option<Environment>,
    pub locale: Option<String>,
    pub retry: RetrySettings,
    /// Replaces the gateway's base URL
    pub base_url: Option<String>,
    pub ui_customization: Option<UiCustomization>,
    pub dark_ui_customization: Option<UiCustomization>,
    pub monitoring_enabled: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            username: None,
            gateway: None,
            environment: None,
            locale: None,
            retry: RetrySettings::default(),
            base_url: None,
            ui_customization: None,
            dark_ui_customization: None,
            monitoring_enabled: true,
        }
    }
}

impl SdkConfig {
    pub fn builder() -> SdkConfigBuilder {
        SdkConfigBuilder::default()
    }

    /// Check the account fields, reporting the first missing one.
    pub fn validate(&self) -> std::result::Result<(&str, GatewayType, Environment), InitError> {
        let username = self
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(InitError::MissingUsername)?;
        let gateway = self.gateway.ok_or(InitError::MissingGateway)?;
        let environment = self.environment.ok_or(InitError::MissingEnvironment)?;
        Ok((username, gateway, environment))
    }

    pub fn is_live(&self) -> bool {
        self.environment.is_some_and(|e| e.is_live())
    }

    /// Vendor challenge configuration with this configuration's overrides
    pub fn challenge_config(&self) -> ChallengeConfig {
        let mut config = ChallengeConfig::new(self.is_live());
        if let Some(ui) = &self.ui_customization {
            config = config.with_ui_customization(ui.clone());
        }
        if let Some(ui) = &self.dark_ui_customization {
            config = config.with_dark_ui_customization(ui.clone());
        }
        config
    }

    /// Context attached to monitoring events
    pub fn monitoring_context(&self) -> MonitoringContext {
        let gateway_url = self
            .base_url
            .clone()
            .or_else(|| self.gateway.map(|g| g.base_url()));
        MonitoringContext {
            environment: self.environment.map(|e| e.as_str().to_string()),
            gateway_type: self.gateway.map(|g| g.as_str().to_string()),
            gateway_url,
            username: self.username.clone(),
        }
    }

    /// Build a configuration from unprefixed, lowercase variable names.
    pub fn from_vars(vars: &HashMap<String, String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        config.username = vars.get("username").cloned();
        config.locale = vars.get("locale").cloned();
        config.base_url = vars.get("base_url").cloned();

        if let Some(value) = vars.get("gateway") {
            config.gateway = Some(GatewayType::from_str(value).ok_or_else(|| {
                ConfigError::Validation(format!("Unknown gateway: {}", value))
            })?);
        }
        if let Some(value) = vars.get("environment") {
            config.environment = Some(Environment::from_str(value).ok_or_else(|| {
                ConfigError::Validation(format!("Unknown environment: {}", value))
            })?);
        }
        if let Some(value) = vars.get("max_retries") {
            config.retry.max_retries = parse_number(value, "max_retries")?;
        }
        if let Some(value) = vars.get("max_retry_interval_secs") {
            config.retry.max_retry_interval_secs = parse_number(value, "max_retry_interval_secs")?;
        }
        if let Some(value) = vars.get("max_request_time_secs") {
            config.retry.max_request_time_secs = parse_number(value, "max_request_time_secs")?;
        }
        if let Some(value) = vars.get("monitoring") {
            config.monitoring_enabled = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Parse(format!("{} is not a number: {}", key, value)))
}

/// Builder for [`SdkConfig`]
#[derive(Debug, Default)]
pub struct SdkConfigBuilder {
    config: SdkConfig,
}

impl SdkConfigBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    pub fn gateway(mut self, gateway: GatewayType) -> Self {
        self.config.gateway = Some(gateway);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = Some(environment);
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = Some(locale.into());
        self
    }

    pub fn retry(mut self, retry: RetrySettings) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn ui_customization(mut self, customization: UiCustomization) -> Self {
        self.config.ui_customization = Some(customization);
        self
    }

    pub fn dark_ui_customization(mut self, customization: UiCustomization) -> Self {
        self.config.dark_ui_customization = Some(customization);
        self
    }

    pub fn monitoring(mut self, enabled: bool) -> Self {
        self.config.monitoring_enabled = enabled;
        self
    }

    pub fn build(self) -> SdkConfig {
        self.config
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::Load("No file extension found".to_string()))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::Load(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> ConfigResult<SdkConfig> {
        let content = fs::read_to_string(path)?;
        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> ConfigResult<SdkConfig> {
        match self.format {
            FileFormat::Json => from_value(self.parse_json(content)?),
            FileFormat::Toml => from_value(self.parse_toml(content)?),
            FileFormat::Env => SdkConfig::from_vars(&self.parse_env(content)),
        }
    }

    fn parse_json(&self, content: &str) -> ConfigResult<Value> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))
    }

    fn parse_toml(&self, content: &str) -> ConfigResult<Value> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;

        serde_json::to_value(toml_value)
            .map_err(|e| ConfigError::Parse(format!("TOML to JSON conversion error: {}", e)))
    }

    fn parse_env(&self, content: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                vars.insert(unprefixed(key.trim()), value.to_string());
            }
        }

        vars
    }
}

fn from_value(value: Value) -> ConfigResult<SdkConfig> {
    serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn unprefixed(key: &str) -> String {
    key.strip_prefix(ENV_PREFIX)
        .map(|rest| rest.trim_start_matches('_'))
        .unwrap_or(key)
        .to_lowercase()
}

/// Environment variable loader
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Read the configuration, loading a `.env` file first when one exists
    pub fn load(&self) -> ConfigResult<SdkConfig> {
        dotenvy::dotenv().ok();
        SdkConfig::from_vars(&self.vars())
    }

    /// Read the configuration after loading the given env file
    pub fn load_from(&self, path: impl AsRef<Path>) -> ConfigResult<SdkConfig> {
        dotenvy::from_path(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        SdkConfig::from_vars(&self.vars())
    }

    /// Prefixed variables, keyed by their unprefixed lowercase name
    pub fn vars(&self) -> HashMap<String, String> {
        let prefix = format!("{}_", self.prefix);
        env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_lowercase(), value))
            })
            .collect()
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> ConfigResult<String> {
        let full_key = format!("{}_{}", self.prefix, key.to_uppercase());
        env::var(&full_key).map_err(ConfigError::Env)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_first_missing_field() {
        let config = SdkConfig::default();
        assert!(matches!(config.validate(), Err(InitError::MissingUsername)));

        let config = SdkConfig::builder().username("merchant").build();
        assert!(matches!(config.validate(), Err(InitError::MissingGateway)));

        let config = SdkConfig::builder()
            .username("merchant")
            .gateway(GatewayType::Eu)
            .build();
        assert!(matches!(config.validate(), Err(InitError::MissingEnvironment)));

        let config = SdkConfig::builder()
            .username("merchant")
            .gateway(GatewayType::Eu)
            .environment(Environment::Staging)
            .build();
        let (username, gateway, environment) = config.validate().unwrap();
        assert_eq!(username, "merchant");
        assert_eq!(gateway, GatewayType::Eu);
        assert_eq!(environment, Environment::Staging);
    }

    #[test]
    fn test_retry_defaults() {
        let policy = RetrySettings::default().policy();
        assert_eq!(policy.max_retries, 20);
        assert_eq!(policy.max_retry_interval, Duration::from_secs(40));
        assert_eq!(policy.max_request_time, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let config = loader
            .parse(
                r#"{
                    "username": "merchant",
                    "gateway": "euBackup",
                    "environment": "production",
                    "retry": {"max_retries": 3}
                }"#,
            )
            .unwrap();

        assert_eq!(config.gateway, Some(GatewayType::EuBackup));
        assert!(config.is_live());
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_request_time_secs, 60);
        assert!(config.monitoring_enabled);
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let config = loader
            .parse(
                r#"
                    username = "merchant"
                    gateway = "us"
                    environment = "staging"
                    locale = "en_GB"
                    monitoring_enabled = false

                    [ui_customization.toolbar]
                    header_text = "Verify"
                "#,
            )
            .unwrap();

        assert_eq!(config.gateway, Some(GatewayType::Us));
        assert_eq!(config.locale.as_deref(), Some("en_GB"));
        assert!(!config.monitoring_enabled);
        let challenge = config.challenge_config();
        assert_eq!(challenge.toolbar().header_text.as_deref(), Some("Verify"));
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let config = loader
            .parse(
                r#"
                    # merchant account
                    SECUREPAY_USERNAME="merchant"
                    SECUREPAY_GATEWAY=devbox
                    SECUREPAY_ENVIRONMENT=staging
                    SECUREPAY_MAX_RETRIES=5
                "#,
            )
            .unwrap();

        assert_eq!(config.username.as_deref(), Some("merchant"));
        assert_eq!(config.gateway, Some(GatewayType::Devbox));
        assert_eq!(config.retry.max_retries, 5);
    }

    #[test]
    fn test_parse_env_rejects_unknown_values() {
        let loader = ConfigLoader::new(FileFormat::Env);
        assert!(matches!(
            loader.parse("SECUREPAY_GATEWAY=mars"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            loader.parse("SECUREPAY_MAX_RETRIES=many"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("env"), Some(FileFormat::Env));
        assert_eq!(FileFormat::from_extension("yaml"), None);
        assert!(ConfigLoader::auto("securepay.toml").is_ok());
        assert!(matches!(
            ConfigLoader::auto("securepay"),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_monitoring_context() {
        let config = SdkConfig::builder()
            .username("merchant")
            .gateway(GatewayType::Eu)
            .environment(Environment::Production)
            .build();
        let context = config.monitoring_context();
        assert_eq!(context.gateway_type.as_deref(), Some("eu"));
        assert_eq!(
            context.gateway_url.as_deref(),
            Some("https://webservices.securetrading.net")
        );
        assert_eq!(context.environment.as_deref(), Some("production"));
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::new("SECUREPAY_TEST");
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
        assert_eq!(loader.load_var_or("MISSING_VAR_67890", "default"), "default");
    }
}
