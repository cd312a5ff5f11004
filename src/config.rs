use crate::endpoint::validate_override;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request time budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// File name of the CA bundle shipped next to the crate.
pub const DEFAULT_CA_BUNDLE: &str = "cacert.pem";

/// Account credentials issued by the risk service.
///
/// Attached to every outgoing request and never logged.
#[derive(Clone)]
pub struct Credentials {
    pub partner_code: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(partner_code: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            partner_code: partner_code.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("partner_code", &self.partner_code)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Where the transport takes its TLS trust anchors from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    /// PEM bundle; the only certificates trusted for the connection.
    Bundle(PathBuf),
    /// The TLS backend's built-in roots.
    PlatformRoots,
}

impl Default for TrustAnchor {
    /// `cacert.pem` in the crate's install directory, independent of the
    /// process working directory.
    fn default() -> Self {
        TrustAnchor::Bundle(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CA_BUNDLE))
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Selects the test host instead of production.
    pub dev_mode: bool,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    pub trust_anchor: TrustAnchor,
    /// Replaces the resolved endpoint entirely (staging proxies, tests).
    pub endpoint_override: Option<String>,
}

impl ClientConfig {
    pub fn new(partner_code: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(partner_code, secret_key),
            dev_mode: false,
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: None,
            trust_anchor: TrustAnchor::default(),
            endpoint_override: None,
        }
    }

    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn trust_anchor(mut self, trust_anchor: TrustAnchor) -> Self {
        self.trust_anchor = trust_anchor;
        self
    }

    pub fn endpoint_override(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    /// Loads configuration from the environment (and `.env` if present).
    ///
    /// `RISK_PARTNER_CODE` and `RISK_SECRET_KEY` are required. Optional:
    /// `RISK_DEV_MODE`, `RISK_TIMEOUT_MS` (0 disables the timeout),
    /// `RISK_USER_AGENT`, `RISK_CA_BUNDLE`, `RISK_ENDPOINT` (https, or plain
    /// http on a loopback host).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let partner_code = required_var("RISK_PARTNER_CODE")?;
        let secret_key = required_var("RISK_SECRET_KEY")?;

        let mut config = Self::new(partner_code, secret_key);

        if let Some(flag) = optional_var("RISK_DEV_MODE") {
            config.dev_mode = parse_flag(&flag)
                .ok_or_else(|| anyhow::anyhow!("RISK_DEV_MODE must be true/false/1/0"))?;
        }

        if let Some(ms) = optional_var("RISK_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                anyhow::anyhow!("RISK_TIMEOUT_MS must be a whole number of milliseconds")
            })?;
            config.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        config.user_agent = optional_var("RISK_USER_AGENT");

        if let Some(path) = optional_var("RISK_CA_BUNDLE") {
            config.trust_anchor = TrustAnchor::Bundle(PathBuf::from(path));
        }

        if let Some(endpoint) = optional_var("RISK_ENDPOINT") {
            validate_override(&endpoint)
                .map_err(|e| anyhow::anyhow!("RISK_ENDPOINT is not usable: {}", e))?;
            config.endpoint_override = Some(endpoint);
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Partner code: {}", config.credentials.partner_code);
        tracing::debug!("Dev mode: {}", config.dev_mode);
        tracing::debug!("Timeout: {:?}", config.timeout);
        if let Some(ref endpoint) = config.endpoint_override {
            tracing::info!("Endpoint override configured: {}", endpoint);
        }

        Ok(config)
    }
}

fn required_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("partner", "secret");
        assert!(!config.dev_mode);
        assert_eq!(config.timeout, Some(Duration::from_millis(500)));
        assert!(config.user_agent.is_none());
        match config.trust_anchor {
            TrustAnchor::Bundle(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with(DEFAULT_CA_BUNDLE));
            }
            other => panic!("unexpected trust anchor: {:?}", other),
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("partner", "top-secret");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("partner"));
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
