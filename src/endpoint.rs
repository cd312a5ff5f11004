use crate::errors::ClientError;
use std::sync::OnceLock;
use url::{Host, Url};

pub const PRODUCTION_URL: &str = "https://api.fraudmetrix.cn/riskService";
pub const TEST_URL: &str = "https://apitest.fraudmetrix.cn/riskService";

/// Pure mapping from the dev-mode flag to the service URL.
pub fn resolve(dev_mode: bool) -> &'static str {
    if dev_mode {
        TEST_URL
    } else {
        PRODUCTION_URL
    }
}

/// Checks an endpoint override.
///
/// Requests carry the account secret, so only `https` is accepted. Plain
/// `http` is allowed for loopback hosts (local proxies, test servers), where
/// the traffic never leaves the machine.
pub fn validate_override(url: &str) -> Result<Url, ClientError> {
    let parsed =
        Url::parse(url).map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback(&parsed) => Ok(parsed),
        "http" => Err(ClientError::InvalidEndpoint(format!(
            "{}: plain http is only allowed for loopback hosts",
            url
        ))),
        other => Err(ClientError::InvalidEndpoint(format!(
            "{}: unsupported scheme '{}'",
            url, other
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}

/// Lazily resolved, cached service endpoint.
///
/// The flag is fixed at construction, so the URL is computed once on first
/// use and reused for the client's lifetime.
#[derive(Debug)]
pub struct Endpoint {
    dev_mode: bool,
    override_url: Option<String>,
    resolved: OnceLock<String>,
}

impl Endpoint {
    pub fn new(dev_mode: bool) -> Self {
        Self {
            dev_mode,
            override_url: None,
            resolved: OnceLock::new(),
        }
    }

    /// Uses `url` verbatim instead of the production/test hosts.
    pub fn with_override(dev_mode: bool, url: &str) -> Result<Self, ClientError> {
        validate_override(url)?;

        Ok(Self {
            dev_mode,
            override_url: Some(url.to_string()),
            resolved: OnceLock::new(),
        })
    }

    pub fn url(&self) -> &str {
        self.resolved.get_or_init(|| {
            let url = self
                .override_url
                .clone()
                .unwrap_or_else(|| resolve(self.dev_mode).to_string());
            tracing::debug!("Resolved risk service endpoint: {}", url);
            url
        })
    }
}
