use crate::config::{ClientConfig, TrustAnchor};
use crate::errors::{ClientError, ResultExt};
use reqwest::blocking::Client;
use reqwest::Certificate;
use std::path::Path;

/// One synchronous form POST.
///
/// Implementations swallow every transport-level failure (connection
/// refused, TLS failure, timeout) into `None`; callers only distinguish
/// "usable body" from "no usable response".
pub trait Transport: Send + Sync {
    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Option<String>;
}

/// HTTPS transport backed by a blocking reqwest client.
///
/// Peer and hostname verification are always on. With a bundle trust anchor
/// the built-in roots are disabled, so only the bundle's CAs are trusted.
/// Redirects are not followed, so the credentials only ever go to the
/// configured endpoint. Idle connections are not kept, so every call acquires
/// and releases its own connection.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout);

        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if let TrustAnchor::Bundle(ref path) = config.trust_anchor {
            builder = builder.tls_built_in_root_certs(false);
            for certificate in load_bundle(path)? {
                builder = builder.add_root_certificate(certificate);
            }
            tracing::debug!("Pinned trust anchors from {}", path.display());
        }

        let client = builder
            .build()
            .context("Failed to create risk service HTTP client")?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Option<String> {
        if fields.is_empty() {
            tracing::warn!("Refusing to send an empty request to {}", url);
            return None;
        }

        let response = match self.client.post(url).form(fields).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Risk service request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Risk service returned HTTP {}", status);
        }

        match response.text() {
            Ok(body) if !body.trim().is_empty() => Some(body),
            Ok(_) => {
                tracing::warn!("Risk service returned an empty body (HTTP {})", status);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read risk service response: {}", e);
                None
            }
        }
    }
}

fn load_bundle(path: &Path) -> Result<Vec<Certificate>, ClientError> {
    let pem = std::fs::read(path).map_err(|source| ClientError::TrustAnchorRead {
        path: path.to_path_buf(),
        source,
    })?;

    let certificates =
        Certificate::from_pem_bundle(&pem).map_err(|e| ClientError::TrustAnchorInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if certificates.is_empty() {
        return Err(ClientError::TrustAnchorInvalid {
            path: path.to_path_buf(),
            reason: "no certificates found".to_string(),
        });
    }

    Ok(certificates)
}
