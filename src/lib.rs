//! Risk Decision Client Library
//!
//! Client for a remote fraud-risk decisioning service. Callers describe a
//! business event (registration, login, SMS send, loan application,
//! marketing, trade, payment, card binding, profile modification) and get
//! back whether the service approved it, with a structured reason when it
//! did not.
//!
//! # Modules
//!
//! - `core`: Domain-layer re-exports (events, fields, outcomes, errors).
//! - `integrations`: Transport-layer re-exports.
//! - `client`: The `DecisionClient`.
//! - `config`: Credentials and client configuration.
//! - `endpoint`: Service endpoint resolution.
//! - `errors`: Construction-time error types.
//! - `events`: Event types and their fixed identifiers.
//! - `fields`: Request field model and form encoding.
//! - `ip`: Caller IP collaborator.
//! - `outcome`: Response decoding.
//! - `transport`: HTTPS transport.
//!
//! # Example
//!
//! ```no_run
//! use rust_risk_client::client::DecisionClient;
//! use rust_risk_client::config::ClientConfig;
//! use rust_risk_client::fields::FieldMap;
//! use rust_risk_client::ip::StaticIp;
//!
//! let config = ClientConfig::new("partner", "secret").dev_mode(true);
//! let client = DecisionClient::new(config, StaticIp("203.0.113.7".to_string()))?;
//!
//! let outcome = client.check_login("alice", FieldMap::new().with("state", 0));
//! if !outcome.success {
//!     println!("rejected: {:?} {:?}", outcome.error_code(), outcome.error_message());
//! }
//! # Ok::<(), rust_risk_client::errors::ClientError>(())
//! ```

pub mod core;
pub mod integrations;

pub mod client;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod events;
pub mod fields;
pub mod ip;
pub mod outcome;
pub mod transport;

pub use client::DecisionClient;
pub use config::{ClientConfig, Credentials, TrustAnchor};
pub use outcome::{DecisionError, DecisionOutcome};
