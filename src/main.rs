//! `risk-check`: submit one event to the risk service from the command line.
//!
//! ```text
//! risk-check <event> [json-fields]
//! ```
//!
//! `event` is a short name (`login`, `trade`, ...) or a full event id.
//! `json-fields` is a JSON object holding the event's required fields; every
//! other key is sent as an optional attribute. Configuration comes from the
//! environment (see `ClientConfig::from_env`), the caller IP from
//! `RISK_CALLER_IP`.

use rust_risk_client::client::DecisionClient;
use rust_risk_client::config::ClientConfig;
use rust_risk_client::events::{DynamicEvent, EventKind};
use rust_risk_client::fields::FieldMap;
use rust_risk_client::ip::StaticIp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: risk-check <event> [json-fields]";

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_risk_client=info,risk_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let kind: EventKind = args
        .next()
        .ok_or_else(|| anyhow::anyhow!(USAGE))?
        .parse()?;
    let raw_fields = args.next().unwrap_or_else(|| "{}".to_string());

    let json: serde_json::Value = serde_json::from_str(&raw_fields)
        .map_err(|e| anyhow::anyhow!("json-fields is not valid JSON: {}", e))?;
    let fields = FieldMap::try_from(json)?;
    let (event, options) = DynamicEvent::split(kind, fields)?;

    let config = ClientConfig::from_env()?;
    let caller_ip = std::env::var("RISK_CALLER_IP").unwrap_or_else(|_| "127.0.0.1".to_string());
    let client = DecisionClient::new(config, StaticIp(caller_ip))?;
    tracing::info!("Submitting {} event to {}", kind, client.endpoint());

    let outcome = client.check(&event, options);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }

    Ok(())
}
