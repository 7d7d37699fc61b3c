//! Bargain Pilot binary entry point.
//!
//! Reads one negotiation message from stdin, runs it through the pipeline
//! and prints the resulting decision as JSON on stdout. Transport back to
//! the assessor is left to whatever wraps this process.

use std::io::Read;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bargain_pilot::adapters::{AnthropicConfig, AnthropicOracle};
use bargain_pilot::application::NegotiationHandler;
use bargain_pilot::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    if !config.oracle.has_api_key() {
        tracing::warn!("ANTHROPIC_API_KEY not set - oracle calls will fail");
    }
    tracing::info!(model = %config.oracle.model, "starting bargain-pilot");

    let oracle_config = AnthropicConfig::new(
        config.oracle.anthropic_api_key.clone().unwrap_or_default(),
    )
    .with_model(config.oracle.model.clone())
    .with_timeout(config.oracle.timeout())
    .with_max_output_tokens(config.oracle.max_output_tokens);

    let oracle = Arc::new(AnthropicOracle::new(oracle_config));
    let handler = NegotiationHandler::new(oracle);

    let mut message = String::new();
    std::io::stdin().read_to_string(&mut message)?;
    tracing::info!(
        preview = %message.chars().take(500).collect::<String>(),
        "received message"
    );

    let decision = handler.handle(&message).await;
    let rendered = serde_json::to_string_pretty(&decision)?;
    tracing::info!(%rendered, "sending decision");
    println!("{rendered}");

    Ok(())
}
