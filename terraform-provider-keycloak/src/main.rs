use keycloak_domain::{
    application::ports::{ConfigurationPort, LogFormat, LoggingConfig},
    infrastructure::adapters::EnvConfigurationAdapter,
};
use terraform_provider_keycloak::KeycloakProvider;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "terraform_provider_keycloak={level},keycloak_domain={level}",
            level = logging.level
        )
        .into()
    });

    // Stdout carries the protocol, so logs go to stderr.
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Pretty => registry.with(layer.pretty()).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
        LogFormat::Full => registry.with(layer).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging = EnvConfigurationAdapter::new()
        .map(|adapter| adapter.get_logging_config().clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let provider = KeycloakProvider::new();
    info!(
        "Keycloak provider ready with {} resource types",
        provider.resource_types().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = provider.handle_request(line).await;
        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;

        if is_stop(line) {
            info!("Stop requested, shutting down");
            break;
        }
    }

    if let Err(err) = stdout.shutdown().await {
        error!("Failed to close stdout: {}", err);
    }
    Ok(())
}

fn is_stop(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|request| request.get("method").and_then(|m| m.as_str()).map(str::to_string))
        .is_some_and(|method| method == "StopProvider")
}
