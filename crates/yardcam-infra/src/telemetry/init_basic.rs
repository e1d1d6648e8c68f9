use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yardcam_core::LogFormat;

const DEFAULT_FILTER: &str = "yardcam=debug,tower_http=debug";

/// Initialize console tracing for a service process
pub fn init_telemetry(
    service_name: &str,
    environment: &str,
    log_format: LogFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()?,
    }

    tracing::info!(
        service = %service_name,
        environment = %environment,
        log_format = ?log_format,
        "Tracing initialized"
    );
    Ok(())
}
