use crate::error::TelemetryError;
use configuration::{LogFormat, LoggingSettings};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when it is set; otherwise the configured filter applies.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    match settings.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}
