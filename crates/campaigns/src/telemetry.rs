//! Tracing and metrics installation.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, ServiceConfig};

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(#[from] TryInitError),

    /// A global metrics recorder was already installed or could not be built.
    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),
}

/// Installs the global tracing subscriber.
///
/// The filter comes from `config.log_level`, falling back to `info` when the
/// directive does not parse.
pub fn init_tracing(config: &ServiceConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
    }
    Ok(())
}

/// Installs the Prometheus recorder behind the `metrics` facade.
///
/// The returned handle renders the current metrics in the Prometheus text
/// format.
pub fn install_metrics_recorder() -> Result<PrometheusHandle, TelemetryError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}
