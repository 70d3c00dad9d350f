use clap::Parser;
use iso_gateway::{AdapterSet, GatewayEnv, Submitter, TransportError};
use std::sync::Arc;
use tracing::Level;
use url::Url;

use crate::telemetry::{self, TelemetryGuard};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl From<&LogLevel> for Level {
    fn from(log_level: &LogLevel) -> Self {
        (*log_level).into()
    }
}

#[derive(Parser, Debug, Clone)]
pub struct Env {
    #[clap(long, env, default_value = "info")]
    pub log_level: LogLevel,
    #[clap(flatten)]
    pub gateway: GatewayEnv,
    /// OTLP/HTTP traces endpoint (optional)
    #[clap(long, env)]
    pub otlp_endpoint: Option<Url>,
    /// Service name reported to the OTLP collector
    #[clap(long, env, default_value = "iso-submit")]
    pub otlp_service_name: String,
    /// `deployment.environment` attribute on exported spans
    #[clap(long, env, default_value = "production")]
    pub otlp_environment: String,
}

impl Env {
    pub fn submitter(&self) -> Result<Submitter, TransportError> {
        let transport = self.gateway.transport()?;
        Ok(Submitter::new(AdapterSet::new(Arc::new(transport))))
    }
}

fn setup_console_tracing(default_filter: String) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .compact()
        .init();
}

/// Installs the global subscriber. Keep the returned guard alive until exit so
/// exported spans get flushed.
pub fn setup_tracing(env: &Env) -> Option<TelemetryGuard> {
    let level: Level = env.log_level.into();
    let default_filter = telemetry::default_filter(level);

    let Some(endpoint) = &env.otlp_endpoint else {
        setup_console_tracing(default_filter);
        return None;
    };

    match telemetry::setup_telemetry(
        endpoint,
        env.otlp_service_name.clone(),
        env.otlp_environment.clone(),
        level,
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("OTLP export to {endpoint} failed ({e}), using console logging");
            setup_console_tracing(default_filter);
            None
        }
    }
}
