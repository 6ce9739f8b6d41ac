use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{FromEnvError, ParseError},
    layer::SubscriberExt,
};

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("Invalid log filter: {0}")]
    EnvFilter(#[from] FromEnvError),
    #[error("Invalid default log filter: {0}")]
    DefaultFilter(#[from] ParseError),
    #[error("Global tracing subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub struct TracerOptions<'a> {
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: &'a str,
    pub ansi: bool,
}

impl Default for TracerOptions<'_> {
    fn default() -> Self {
        Self {
            default_filter: "info",
            ansi: true,
        }
    }
}

/// This object initialises the stdout tracer, given a TracerOptions struct.
pub struct TracerEngine;

impl TracerEngine {
    /// Initialises the stdout tracer for the calling binary.
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// * `service_name` - The name of the binary, recorded in the first log line.
    /// #Returns
    /// An instance of TracerEngine, or an error if the filter could not be parsed
    /// or a global subscriber has already been installed.
    pub fn new(options: TracerOptions, service_name: &str) -> Result<Self, TracerError> {
        let stdout_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(options.ansi);

        // An unset RUST_LOG falls back to the default, a malformed one is reported
        let log_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(_) => EnvFilter::try_from_default_env()?,
            Err(_) => EnvFilter::try_new(options.default_filter)?,
        };

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));
        tracing::subscriber::set_global_default(subscriber)?;

        debug!("Tracer initialised for {service_name}");
        Ok(Self)
    }
}

/// Should be called at the start of each binary.
#[macro_export]
macro_rules! init_tracer {
    ($options:expr) => {
        $crate::TracerEngine::new($options, env!("CARGO_BIN_NAME"))
    };
}
