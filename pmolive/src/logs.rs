// logs.rs
use anyhow::{anyhow, Result};
use pmoconfig::Config;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter,
    Registry,
};

/// Handle permettant de changer le niveau de log à chaud
#[derive(Clone)]
pub struct LogHandle {
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    pub fn set_level(&self, level: &str) -> Result<()> {
        let filter = parse_level(level).ok_or_else(|| anyhow!("Unknown log level '{}'", level))?;
        self.reload_handle
            .reload(filter)
            .map_err(|e| anyhow!("Failed to reload log level filter: {}", e))
    }
}

/// Convertit un niveau de la configuration (`INFO`, `debug`...) en filtre
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_uppercase().as_str() {
        "ERROR" => Some(LevelFilter::ERROR),
        "WARN" | "WARNING" => Some(LevelFilter::WARN),
        "INFO" => Some(LevelFilter::INFO),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "TRACE" => Some(LevelFilter::TRACE),
        "OFF" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Initialise le logging à partir de la section `host.logger`
///
/// `RUST_LOG`, s'il est défini, affine le filtre par cible.
pub fn init_logging(config: &Config) -> LogHandle {
    let configured = config.get_log_min_level();
    let level = parse_level(&configured).unwrap_or_else(|| {
        eprintln!("⚠️ Unknown log level '{}', using INFO", configured);
        LevelFilter::INFO
    });

    let (filter, reload_handle) = reload::Layer::new(level);

    let console = config.get_log_enable_console().then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    let result = Registry::default()
        .with(filter)
        .with(EnvFilter::try_from_default_env().ok())
        .with(console)
        .try_init();

    if let Err(e) = result {
        eprintln!("❌ Logging already initialised: {}", e);
    }

    LogHandle { reload_handle }
}
