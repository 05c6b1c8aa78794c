use std::sync::Once;

/// Filter used when neither the config nor `RUST_LOG` sets one. The wgpu
/// internals log every resource creation at info level.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` uses `env_logger` syntax, e.g. `"tandem_bridge=debug,wgpu_core=warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// The filter `init_logging` will install given the current environment.
    pub fn resolved_filter(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolved_filter();
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter).write_style(config.write_style);

        // A test harness may have installed a logger already.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized with filter {filter:?}");
        }
    });
}
