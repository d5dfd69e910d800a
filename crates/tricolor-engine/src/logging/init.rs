use std::sync::Once;

use log::LevelFilter;

/// Crates whose info-level output drowns the per-frame diagnostics.
const QUIET_CRATES: &[(&str, LevelFilter)] = &[
    ("wgpu_core", LevelFilter::Warn),
    ("wgpu_hal", LevelFilter::Warn),
    ("naga", LevelFilter::Warn),
];

/// Logger configuration.
///
/// `env_filter` uses `env_logger` filter syntax, e.g.
/// `"info,tricolor_engine::render=trace"`. When unset, `RUST_LOG` is used,
/// then `info` with the GPU stack held at `warn`.
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
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();

        match self
            .env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
        {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(LevelFilter::Info);
                for (module, level) in QUIET_CRATES {
                    builder.filter_module(module, *level);
                }
            }
        }

        builder.write_style(self.write_style);
        builder.format_timestamp_millis();
        builder
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        match config.builder().try_init() {
            Ok(()) => log::debug!("logging initialized"),
            // Some other logger got there first; it receives this record.
            Err(err) => log::debug!("keeping the installed logger: {err}"),
        }
    });
}
