//! Logging set-up for hosts embedding the engine

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset (default: info)
    pub level: String,
    /// Emit an event when a scan session span opens and closes
    pub with_spans: bool,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            with_spans: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.with_spans = true;
        self
    }
}

/// Install a compact fmt subscriber at `level` unless `RUST_LOG` says otherwise.
///
/// Returns false when a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    init_with_config(LogConfig::default().level(level))
}

pub fn init_with_config(config: LogConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let span_events = if config.with_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .compact()
        .with_span_events(span_events)
        .with_target(config.with_target);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::default().level("debug").with_spans();
        assert_eq!(config.level, "debug");
        assert!(config.with_spans);
    }

    #[test]
    fn test_second_init_is_harmless() {
        init("warn");
        assert!(!init("warn"));
    }
}
