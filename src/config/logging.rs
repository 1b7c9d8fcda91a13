//! Log level setting and the level-gated logger handed to pipeline stages.

use super::{ConfigKey, Configs, LevelFilter};
use std::fmt;
use tracing::Level;

/// Setting: maximum verbosity of pipeline log events.
pub struct LogLevelKey;

impl ConfigKey for LogLevelKey {
    type Value = LevelFilter;
}

impl Configs {
    /// Log level, [`LevelFilter::OFF`] when unset.
    pub fn log_level(&self) -> LevelFilter {
        self.get::<LogLevelKey>().unwrap_or(LevelFilter::OFF)
    }

    /// Logger gated by [`Configs::log_level`].
    pub fn logger(&self) -> Logger {
        Logger::new(self.log_level())
    }
}

/// Emits `tracing` events under the `netclient` target when the snapshot's
/// level allows them.
///
/// Logging is a side effect only; it never changes control flow.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    /// Logger that emits events up to `level`.
    pub fn new(level: LevelFilter) -> Self {
        Logger { level }
    }

    /// Whether events at `level` are emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Emit a `trace` event.
    pub fn trace(&self, message: fmt::Arguments<'_>) {
        if self.enabled(Level::TRACE) {
            tracing::trace!(target: "netclient", "{}", message);
        }
    }

    /// Emit a `debug` event.
    pub fn debug(&self, message: fmt::Arguments<'_>) {
        if self.enabled(Level::DEBUG) {
            tracing::debug!(target: "netclient", "{}", message);
        }
    }

    /// Emit a `warn` event.
    pub fn warn(&self, message: fmt::Arguments<'_>) {
        if self.enabled(Level::WARN) {
            tracing::warn!(target: "netclient", "{}", message);
        }
    }

    /// Emit an `error` event.
    pub fn error(&self, message: fmt::Arguments<'_>) {
        if self.enabled(Level::ERROR) {
            tracing::error!(target: "netclient", "{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_off() {
        let configs = Configs::new();
        assert_eq!(configs.log_level(), LevelFilter::OFF);
        assert!(!configs.logger().enabled(Level::ERROR));
    }

    #[test]
    fn test_level_gating() {
        let logger = Logger::new(LevelFilter::INFO);
        assert!(logger.enabled(Level::ERROR));
        assert!(logger.enabled(Level::INFO));
        assert!(!logger.enabled(Level::DEBUG));
    }
}
