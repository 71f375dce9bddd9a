//! Logging collaborator injected into sessions.

use tracing::Level;

/// Sink for leveled session diagnostics
pub trait LogSink: Send + Sync {
    /// Record a message at the given severity
    fn log(&self, level: Level, message: &str);
}

/// Forwards diagnostics to `tracing` under the `session` component
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(component = "session", "{}", message),
            Level::WARN => tracing::warn!(component = "session", "{}", message),
            Level::INFO => tracing::info!(component = "session", "{}", message),
            Level::DEBUG => tracing::debug!(component = "session", "{}", message),
            _ => tracing::trace!(component = "session", "{}", message),
        }
    }
}
