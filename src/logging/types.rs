//! The [`Log`] trait.

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) routes messages through `tracing`;
/// renderers take `&dyn Log` so tests can capture what would be shown.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}
