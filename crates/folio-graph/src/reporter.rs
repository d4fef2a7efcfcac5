//! Build diagnostics.

/// Diagnostics sink handed to plugins.
pub trait Reporter: Send + Sync {
    /// Progress information.
    fn info(&self, message: &str);

    /// Something suspicious that does not stop the build.
    fn warn(&self, message: &str);

    /// A fatal problem. The caller stops producing output after reporting it
    /// and returns an error; the build must not complete.
    fn panic_on_build(&self, message: &str);
}

/// [`Reporter`] that writes to `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn panic_on_build(&self, message: &str) {
        tracing::error!(fatal = true, "{message}");
    }
}
