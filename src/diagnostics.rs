//! Operator-facing diagnostics captured when a step fails or defers.
use anyhow::{anyhow, Result};

/// Source of UI-state dumps for the device under test.
pub trait Diagnostics {
    /// Describe the current UI state (element tree, visible screen, ...).
    fn dump(&self) -> Result<String>;

    /// Capture a screenshot under the given name.
    fn capture_screen(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// Used when no device-side diagnostics are wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn dump(&self) -> Result<String> {
        Err(anyhow!("no diagnostics available for this target"))
    }
}

/// Log the diagnostic dump; a failing dump is reported but never propagated.
pub fn log_screen_info(diagnostics: &dyn Diagnostics) {
    match diagnostics.dump() {
        Ok(dump) => tracing::debug!("screen info:\n{dump}"),
        Err(err) => tracing::debug!("screen info unavailable: {err:#}"),
    }
}

/// Capture a failure screenshot; errors are logged and swallowed.
pub fn capture_failure_screen(diagnostics: &dyn Diagnostics, name: &str) {
    if let Err(err) = diagnostics.capture_screen(name) {
        tracing::debug!(name, "screen capture failed: {err:#}");
    }
}
