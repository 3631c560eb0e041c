//! Platform definitions for multi-vendor support.
//!
//! This module defines vendor-specific configurations including
//! prompt patterns, privilege levels, and device behavior.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
pub use registry::{DEFAULT_PLATFORM, PlatformRegistry};

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Normalize command output (strip command echo, trailing prompt).
    fn normalize_output(&self, raw: &str, command: &str) -> String;

    /// Detect command failure from output.
    ///
    /// Returns the offending output line when one of the platform's failure
    /// strings is present.
    fn detect_failure(&self, platform: &PlatformDefinition, output: &str) -> Option<String> {
        let needle = platform.failure_in(output)?;
        let line = output
            .lines()
            .find(|l| l.contains(needle))
            .unwrap_or(needle);
        Some(line.trim().to_string())
    }
}

/// Default vendor behavior implementation.
#[derive(Debug, Default)]
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        let command = command.trim();

        // Strip command echo
        let output = match raw.split_once('\n') {
            Some((first, rest)) if !command.is_empty() && first.trim_end().ends_with(command) => rest,
            _ => raw,
        };

        // Strip trailing prompt (last line)
        let body = match memchr::memrchr(b'\n', output.as_bytes()) {
            Some(pos) => &output[..pos],
            None => "",
        };

        body.trim_end_matches('\n').to_string()
    }
}
