//! Plain-text batch report.
//!
//! [`BatchReport`] and [`DeviceOutcome`] render through `Display`; the report
//! text is `report.to_string()`.

use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use super::outcome::{BatchReport, DeviceOutcome};
use crate::error::ReportError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes a [`BatchReport`] to one destination file.
///
/// The file is replaced as a whole: the report is written to a temporary
/// file next to the destination and renamed over it, so a failed write
/// leaves whatever was there before.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render and write `report`.
    pub fn write(&self, report: &BatchReport) -> Result<(), ReportError> {
        let io_error = |source| ReportError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(report.to_string().as_bytes()).map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        file.persist(&self.path).map_err(|e| io_error(e.error))?;

        info!("Report written to {}", self.path.display());
        Ok(())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Network Device Configuration Backup ---")?;
        writeln!(f, "--- Timestamp: {} ---", self.started_at.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "--- Task: {} ---", self.task)?;

        for outcome in &self.outcomes {
            writeln!(f)?;
            write!(f, "{}", outcome)?;
        }

        writeln!(f, "\n--- Summary: {} ---", self.summary())
    }
}

/// One device section of the report.
impl fmt::Display for DeviceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            self.fmt_success(f)
        } else {
            self.fmt_failure(f)
        }
    }
}

impl DeviceOutcome {
    fn fmt_success(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bar = "#".repeat(20);
        writeln!(f, "{bar} [ Configuration for {} ({}) ] {bar}\n", self.device, self.host)?;

        if let Some(warning) = &self.warning {
            writeln!(f, "Warning: {}: {}", warning.kind(), warning)?;
        }
        if !self.applied_commands.is_empty() {
            writeln!(
                f,
                "Applied {} commands{}",
                self.applied_commands.len(),
                if self.saved { " (saved)" } else { "" }
            )?;
        }
        if let Some(active) = &self.active_interfaces {
            if active.is_empty() {
                writeln!(f, "Active interfaces: none")?;
            } else {
                writeln!(f, "Active interfaces:")?;
                for activity in active {
                    writeln!(
                        f,
                        "  {:<25} last input {}",
                        activity.interface,
                        activity.last_input.as_deref().unwrap_or("unknown")
                    )?;
                }
            }
            writeln!(f)?;
        }

        writeln!(f, "{}\n", self.output)
    }

    fn fmt_failure(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bar = "!".repeat(20);
        writeln!(f, "{bar} [ FAILED: {} ({}) ] {bar}", self.device, self.host)?;

        if let Some(error) = &self.error {
            writeln!(f, "Error: {}: {}", error.kind(), error)?;
        }
        if let Some(state) = self.failed_at {
            writeln!(f, "Failed while: {}", state)?;
        }
        if !self.applied_commands.is_empty() {
            writeln!(f, "Applied before failure:")?;
            for command in &self.applied_commands {
                writeln!(f, "  {}", command)?;
            }
        }
        writeln!(f)
    }
}
