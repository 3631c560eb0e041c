//! Per-device outcomes and the batch report they accumulate into.

use std::fmt;

use chrono::{DateTime, Local};

use super::discovery::InterfaceActivity;
use super::runner::Task;
use crate::error::DeviceError;

/// Where a device is in its run.
///
/// `Pending → Connecting → Connected → Configuring → Saving → Succeeded`,
/// with `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Pending,
    Connecting,
    Connected,
    Configuring,
    Saving,
    Succeeded,
    Failed,
}

impl DeviceState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Configuring => "Configuring",
            Self::Saving => "Saving",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Final status of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("Succeeded"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

/// Result of running one device. Built once by the runner, never mutated after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOutcome {
    pub device: String,
    pub host: String,
    pub status: DeviceStatus,

    /// Commands the device accepted, in submission order.
    pub applied_commands: Vec<String>,

    /// Captured running configuration (empty if never captured).
    pub output: String,

    /// Why the device failed.
    pub error: Option<DeviceError>,

    /// State the device was in when it failed.
    pub failed_at: Option<DeviceState>,

    /// Non-fatal condition, such as a template that rendered no commands.
    pub warning: Option<DeviceError>,

    /// Whether the configuration was persisted.
    pub saved: bool,

    /// Up/up interfaces, when the task checked them.
    pub active_interfaces: Option<Vec<InterfaceActivity>>,
}

impl DeviceOutcome {
    /// Outcome for a device that never got to run.
    pub fn cancelled(device: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            host: host.into(),
            status: DeviceStatus::Failed,
            applied_commands: Vec::new(),
            output: String::new(),
            error: Some(DeviceError::Cancelled),
            failed_at: Some(DeviceState::Pending),
            warning: None,
            saved: false,
            active_interfaces: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeviceStatus::Succeeded
    }
}

/// Every device outcome of one run, in inventory order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub started_at: DateTime<Local>,
    pub task: Task,
    pub outcomes: Vec<DeviceOutcome>,
}

impl BatchReport {
    /// Start an empty report stamped with the current local time.
    pub fn new(task: Task) -> Self {
        Self {
            started_at: Local::now(),
            task,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: DeviceOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// One-line tally, e.g. `3 devices: 2 succeeded, 1 failed`.
    pub fn summary(&self) -> String {
        format!(
            "{} devices: {} succeeded, {} failed",
            self.outcomes.len(),
            self.succeeded(),
            self.failed()
        )
    }
}
