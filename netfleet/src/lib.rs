//! # Netfleet
//!
//! Async batch configuration and backup for fleets of network devices over SSH.
//!
//! Netfleet opens one SSH shell per device, renders or infers the commands
//! each device should receive, applies them in configuration mode, saves,
//! captures the running configuration and collects everything into one
//! timestamped report. A failing device is recorded in the report and never
//! stops the rest of the batch.
//!
//! ## Layers
//!
//! - [`transport`]: russh connection, authentication, algorithm policy and host keys
//! - [`channel`]: PTY shell channel with ANSI stripping and prompt detection
//! - [`platform`]: vendor prompt, privilege and failure-pattern definitions
//! - [`driver`]: command execution and privilege navigation for one device
//! - [`fleet`]: inventory, rendering, description inference, batch runs, reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use netfleet::fleet::{
//!     BatchOrchestrator, CommandRenderer, DescriptionRules, DeviceRunner, Inventory, ReportWriter,
//!     SshConnector, Task,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inventory = Inventory::load(Path::new("devices.yml"))?;
//!
//!     let runner = DeviceRunner::new(
//!         Task::Backup,
//!         CommandRenderer::new(inventory.defaults.clone()),
//!         DescriptionRules::new(inventory.wan_edges.clone()),
//!     );
//!     let batch = BatchOrchestrator::new(SshConnector::new(inventory.options.clone()), runner);
//!
//!     let report = batch
//!         .run(&inventory.devices, &inventory.credentials, &inventory.algorithms)
//!         .await;
//!     ReportWriter::new("backup.txt").write(&report)?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod fleet;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::{DeviceError, Error};
pub use fleet::{BatchOrchestrator, BatchReport, DeviceOutcome, Inventory, ReportWriter, Task};
pub use platform::{PlatformDefinition, PrivilegeLevel};
pub use transport::{AlgorithmPolicy, AuthMethod, SshConfig};
