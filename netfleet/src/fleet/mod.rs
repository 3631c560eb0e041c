//! Batch orchestration over a device inventory.
//!
//! [`Inventory`] describes the devices and how to reach them,
//! [`BatchOrchestrator`] runs a [`DeviceRunner`] per device through a
//! [`Connector`], and [`ReportWriter`] turns the resulting [`BatchReport`]
//! into a text artifact.

mod batch;
mod describe;
mod discovery;
mod inventory;
mod outcome;
mod render;
mod report;
mod runner;
mod session;

pub use batch::BatchOrchestrator;
pub use describe::{
    DescriptionRules, InterfaceDescription, InterfaceRecord, NeighborRecord, canonical_interface, to_commands,
};
pub use discovery::{
    ACTIVITY_COMMAND, INTERFACES_COMMAND, InterfaceActivity, NEIGHBORS_COMMAND, parse_active_interfaces,
    parse_interfaces, parse_neighbors,
};
pub use inventory::{ConnectionOptions, CredentialSet, DeviceSpec, Inventory, Vars, WanEdge, expand_home};
pub use outcome::{BatchReport, DeviceOutcome, DeviceState, DeviceStatus};
pub use render::{CommandRenderer, split_commands};
pub use report::ReportWriter;
pub use runner::{DeviceRunner, Task};
pub use session::{Connector, DeviceSession, SshConnector, SshSession};
