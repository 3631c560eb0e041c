//! High-level driver for device interaction.
//!
//! The driver layer provides the API for sending commands and managing
//! privilege levels on network devices.

mod builder;
mod generic;
mod privilege;
mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use privilege::{PrivilegeManager, TransitionInfo};
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// Trait for device drivers.
pub trait Driver: Send {
    /// Connect, wait for the first prompt, move to the platform's default
    /// privilege level and run its session-prep commands.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send commands in configuration mode.
    ///
    /// Enters the platform's configuration level, sends the commands in
    /// order and returns to the default level. Each accepted command is
    /// pushed onto `applied` as soon as the device answers, so the caller
    /// knows what reached the device even when an error cuts the batch
    /// short. Stops at the first rejected command and returns its response.
    ///
    /// ```rust,no_run
    /// use netfleet::driver::Driver;
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), netfleet::Error> {
    /// let commands = vec![
    ///     "interface GigabitEthernet0/1".to_string(),
    ///     " description Connect to PC".to_string(),
    /// ];
    /// let mut applied = Vec::new();
    /// if let Some(rejected) = driver.send_config(&commands, &mut applied).await? {
    ///     eprintln!("{} rejected: {:?}", rejected.command, rejected.failure_message);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn send_config(
        &mut self,
        commands: &[String],
        applied: &mut Vec<String>,
    ) -> impl Future<Output = Result<Option<Response>>> + Send;

    /// Acquire a specific privilege level.
    fn acquire_privilege(&mut self, privilege: &str) -> impl Future<Output = Result<()>> + Send;
}
