//! Drives one device from connect to outcome.

use std::fmt;

use clap::ValueEnum;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::describe::{DescriptionRules, to_commands};
use super::discovery::{
    ACTIVITY_COMMAND, INTERFACES_COMMAND, InterfaceActivity, NEIGHBORS_COMMAND, parse_active_interfaces,
    parse_interfaces, parse_neighbors,
};
use super::inventory::{CredentialSet, DeviceSpec};
use super::outcome::{DeviceOutcome, DeviceState, DeviceStatus};
use super::render::CommandRenderer;
use super::session::{Connector, DeviceSession};
use crate::error::DeviceError;
use crate::transport::AlgorithmPolicy;

/// What a run does to every device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Task {
    /// Capture the running configuration only.
    Backup,
    /// Submit rendered commands, then save.
    Configure,
    /// Infer interface descriptions from CDP, submit them, then save.
    Describe,
    /// Save the running configuration only.
    Save,
    /// List up/up interfaces and when they last received traffic.
    Status,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Backup => "backup",
            Self::Configure => "configure",
            Self::Describe => "describe",
            Self::Save => "save",
            Self::Status => "status",
        };
        f.write_str(name)
    }
}

/// Runs the per-device state machine for one [`Task`].
///
/// Every failure is caught here and recorded in the returned
/// [`DeviceOutcome`]; nothing propagates to the caller.
#[derive(Debug)]
pub struct DeviceRunner {
    task: Task,
    renderer: CommandRenderer,
    rules: DescriptionRules,
    save: bool,
}

impl DeviceRunner {
    pub fn new(task: Task, renderer: CommandRenderer, rules: DescriptionRules) -> Self {
        Self {
            task,
            renderer,
            rules,
            save: true,
        }
    }

    /// Whether configure/describe runs persist the configuration (default: true).
    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn task(&self) -> Task {
        self.task
    }

    /// Run the task against `device`. The session opened here is closed
    /// before returning, whatever happened.
    pub async fn run<C: Connector>(
        &self,
        connector: &C,
        device: &DeviceSpec,
        credentials: &CredentialSet,
        policy: &AlgorithmPolicy,
        cancel: &CancellationToken,
    ) -> DeviceOutcome {
        let mut progress = Progress::new(device);

        progress.advance(DeviceState::Connecting);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeviceError::Cancelled),
            session = connector.open(device, credentials, policy) => session,
        };
        let mut session = match opened {
            Ok(session) => session,
            Err(e) => return progress.finish(Err(e)),
        };
        progress.advance(DeviceState::Connected);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeviceError::Cancelled),
            result = self.drive(&mut session, &mut progress) => result,
        };

        session.close().await;
        progress.finish(result)
    }

    async fn drive<S: DeviceSession>(&self, session: &mut S, progress: &mut Progress<'_>) -> Result<(), DeviceError> {
        let device = progress.device;

        match self.task {
            Task::Backup => {}
            Task::Save => self.persist(session, progress).await?,
            Task::Status => {
                let active = parse_active_interfaces(&session.run_command(ACTIVITY_COMMAND).await?)?;
                debug!("{}: {} active interfaces", device.name, active.len());
                progress.active_interfaces = Some(active);
            }
            Task::Configure | Task::Describe => {
                progress.advance(DeviceState::Configuring);

                let commands = match self.task {
                    Task::Describe => self.discover(session, device).await,
                    _ => self.renderer.render(device),
                };

                match commands {
                    Ok(commands) => {
                        debug!("{}: submitting {} commands", device.name, commands.len());
                        session.send_config(&commands, &mut progress.applied).await?;
                        if self.save {
                            self.persist(session, progress).await?;
                        }
                    }
                    Err(DeviceError::EmptyConfiguration) => {
                        warn!("{}: nothing to submit", device.name);
                        progress.warning = Some(DeviceError::EmptyConfiguration);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        progress.output = session.running_config().await?;
        Ok(())
    }

    async fn persist<S: DeviceSession>(&self, session: &mut S, progress: &mut Progress<'_>) -> Result<(), DeviceError> {
        progress.advance(DeviceState::Saving);
        session.save_config().await.map_err(|e| match e {
            DeviceError::CommandRejected { message, .. } => DeviceError::SaveFailed(message),
            other => DeviceError::SaveFailed(other.to_string()),
        })?;
        progress.saved = true;
        Ok(())
    }

    async fn discover<S: DeviceSession>(&self, session: &mut S, device: &DeviceSpec) -> Result<Vec<String>, DeviceError> {
        let neighbors = parse_neighbors(&session.run_command(NEIGHBORS_COMMAND).await?)?;
        let interfaces = parse_interfaces(&session.run_command(INTERFACES_COMMAND).await?)?;
        debug!(
            "{}: {} neighbors, {} interfaces",
            device.name,
            neighbors.len(),
            interfaces.len()
        );

        let commands = to_commands(&self.rules.infer(&device.name, &neighbors, &interfaces));
        if commands.is_empty() {
            return Err(DeviceError::EmptyConfiguration);
        }
        Ok(commands)
    }
}

/// Mutable state of one in-flight device, frozen into an outcome at the end.
struct Progress<'a> {
    device: &'a DeviceSpec,
    state: DeviceState,
    applied: Vec<String>,
    output: String,
    warning: Option<DeviceError>,
    saved: bool,
    active_interfaces: Option<Vec<InterfaceActivity>>,
}

impl<'a> Progress<'a> {
    fn new(device: &'a DeviceSpec) -> Self {
        Self {
            device,
            state: DeviceState::Pending,
            applied: Vec::new(),
            output: String::new(),
            warning: None,
            saved: false,
            active_interfaces: None,
        }
    }

    fn advance(&mut self, next: DeviceState) {
        debug!("{}: {} -> {}", self.device.name, self.state, next);
        self.state = next;
    }

    fn finish(mut self, result: Result<(), DeviceError>) -> DeviceOutcome {
        let (status, error, failed_at) = match result {
            Ok(()) => {
                self.advance(DeviceState::Succeeded);
                (DeviceStatus::Succeeded, None, None)
            }
            Err(e) => {
                warn!("{}: failed while {}: {}", self.device.name, self.state, e);
                let failed_at = self.state;
                self.advance(DeviceState::Failed);
                (DeviceStatus::Failed, Some(e), Some(failed_at))
            }
        };

        DeviceOutcome {
            device: self.device.name.clone(),
            host: self.device.host.clone(),
            status,
            applied_commands: self.applied,
            output: self.output,
            error,
            failed_at,
            warning: self.warning,
            saved: self.saved,
            active_interfaces: self.active_interfaces,
        }
    }
}
