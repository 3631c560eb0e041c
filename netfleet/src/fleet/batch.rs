//! Runs a task across the whole inventory.

use futures_util::{StreamExt, stream};
use log::info;
use tokio_util::sync::CancellationToken;

use super::inventory::{CredentialSet, DeviceSpec};
use super::outcome::{BatchReport, DeviceOutcome};
use super::runner::DeviceRunner;
use super::session::Connector;
use crate::transport::AlgorithmPolicy;

/// Fans a [`DeviceRunner`] out over a device list.
///
/// Up to `jobs` devices are in flight at once, all on the calling task.
/// Outcomes come back in inventory order whatever order devices finish in.
pub struct BatchOrchestrator<C> {
    connector: C,
    runner: DeviceRunner,
    jobs: usize,
    cancel: CancellationToken,
}

impl<C: Connector> BatchOrchestrator<C> {
    pub fn new(connector: C, runner: DeviceRunner) -> Self {
        Self {
            connector,
            runner,
            jobs: 1,
            cancel: CancellationToken::new(),
        }
    }

    /// Maximum devices in flight (at least 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Cancel the batch through an external token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every device and collect one outcome per device.
    ///
    /// After cancellation, in-flight devices close their sessions and
    /// report [`Cancelled`](crate::error::DeviceError::Cancelled); devices
    /// not yet started are reported the same way without connecting.
    pub async fn run(
        &self,
        devices: &[DeviceSpec],
        credentials: &CredentialSet,
        policy: &AlgorithmPolicy,
    ) -> BatchReport {
        let task = self.runner.task();
        info!(
            "Starting {} on {} devices ({} at a time)",
            task,
            devices.len(),
            self.jobs
        );

        let mut report = BatchReport::new(task);
        let mut outcomes = stream::iter(devices)
            .map(|device| async move {
                if self.cancel.is_cancelled() {
                    return DeviceOutcome::cancelled(&device.name, &device.host);
                }
                self.runner
                    .run(&self.connector, device, credentials, policy, &self.cancel)
                    .await
            })
            .buffered(self.jobs);

        while let Some(outcome) = outcomes.next().await {
            info!("{} ({}): {}", outcome.device, outcome.host, outcome.status);
            report.push(outcome);
        }

        info!("Finished {}: {}", task, report.summary());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::fleet::describe::DescriptionRules;
    use crate::fleet::render::CommandRenderer;
    use crate::fleet::runner::Task;
    use crate::fleet::session::DeviceSession;
    use crate::transport::AuthMethod;
    use secrecy::SecretString;

    struct Unreachable;

    struct NoSession;

    impl DeviceSession for NoSession {
        async fn run_command(&mut self, _command: &str) -> Result<String, DeviceError> {
            Ok(String::new())
        }

        async fn send_config(&mut self, _commands: &[String], _applied: &mut Vec<String>) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn save_config(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn running_config(&mut self) -> Result<String, DeviceError> {
            Ok(String::new())
        }

        async fn close(self) {}
    }

    impl Connector for Unreachable {
        type Session = NoSession;

        async fn open(
            &self,
            device: &DeviceSpec,
            _credentials: &CredentialSet,
            _policy: &AlgorithmPolicy,
        ) -> Result<NoSession, DeviceError> {
            Err(DeviceError::Network(format!("{}: no route to host", device.host)))
        }
    }

    #[tokio::test]
    async fn test_every_device_reported_when_all_fail() {
        let runner = DeviceRunner::new(Task::Backup, CommandRenderer::default(), DescriptionRules::default());
        let batch = BatchOrchestrator::new(Unreachable, runner).with_jobs(0);
        let devices = vec![
            DeviceSpec::new("R1", "172.31.21.4"),
            DeviceSpec::new("R2", "172.31.21.5"),
        ];
        let credentials = CredentialSet::new("admin", AuthMethod::Password(SecretString::from("x".to_string())));

        let report = batch.run(&devices, &credentials, &AlgorithmPolicy::default()).await;
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.task, Task::Backup);
    }
}
