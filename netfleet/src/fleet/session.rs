//! The seam between the device runner and a live device.
//!
//! [`Connector`] opens one [`DeviceSession`] per device. The SSH
//! implementation wraps a [`GenericDriver`]; tests substitute scripted
//! sessions so the runner and batch logic run without a network.

use std::future::Future;

use log::debug;

use super::inventory::{ConnectionOptions, CredentialSet, DeviceSpec};
use crate::driver::{Driver, DriverBuilder, GenericDriver, Response};
use crate::error::DeviceError;
use crate::transport::AlgorithmPolicy;
use crate::transport::config::clone_secret;

/// Opens authenticated sessions to devices.
pub trait Connector: Send + Sync {
    type Session: DeviceSession;

    /// Connect and prepare a session, or classify why that failed.
    fn open(
        &self,
        device: &DeviceSpec,
        credentials: &CredentialSet,
        policy: &AlgorithmPolicy,
    ) -> impl Future<Output = Result<Self::Session, DeviceError>> + Send;
}

/// A prepared session bound to one device.
pub trait DeviceSession: Send {
    /// Run an exec-mode command and return its output.
    fn run_command(&mut self, command: &str) -> impl Future<Output = Result<String, DeviceError>> + Send;

    /// Submit configuration commands in order.
    ///
    /// Accepted commands are pushed onto `applied` as they complete.
    fn send_config(
        &mut self,
        commands: &[String],
        applied: &mut Vec<String>,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Persist the running configuration.
    fn save_config(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Capture the running configuration.
    fn running_config(&mut self) -> impl Future<Output = Result<String, DeviceError>> + Send;

    /// Release the session. Called exactly once on every exit path.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// [`Connector`] over SSH.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: ConnectionOptions,
}

impl SshConnector {
    pub fn new(options: ConnectionOptions) -> Self {
        Self { options }
    }

    fn build(
        &self,
        device: &DeviceSpec,
        credentials: &CredentialSet,
        policy: &AlgorithmPolicy,
    ) -> Result<GenericDriver, DeviceError> {
        let mut driver = DriverBuilder::new(device.host.clone())
            .port(device.port.unwrap_or(self.options.port))
            .username(credentials.username.clone())
            .auth(credentials.auth.clone())
            .enable_secret(credentials.enable_secret.as_ref().map(clone_secret))
            .platform(device.platform.as_deref().unwrap_or(&self.options.platform))
            .timeout(credentials.timeout)
            .host_key_verification(self.options.host_key_verification)
            .known_hosts_path(self.options.known_hosts.clone())
            .algorithms(policy.clone())
            .build()?;
        driver.set_timeout(self.options.command_timeout);
        Ok(driver)
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn open(
        &self,
        device: &DeviceSpec,
        credentials: &CredentialSet,
        policy: &AlgorithmPolicy,
    ) -> Result<SshSession, DeviceError> {
        let mut driver = self.build(device, credentials, policy)?;

        if let Err(e) = driver.open().await {
            // open can fail after the transport is up, e.g. at enable
            if let Err(close_err) = driver.close().await {
                debug!("{}: close after failed open: {}", device.name, close_err);
            }
            return Err(e.into());
        }

        Ok(SshSession { driver })
    }
}

/// A [`DeviceSession`] driving a platform over an SSH shell.
pub struct SshSession {
    driver: GenericDriver,
}

impl SshSession {
    fn check(response: Response) -> Result<String, DeviceError> {
        match response.failure_message {
            Some(message) => Err(DeviceError::CommandRejected {
                command: response.command,
                message,
            }),
            None => Ok(response.result),
        }
    }
}

impl DeviceSession for SshSession {
    async fn run_command(&mut self, command: &str) -> Result<String, DeviceError> {
        let response = self.driver.send_command(command).await?;
        Self::check(response)
    }

    async fn send_config(&mut self, commands: &[String], applied: &mut Vec<String>) -> Result<(), DeviceError> {
        match self.driver.send_config(commands, applied).await? {
            Some(rejected) => Self::check(rejected).map(|_| ()),
            None => Ok(()),
        }
    }

    async fn save_config(&mut self) -> Result<(), DeviceError> {
        let command = self.driver.platform().save_command.clone();
        self.run_command(&command).await.map(|_| ())
    }

    async fn running_config(&mut self) -> Result<String, DeviceError> {
        let command = self.driver.platform().running_config_command.clone();
        self.run_command(&command).await
    }

    async fn close(mut self) {
        if let Err(e) = self.driver.close().await {
            debug!("{}: close: {}", self.driver.host(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::AuthMethod;
    use secrecy::SecretString;
    use std::time::Duration;

    fn credentials() -> CredentialSet {
        CredentialSet::new("admin", AuthMethod::Password(SecretString::from("cisco".to_string())))
    }

    #[test]
    fn test_build_uses_device_overrides() {
        let connector = SshConnector::new(ConnectionOptions {
            command_timeout: Duration::from_secs(5),
            ..ConnectionOptions::default()
        });
        let mut device = DeviceSpec::new("SW1", "172.31.21.10");
        device.platform = Some("arista_eos".into());

        let driver = connector
            .build(&device, &credentials(), &AlgorithmPolicy::default())
            .unwrap();
        assert_eq!(driver.platform().name, "arista_eos");
        assert_eq!(driver.host(), "172.31.21.10");
    }

    #[test]
    fn test_build_unknown_platform_is_classified() {
        let connector = SshConnector::default();
        let mut device = DeviceSpec::new("X1", "10.0.0.1");
        device.platform = Some("vyos".into());

        let err = connector
            .build(&device, &credentials(), &AlgorithmPolicy::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), "NetworkError");
    }

    #[test]
    fn test_rejected_response_becomes_command_rejected() {
        let response = Response::new("shutdwn", "", "R1(config-if)#", Duration::ZERO)
            .with_failure("% Invalid input detected at '^' marker.");
        assert_eq!(
            SshSession::check(response),
            Err(DeviceError::CommandRejected {
                command: "shutdwn".into(),
                message: "% Invalid input detected at '^' marker.".into(),
            })
        );
    }
}
