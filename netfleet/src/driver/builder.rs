//! Builder for creating device drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::error::{DriverError, Result};
use crate::platform::{DEFAULT_PLATFORM, PlatformDefinition, PlatformRegistry};
use crate::transport::{AlgorithmPolicy, AuthMethod, HostKeyVerification, SshConfig};

/// Builder for constructing device drivers.
///
/// ```rust,no_run
/// use netfleet::driver::{Driver, DriverBuilder};
///
/// # async fn example() -> Result<(), netfleet::Error> {
/// let mut driver = DriverBuilder::new("172.31.21.4")
///     .username("admin")
///     .private_key("/home/admin/.ssh/id_rsa")
///     .platform("cisco_ios")
///     .build()?;
/// driver.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    enable_secret: Option<SecretString>,
    platform_name: Option<String>,
    custom_platform: Option<PlatformDefinition>,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    algorithms: AlgorithmPolicy,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            enable_secret: None,
            platform_name: None,
            custom_platform: None,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            algorithms: AlgorithmPolicy::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    /// Use an already assembled authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Secret for the `enable` prompt.
    pub fn enable_secret(mut self, secret: Option<SecretString>) -> Self {
        self.enable_secret = secret;
        self
    }

    /// Set the platform name (default: `cisco_ios`).
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    /// Set a custom platform definition.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Timeout for connecting, negotiating and each command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts_path = path;
        self
    }

    /// Algorithms excluded from negotiation.
    pub fn algorithms(mut self, policy: AlgorithmPolicy) -> Self {
        self.algorithms = policy;
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Call `open()` on the
    /// returned driver to establish the connection.
    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;

        let auth = self.auth.ok_or_else(|| DriverError::InvalidConfig {
            message: "a password or private key is required".to_string(),
        })?;

        let platform = match self.custom_platform {
            Some(custom) => custom,
            None => PlatformRegistry::builtin()
                .lookup(self.platform_name.as_deref().unwrap_or(DEFAULT_PLATFORM))?,
        };

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth,
            enable_secret: self.enable_secret,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
            algorithms: self.algorithms,
        };

        GenericDriver::new(ssh_config, platform)
    }
}
