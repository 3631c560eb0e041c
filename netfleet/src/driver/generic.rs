//! Generic driver implementation that works with any platform.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::Driver;
use super::privilege::PrivilegeManager;
use super::response::Response;
use crate::channel::{PtyChannel, PtyConfig, combine_patterns, last_prompt};
use crate::error::{ChannelError, DriverError, Error, PlatformError, Result};
use crate::platform::{DefaultBehavior, PlatformDefinition, VendorBehavior};
use crate::transport::config::clone_secret;
use crate::transport::{AuthMethod, SshConfig, SshTransport};

/// Generic driver that works with any platform definition.
///
/// Owns the SSH transport and one PTY shell channel, tracks the privilege
/// level from every prompt it reads, and applies the platform's failure
/// strings to each command's output.
pub struct GenericDriver {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    behavior: Arc<dyn VendorBehavior>,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,
    privilege_manager: PrivilegeManager,
    timeout: Duration,

    /// Combined prompt pattern for all privilege levels.
    prompt_pattern: Regex,
}

impl GenericDriver {
    /// Create a new generic driver. Nothing is sent until [`Driver::open`].
    pub fn new(ssh_config: SshConfig, platform: PlatformDefinition) -> Result<Self> {
        let prompt_pattern = combine_patterns(platform.privilege_levels.values().map(|l| &l.pattern))
            .map_err(|e| PlatformError::InvalidDefinition {
                message: format!("combined prompt pattern for '{}': {}", platform.name, e),
            })?;

        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));

        Ok(Self {
            timeout: ssh_config.timeout,
            privilege_manager: PrivilegeManager::new(platform.privilege_levels.clone()),
            ssh_config,
            platform,
            behavior,
            transport: None,
            channel: None,
            prompt_pattern,
        })
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Device address this driver talks to.
    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    /// Set the per-command timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn channel_mut(&mut self) -> Result<&mut PtyChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    /// Read until a prompt, record the privilege level it shows.
    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let timeout = self.timeout;
        let pattern = self.prompt_pattern.clone();
        let data = self.channel_mut()?.read_until_pattern(&pattern, timeout).await?;

        let prompt = last_prompt(&pattern, &data)
            .map(|p| String::from_utf8_lossy(p).trim().to_string())
            .unwrap_or_default();

        if self.privilege_manager.update_from_prompt(&prompt).is_none() {
            debug!("{}: prompt '{}' matches no privilege level", self.host(), prompt);
        }

        Ok((String::from_utf8_lossy(&data).into_owned(), prompt))
    }

    /// Wait for the first prompt after login, nudging once with a newline.
    async fn read_initial_prompt(&mut self) -> Result<()> {
        match self.read_until_prompt().await {
            Ok(_) => Ok(()),
            Err(Error::Channel(ChannelError::PatternTimeout(_))) => {
                debug!("{}: no prompt after login, sending newline", self.host());
                self.channel_mut()?.send("").await?;
                self.read_until_prompt().await.map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    /// Secret to answer an escalation prompt with.
    fn escalation_secret(&self) -> Option<SecretString> {
        match (&self.ssh_config.enable_secret, &self.ssh_config.auth) {
            (Some(secret), _) => Some(clone_secret(secret)),
            (None, AuthMethod::Password(password)) => Some(clone_secret(password)),
            (None, AuthMethod::PrivateKey { .. }) => None,
        }
    }

    /// Move one hop in the privilege graph.
    async fn transition(&mut self, from: &str, to: &str) -> Result<()> {
        let transition = self
            .privilege_manager
            .get_transition(from, to)
            .ok_or_else(|| DriverError::NoPrivilegePath {
                from: from.to_string(),
                to: to.to_string(),
            })?;

        debug!("{}: {} -> {} via '{}'", self.host(), from, to, transition.command);
        self.channel_mut()?.send(&transition.command).await?;

        if let Some(auth_prompt) = transition.auth_prompt {
            let timeout = self.timeout;
            let either = combine_patterns([&auth_prompt, &self.prompt_pattern])
                .map_err(ChannelError::InvalidPattern)?;
            let data = self.channel_mut()?.read_until_pattern(&either, timeout).await?;

            if auth_prompt.is_match(&data) && !self.prompt_pattern.is_match(&data) {
                let secret = self
                    .escalation_secret()
                    .ok_or_else(|| DriverError::PrivilegeAcquisitionFailed { target: to.to_string() })?;
                self.channel_mut()?.send(secret.expose_secret()).await?;
                self.read_until_prompt().await?;
            } else if let Some(prompt) = last_prompt(&self.prompt_pattern, &data) {
                let prompt = String::from_utf8_lossy(prompt).trim().to_string();
                self.privilege_manager.update_from_prompt(&prompt);
            }
        } else {
            self.read_until_prompt().await?;
        }

        if self.privilege_manager.current_name() != Some(to) {
            return Err(DriverError::PrivilegeAcquisitionFailed { target: to.to_string() }.into());
        }
        Ok(())
    }

    async fn execute_on_open_commands(&mut self) -> Result<()> {
        for cmd in self.platform.on_open_commands.clone() {
            let response = self.send_command(&cmd).await?;
            if let Some(msg) = response.failure_message {
                warn!("{}: '{}' rejected: {}", self.host(), cmd, msg);
            }
        }
        Ok(())
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        let channel = transport
            .open_channel(self.platform.terminal_width, self.platform.terminal_height)
            .await?;

        self.channel = Some(PtyChannel::new(channel, PtyConfig::default()));
        self.transport = Some(transport);

        self.read_initial_prompt().await?;

        let default = self.platform.default_privilege.clone();
        if !default.is_empty() {
            self.acquire_privilege(&default).await?;
        }

        self.execute_on_open_commands().await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("{}: channel close: {}", self.host(), e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        self.channel_mut()?.send(command).await?;
        let (raw, prompt) = self.read_until_prompt().await?;

        let result = self.behavior.normalize_output(&raw, command);
        let response = Response::new(command, result, prompt, start.elapsed());

        match self.behavior.detect_failure(&self.platform, &response.result) {
            Some(message) => Ok(response.with_failure(message)),
            None => Ok(response),
        }
    }

    async fn send_config(
        &mut self,
        commands: &[String],
        applied: &mut Vec<String>,
    ) -> Result<Option<Response>> {
        let config = self.platform.config_privilege.clone();
        let default = self.platform.default_privilege.clone();
        let mut rejected = None;

        for cmd in commands {
            // A command such as `end` may drop out of config mode
            if !config.is_empty() && self.privilege_manager.current_name() != Some(config.as_str()) {
                self.acquire_privilege(&config).await?;
            }

            let response = self.send_command(cmd).await?;
            if !response.is_success() {
                rejected = Some(response);
                break;
            }
            applied.push(cmd.clone());
        }

        if !default.is_empty() {
            self.acquire_privilege(&default).await?;
        }
        Ok(rejected)
    }

    async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let current = self
            .privilege_manager
            .current_name()
            .ok_or_else(|| DriverError::UnknownPrivilege {
                prompt: String::new(),
            })?
            .to_string();

        let path = self.privilege_manager.find_path(&current, target)?;
        for hop in path.windows(2) {
            self.transition(&hop[0], &hop[1]).await?;
        }
        Ok(())
    }
}
