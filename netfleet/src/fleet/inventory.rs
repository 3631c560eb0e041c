//! YAML inventory: devices, shared credentials and connection options.
//!
//! ```yaml
//! credentials:
//!   username: admin
//!   key_file: ~/.ssh/id_rsa
//! connection_options:
//!   timeout: 20
//!   algorithms:
//!     preset: legacy
//! defaults:
//!   domain: lab.local
//! template_dir: templates
//! wan_edges:
//!   - device: R2
//!     interface: GigabitEthernet0/3
//! devices:
//!   - name: R1
//!     host: 172.31.21.4
//!     template: router.j2
//!     ospf_area: 0
//! ```
//!
//! Any device key other than the recognised ones becomes a template variable.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::InventoryError;
use crate::platform::{DEFAULT_PLATFORM, PlatformRegistry};
use crate::transport::{AlgorithmPolicy, AlgorithmPreset, AuthMethod, DisabledAlgorithms, HostKeyVerification};

/// Template variables, in declaration order.
pub type Vars = IndexMap<String, serde_yaml::Value>;

/// One target device. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// Platform name; falls back to the run-wide platform.
    #[serde(default)]
    pub platform: Option<String>,

    /// Template file name inside the template directory.
    #[serde(default)]
    pub template: Option<String>,

    /// Literal commands, submitted verbatim.
    #[serde(default)]
    pub commands: Option<Vec<String>>,

    #[serde(flatten)]
    pub vars: Vars,
}

impl DeviceSpec {
    /// Minimal device with no configuration source.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: None,
            platform: None,
            template: None,
            commands: None,
            vars: Vars::new(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = Some(commands.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

/// Login material shared read-only by every device in a run.
#[derive(Debug)]
pub struct CredentialSet {
    pub username: String,
    pub auth: AuthMethod,
    pub enable_secret: Option<SecretString>,

    /// Connect and negotiation timeout.
    pub timeout: Duration,
}

impl CredentialSet {
    pub fn new(username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            username: username.into(),
            auth,
            enable_secret: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Run-wide connection knobs.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub port: u16,
    pub command_timeout: Duration,
    pub platform: String,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts: Option<PathBuf>,
    pub jobs: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            port: 22,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            platform: DEFAULT_PLATFORM.to_string(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts: None,
            jobs: 1,
        }
    }
}

/// Device/interface pair whose uplink faces the internet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WanEdge {
    pub device: String,
    pub interface: String,
}

/// A parsed and validated inventory.
#[derive(Debug)]
pub struct Inventory {
    pub credentials: CredentialSet,
    pub options: ConnectionOptions,
    pub algorithms: AlgorithmPolicy,
    pub defaults: Vars,
    pub template_dir: Option<PathBuf>,
    pub wan_edges: Vec<WanEdge>,
    pub devices: Vec<DeviceSpec>,
}

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInventory {
    credentials: RawCredentials,
    #[serde(default)]
    connection_options: RawOptions,
    #[serde(default)]
    defaults: Vars,
    #[serde(default)]
    template_dir: Option<PathBuf>,
    #[serde(default)]
    wan_edges: Vec<WanEdge>,
    devices: Vec<DeviceSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCredentials {
    username: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    key_file: Option<PathBuf>,
    #[serde(default)]
    passphrase: Option<String>,
    #[serde(default)]
    enable_secret: Option<String>,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawOptions {
    port: u16,
    timeout: u64,
    command_timeout: u64,
    platform: String,
    host_key_verification: HostKeyVerification,
    known_hosts: Option<PathBuf>,
    jobs: usize,
    algorithms: RawAlgorithms,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            port: 22,
            timeout: DEFAULT_TIMEOUT_SECS,
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
            platform: DEFAULT_PLATFORM.to_string(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts: None,
            jobs: 1,
            algorithms: RawAlgorithms::default(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawAlgorithms {
    preset: AlgorithmPreset,
    disabled: DisabledAlgorithms,
}

impl Inventory {
    /// Read and validate an inventory file.
    ///
    /// Relative `template_dir` and `known_hosts` paths are resolved against
    /// the inventory's own directory.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let text = fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let inventory = Self::from_yaml(&text, base)?;
        debug!("Loaded {} devices from {}", inventory.devices.len(), path.display());
        Ok(inventory)
    }

    /// Parse and validate an inventory document.
    pub fn from_yaml(text: &str, base_dir: &Path) -> Result<Self, InventoryError> {
        let raw: RawInventory = serde_yaml::from_str(text)?;
        validate_devices(&raw.devices)?;

        let options = raw.connection_options;
        if options.jobs == 0 {
            return Err(InventoryError::Invalid("connection_options.jobs must be at least 1".into()));
        }
        if !PlatformRegistry::builtin().contains(&options.platform) {
            return Err(InventoryError::Invalid(format!(
                "unknown platform '{}'",
                options.platform
            )));
        }

        let credentials = credentials(raw.credentials, Duration::from_secs(options.timeout))?;

        Ok(Self {
            credentials,
            algorithms: AlgorithmPolicy::new(options.algorithms.preset, options.algorithms.disabled),
            options: ConnectionOptions {
                port: options.port,
                command_timeout: Duration::from_secs(options.command_timeout),
                platform: options.platform,
                host_key_verification: options.host_key_verification,
                known_hosts: options.known_hosts.map(|p| resolve(base_dir, p)),
                jobs: options.jobs,
            },
            defaults: raw.defaults,
            template_dir: raw.template_dir.map(|p| resolve(base_dir, p)),
            wan_edges: raw.wan_edges,
            devices: raw.devices,
        })
    }
}

fn validate_devices(devices: &[DeviceSpec]) -> Result<(), InventoryError> {
    if devices.is_empty() {
        return Err(InventoryError::Invalid("no devices listed".into()));
    }

    let mut seen = HashSet::new();
    for device in devices {
        if device.name.trim().is_empty() || device.host.trim().is_empty() {
            return Err(InventoryError::Invalid("every device needs a name and a host".into()));
        }
        if !seen.insert(device.name.as_str()) {
            return Err(InventoryError::Invalid(format!("duplicate device '{}'", device.name)));
        }
        if device.template.is_some() && device.commands.is_some() {
            return Err(InventoryError::Invalid(format!(
                "device '{}' has both a template and inline commands",
                device.name
            )));
        }
        if let Some(platform) = &device.platform {
            if !PlatformRegistry::builtin().contains(platform) {
                return Err(InventoryError::Invalid(format!(
                    "device '{}' uses unknown platform '{}'",
                    device.name, platform
                )));
            }
        }
    }
    Ok(())
}

fn credentials(raw: RawCredentials, timeout: Duration) -> Result<CredentialSet, InventoryError> {
    let auth = match (raw.password, raw.key_file) {
        (Some(password), None) => AuthMethod::Password(SecretString::from(password)),
        (None, Some(path)) => AuthMethod::PrivateKey {
            path: expand_home(&path),
            passphrase: raw.passphrase.map(SecretString::from),
        },
        (Some(_), Some(_)) => {
            return Err(InventoryError::Invalid(
                "credentials: give either password or key_file, not both".into(),
            ));
        }
        (None, None) => {
            return Err(InventoryError::Invalid(
                "credentials: password or key_file is required".into(),
            ));
        }
    };

    Ok(CredentialSet {
        username: raw.username,
        auth,
        enable_secret: raw.enable_secret.map(SecretString::from),
        timeout,
    })
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    let path = expand_home(&path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
