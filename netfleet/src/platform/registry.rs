//! Platform registry for looking up platform definitions by name.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::error;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::PlatformError;

/// Platform used when a device does not name one.
pub const DEFAULT_PLATFORM: &str = "cisco_ios";

/// Built-in platforms, constructed on first use.
static BUILTIN: LazyLock<PlatformRegistry> = LazyLock::new(PlatformRegistry::with_builtin_platforms);

/// Registry for platform definitions.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Registry holding every built-in platform.
    pub fn builtin() -> &'static PlatformRegistry {
        &BUILTIN
    }

    /// Create a registry preloaded with the built-in platforms.
    pub fn with_builtin_platforms() -> Self {
        let mut registry = Self::new();
        for platform in [vendors::cisco_ios::platform(), vendors::arista_eos::platform()] {
            match platform {
                Ok(platform) => {
                    if let Err(e) = registry.register(platform) {
                        error!("{}", e);
                    }
                }
                Err(e) => error!("Skipping built-in platform: {}", e),
            }
        }
        registry
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<(), PlatformError> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            });
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    /// Get an owned copy of a platform, or fail with `UnknownPlatform`.
    pub fn lookup(&self, name: &str) -> Result<PlatformDefinition, PlatformError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownPlatform {
                name: name.to_string(),
            })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }
}
