//! Privilege level definition.

use regex::bytes::Regex;

use crate::error::PlatformError;

/// A privilege level definition for a network device.
///
/// Privilege levels form a graph where each level can have a parent
/// (previous_priv) and commands to escalate/de-escalate between levels.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g., "exec", "privilege_exec", "configuration").
    pub name: String,

    /// Regex pattern to match the prompt for this privilege level.
    pub pattern: Regex,

    /// Name of the parent privilege level (None for root level).
    pub previous_priv: Option<String>,

    /// Command to escalate TO this level from the parent.
    pub escalate_command: Option<String>,

    /// Command to de-escalate FROM this level to the parent.
    pub deescalate_command: Option<String>,

    /// Pattern matching the secret prompt shown during escalation, if any.
    pub escalate_prompt: Option<Regex>,

    /// Strings that must NOT be in the prompt for this level to match.
    /// Used for disambiguation (e.g., "#" matches both priv and config modes).
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    /// Create a new privilege level with minimal required fields.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, PlatformError> {
        let name = name.into();
        let pattern = compile(&name, pattern)?;
        Ok(Self {
            name,
            pattern,
            previous_priv: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    /// Set the escalation command.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    /// Set the de-escalation command.
    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Escalation may stop at a secret prompt matching `prompt_pattern`.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, PlatformError> {
        self.escalate_prompt = Some(compile(&self.name, prompt_pattern)?);
        Ok(self)
    }

    /// Add a not_contains pattern.
    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Whether escalating into this level may ask for a secret.
    pub fn requires_auth(&self) -> bool {
        self.escalate_prompt.is_some()
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}

fn compile(level: &str, pattern: &str) -> Result<Regex, PlatformError> {
    Regex::new(pattern).map_err(|e| PlatformError::InvalidDefinition {
        message: format!("privilege level '{}': {}", level, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_contains_disambiguates() {
        let level = PrivilegeLevel::new("privilege_exec", r"(?m)^\S+#\s?$")
            .unwrap()
            .with_not_contains("(config");

        assert!(level.matches("R1#"));
        assert!(!level.matches("R1(config)#"));
    }

    #[test]
    fn test_invalid_pattern_is_definition_error() {
        let err = PrivilegeLevel::new("exec", r"(unclosed").unwrap_err();
        assert!(matches!(err, PlatformError::InvalidDefinition { .. }));
        assert!(err.to_string().contains("exec"));
    }

    #[test]
    fn test_requires_auth() {
        let level = PrivilegeLevel::new("privilege_exec", r"#\s?$")
            .unwrap()
            .with_auth(r"(?mi)^password:\s?$")
            .unwrap();
        assert!(level.requires_auth());
        assert!(level.escalate_prompt.unwrap().is_match(b"Password: "));
    }
}
