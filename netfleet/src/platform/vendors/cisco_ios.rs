//! Cisco IOS / IOS-XE platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! R1>                    # exec mode
//! R1#                    # privilege_exec mode
//! R1(config)#            # configuration mode
//! R1(config-if)#         # config sub-mode (interface)
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use crate::error::PlatformError;
use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Create the Cisco IOS platform definition.
pub fn platform() -> Result<PlatformDefinition, PlatformError> {
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@/:]{1,63}>\s?$")?;

    // not_contains "(config" keeps config prompts out even if a hostname
    // pattern ever widens to allow parentheses
    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@/:]{1,63}#\s?$")?
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^password:\s?$")?
        .with_not_contains("(config");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,32}\)#\s?$",
    )?
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    Ok(PlatformDefinition::new("cisco_ios")
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_config_privilege("configuration")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Error")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_save_command("write memory")
        .with_running_config_command("show running-config")
        .with_terminal_size(511, 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_platform() {
        let platform = platform().unwrap();
        assert_eq!(platform.name, "cisco_ios");
        assert_eq!(platform.privilege_levels.len(), 3);
        assert_eq!(platform.default_privilege, "privilege_exec");
        assert_eq!(platform.config_privilege, "configuration");
        assert_eq!(platform.save_command, "write memory");
        assert_eq!(platform.running_config_command, "show running-config");
    }

    #[test]
    fn test_exec_prompt_match() {
        let platform = platform().unwrap();
        let exec = platform.get_privilege("exec").unwrap();

        assert!(exec.matches("R1>"));
        assert!(exec.matches("core-sw.lab>"));
        assert!(!exec.matches("R1#"));
        assert!(!exec.matches("R1(config)#"));
    }

    #[test]
    fn test_privilege_exec_prompt_match() {
        let platform = platform().unwrap();
        let priv_exec = platform.get_privilege("privilege_exec").unwrap();

        assert!(priv_exec.matches("R1#"));
        assert!(priv_exec.matches("R1# "));
        assert!(!priv_exec.matches("R1(config)#"));
        assert!(!priv_exec.matches("R1(config-if)#"));
        assert!(!priv_exec.matches("R1>"));
    }

    #[test]
    fn test_configuration_prompt_match() {
        let platform = platform().unwrap();
        let config = platform.get_privilege("configuration").unwrap();

        assert!(config.matches("R1(config)#"));
        assert!(config.matches("R1(config-if)#"));
        assert!(config.matches("R1(config-router)#"));
        assert!(!config.matches("R1#"));
        assert!(!config.matches("R1>"));
    }

    #[test]
    fn test_prompt_found_after_output() {
        let platform = platform().unwrap();
        let priv_exec = platform.get_privilege("privilege_exec").unwrap();

        let output = b"show ip interface brief\nInterface  IP-Address  OK? Method Status Protocol\nR1#";
        assert!(priv_exec.pattern.is_match(output));
    }

    #[test]
    fn test_enable_secret_prompt() {
        let platform = platform().unwrap();
        let priv_exec = platform.get_privilege("privilege_exec").unwrap();
        let prompt = priv_exec.escalate_prompt.as_ref().unwrap();

        assert!(prompt.is_match(b"enable\nPassword: "));
    }

    #[test]
    fn test_failure_patterns() {
        let platform = platform().unwrap();
        assert_eq!(
            platform.failure_in("% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.failure_in("% Incomplete command."), Some("% Incomplete command"));
        assert_eq!(platform.failure_in("Building configuration...\n[OK]"), None);
    }

    #[test]
    fn test_on_open_commands() {
        let platform = platform().unwrap();
        assert_eq!(
            platform.on_open_commands,
            vec!["terminal length 0".to_string(), "terminal width 511".to_string()]
        );
    }
}
