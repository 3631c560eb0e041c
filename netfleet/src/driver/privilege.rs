//! Privilege level management with graph-based navigation.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// Tracks the current privilege level and plans moves between levels.
///
/// Each level is linked to its parent (`previous_priv`), giving an undirected
/// graph; moving between two levels walks the shortest path through it.
#[derive(Debug)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    graph: HashMap<String, HashSet<String>>,
    current: Option<String>,
}

/// A single hop between adjacent privilege levels.
#[derive(Debug, Clone)]
pub struct TransitionInfo {
    /// Command to execute for the transition.
    pub command: String,

    /// Secret prompt the device may show before reaching the new level.
    pub auth_prompt: Option<Regex>,
}

impl PrivilegeManager {
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let mut graph: HashMap<String, HashSet<String>> = HashMap::new();
        for (name, level) in &levels {
            graph.entry(name.clone()).or_default();
            if let Some(parent) = &level.previous_priv {
                graph.entry(name.clone()).or_default().insert(parent.clone());
                graph.entry(parent.clone()).or_default().insert(name.clone());
            }
        }

        Self {
            levels,
            graph,
            current: None,
        }
    }

    /// Level whose prompt matches `prompt`, honouring `not_contains`.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// Update the current level from a freshly matched prompt.
    ///
    /// Returns the new level name, or `None` if no level matched (the
    /// previous level is kept).
    pub fn update_from_prompt(&mut self, prompt: &str) -> Option<&str> {
        let name = self.determine_from_prompt(prompt).ok()?.name.clone();
        self.current = Some(name);
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&PrivilegeLevel> {
        self.current.as_ref().and_then(|name| self.levels.get(name))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if !self.levels.contains_key(name) {
            return Err(DriverError::UnknownPrivilege {
                prompt: name.to_string(),
            }
            .into());
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// Shortest path between two levels, both ends included.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        if from == to {
            return Ok(vec![from.to_string()]);
        }

        let mut queue = VecDeque::from([from.to_string()]);
        let mut came_from: HashMap<String, String> = HashMap::new();
        let mut seen = HashSet::from([from.to_string()]);

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![node];
                while let Some(prev) = path.last().and_then(|n| came_from.get(n)) {
                    path.push(prev.clone());
                }
                path.reverse();
                return Ok(path);
            }

            for next in self.graph.get(&node).into_iter().flatten() {
                if seen.insert(next.clone()) {
                    came_from.insert(next.clone(), node.clone());
                    queue.push_back(next.clone());
                }
            }
        }

        Err(DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into())
    }

    /// Command that moves from `from` to the adjacent level `to`.
    pub fn get_transition(&self, from: &str, to: &str) -> Option<TransitionInfo> {
        let from_level = self.levels.get(from)?;
        let to_level = self.levels.get(to)?;

        if to_level.previous_priv.as_deref() == Some(from) {
            return Some(TransitionInfo {
                command: to_level.escalate_command.clone()?,
                auth_prompt: to_level.escalate_prompt.clone(),
            });
        }

        if from_level.previous_priv.as_deref() == Some(to) {
            return Some(TransitionInfo {
                command: from_level.deescalate_command.clone()?,
                auth_prompt: None,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::cisco_ios;

    fn manager() -> PrivilegeManager {
        PrivilegeManager::new(cisco_ios::platform().unwrap().privilege_levels)
    }

    #[test]
    fn test_determine_privilege() {
        let manager = manager();
        assert_eq!(manager.determine_from_prompt("R1>").unwrap().name, "exec");
        assert_eq!(manager.determine_from_prompt("R1#").unwrap().name, "privilege_exec");
        assert_eq!(
            manager.determine_from_prompt("R1(config-if)#").unwrap().name,
            "configuration"
        );
        assert!(manager.determine_from_prompt("Password:").is_err());
    }

    #[test]
    fn test_update_from_prompt_keeps_previous_on_miss() {
        let mut manager = manager();
        assert_eq!(manager.update_from_prompt("R1#"), Some("privilege_exec"));
        assert_eq!(manager.update_from_prompt("???"), None);
        assert_eq!(manager.current_name(), Some("privilege_exec"));
    }

    #[test]
    fn test_find_path() {
        let manager = manager();
        assert_eq!(
            manager.find_path("exec", "configuration").unwrap(),
            vec!["exec", "privilege_exec", "configuration"]
        );
        assert_eq!(
            manager.find_path("configuration", "privilege_exec").unwrap(),
            vec!["configuration", "privilege_exec"]
        );
        assert_eq!(manager.find_path("exec", "exec").unwrap(), vec!["exec"]);
        assert!(manager.find_path("exec", "shell").is_err());
    }

    #[test]
    fn test_get_transition() {
        let manager = manager();

        let up = manager.get_transition("exec", "privilege_exec").unwrap();
        assert_eq!(up.command, "enable");
        assert!(up.auth_prompt.is_some());

        let down = manager.get_transition("configuration", "privilege_exec").unwrap();
        assert_eq!(down.command, "end");
        assert!(down.auth_prompt.is_none());

        assert!(manager.get_transition("exec", "configuration").is_none());
    }
}
