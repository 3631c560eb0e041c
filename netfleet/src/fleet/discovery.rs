//! Parse Cisco neighbor and interface reports into records.
//!
//! The two discovery tables go through TextFSM. `show interfaces` is free-form
//! per interface and is scanned with plain regexes.

use std::collections::HashMap;

use regex::Regex;
use textfsm_rust::Template;

use super::describe::{InterfaceRecord, NeighborRecord};
use crate::error::DeviceError;

/// Neighbor-discovery report.
pub const NEIGHBORS_COMMAND: &str = "show cdp neighbors detail";

/// Interface-status report.
pub const INTERFACES_COMMAND: &str = "show ip interface brief";

/// Per-interface counters report, scanned for up/up interfaces.
pub const ACTIVITY_COMMAND: &str = "show interfaces";

const NEIGHBORS_TEMPLATE: &str = include_str!("../../templates/cisco_ios_show_cdp_neighbors_detail.textfsm");
const INTERFACES_TEMPLATE: &str = include_str!("../../templates/cisco_ios_show_ip_interface_brief.textfsm");

/// Parse `show cdp neighbors detail`.
pub fn parse_neighbors(output: &str) -> Result<Vec<NeighborRecord>, DeviceError> {
    let records = parse(NEIGHBORS_TEMPLATE, output)?;
    Ok(records
        .iter()
        .map(|r| NeighborRecord {
            local_port: field(r, "local_port"),
            remote_port: field(r, "remote_port"),
            remote_host: field(r, "destination_host"),
        })
        .filter(|n| !n.local_port.is_empty())
        .collect())
}

/// Parse `show ip interface brief`.
pub fn parse_interfaces(output: &str) -> Result<Vec<InterfaceRecord>, DeviceError> {
    let records = parse(INTERFACES_TEMPLATE, output)?;
    Ok(records
        .iter()
        .map(|r| InterfaceRecord {
            name: field(r, "intf"),
            status: field(r, "status"),
            protocol: field(r, "proto"),
        })
        .filter(|i| !i.name.is_empty())
        .collect())
}

/// Start of one interface block in `show interfaces`.
const INTERFACE_HEADER: &str = r"(?m)^(\S+) is ((?:administratively )?(?:up|down)), line protocol is (\w+)";

const LAST_INPUT: &str = r"Last input ([^,\s]+),";

/// An interface that is up with its line protocol up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceActivity {
    pub interface: String,

    /// `Last input` as the device prints it (`00:00:03`, `1w2d`, `never`).
    pub last_input: Option<String>,
}

/// Parse `show interfaces` into its up/up interfaces, in report order.
pub fn parse_active_interfaces(output: &str) -> Result<Vec<InterfaceActivity>, DeviceError> {
    let header = Regex::new(INTERFACE_HEADER).map_err(|e| DeviceError::Discovery(e.to_string()))?;
    let last_input = Regex::new(LAST_INPUT).map_err(|e| DeviceError::Discovery(e.to_string()))?;

    let blocks: Vec<_> = header.captures_iter(output).collect();
    let mut active = Vec::new();

    for (i, caps) in blocks.iter().enumerate() {
        if &caps[2] != "up" || &caps[3] != "up" {
            continue;
        }

        let start = caps.get(0).map_or(0, |m| m.end());
        let end = blocks
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(output.len(), |m| m.start());

        active.push(InterfaceActivity {
            interface: caps[1].to_string(),
            last_input: last_input.captures(&output[start..end]).map(|c| c[1].to_string()),
        });
    }

    Ok(active)
}

fn parse(template: &str, output: &str) -> Result<Vec<HashMap<String, String>>, DeviceError> {
    let template = Template::parse_str(template).map_err(|e| DeviceError::Discovery(e.to_string()))?;
    let mut parser = template.parser();
    parser
        .parse_text_to_dicts(output)
        .map_err(|e| DeviceError::Discovery(e.to_string()))
}

fn field(record: &HashMap<String, String>, name: &str) -> String {
    record
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}
