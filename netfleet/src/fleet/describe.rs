//! Interface description inference from neighbor and interface data.
//!
//! For each interface, in the order the device listed them:
//!
//! 1. a configured WAN edge gets `Connect to WAN`;
//! 2. a CDP neighbor on the port gets `Connect to <remote port> of <remote host>`;
//! 3. any other non-loopback interface gets `Connect to PC`;
//! 4. a loopback with neither is skipped.
//!
//! Ports are compared by canonical name ([`canonical_interface`]) so that
//! `Gig 0/2`, `Gi0/2` and `GigabitEthernet0/2` are the same port. Emitted
//! commands always use the interface name exactly as the device reported it.

use std::collections::HashMap;

use super::inventory::WanEdge;

/// One discovered neighbor link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRecord {
    pub local_port: String,
    pub remote_port: String,
    pub remote_host: String,
}

impl NeighborRecord {
    pub fn new(local_port: impl Into<String>, remote_port: impl Into<String>, remote_host: impl Into<String>) -> Self {
        Self {
            local_port: local_port.into(),
            remote_port: remote_port.into(),
            remote_host: remote_host.into(),
        }
    }
}

/// One local interface as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    pub status: String,
    pub protocol: String,
}

impl InterfaceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: String::new(),
            protocol: String::new(),
        }
    }
}

/// An inferred `interface` / `description` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescription {
    pub interface: String,
    pub description: String,
}

/// Description inference configured with the run's WAN edges.
#[derive(Debug, Clone, Default)]
pub struct DescriptionRules {
    wan_edges: Vec<WanEdge>,
}

impl DescriptionRules {
    pub fn new(wan_edges: Vec<WanEdge>) -> Self {
        Self { wan_edges }
    }

    fn is_wan(&self, device: &str, port_key: &str) -> bool {
        self.wan_edges
            .iter()
            .any(|edge| edge.device == device && canonical_interface(&edge.interface) == port_key)
    }

    /// Infer descriptions for `device`. Pure: same input, same output.
    pub fn infer(
        &self,
        device: &str,
        neighbors: &[NeighborRecord],
        interfaces: &[InterfaceRecord],
    ) -> Vec<InterfaceDescription> {
        let mut by_port: HashMap<String, &NeighborRecord> = HashMap::with_capacity(neighbors.len());
        for neighbor in neighbors {
            // First record wins when CDP lists a port twice
            by_port
                .entry(canonical_interface(&neighbor.local_port))
                .or_insert(neighbor);
        }

        interfaces
            .iter()
            .filter_map(|intf| {
                let key = canonical_interface(&intf.name);

                let description = if self.is_wan(device, &key) {
                    "Connect to WAN".to_string()
                } else if let Some(neighbor) = by_port.get(&key) {
                    format!("Connect to {} of {}", neighbor.remote_port, neighbor.remote_host)
                } else if !key.contains("Loopback") {
                    "Connect to PC".to_string()
                } else {
                    return None;
                };

                Some(InterfaceDescription {
                    interface: intf.name.clone(),
                    description,
                })
            })
            .collect()
    }
}

/// Flatten pairs into adjacent `interface X` / ` description Y` commands.
pub fn to_commands(descriptions: &[InterfaceDescription]) -> Vec<String> {
    descriptions
        .iter()
        .flat_map(|d| {
            [
                format!("interface {}", d.interface),
                format!(" description {}", d.description),
            ]
        })
        .collect()
}

/// Full interface type names, used to expand abbreviations.
const INTERFACE_TYPES: &[&str] = &[
    "GigabitEthernet",
    "FastEthernet",
    "TenGigabitEthernet",
    "TwentyFiveGigE",
    "FortyGigabitEthernet",
    "HundredGigE",
    "Ethernet",
    "Loopback",
    "Port-channel",
    "Serial",
    "Vlan",
    "Tunnel",
];

/// Lookup key for an interface name.
///
/// Removes all whitespace and expands the type prefix when it is an
/// unambiguous abbreviation of a known type (`G0/1`, `Gi0/1`, `Gig 0/1` all
/// become `GigabitEthernet0/1`). Unknown or ambiguous prefixes are kept.
pub fn canonical_interface(name: &str) -> String {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let split = compact
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(compact.len());
    let (prefix, rest) = compact.split_at(split);

    if prefix.is_empty() {
        return compact;
    }

    let prefix_lower = prefix.to_ascii_lowercase();
    let mut candidates = INTERFACE_TYPES
        .iter()
        .filter(|full| full.to_ascii_lowercase().starts_with(&prefix_lower));

    match (candidates.next(), candidates.next()) {
        (Some(full), None) => format!("{}{}", full, rest),
        _ => compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(out: &[InterfaceDescription]) -> Vec<(&str, &str)> {
        out.iter()
            .map(|d| (d.interface.as_str(), d.description.as_str()))
            .collect()
    }

    fn rules() -> DescriptionRules {
        DescriptionRules::new(vec![WanEdge {
            device: "R2".into(),
            interface: "GigabitEthernet0/3".into(),
        }])
    }

    #[test]
    fn test_r1_neighbors_pc_and_loopback() {
        let interfaces: Vec<_> = ["G0/0", "G0/1", "G0/2", "Loopback0"]
            .into_iter()
            .map(InterfaceRecord::new)
            .collect();
        let neighbors = vec![
            NeighborRecord::new("G0/2", "Gig 0/1", "R2"),
            NeighborRecord::new("G0/0", "Gig 0/1", "S0"),
        ];

        let out = rules().infer("R1", &neighbors, &interfaces);
        assert_eq!(
            pairs(&out),
            vec![
                ("G0/0", "Connect to Gig 0/1 of S0"),
                ("G0/1", "Connect to PC"),
                ("G0/2", "Connect to Gig 0/1 of R2"),
            ]
        );
    }

    #[test]
    fn test_r2_wan_edge() {
        let out = rules().infer("R2", &[], &[InterfaceRecord::new("G0/3")]);
        assert_eq!(pairs(&out), vec![("G0/3", "Connect to WAN")]);
    }

    #[test]
    fn test_wan_edge_only_for_its_device() {
        let out = rules().infer("R1", &[], &[InterfaceRecord::new("GigabitEthernet0/3")]);
        assert_eq!(pairs(&out), vec![("GigabitEthernet0/3", "Connect to PC")]);
    }

    #[test]
    fn test_wan_beats_neighbor() {
        let neighbors = vec![NeighborRecord::new("Gig 0/3", "Gig 0/0", "ISP")];
        let out = rules().infer("R2", &neighbors, &[InterfaceRecord::new("GigabitEthernet0/3")]);
        assert_eq!(out[0].description, "Connect to WAN");
    }

    #[test]
    fn test_cdp_short_names_match_long_names() {
        let neighbors = vec![NeighborRecord::new("Gig 0/2", "Gig 0/1", "R2")];
        let interfaces = vec![InterfaceRecord::new("GigabitEthernet0/2")];

        let out = DescriptionRules::default().infer("R1", &neighbors, &interfaces);
        assert_eq!(
            pairs(&out),
            vec![("GigabitEthernet0/2", "Connect to Gig 0/1 of R2")]
        );
    }

    #[test]
    fn test_loopback_with_neighbor_is_described() {
        let neighbors = vec![NeighborRecord::new("Loopback0", "Lo0", "R9")];
        let out = DescriptionRules::default().infer("R1", &neighbors, &[InterfaceRecord::new("Loopback0")]);
        assert_eq!(out[0].description, "Connect to Lo0 of R9");
    }

    #[test]
    fn test_only_loopbacks_yields_nothing() {
        let interfaces = vec![InterfaceRecord::new("Loopback0"), InterfaceRecord::new("Lo1")];
        assert!(DescriptionRules::default().infer("R1", &[], &interfaces).is_empty());
    }

    #[test]
    fn test_infer_is_deterministic() {
        let interfaces: Vec<_> = ["G0/0", "G0/1", "G0/2"].into_iter().map(InterfaceRecord::new).collect();
        let neighbors = vec![
            NeighborRecord::new("G0/2", "Gig 0/1", "R2"),
            NeighborRecord::new("G0/0", "Gig 0/1", "S0"),
        ];
        let rules = rules();
        let first = rules.infer("R1", &neighbors, &interfaces);
        for _ in 0..10 {
            assert_eq!(rules.infer("R1", &neighbors, &interfaces), first);
        }
    }

    #[test]
    fn test_to_commands_keeps_pairs_adjacent() {
        let out = rules().infer(
            "R1",
            &[NeighborRecord::new("G0/2", "Gig 0/1", "R2")],
            &[InterfaceRecord::new("G0/1"), InterfaceRecord::new("G0/2")],
        );
        let commands = to_commands(&out);
        assert_eq!(
            commands,
            vec![
                "interface G0/1",
                " description Connect to PC",
                "interface G0/2",
                " description Connect to Gig 0/1 of R2",
            ]
        );
        for pair in commands.chunks(2) {
            assert!(pair[0].starts_with("interface "));
            assert!(pair[1].starts_with(" description "));
        }
    }

    #[test]
    fn test_canonical_interface() {
        assert_eq!(canonical_interface("Gig 0/1"), "GigabitEthernet0/1");
        assert_eq!(canonical_interface("Gi0/1"), "GigabitEthernet0/1");
        assert_eq!(canonical_interface("G0/1"), "GigabitEthernet0/1");
        assert_eq!(canonical_interface("GigabitEthernet0/1"), "GigabitEthernet0/1");
        assert_eq!(canonical_interface("Fa0/24"), "FastEthernet0/24");
        assert_eq!(canonical_interface("Te1/0/1"), "TenGigabitEthernet1/0/1");
        assert_eq!(canonical_interface("Lo0"), "Loopback0");
        assert_eq!(canonical_interface("Po10"), "Port-channel10");
        assert_eq!(canonical_interface("Eth 1/1"), "Ethernet1/1");
        // ambiguous between TenGig, TwentyFive and Tunnel
        assert_eq!(canonical_interface("T1"), "T1");
        assert_eq!(canonical_interface("Null0"), "Null0");
    }
}
