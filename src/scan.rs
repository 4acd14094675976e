use crate::model::Interface;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCAN_TIMEOUT_SECS: u64 = 15;
pub const SCAN_EXPRESSION: &str = "ip";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub ifaces: Vec<String>,
}

impl ScanRequest {
    /// Comma separated interface list, `any` when nothing is selected.
    pub fn ifaces_param(&self) -> String {
        let picked: Vec<&str> = self
            .ifaces
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if picked.is_empty() {
            "any".to_string()
        } else {
            picked.join(",")
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(default)]
    pub ifaces: BTreeMap<String, InterfaceScan>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceScan {
    #[serde(default)]
    pub iface: Option<Interface>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub family: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub sport: Option<u16>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub dport: Option<u16>,
    #[serde(default)]
    pub packets: u64,
    #[serde(default)]
    pub bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowDirection {
    Egress,
    Ingress,
}

impl FlowDirection {
    pub fn label(self) -> &'static str {
        match self {
            FlowDirection::Egress => "egress",
            FlowDirection::Ingress => "ingress",
        }
    }
}

pub fn protocol_label(family: u32) -> &'static str {
    match family {
        17 => "UDP",
        6 => "TCP",
        1 => "ICMP",
        _ => "unknown",
    }
}

/// Egress when the flow leaves the interface's own address. Loopback-style
/// flows (source equals destination) have no direction.
pub fn flow_direction(local_ipv4: Option<&str>, source: &str, dest: &str) -> Option<FlowDirection> {
    if source == dest {
        return None;
    }
    if local_ipv4 == Some(source) {
        Some(FlowDirection::Egress)
    } else {
        Some(FlowDirection::Ingress)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanTable {
    pub iface: String,
    pub rows: Vec<ScanRow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRow {
    pub index: usize,
    pub iface: String,
    pub protocol: &'static str,
    pub source: String,
    pub source_local: bool,
    pub sport: String,
    pub dest: String,
    pub dest_local: bool,
    pub dport: String,
    pub packets: u64,
    pub bytes: u64,
    pub direction: &'static str,
}

impl ScanReport {
    /// One table per scanned interface, rows in backend order.
    pub fn tables(&self) -> Vec<ScanTable> {
        self.ifaces
            .iter()
            .map(|(key, scan)| {
                let name = scan
                    .iface
                    .as_ref()
                    .map(|i| i.name.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| key.clone());
                let local = scan.iface.as_ref().and_then(|i| i.ipv4());
                let rows = scan
                    .endpoints
                    .iter()
                    .enumerate()
                    .map(|(idx, ep)| build_row(idx + 1, &name, local, ep))
                    .collect();
                ScanTable { iface: name, rows }
            })
            .collect()
    }

    pub fn endpoint_count(&self) -> usize {
        self.ifaces.values().map(|s| s.endpoints.len()).sum()
    }
}

fn build_row(index: usize, iface: &str, local: Option<&str>, ep: &Endpoint) -> ScanRow {
    let source = ep.source.clone().unwrap_or_default();
    let dest = ep.dest.clone().unwrap_or_default();
    let direction = flow_direction(local, &source, &dest)
        .map(FlowDirection::label)
        .unwrap_or("");
    ScanRow {
        index,
        iface: iface.to_string(),
        protocol: protocol_label(ep.family),
        source_local: local.is_some() && local == Some(source.as_str()),
        dest_local: local.is_some() && local == Some(dest.as_str()),
        sport: ep.sport.map(|p| p.to_string()).unwrap_or_default(),
        dport: ep.dport.map(|p| p.to_string()).unwrap_or_default(),
        packets: ep.packets,
        bytes: ep.bytes,
        direction,
        source,
        dest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(json: &str) -> ScanReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_selection_scans_any() {
        assert_eq!(ScanRequest::default().ifaces_param(), "any");
        let req = ScanRequest {
            ifaces: vec!["eth0".into(), " ".into()],
        };
        assert_eq!(req.ifaces_param(), "eth0");
    }

    #[test]
    fn protocol_labels() {
        assert_eq!(protocol_label(17), "UDP");
        assert_eq!(protocol_label(6), "TCP");
        assert_eq!(protocol_label(1), "ICMP");
        assert_eq!(protocol_label(132), "unknown");
    }

    #[test]
    fn direction_from_local_address() {
        let local = Some("10.0.0.2");
        assert_eq!(
            flow_direction(local, "10.0.0.2", "10.0.0.9"),
            Some(FlowDirection::Egress)
        );
        assert_eq!(
            flow_direction(local, "10.0.0.9", "10.0.0.2"),
            Some(FlowDirection::Ingress)
        );
        assert_eq!(flow_direction(local, "10.0.0.2", "10.0.0.2"), None);
    }

    #[test]
    fn tables_from_backend_payload() {
        let report = report(
            r#"{"start":"x","ifaces":{"eth0":{
                "iface":{"name":"eth0","ipv4":"10.0.0.2"},
                "endpoints":[
                    {"family":17,"source":"10.0.0.2","sport":5000,"dest":"10.0.0.9","dport":8000,"packets":12,"bytes":9000},
                    {"family":6,"source":"10.0.0.9","dest":"10.0.0.2","packets":3,"bytes":180}
                ]}}}"#,
        );
        assert_eq!(report.endpoint_count(), 2);
        let tables = report.tables();
        assert_eq!(tables.len(), 1);
        let rows = &tables[0].rows;
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].protocol, "UDP");
        assert!(rows[0].source_local);
        assert_eq!(rows[0].direction, "egress");
        assert_eq!(rows[1].protocol, "TCP");
        assert_eq!(rows[1].sport, "");
        assert!(rows[1].dest_local);
        assert_eq!(rows[1].direction, "ingress");
    }

    #[test]
    fn table_name_falls_back_to_key() {
        let report = report(r#"{"ifaces":{"any":{"endpoints":[]}}}"#);
        assert_eq!(report.tables()[0].iface, "any");
        assert!(report.tables()[0].rows.is_empty());
    }
}
