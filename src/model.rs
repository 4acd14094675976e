use serde::{Deserialize, Serialize};

pub const LOSS_PERCENTS: &[u32] = &[1, 5, 10, 15, 20, 25, 30, 35, 40, 50, 60, 70, 80, 90, 95, 100];

pub const DELAY_MILLIS: &[u32] = &[
    1, 5, 10, 15, 20, 25, 30, 40, 50, 60, 70, 80, 90, 100, 130, 150, 200, 500, 1000, 3000,
];

/// Bandwidth caps in kbps; 0 means unlimited.
pub const RATE_KBPS: &[u32] = &[
    0, 1, 10, 100, 300, 500, 800, 900, 1000, 1200, 1300, 1400, 1500, 1600, 1700, 1800, 1900,
    2000, 2500, 3000, 4000, 5000, 6000, 7000, 8000, 9000, 10000, 15000, 30000, 50000, 100000,
    1000000,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageVariant {
    Simple,
    Combined,
}

impl PageVariant {
    pub fn route(self) -> &'static str {
        match self {
            PageVariant::Simple => "/tc/p/SingleStategy",
            PageVariant::Combined => "/tc/p/ComplexStategy",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            PageVariant::Simple => "simple",
            PageVariant::Combined => "combined",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PageVariant::Simple => "Simple strategy",
            PageVariant::Combined => "Combined strategy",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
}

impl Interface {
    /// Intermediate functional block devices carry ingress shaping and are
    /// never offered for selection.
    pub fn is_ifb(&self) -> bool {
        self.name.contains("ifb")
    }

    pub fn ipv4(&self) -> Option<&str> {
        self.ipv4.as_deref().filter(|ip| !ip.is_empty())
    }

    pub fn label(&self) -> String {
        match self.ipv4() {
            Some(ip) => format!("{} ({ip})", self.name),
            None => self.name.clone(),
        }
    }
}

pub fn selectable(ifaces: &[Interface]) -> Vec<Interface> {
    ifaces.iter().filter(|i| !i.is_ifb()).cloned().collect()
}

pub fn ifb_devices(ifaces: &[Interface]) -> Vec<Interface> {
    ifaces
        .iter()
        .filter(|i| i.is_ifb() && !i.name.is_empty())
        .cloned()
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ip,
}

impl Protocol {
    pub const ALL: &'static [Protocol] = &[Protocol::Ip];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Ip => "ip",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Protocol::Ip => "IP",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub const ALL: &'static [Direction] = &[Direction::Incoming, Direction::Outgoing];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Incoming => "Incoming (data sent to this host)",
            Direction::Outgoing => "Outgoing (data sent by this host)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifyKey {
    ServerPort,
    ClientIp,
    ClientPort,
    All,
}

impl IdentifyKey {
    pub const ALL: &'static [IdentifyKey] = &[
        IdentifyKey::ServerPort,
        IdentifyKey::ClientIp,
        IdentifyKey::ClientPort,
        IdentifyKey::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IdentifyKey::ServerPort => "serverPort",
            IdentifyKey::ClientIp => "clientIp",
            IdentifyKey::ClientPort => "clientPort",
            IdentifyKey::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IdentifyKey::ServerPort => "By local port",
            IdentifyKey::ClientIp => "By peer IP",
            IdentifyKey::ClientPort => "By peer port",
            IdentifyKey::All => "Match everything",
        }
    }

    pub fn needs_value(self) -> bool {
        !matches!(self, IdentifyKey::All)
    }

    pub fn value_label(self) -> &'static str {
        match self {
            IdentifyKey::ClientIp => "IP",
            _ => "port",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default)]
    pub iface: Option<String>,
    #[serde(default)]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub identify_key: Option<IdentifyKey>,
    #[serde(default)]
    pub identify_value: Option<String>,
}

impl Filter {
    /// What a page shows before anything was saved.
    pub fn page_default() -> Self {
        Self {
            iface: None,
            protocol: Some(Protocol::Ip),
            direction: Some(Direction::Incoming),
            identify_key: Some(IdentifyKey::All),
            identify_value: None,
        }
    }

    pub fn iface(&self) -> Option<&str> {
        non_empty(self.iface.as_deref())
    }

    pub fn identify_value(&self) -> Option<&str> {
        non_empty(self.identify_value.as_deref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Loss,
    Delay,
    Rate,
}

impl StrategyKind {
    pub const ALL: &'static [StrategyKind] =
        &[StrategyKind::Loss, StrategyKind::Delay, StrategyKind::Rate];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Loss => "loss",
            StrategyKind::Delay => "delay",
            StrategyKind::Rate => "rate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Loss => "Packet loss",
            StrategyKind::Delay => "Delay",
            StrategyKind::Rate => "Bandwidth cap",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    #[serde(default)]
    pub kind: Option<StrategyKind>,
    #[serde(default)]
    pub loss: Option<u32>,
    #[serde(default)]
    pub delay: Option<u32>,
    #[serde(default)]
    pub delay_jitter: Option<String>,
    #[serde(default)]
    pub rate: Option<u32>,
}

impl Strategy {
    pub fn page_default(kind: Option<StrategyKind>) -> Self {
        Self {
            kind,
            loss: Some(1),
            delay: Some(10),
            delay_jitter: None,
            rate: Some(1_000_000),
        }
    }

    pub fn delay_jitter(&self) -> Option<&str> {
        non_empty(self.delay_jitter.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPair {
    #[serde(default)]
    pub first: Strategy,
    #[serde(default)]
    pub second: Strategy,
}

impl StrategyPair {
    pub fn page_default() -> Self {
        Self {
            first: Strategy::page_default(Some(StrategyKind::Loss)),
            second: Strategy::page_default(Some(StrategyKind::Delay)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, ipv4: Option<&str>) -> Interface {
        Interface {
            name: name.into(),
            ipv4: ipv4.map(Into::into),
            ipv6: None,
        }
    }

    #[test]
    fn ifb_devices_are_not_selectable() {
        let ifaces = vec![iface("eth0", Some("10.0.0.2")), iface("ifb0", None)];
        let names: Vec<_> = selectable(&ifaces).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["eth0"]);
        let ifbs: Vec<_> = ifb_devices(&ifaces).into_iter().map(|i| i.name).collect();
        assert_eq!(ifbs, vec!["ifb0"]);
    }

    #[test]
    fn interface_label_includes_ipv4() {
        assert_eq!(iface("eth0", Some("10.0.0.2")).label(), "eth0 (10.0.0.2)");
        assert_eq!(iface("lo", Some("")).label(), "lo");
    }

    #[test]
    fn identify_value_label() {
        assert!(!IdentifyKey::All.needs_value());
        assert!(IdentifyKey::ClientPort.needs_value());
        assert_eq!(IdentifyKey::ClientIp.value_label(), "IP");
        assert_eq!(IdentifyKey::ServerPort.value_label(), "port");
    }

    #[test]
    fn filter_uses_wire_names() {
        let filter: Filter = serde_json::from_str(
            r#"{"iface":"eth0","protocol":"ip","identifyKey":"clientIp","identifyValue":"10.0.0.9"}"#,
        )
        .unwrap();
        assert_eq!(filter.identify_key, Some(IdentifyKey::ClientIp));
        assert_eq!(filter.direction, None);
        assert_eq!(filter.identify_value(), Some("10.0.0.9"));
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let filter = Filter {
            iface: Some("  ".into()),
            identify_value: Some(String::new()),
            ..Filter::default()
        };
        assert_eq!(filter.iface(), None);
        assert_eq!(filter.identify_value(), None);
    }

    #[test]
    fn page_defaults_match_option_sets() {
        let pair = StrategyPair::page_default();
        assert_eq!(pair.first.kind, Some(StrategyKind::Loss));
        assert_eq!(pair.second.kind, Some(StrategyKind::Delay));
        assert!(LOSS_PERCENTS.contains(&pair.first.loss.unwrap()));
        assert!(DELAY_MILLIS.contains(&pair.first.delay.unwrap()));
        assert!(RATE_KBPS.contains(&pair.first.rate.unwrap()));
    }
}
