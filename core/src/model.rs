use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct ScanRun {
    #[serde(rename = "@scanner", default, skip_serializing_if = "String::is_empty")]
    pub scanner: String,
    #[serde(rename = "@args", default, skip_serializing_if = "String::is_empty")]
    pub args: String,
    #[serde(rename = "@profile_name", default, skip_serializing_if = "String::is_empty")]
    pub profile_name: String,
    #[serde(rename = "@start", default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(rename = "@startstr", default, skip_serializing_if = "String::is_empty")]
    pub start_str: String,
    #[serde(rename = "@version", default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(
        rename = "@xmloutputversion",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub xml_output_version: String,
    #[serde(rename = "scaninfo", default, skip_serializing_if = "Vec::is_empty")]
    pub scan_info: Vec<ScanInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debugging: Option<Level>,
    #[serde(rename = "output", default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Output>,
    #[serde(rename = "target", default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Target>,
    #[serde(rename = "taskbegin", default, skip_serializing_if = "Vec::is_empty")]
    pub task_begin: Vec<Task>,
    #[serde(rename = "taskprogress", default, skip_serializing_if = "Vec::is_empty")]
    pub task_progress: Vec<TaskProgress>,
    #[serde(rename = "taskend", default, skip_serializing_if = "Vec::is_empty")]
    pub task_end: Vec<Task>,
    #[serde(
        rename = "prescript",
        default,
        with = "script_block",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pre_scripts: Vec<Script>,
    #[serde(rename = "host", default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<Host>,
    #[serde(
        rename = "postscript",
        default,
        with = "script_block",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub post_scripts: Vec<Script>,
    #[serde(rename = "runstats", default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,
}

impl ScanRun {
    pub fn metadata(&self) -> ScanRun {
        ScanRun {
            scanner: self.scanner.clone(),
            args: self.args.clone(),
            profile_name: self.profile_name.clone(),
            start: self.start,
            start_str: self.start_str.clone(),
            version: self.version.clone(),
            xml_output_version: self.xml_output_version.clone(),
            scan_info: self.scan_info.clone(),
            verbose: self.verbose.clone(),
            debugging: self.debugging.clone(),
            errors: self.errors.clone(),
            targets: self.targets.clone(),
            task_begin: self.task_begin.clone(),
            task_progress: self.task_progress.clone(),
            task_end: self.task_end.clone(),
            pre_scripts: self.pre_scripts.clone(),
            hosts: Vec::new(),
            post_scripts: self.post_scripts.clone(),
            stats: self.stats.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanInfo {
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "@scanflags", default, skip_serializing_if = "String::is_empty")]
    pub scan_flags: String,
    #[serde(rename = "@protocol", default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(rename = "@numservices", default, skip_serializing_if = "Option::is_none")]
    pub num_services: Option<u32>,
    #[serde(rename = "@services", default, skip_serializing_if = "String::is_empty")]
    pub services: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(rename = "@level", default)]
    pub level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "$text", default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "@specification", default)]
    pub specification: String,
    #[serde(rename = "@status", default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(rename = "@reason", default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "@task", default)]
    pub task: String,
    #[serde(rename = "@time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(rename = "@extrainfo", default, skip_serializing_if = "String::is_empty")]
    pub extra_info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    #[serde(rename = "@task", default)]
    pub task: String,
    #[serde(rename = "@time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(rename = "@percent", default, skip_serializing_if = "String::is_empty")]
    pub percent: String,
    #[serde(rename = "@remaining", default, skip_serializing_if = "String::is_empty")]
    pub remaining: String,
    #[serde(rename = "@etc", default, skip_serializing_if = "String::is_empty")]
    pub etc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<Finished>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<HostCounts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finished {
    #[serde(rename = "@time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(rename = "@timestr", default, skip_serializing_if = "String::is_empty")]
    pub time_str: String,
    #[serde(rename = "@elapsed", default, skip_serializing_if = "String::is_empty")]
    pub elapsed: String,
    #[serde(rename = "@summary", default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(rename = "@exit", default, skip_serializing_if = "String::is_empty")]
    pub exit: String,
    #[serde(rename = "@errormsg", default, skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostCounts {
    #[serde(rename = "@up", default)]
    pub up: u32,
    #[serde(rename = "@down", default)]
    pub down: u32,
    #[serde(rename = "@total", default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(rename = "@starttime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(rename = "@endtime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(rename = "@comment", default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "address", default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    #[serde(default, with = "hostname_block", skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<Hostname>,
    #[serde(rename = "smurf", default, skip_serializing_if = "Vec::is_empty")]
    pub smurfs: Vec<Smurf>,
    #[serde(default, skip_serializing_if = "PortTable::is_empty")]
    pub ports: PortTable,
    #[serde(default, skip_serializing_if = "Os::is_empty")]
    pub os: Os,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<Uptime>,
    #[serde(rename = "tcpsequence", default, skip_serializing_if = "Option::is_none")]
    pub tcp_sequence: Option<Sequence>,
    #[serde(rename = "ipidsequence", default, skip_serializing_if = "Option::is_none")]
    pub ip_id_sequence: Option<Sequence>,
    #[serde(rename = "tcptssequence", default, skip_serializing_if = "Option::is_none")]
    pub tcp_ts_sequence: Option<Sequence>,
    #[serde(
        rename = "hostscript",
        default,
        with = "script_block",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub host_scripts: Vec<Script>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Times>,
}

impl Host {
    pub fn address_strings(&self) -> Vec<String> {
        self.addresses.iter().map(|addr| addr.addr.clone()).collect()
    }

    pub fn hostname_strings(&self) -> Vec<String> {
        self.hostnames.iter().map(|name| name.name.clone()).collect()
    }

    pub fn ip_addresses(&self) -> impl Iterator<Item = (&Address, IpAddr)> {
        self.addresses
            .iter()
            .filter_map(|addr| addr.ip().map(|ip| (addr, ip)))
    }

    pub fn display_name(&self) -> Option<&str> {
        self.hostnames
            .first()
            .map(|name| name.name.as_str())
            .or_else(|| self.addresses.first().map(|addr| addr.addr.as_str()))
    }

    pub fn has_open_ports(&self) -> bool {
        self.ports.entries.iter().any(Port::is_open)
    }

    pub fn is_up(&self) -> bool {
        self.status.state == "up"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "@state", default)]
    pub state: String,
    #[serde(rename = "@reason", default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(rename = "@reason_ttl", default, skip_serializing_if = "Option::is_none")]
    pub reason_ttl: Option<u32>,
}

impl Status {
    pub fn is_unknown(&self) -> bool {
        self.state.is_empty() || self.state == "unknown"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype", default)]
    pub addr_type: String,
    #[serde(rename = "@vendor", default, skip_serializing_if = "String::is_empty")]
    pub vendor: String,
}

impl Address {
    pub fn ipv4(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            addr_type: "ipv4".to_string(),
            vendor: String::new(),
        }
    }

    pub fn ipv6(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            addr_type: "ipv6".to_string(),
            vendor: String::new(),
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.addr.parse().ok()
    }

    pub fn same_as(&self, other: &Address) -> bool {
        self.addr == other.addr && self.addr_type == other.addr_type
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hostname {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Hostname {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "user".to_string(),
        }
    }

    pub fn ptr(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "PTR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Smurf {
    #[serde(rename = "@responses", default)]
    pub responses: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortTable {
    #[serde(rename = "extraports", default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ExtraPorts>,
    #[serde(rename = "port", default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Port>,
}

impl PortTable {
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraPorts {
    #[serde(rename = "@state", default)]
    pub state: String,
    #[serde(rename = "@count", default)]
    pub count: u32,
    #[serde(rename = "extrareasons", default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<ExtraReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraReason {
    #[serde(rename = "@reason", default)]
    pub reason: String,
    #[serde(rename = "@count", default)]
    pub count: u32,
    #[serde(rename = "@proto", default, skip_serializing_if = "String::is_empty")]
    pub proto: String,
    #[serde(rename = "@ports", default, skip_serializing_if = "String::is_empty")]
    pub ports: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub id: u16,
    #[serde(default)]
    pub state: PortState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(default, skip_serializing_if = "Service::is_blank")]
    pub service: Service,
    #[serde(rename = "script", default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<Script>,
}

impl Port {
    pub fn new(protocol: impl Into<String>, id: u16, state: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            id,
            state: PortState {
                state: state.into(),
                ..PortState::default()
            },
            ..Port::default()
        }
    }

    pub fn is_tcp(&self) -> bool {
        self.protocol.eq_ignore_ascii_case("tcp")
    }

    pub fn is_open(&self) -> bool {
        self.state.state == "open"
    }

    pub fn is_closed(&self) -> bool {
        self.state.state == "closed"
    }

    pub fn is_tcp_wrapped(&self) -> bool {
        self.service.name == "tcpwrapped"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortState {
    #[serde(rename = "@state", default)]
    pub state: String,
    #[serde(rename = "@reason", default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(rename = "@reason_ttl", default, skip_serializing_if = "Option::is_none")]
    pub reason_ttl: Option<u32>,
    #[serde(rename = "@reason_ip", default, skip_serializing_if = "String::is_empty")]
    pub reason_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "@name", default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@product", default, skip_serializing_if = "String::is_empty")]
    pub product: String,
    #[serde(rename = "@version", default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(rename = "@extrainfo", default, skip_serializing_if = "String::is_empty")]
    pub extra_info: String,
    #[serde(rename = "@tunnel", default, skip_serializing_if = "String::is_empty")]
    pub tunnel: String,
    #[serde(rename = "@proto", default, skip_serializing_if = "String::is_empty")]
    pub proto: String,
    #[serde(rename = "@hostname", default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(rename = "@ostype", default, skip_serializing_if = "String::is_empty")]
    pub os_type: String,
    #[serde(rename = "@devicetype", default, skip_serializing_if = "String::is_empty")]
    pub device_type: String,
    #[serde(rename = "@servicefp", default, skip_serializing_if = "String::is_empty")]
    pub service_fp: String,
    #[serde(rename = "@method", default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(rename = "@conf", default)]
    pub confidence: u8,
    #[serde(rename = "cpe", default, skip_serializing_if = "Vec::is_empty")]
    pub cpes: Vec<String>,
}

impl Service {
    pub fn is_informative(&self) -> bool {
        self.method == "probed"
            || !self.product.is_empty()
            || !self.version.is_empty()
            || !self.extra_info.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.method.is_empty() && !self.is_informative()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@output", default)]
    pub output: String,
    #[serde(rename = "elem", default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ScriptElement>,
    #[serde(rename = "table", default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<ScriptTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptElement {
    #[serde(rename = "@key", default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptTable {
    #[serde(rename = "@key", default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(rename = "elem", default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ScriptElement>,
    #[serde(rename = "table", default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<ScriptTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Os {
    #[serde(rename = "portused", default, skip_serializing_if = "Vec::is_empty")]
    pub ports_used: Vec<PortUsed>,
    #[serde(rename = "osmatch", default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<OsMatch>,
    #[serde(rename = "osfingerprint", default, skip_serializing_if = "Vec::is_empty")]
    pub fingerprints: Vec<OsFingerprint>,
}

impl Os {
    pub fn is_empty(&self) -> bool {
        self.ports_used.is_empty() && self.matches.is_empty() && self.fingerprints.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortUsed {
    #[serde(rename = "@state", default)]
    pub state: String,
    #[serde(rename = "@proto", default)]
    pub proto: String,
    #[serde(rename = "@portid", default)]
    pub id: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsMatch {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@accuracy", default)]
    pub accuracy: u8,
    #[serde(rename = "@line", default, skip_serializing_if = "String::is_empty")]
    pub line: String,
    #[serde(rename = "osclass", default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<OsClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsClass {
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "@vendor", default, skip_serializing_if = "String::is_empty")]
    pub vendor: String,
    #[serde(rename = "@osfamily", default, skip_serializing_if = "String::is_empty")]
    pub family: String,
    #[serde(rename = "@osgen", default, skip_serializing_if = "String::is_empty")]
    pub generation: String,
    #[serde(rename = "@accuracy", default)]
    pub accuracy: u8,
    #[serde(rename = "cpe", default, skip_serializing_if = "Vec::is_empty")]
    pub cpes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsFingerprint {
    #[serde(rename = "@fingerprint", default)]
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    #[serde(rename = "@value", default)]
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Uptime {
    #[serde(rename = "@seconds", default)]
    pub seconds: u64,
    #[serde(rename = "@lastboot", default, skip_serializing_if = "String::is_empty")]
    pub last_boot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(rename = "@index", default, skip_serializing_if = "String::is_empty")]
    pub index: String,
    #[serde(rename = "@difficulty", default, skip_serializing_if = "String::is_empty")]
    pub difficulty: String,
    #[serde(rename = "@class", default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(rename = "@values", default, skip_serializing_if = "String::is_empty")]
    pub values: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "@port", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "@proto", default, skip_serializing_if = "String::is_empty")]
    pub proto: String,
    #[serde(rename = "hop", default, skip_serializing_if = "Vec::is_empty")]
    pub hops: Vec<Hop>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    #[serde(rename = "@ttl", default)]
    pub ttl: u32,
    #[serde(rename = "@ipaddr", default, skip_serializing_if = "String::is_empty")]
    pub ip_addr: String,
    #[serde(rename = "@rtt", default, skip_serializing_if = "String::is_empty")]
    pub rtt: String,
    #[serde(rename = "@host", default, skip_serializing_if = "String::is_empty")]
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Times {
    #[serde(rename = "@srtt", default, skip_serializing_if = "String::is_empty")]
    pub srtt: String,
    #[serde(rename = "@rttvar", default, skip_serializing_if = "String::is_empty")]
    pub rttvar: String,
    #[serde(rename = "@to", default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

mod script_block {
    use super::Script;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct BlockRef<'a> {
        #[serde(rename = "script")]
        scripts: &'a [Script],
    }

    #[derive(Deserialize)]
    struct Block {
        #[serde(rename = "script", default)]
        scripts: Vec<Script>,
    }

    pub fn serialize<S: Serializer>(scripts: &[Script], serializer: S) -> Result<S::Ok, S::Error> {
        BlockRef { scripts }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Script>, D::Error> {
        Ok(Block::deserialize(deserializer)?.scripts)
    }
}

mod hostname_block {
    use super::Hostname;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct BlockRef<'a> {
        #[serde(rename = "hostname")]
        hostnames: &'a [Hostname],
    }

    #[derive(Deserialize)]
    struct Block {
        #[serde(rename = "hostname", default)]
        hostnames: Vec<Hostname>,
    }

    pub fn serialize<S: Serializer>(
        hostnames: &[Hostname],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        BlockRef { hostnames }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Hostname>, D::Error> {
        Ok(Block::deserialize(deserializer)?.hostnames)
    }
}
