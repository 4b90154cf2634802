use crate::model::Port;
use crate::rules::ClassificationRules;
use crate::view::{ListedHost, View};
use comfy_table::{presets::ASCII_FULL, Table};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;

pub const TABLE_HEADERS: [&str; 4] = ["IP", "Hostnames", "TCP", "UDP"];
pub const PORT_COLUMN_WIDTH: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("invalid sort direction '{0}', expected asc or dsc")]
    InvalidSortDirection(String),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFields {
    pub ips: bool,
    pub hostnames: bool,
}

pub fn host_list(view: &View<'_>, fields: ListFields) -> Vec<String> {
    let mut entries = BTreeSet::new();
    for listed in view.listed_hosts() {
        if fields.ips {
            entries.extend(listed.host.ip_addresses().map(|(addr, _)| addr.addr.clone()));
        }
        if fields.hostnames {
            entries.extend(listed.host.hostnames.iter().map(|name| name.name.clone()));
        }
    }
    entries.into_iter().collect()
}

pub fn render_list(entries: &[String]) -> String {
    entries.join("\n")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Dsc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: TABLE_HEADERS[0].to_string(),
            direction: SortDirection::Asc,
        }
    }
}

impl FromStr for SortSpec {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match s.split_once(';') {
            Some((column, direction)) => (column, direction.trim()),
            None => (s, ""),
        };
        let direction = if direction.is_empty() || direction.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else if direction.eq_ignore_ascii_case("dsc") || direction.eq_ignore_ascii_case("desc")
        {
            SortDirection::Dsc
        } else {
            return Err(ViewError::InvalidSortDirection(direction.to_string()));
        };
        Ok(Self {
            column: column.trim().to_string(),
            direction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HostTable {
    pub fn from_view(view: &View<'_>) -> Self {
        let rows = view.listed_hosts().iter().map(table_row).collect();
        Self {
            columns: TABLE_HEADERS.iter().map(|header| header.to_string()).collect(),
            rows,
        }
    }

    pub fn sort_by(&mut self, spec: &SortSpec) {
        let index = self
            .columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(&spec.column))
            .unwrap_or(0);
        self.rows.sort_by(|left, right| match spec.direction {
            SortDirection::Asc => left[index].cmp(&right[index]),
            SortDirection::Dsc => right[index].cmp(&left[index]),
        });
    }

    pub fn render(&self) -> String {
        let mut display = Table::new();
        display.load_preset(ASCII_FULL);
        display.set_header(
            self.columns
                .iter()
                .map(|column| column.to_uppercase())
                .collect::<Vec<_>>(),
        );
        for row in &self.rows {
            display.add_row(row.clone());
        }
        display.to_string()
    }
}

fn table_row(listed: &ListedHost<'_>) -> Vec<String> {
    let ips: BTreeSet<&str> = listed
        .host
        .ip_addresses()
        .map(|(addr, _)| addr.addr.as_str())
        .collect();
    let hostnames: BTreeSet<&str> = listed
        .host
        .hostnames
        .iter()
        .map(|name| name.name.as_str())
        .collect();

    vec![
        ips.into_iter().collect::<Vec<_>>().join("\n"),
        hostnames.into_iter().collect::<Vec<_>>().join("\n"),
        wrap_ports(&listed.tcp, PORT_COLUMN_WIDTH),
        wrap_ports(&listed.udp, PORT_COLUMN_WIDTH),
    ]
}

pub fn wrap_ports(ports: &[u16], width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for port in ports {
        let port = port.to_string();
        match lines.last_mut() {
            Some(line) if line.len() + 1 + port.len() <= width => {
                line.push(',');
                line.push_str(&port);
            }
            _ => lines.push(port),
        }
    }
    lines.join("\n")
}

/// The view's hosts as a pretty-printed JSON array.
///
/// Every host field is kept. XML attribute markers are dropped from the keys,
/// element text is keyed `value`, and `<hostnames>`/`<hostscript>` wrappers
/// collapse into plain arrays.
pub fn hosts_json(view: &View<'_>) -> Result<String, ViewError> {
    let hosts = view
        .hosts()
        .into_iter()
        .map(|host| serde_json::to_value(host).map(plain_keys))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_string_pretty(&hosts)?)
}

fn plain_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let key = match key.as_str() {
                        "$text" => "value".to_string(),
                        other => other.trim_start_matches('@').to_string(),
                    };
                    (key, unwrap_block(plain_keys(value)))
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(plain_keys).collect()),
        other => other,
    }
}

fn unwrap_block(value: Value) -> Value {
    match value {
        Value::Object(map)
            if map.len() == 1
                && ["script", "hostname"]
                    .iter()
                    .any(|key| map.get(*key).is_some_and(Value::is_array)) =>
        {
            map.into_iter().map(|(_, list)| list).next().unwrap_or_default()
        }
        other => other,
    }
}

fn scheme_for(port: &Port) -> &str {
    match port.id {
        443 => "https",
        80 => "http",
        _ => {
            let name = port.service.name.as_str();
            if name.starts_with("https") {
                "https"
            } else if name.starts_with("http") {
                "http"
            } else {
                name
            }
        }
    }
}

fn url_authority(host: &str, ip: Option<IpAddr>) -> String {
    match ip {
        Some(IpAddr::V6(_)) => format!("[{host}]"),
        _ => host.to_string(),
    }
}

pub fn service_urls(
    view: &View<'_>,
    rules: &ClassificationRules,
    scheme_prefix: &str,
) -> Vec<String> {
    let options = view.options();
    let mut urls = BTreeSet::new();

    for host in view.hosts() {
        let behind_cdn = host
            .hostnames
            .iter()
            .any(|name| rules.is_infrastructure_host(&name.name));

        for port in &host.ports.entries {
            if options.exclude_ports.contains(&port.id)
                || (!options.include_ports.is_empty() && !options.include_ports.contains(&port.id))
                || port.is_tcp_wrapped()
                || !port.is_open()
            {
                continue;
            }

            let scheme = scheme_for(port);
            if !scheme.starts_with(scheme_prefix) {
                continue;
            }
            let lead = if scheme.is_empty() {
                debug!(
                    "No scheme for {}/{} on {:?}",
                    port.id,
                    port.protocol,
                    host.address_strings()
                );
                String::new()
            } else {
                format!("{scheme}://")
            };

            let suffix = match (scheme, port.id) {
                ("http", 80) | ("https", 443) => String::new(),
                (_, id) => format!(":{id}"),
            };

            if !behind_cdn {
                for (addr, ip) in host.ip_addresses() {
                    let authority = url_authority(&addr.addr, Some(ip));
                    urls.insert(format!("{lead}{authority}{suffix}"));
                }
            }

            if scheme.starts_with("http") {
                for name in &host.hostnames {
                    if rules.merits_further_lookup(&name.name) {
                        let authority = url_authority(&name.name, None);
                        urls.insert(format!("{lead}{authority}{suffix}"));
                    }
                }
            }
        }
    }

    urls.into_iter().collect()
}
