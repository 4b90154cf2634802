use crate::model::{Host, Port, ScanRun};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

pub trait HostFilter {
    fn accept(&self, hostnames: &[String], ips: &[String]) -> bool;
}

impl<F> HostFilter for F
where
    F: Fn(&[String], &[String]) -> bool,
{
    fn accept(&self, hostnames: &[String], ips: &[String]) -> bool {
        self(hostnames, ips)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl HostFilter for AcceptAll {
    fn accept(&self, _hostnames: &[String], _ips: &[String]) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExcludeNames {
    names: BTreeSet<String>,
}

impl ExcludeNames {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl HostFilter for ExcludeNames {
    fn accept(&self, hostnames: &[String], ips: &[String]) -> bool {
        !hostnames
            .iter()
            .chain(ips)
            .any(|name| self.names.contains(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub require_private_ip: bool,
    pub require_public_ip: bool,
    pub require_alive: bool,
    pub require_open_ports: bool,
    pub ignore_tcp_wrapped: bool,
    pub exclude_ports: BTreeSet<u16>,
    pub include_ports: BTreeSet<u16>,
    pub exclude_names: BTreeSet<String>,
}

pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HostFacts {
    has_private_ip: bool,
    has_public_ip: bool,
    is_up: bool,
    has_open_ports: bool,
    only_excluded_ports_open: bool,
    has_included_port: bool,
}

impl HostFacts {
    fn of(host: &Host, options: &ViewOptions) -> Self {
        let mut facts = HostFacts {
            is_up: host.is_up(),
            has_open_ports: host.has_open_ports(),
            ..HostFacts::default()
        };

        for (_, ip) in host.ip_addresses() {
            if is_private_ip(&ip) {
                facts.has_private_ip = true;
            } else {
                facts.has_public_ip = true;
            }
        }

        let mut open = host.ports.entries.iter().filter(|port| port.is_open()).peekable();
        facts.only_excluded_ports_open = !options.exclude_ports.is_empty()
            && open.peek().is_some()
            && open.all(|port| options.exclude_ports.contains(&port.id));

        facts.has_included_port = host
            .ports
            .entries
            .iter()
            .any(|port| options.include_ports.contains(&port.id));

        facts
    }

    fn passes(&self, options: &ViewOptions) -> bool {
        if options.require_private_ip && !self.has_private_ip {
            return false;
        }
        if options.require_public_ip && !self.has_public_ip {
            return false;
        }
        if options.require_alive && !self.is_up && !self.has_open_ports {
            return false;
        }
        if options.require_open_ports && !self.has_open_ports {
            return false;
        }
        if self.only_excluded_ports_open {
            return false;
        }
        if !options.include_ports.is_empty() && !self.has_included_port {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListedHost<'a> {
    pub host: &'a Host,
    pub tcp: Vec<u16>,
    pub udp: Vec<u16>,
}

/// Read-only filtered view over a reconciled run.
///
/// The run is never mutated; every call recomputes its selection from the
/// same borrowed data, so one run can back any number of views.
pub struct View<'a> {
    run: &'a ScanRun,
    options: ViewOptions,
    filters: Vec<Box<dyn HostFilter + 'a>>,
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("hosts", &self.run.hosts.len())
            .field("options", &self.options)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl<'a> View<'a> {
    pub fn new(run: &'a ScanRun, options: ViewOptions) -> Self {
        let mut filters: Vec<Box<dyn HostFilter + 'a>> = Vec::new();
        if !options.exclude_names.is_empty() {
            filters.push(Box::new(ExcludeNames::new(
                options.exclude_names.iter().cloned(),
            )));
        }
        Self {
            run,
            options,
            filters,
        }
    }

    pub fn with_filter(mut self, filter: impl HostFilter + 'a) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    fn accepted_by_filters(&self, host: &Host) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        let hostnames = host.hostname_strings();
        let ips = host.address_strings();
        self.filters
            .iter()
            .all(|filter| filter.accept(&hostnames, &ips))
    }

    pub fn hosts(&self) -> Vec<&'a Host> {
        let run: &'a ScanRun = self.run;
        run.hosts
            .iter()
            .filter(|host| self.accepted_by_filters(host))
            .filter(|host| HostFacts::of(host, &self.options).passes(&self.options))
            .collect()
    }

    pub fn listed_hosts(&self) -> Vec<ListedHost<'a>> {
        self.hosts()
            .into_iter()
            .filter_map(|host| {
                let (mut tcp, mut udp) = (Vec::new(), Vec::new());
                for port in host.ports.entries.iter().filter(|port| self.is_listed(port)) {
                    if port.is_tcp() {
                        tcp.push(port.id);
                    } else {
                        udp.push(port.id);
                    }
                }

                if self.options.ignore_tcp_wrapped && tcp.is_empty() && udp.is_empty() {
                    return None;
                }

                tcp.sort_unstable();
                udp.sort_unstable();
                Some(ListedHost { host, tcp, udp })
            })
            .collect()
    }

    fn is_listed(&self, port: &Port) -> bool {
        port.is_open()
            && !self.options.exclude_ports.contains(&port.id)
            && !(self.options.ignore_tcp_wrapped && port.is_tcp_wrapped())
    }
}
