use crate::document::load_scan;
use crate::model::{Address, Host, HostCounts, Hostname, Port, ScanRun, Service};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub open_only: bool,
    pub up_only: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MergeError {
    #[error("no nmap files merged")]
    NoInput,
}

pub fn merge_files<P: AsRef<Path>>(
    paths: &[P],
    options: MergeOptions,
) -> Result<ScanRun, MergeError> {
    let mut runs = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match load_scan(path) {
            Ok(run) => runs.push(run),
            Err(err) => warn!("Skipping {} due to error: {err}", path.display()),
        }
    }
    merge_runs(runs, options)
}

pub fn merge_runs(
    runs: impl IntoIterator<Item = ScanRun>,
    options: MergeOptions,
) -> Result<ScanRun, MergeError> {
    let mut merged: Option<ScanRun> = None;
    let mut index = HostIndex::default();
    let mut run_count = 0usize;

    for mut run in runs {
        run_count += 1;
        for host in std::mem::take(&mut run.hosts) {
            index.insert(host);
        }
        match merged.as_mut() {
            Some(target) => append_metadata(target, run),
            None => merged = Some(run),
        }
    }

    let mut merged = merged.ok_or(MergeError::NoInput)?;
    merged.hosts = index
        .into_hosts()
        .filter_map(|host| finish_host(host, options))
        .collect();
    refresh_host_counts(&mut merged);

    info!(
        "Merged {run_count} scan(s) into {} host(s)",
        merged.hosts.len()
    );
    Ok(merged)
}

pub fn split_run(run: &ScanRun) -> Vec<ScanRun> {
    run.hosts
        .iter()
        .map(|host| {
            let mut single = run.metadata();
            single.hosts = vec![host.clone()];
            refresh_host_counts(&mut single);
            single
        })
        .collect()
}

fn append_metadata(target: &mut ScanRun, run: ScanRun) {
    target.errors.extend(run.errors);
    target.pre_scripts.extend(run.pre_scripts);
    target.post_scripts.extend(run.post_scripts);
    target.targets.extend(run.targets);
    target.task_begin.extend(run.task_begin);
    target.task_progress.extend(run.task_progress);
    target.task_end.extend(run.task_end);
}

fn finish_host(mut host: Host, options: MergeOptions) -> Option<Host> {
    if options.up_only && !host.is_up() {
        return None;
    }

    if options.open_only {
        host.ports
            .entries
            .retain(|port| port.state.state.contains("open"));
        if host.ports.entries.is_empty() {
            return None;
        }
    }

    host.ports.entries.sort_by_key(|port| port.id);
    Some(host)
}

fn refresh_host_counts(run: &mut ScanRun) {
    let up = run.hosts.iter().filter(|host| host.is_up()).count() as u32;
    let total = run.hosts.len() as u32;
    if let Some(stats) = run.stats.as_mut() {
        stats.hosts = Some(HostCounts {
            up,
            down: total - up,
            total,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IdentityKey {
    Address(String),
    Hostname(String),
}

fn identity_keys(host: &Host) -> Vec<IdentityKey> {
    if host.addresses.is_empty() {
        host.hostnames
            .iter()
            .map(|hostname| IdentityKey::Hostname(hostname.name.clone()))
            .collect()
    } else {
        host.addresses
            .iter()
            .map(|address| IdentityKey::Address(address.addr.clone()))
            .collect()
    }
}

#[derive(Debug, Default)]
struct HostIndex {
    slots: Vec<Option<Host>>,
    keys: HashMap<IdentityKey, usize>,
}

impl HostIndex {
    fn insert(&mut self, host: Host) {
        let mut hits: Vec<usize> = identity_keys(&host)
            .iter()
            .filter_map(|key| self.keys.get(key).copied())
            .collect();
        hits.sort_unstable();
        hits.dedup();

        let slot = match hits.split_first() {
            None => {
                self.slots.push(Some(host));
                self.slots.len() - 1
            }
            Some((&primary, bridged)) => {
                // The incoming host links entries that were distinct so far.
                for &other in bridged {
                    if let Some(absorbed) = self.slots[other].take() {
                        debug!("Host links two entries; folding entry {other} into {primary}");
                        self.merge_into(primary, absorbed);
                    }
                }
                self.merge_into(primary, host);
                primary
            }
        };

        if let Some(entry) = &self.slots[slot] {
            for key in identity_keys(entry) {
                self.keys.insert(key, slot);
            }
        }
    }

    fn merge_into(&mut self, slot: usize, incoming: Host) {
        if let Some(existing) = self.slots[slot].take() {
            self.slots[slot] = Some(merge_host(existing, incoming));
        }
    }

    fn into_hosts(self) -> impl Iterator<Item = Host> {
        self.slots.into_iter().flatten()
    }
}

pub fn merge_host(existing: Host, incoming: Host) -> Host {
    let mut merged = existing;
    let incoming_is_later = incoming.start_time.unwrap_or(0) > merged.start_time.unwrap_or(0);

    let addresses = std::mem::take(&mut merged.addresses);
    merged.addresses = union_by(addresses, incoming.addresses, Address::same_as);

    let hostnames = std::mem::take(&mut merged.hostnames);
    merged.hostnames = union_by(hostnames, incoming.hostnames, |left: &Hostname, right| {
        left.name == right.name
    });

    if merged.status.is_unknown() && !incoming.status.is_unknown() {
        merged.status = incoming.status;
    }

    if incoming_is_later {
        merged.start_time = incoming.start_time;
        merged.end_time = incoming.end_time;
    }

    merged.os.ports_used.extend(incoming.os.ports_used);
    merged.os.matches.extend(incoming.os.matches);
    merged.os.fingerprints.extend(incoming.os.fingerprints);
    merged.host_scripts.extend(incoming.host_scripts);
    merged.smurfs.extend(incoming.smurfs);
    merged.ports.extra.extend(incoming.ports.extra);

    let ports = std::mem::take(&mut merged.ports.entries);
    merged.ports.entries = merge_port_lists(ports, incoming.ports.entries);

    debug!(
        "Merged host {}",
        merged
            .addresses
            .first()
            .map(|address| address.addr.as_str())
            .unwrap_or("<no address>")
    );
    merged
}

fn union_by<T>(left: Vec<T>, right: Vec<T>, same: impl Fn(&T, &T) -> bool) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(left.len() + right.len());
    for item in left.into_iter().chain(right) {
        if !out.iter().any(|seen| same(seen, &item)) {
            out.push(item);
        }
    }
    out
}

fn merge_port_lists(left: Vec<Port>, right: Vec<Port>) -> Vec<Port> {
    let mut by_key: BTreeMap<(String, u16), Port> = BTreeMap::new();
    for port in left.into_iter().chain(right) {
        let key = (port.protocol.to_ascii_lowercase(), port.id);
        let port = match by_key.remove(&key) {
            Some(found) => merge_port(found, port),
            None => port,
        };
        by_key.insert(key, port);
    }
    by_key.into_values().collect()
}

/// Resolves two observations of the same port; `p1` was seen first.
///
/// A closed observation never beats a non-closed one. Otherwise `p1` keeps
/// its identity and state, takes the most informative service and collects
/// both sides' scripts.
pub fn merge_port(p1: Port, p2: Port) -> Port {
    match (p1.is_closed(), p2.is_closed()) {
        (false, true) => return p1,
        (true, false) => return p2,
        _ => {}
    }

    let service = most_accurate_service(p1.service, p2.service);
    let mut scripts = p1.scripts;
    scripts.extend(p2.scripts);

    Port {
        protocol: p1.protocol,
        id: p1.id,
        state: p1.state,
        owner: p1.owner,
        service,
        scripts,
    }
}

fn most_accurate_service(s1: Service, s2: Service) -> Service {
    match (s1.is_informative(), s2.is_informative()) {
        (true, false) => s1,
        (false, true) => s2,
        (true, true) if s2.confidence > s1.confidence => s2,
        _ => s1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Os, OsFingerprint, RunStats, Script, Status, Task};
    use std::fs;

    fn host(addrs: &[&str], names: &[&str], ports: Vec<Port>) -> Host {
        let mut host = Host {
            addresses: addrs.iter().map(|addr| Address::ipv4(*addr)).collect(),
            hostnames: names.iter().map(|name| Hostname::user(*name)).collect(),
            status: Status {
                state: "up".to_string(),
                ..Status::default()
            },
            ..Host::default()
        };
        host.ports.entries = ports;
        host
    }

    fn run_of(hosts: Vec<Host>) -> ScanRun {
        ScanRun {
            scanner: "nmap".to_string(),
            hosts,
            ..ScanRun::default()
        }
    }

    fn probed(product: &str, confidence: u8) -> Service {
        Service {
            name: "http".to_string(),
            product: product.to_string(),
            method: "probed".to_string(),
            confidence,
            ..Service::default()
        }
    }

    fn table_guess() -> Service {
        Service {
            name: "http".to_string(),
            method: "table".to_string(),
            confidence: 3,
            ..Service::default()
        }
    }

    fn port_with(protocol: &str, id: u16, state: &str, service: Service) -> Port {
        Port {
            service,
            ..Port::new(protocol, id, state)
        }
    }

    #[test]
    fn hosts_sharing_an_address_collapse() {
        let r1 = run_of(vec![host(&["10.0.0.1"], &["a.example.com"], vec![])]);
        let r2 = run_of(vec![host(
            &["10.0.0.1", "fe80::1"],
            &["b.example.com"],
            vec![],
        )]);

        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 1);
        let merged_host = &merged.hosts[0];
        assert_eq!(merged_host.address_strings(), vec!["10.0.0.1", "fe80::1"]);
        assert_eq!(
            merged_host.hostname_strings(),
            vec!["a.example.com", "b.example.com"]
        );
    }

    #[test]
    fn shared_hostname_does_not_merge_hosts() {
        let r1 = run_of(vec![host(&["10.0.0.1"], &["rr.example.com"], vec![])]);
        let r2 = run_of(vec![host(&["10.0.0.2"], &["rr.example.com"], vec![])]);
        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 2);
    }

    #[test]
    fn later_address_of_merged_host_is_indexed() {
        let r1 = run_of(vec![host(&["10.0.0.1"], &[], vec![])]);
        let r2 = run_of(vec![host(&["10.0.0.1", "10.0.0.9"], &[], vec![])]);
        let r3 = run_of(vec![host(&["10.0.0.9"], &["late.example.com"], vec![])]);
        let merged =
            merge_runs(vec![r1, r2, r3], MergeOptions::default()).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 1);
        assert_eq!(merged.hosts[0].hostname_strings(), vec!["late.example.com"]);
    }

    #[test]
    fn bridging_host_folds_entries_together() {
        let r1 = run_of(vec![
            host(&["10.0.0.1"], &["one"], vec![]),
            host(&["10.0.0.2"], &["two"], vec![]),
        ]);
        let r2 = run_of(vec![host(&["10.0.0.2", "10.0.0.1"], &[], vec![])]);
        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 1);
        assert_eq!(merged.hosts[0].address_strings(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(merged.hosts[0].hostname_strings(), vec!["one", "two"]);
    }

    #[test]
    fn hosts_keep_discovery_order() {
        let r1 = run_of(vec![
            host(&["10.0.0.3"], &[], vec![]),
            host(&["10.0.0.1"], &[], vec![]),
        ]);
        let r2 = run_of(vec![host(&["10.0.0.2"], &[], vec![])]);
        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        let order: Vec<String> = merged
            .hosts
            .iter()
            .map(|host| host.addresses[0].addr.clone())
            .collect();
        assert_eq!(order, vec!["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn remerging_a_merged_run_is_stable() {
        let r1 = run_of(vec![
            host(
                &["10.0.0.1"],
                &["a"],
                vec![port_with("tcp", 80, "open", probed("nginx", 10))],
            ),
            host(&["10.0.0.2"], &[], vec![Port::new("udp", 53, "open")]),
        ]);
        let r2 = run_of(vec![host(
            &["10.0.0.1", "10.0.0.7"],
            &["b"],
            vec![Port::new("tcp", 22, "closed")],
        )]);

        let once = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        let twice = merge_runs(vec![once.clone(), once.clone()], MergeOptions::default())
            .expect("merge succeeds");

        assert_eq!(once.hosts.len(), twice.hosts.len());
        for (left, right) in once.hosts.iter().zip(&twice.hosts) {
            assert_eq!(left.addresses, right.addresses);
            assert_eq!(left.hostnames, right.hostnames);
            assert_eq!(left.status, right.status);
            let summary = |host: &Host| -> Vec<(String, u16, String, Service)> {
                host.ports
                    .entries
                    .iter()
                    .map(|port| {
                        (
                            port.protocol.clone(),
                            port.id,
                            port.state.state.clone(),
                            port.service.clone(),
                        )
                    })
                    .collect()
            };
            assert_eq!(summary(left), summary(right));
        }
    }

    #[test]
    fn open_observation_beats_closed_in_either_order() {
        let open = || run_of(vec![host(&["10.0.0.1"], &[], vec![Port::new("tcp", 80, "open")])]);
        let closed =
            || run_of(vec![host(&["10.0.0.1"], &[], vec![Port::new("tcp", 80, "closed")])]);

        for runs in [vec![open(), closed()], vec![closed(), open()]] {
            let merged = merge_runs(runs, MergeOptions::default()).expect("merge succeeds");
            let port = &merged.hosts[0].ports.entries[0];
            assert_eq!(port.id, 80);
            assert_eq!(port.state.state, "open");
        }
    }

    #[test]
    fn informative_service_wins_in_either_order() {
        let bare = port_with("tcp", 80, "open", table_guess());
        let detailed = port_with("tcp", 80, "open", probed("nginx", 10));

        let forward = merge_port(bare.clone(), detailed.clone());
        let backward = merge_port(detailed, bare);
        assert_eq!(forward.service.product, "nginx");
        assert_eq!(backward.service.product, "nginx");
    }

    #[test]
    fn higher_confidence_wins_between_informative_services() {
        let low = port_with("tcp", 80, "open", probed("apache", 5));
        let high = port_with("tcp", 80, "open", probed("nginx", 10));
        assert_eq!(merge_port(low.clone(), high.clone()).service.product, "nginx");
        assert_eq!(merge_port(high, low).service.product, "nginx");

        let first = port_with("tcp", 80, "open", probed("apache", 7));
        let second = port_with("tcp", 80, "open", probed("nginx", 7));
        assert_eq!(merge_port(first, second).service.product, "apache");
    }

    #[test]
    fn merged_port_keeps_first_state_and_collects_scripts() {
        let mut p1 = Port::new("tcp", 443, "open");
        p1.scripts.push(Script {
            id: "ssl-cert".to_string(),
            ..Script::default()
        });
        let mut p2 = Port::new("tcp", 443, "filtered");
        p2.scripts.push(Script {
            id: "http-title".to_string(),
            ..Script::default()
        });

        let merged = merge_port(p1, p2);
        assert_eq!(merged.state.state, "open");
        let ids: Vec<&str> = merged.scripts.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ssl-cert", "http-title"]);
    }

    #[test]
    fn same_number_on_different_protocols_stays_separate() {
        let r1 = run_of(vec![host(&["10.0.0.1"], &[], vec![Port::new("tcp", 53, "open")])]);
        let r2 = run_of(vec![host(&["10.0.0.1"], &[], vec![Port::new("udp", 53, "open")])]);
        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        let ports = &merged.hosts[0].ports.entries;
        assert_eq!(ports.len(), 2);
        assert!(ports.iter().any(|port| port.protocol == "tcp" && port.id == 53));
        assert!(ports.iter().any(|port| port.protocol == "udp" && port.id == 53));
    }

    #[test]
    fn ports_are_sorted_by_number() {
        let r1 = run_of(vec![host(
            &["10.0.0.1"],
            &[],
            vec![Port::new("tcp", 8080, "open"), Port::new("udp", 161, "open")],
        )]);
        let r2 = run_of(vec![host(
            &["10.0.0.1"],
            &[],
            vec![Port::new("tcp", 22, "open"), Port::new("tcp", 443, "open")],
        )]);
        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        let ids: Vec<u16> = merged.hosts[0].ports.entries.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![22, 161, 443, 8080]);
    }

    #[test]
    fn unknown_status_is_replaced_by_known_one() {
        let mut first = host(&["10.0.0.1"], &[], vec![]);
        first.status.state = "unknown".to_string();
        let mut second = host(&["10.0.0.1"], &[], vec![]);
        second.status.state = "down".to_string();
        assert_eq!(merge_host(first, second).status.state, "down");

        let mut up = host(&["10.0.0.1"], &[], vec![]);
        up.status.state = "up".to_string();
        let mut down = host(&["10.0.0.1"], &[], vec![]);
        down.status.state = "down".to_string();
        assert_eq!(merge_host(up, down).status.state, "up");
    }

    #[test]
    fn later_scan_window_wins_timing() {
        let mut early = host(&["10.0.0.1"], &[], vec![]);
        early.start_time = Some(100);
        early.end_time = Some(150);
        let mut late = host(&["10.0.0.1"], &[], vec![]);
        late.start_time = Some(200);
        late.end_time = Some(260);

        let merged = merge_host(early.clone(), late.clone());
        assert_eq!((merged.start_time, merged.end_time), (Some(200), Some(260)));

        let merged = merge_host(late, early);
        assert_eq!((merged.start_time, merged.end_time), (Some(200), Some(260)));
    }

    #[test]
    fn diagnostic_collections_are_concatenated() {
        let mut first = host(&["10.0.0.1"], &[], vec![]);
        first.os = Os {
            fingerprints: vec![OsFingerprint {
                fingerprint: "A".to_string(),
            }],
            ..Os::default()
        };
        let second = first.clone();
        let merged = merge_host(first, second);
        assert_eq!(merged.os.fingerprints.len(), 2);
    }

    #[test]
    fn run_metadata_is_concatenated_in_input_order() {
        let mut r1 = run_of(vec![]);
        r1.args = "nmap -sS".to_string();
        r1.task_begin.push(Task {
            task: "SYN Stealth Scan".to_string(),
            ..Task::default()
        });
        let mut r2 = run_of(vec![]);
        r2.args = "nmap -sU".to_string();
        r2.task_begin.push(Task {
            task: "UDP Scan".to_string(),
            ..Task::default()
        });

        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        assert_eq!(merged.args, "nmap -sS");
        let tasks: Vec<&str> = merged.task_begin.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(tasks, vec!["SYN Stealth Scan", "UDP Scan"]);
    }

    #[test]
    fn no_runs_is_an_error() {
        let err = merge_runs(Vec::new(), MergeOptions::default()).expect_err("nothing to merge");
        assert!(matches!(err, MergeError::NoInput));
    }

    #[test]
    fn open_only_drops_hosts_without_open_ports() {
        let run = run_of(vec![
            host(
                &["10.0.0.1"],
                &[],
                vec![Port::new("tcp", 22, "closed"), Port::new("udp", 53, "open|filtered")],
            ),
            host(&["10.0.0.2"], &[], vec![Port::new("tcp", 22, "closed")]),
        ]);
        let options = MergeOptions {
            open_only: true,
            ..MergeOptions::default()
        };
        let merged = merge_runs(vec![run], options).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 1);
        assert_eq!(merged.hosts[0].ports.entries.len(), 1);
        assert_eq!(merged.hosts[0].ports.entries[0].id, 53);
    }

    #[test]
    fn up_only_drops_hosts_that_are_not_up() {
        let mut down = host(&["10.0.0.2"], &[], vec![]);
        down.status.state = "down".to_string();
        let run = run_of(vec![host(&["10.0.0.1"], &[], vec![]), down]);
        let options = MergeOptions {
            up_only: true,
            ..MergeOptions::default()
        };
        let merged = merge_runs(vec![run], options).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 1);
        assert_eq!(merged.hosts[0].addresses[0].addr, "10.0.0.1");
    }

    #[test]
    fn addressless_hosts_merge_by_hostname_only_with_each_other() {
        let r1 = run_of(vec![
            host(&[], &["solo.example.com"], vec![Port::new("tcp", 80, "open")]),
            host(&["10.0.0.1"], &["solo.example.com"], vec![]),
        ]);
        let r2 = run_of(vec![
            host(&[], &["solo.example.com"], vec![Port::new("tcp", 443, "open")]),
            host(&[], &[], vec![]),
            host(&[], &[], vec![]),
        ]);
        let merged = merge_runs(vec![r1, r2], MergeOptions::default()).expect("merge succeeds");
        assert_eq!(merged.hosts.len(), 4);
        assert_eq!(merged.hosts[0].ports.entries.len(), 2);
        assert!(merged.hosts[0].addresses.is_empty());
    }

    #[test]
    fn host_counts_follow_merged_hosts() {
        let mut run = run_of(vec![
            host(&["10.0.0.1"], &[], vec![]),
            host(&["10.0.0.1"], &[], vec![]),
        ]);
        run.stats = Some(RunStats::default());
        let merged = merge_runs(vec![run], MergeOptions::default()).expect("merge succeeds");
        let counts = merged
            .stats
            .and_then(|stats| stats.hosts)
            .expect("counts present");
        assert_eq!((counts.up, counts.down, counts.total), (1, 0, 1));
    }

    #[test]
    fn split_run_yields_one_run_per_host() {
        let mut run = run_of(vec![
            host(&["10.0.0.1"], &[], vec![]),
            host(&["10.0.0.2"], &[], vec![]),
        ]);
        run.args = "nmap -sV".to_string();
        let parts = split_run(&run);
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|part| part.hosts.len() == 1));
        assert!(parts.iter().all(|part| part.args == "nmap -sV"));
        assert_eq!(parts[1].hosts[0].addresses[0].addr, "10.0.0.2");
    }

    #[test]
    fn unreadable_documents_are_skipped() {
        let dir = std::env::temp_dir().join("hostmerge-merge-files-test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("temp dir");

        let good = dir.join("good.xml");
        fs::write(&good, crate::document::SAMPLE_SCAN).expect("write fixture");
        let bad = dir.join("bad.xml");
        fs::write(
            &bad,
            r#"<nmaprun><host><ports><port protocol="tcp" portid="http"/></ports></host></nmaprun>"#,
        )
        .expect("write fixture");
        let missing = dir.join("missing.xml");

        let merged = merge_files(&[bad.clone(), good, missing.clone()], MergeOptions::default())
            .expect("one document loads");
        assert_eq!(merged.hosts.len(), 1);

        let err = merge_files(&[bad, missing], MergeOptions::default())
            .expect_err("no document loads");
        assert!(matches!(err, MergeError::NoInput));
        let _ = fs::remove_dir_all(&dir);
    }
}
