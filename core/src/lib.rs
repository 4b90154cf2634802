pub mod document;
pub mod merge;
pub mod model;
pub mod output;
pub mod rules;
pub mod view;

pub use document::{load_scan, parse_scan, render_document, write_document, DocumentError, XML_HEADER};
pub use merge::{merge_files, merge_host, merge_port, merge_runs, split_run, MergeError, MergeOptions};
pub use model::{
    Address, ExtraPorts, Host, Hostname, Os, Port, PortState, PortTable, RunStats, ScanRun,
    Script, Service, Status,
};
pub use output::{
    host_list, hosts_json, render_list, service_urls, wrap_ports, HostTable, ListFields,
    SortDirection, SortSpec, ViewError, PORT_COLUMN_WIDTH, TABLE_HEADERS,
};
pub use rules::{ClassificationRules, DomainMatch};
pub use view::{is_private_ip, AcceptAll, ExcludeNames, HostFilter, ListedHost, View, ViewOptions};
