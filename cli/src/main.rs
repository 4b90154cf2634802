mod logging;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use hostmerge_core::{
    host_list, hosts_json, merge_files, render_list, service_urls, split_run, write_document,
    ClassificationRules, HostTable, ListFields, MergeOptions, ScanRun, SortSpec, View,
    ViewOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about = "Merge and view nmap XML scan results")]
struct HostmergeCli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge nmap XML files into one
    Merge {
        /// Files or glob patterns
        #[arg(required = true, value_name = "FILE/GLOB")]
        patterns: Vec<String>,
        #[command(flatten)]
        merge: MergeArgs,
        /// Output of resulting merged file
        #[arg(short, long, default_value = "nmap-merge.xml")]
        output: PathBuf,
    },
    /// View nmap XML scans as a table, a list or JSON
    View {
        #[arg(required = true, value_name = "FILE/GLOB")]
        patterns: Vec<String>,
        #[command(flatten)]
        merge: MergeArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort by the specified column. Format: column[;(asc|dsc)]
        #[arg(long, default_value = "IP;asc")]
        sort_by: String,
        /// Print JSON
        #[arg(long, conflicts_with = "list")]
        json: bool,
        /// Print a plain list of addresses and/or hostnames
        #[arg(long)]
        list: bool,
        /// With --list, include IP addresses
        #[arg(long, requires = "list")]
        ips: bool,
        /// With --list, include hostnames
        #[arg(long, requires = "list")]
        hostnames: bool,
        /// Leave out tcpwrapped ports, and hosts with nothing else to show
        #[arg(long)]
        ignore_tcpwrapped: bool,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Get service URLs from nmap scan data
    Urls {
        #[arg(required = true, value_name = "FILE/GLOB")]
        patterns: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Only emit URLs whose scheme starts with this prefix
        #[arg(short, long, default_value = "")]
        protocol: String,
        /// YAML or JSON file replacing the built-in CDN/infrastructure rules
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Split a scan into one file per host
    Split {
        /// Path of the nmap XML file
        #[arg(short, long)]
        path: PathBuf,
        /// Directory receiving one sub-directory per host
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// File name used for each host, without the extension
        #[arg(short, long, default_value = "nmap-tcp")]
        name: String,
    },
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Keep only hosts with open ports
    #[arg(long)]
    open: bool,
    /// Keep only hosts that are up
    #[arg(long)]
    up: bool,
}

impl From<&MergeArgs> for MergeOptions {
    fn from(args: &MergeArgs) -> Self {
        MergeOptions {
            open_only: args.open,
            up_only: args.up,
        }
    }
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Only show hosts with private IPs
    #[arg(long)]
    private: bool,
    /// Only show hosts with public IPs
    #[arg(long)]
    public: bool,
    /// Only show hosts that are up or have an open port
    #[arg(long)]
    alive: bool,
    /// Only show hosts with open ports
    #[arg(long)]
    open_ports: bool,
    /// Exclude hosts that only have these ports open
    #[arg(long, value_delimiter = ',', value_name = "PORT")]
    exclude_ports: Vec<u16>,
    /// Only include hosts that have one of these ports
    #[arg(long, value_delimiter = ',', value_name = "PORT")]
    include_ports: Vec<u16>,
    /// Exclude hosts with any of these hostnames or IPs
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    exclude: Vec<String>,
}

impl FilterArgs {
    fn view_options(&self) -> ViewOptions {
        ViewOptions {
            require_private_ip: self.private,
            require_public_ip: self.public,
            require_alive: self.alive,
            require_open_ports: self.open_ports,
            ignore_tcp_wrapped: false,
            exclude_ports: self.exclude_ports.iter().copied().collect(),
            include_ports: self.include_ports.iter().copied().collect(),
            exclude_names: self.exclude.iter().cloned().collect(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = HostmergeCli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Merge {
            patterns,
            merge,
            output,
        } => {
            let run = load_merged(&patterns, (&merge).into())?;
            write_document(&run, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("Wrote {} host(s) to {}", run.hosts.len(), output.display());
        }
        Command::View {
            patterns,
            merge,
            filter,
            sort_by,
            json,
            list,
            ips,
            hostnames,
            ignore_tcpwrapped,
            output,
        } => {
            let run = load_merged(&patterns, (&merge).into())?;
            let mut options = filter.view_options();
            options.ignore_tcp_wrapped = ignore_tcpwrapped;
            let view = View::new(&run, options);

            let rendered = if json {
                hosts_json(&view)?
            } else if list {
                let fields = if ips || hostnames {
                    ListFields { ips, hostnames }
                } else {
                    ListFields {
                        ips: true,
                        hostnames: true,
                    }
                };
                render_list(&host_list(&view, fields))
            } else {
                let sort: SortSpec = sort_by.parse()?;
                let mut table = HostTable::from_view(&view);
                if table.rows.is_empty() {
                    String::new()
                } else {
                    table.sort_by(&sort);
                    table.render()
                }
            };
            emit(&rendered, output.as_deref())?;
        }
        Command::Urls {
            patterns,
            filter,
            protocol,
            rules,
            output,
        } => {
            let rules = match rules {
                Some(path) => load_rules(&path)?,
                None => ClassificationRules::default(),
            };
            let run = load_merged(&patterns, MergeOptions::default())?;
            let view = View::new(&run, filter.view_options());
            let urls = service_urls(&view, &rules, &protocol);
            emit(&urls.join("\n"), output.as_deref())?;
        }
        Command::Split { path, dir, name } => {
            split(&path, &dir, &name)?;
        }
    }

    Ok(())
}

fn expand_patterns(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matches =
            glob::glob(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?;
        for entry in matches {
            files.push(entry?);
        }
    }
    if files.is_empty() {
        bail!("no files found");
    }
    Ok(files)
}

fn load_merged(patterns: &[String], options: MergeOptions) -> anyhow::Result<ScanRun> {
    let files = expand_patterns(patterns)?;
    Ok(merge_files(&files, options)?)
}

fn load_rules(path: &Path) -> anyhow::Result<ClassificationRules> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let rules = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(rules)
}

fn emit(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let content = if rendered.is_empty() {
                String::new()
            } else {
                format!("{rendered}\n")
            };
            fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None if rendered.is_empty() => {}
        None => println!("{rendered}"),
    }
    Ok(())
}

fn split(path: &Path, dir: &Path, name: &str) -> anyhow::Result<()> {
    let run = hostmerge_core::load_scan(path)?;
    for single in split_run(&run) {
        let Some(host) = single.hosts.first() else {
            continue;
        };
        let Some(host_key) = host.display_name() else {
            tracing::warn!("Skipping host without hostnames or addresses");
            continue;
        };
        info!("Processing host: {host_key}");
        let target = dir.join(sanitize_component(host_key)).join(format!("{name}.xml"));
        write_document(&single, &target)?;
    }
    Ok(())
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}
