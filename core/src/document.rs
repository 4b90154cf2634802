use crate::model::ScanRun;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<?xml-stylesheet href="/static/nmap.xsl" type="text/xsl"?>
"#;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("XML parsing error: {0}")]
    Parse(#[from] quick_xml::errors::serialize::DeError),
    #[error("XML serialization error: {0}")]
    Serialize(#[from] quick_xml::errors::serialize::SeError),
}

pub fn parse_scan(xml: &str) -> Result<ScanRun, DocumentError> {
    Ok(quick_xml::de::from_str(xml)?)
}

pub fn load_scan(path: &Path) -> Result<ScanRun, DocumentError> {
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scan(&content)
}

pub fn render_document(run: &ScanRun) -> Result<String, DocumentError> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    run.serialize(serializer)?;

    let mut document = String::with_capacity(XML_HEADER.len() + body.len() + 1);
    document.push_str(XML_HEADER);
    document.push_str(&body);
    document.push('\n');
    Ok(document)
}

pub fn write_document(run: &ScanRun, path: &Path) -> Result<(), DocumentError> {
    let document = render_document(run)?;
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DocumentError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, document).map_err(|source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) const SAMPLE_SCAN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<?xml-stylesheet href="file:///usr/bin/../share/nmap/nmap.xsl" type="text/xsl"?>
<nmaprun scanner="nmap" args="nmap -sV -oX scan.xml 10.0.0.0/24" start="1700000000" startstr="Tue Nov 14 22:13:20 2023" version="7.94" xmloutputversion="1.05">
<scaninfo type="syn" protocol="tcp" numservices="1000" services="1-1000"/>
<verbose level="0"/>
<debugging level="0"/>
<taskbegin task="SYN Stealth Scan" time="1700000001"/>
<taskend task="SYN Stealth Scan" time="1700000005" extrainfo="1000 total ports"/>
<host starttime="1700000001" endtime="1700000009"><status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="10.0.0.5" addrtype="ipv4"/>
<address addr="00:11:22:33:44:55" addrtype="mac" vendor="Acme"/>
<hostnames>
<hostname name="web.example.com" type="user"/>
<hostname name="web.example.com" type="PTR"/>
</hostnames>
<ports><extraports state="closed" count="997">
<extrareasons reason="reset" count="997" proto="tcp" ports="1-21,23-79"/>
</extraports>
<port protocol="tcp" portid="22"><state state="open" reason="syn-ack" reason_ttl="64"/><service name="ssh" product="OpenSSH" version="9.6" method="probed" conf="10"><cpe>cpe:/a:openbsd:openssh:9.6</cpe></service></port>
<port protocol="tcp" portid="443"><state state="open" reason="syn-ack" reason_ttl="64"/><service name="https" method="table" conf="3"/><script id="ssl-cert" output="Subject: commonName=web.example.com"><table key="subject"><elem key="commonName">web.example.com</elem></table></script></port>
<port protocol="udp" portid="53"><state state="open|filtered" reason="no-response" reason_ttl="0"/><service name="domain" method="table" conf="3"/></port>
</ports>
<os><portused state="open" proto="tcp" portid="22"/>
<osmatch name="Linux 5.0 - 5.14" accuracy="98" line="67010"><osclass type="general purpose" vendor="Linux" osfamily="Linux" osgen="5.X" accuracy="98"><cpe>cpe:/o:linux:linux_kernel:5</cpe></osclass></osmatch>
</os>
<hostscript><script id="smb2-time" output="date: 2023-11-14"/></hostscript>
<times srtt="512" rttvar="3765" to="100000"/>
</host>
<runstats><finished time="1700000010" timestr="Tue Nov 14 22:13:30 2023" elapsed="10.00" summary="Nmap done" exit="success"/><hosts up="1" down="0" total="1"/>
</runstats>
</nmaprun>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nmap_document() {
        let run = parse_scan(SAMPLE_SCAN).expect("sample parses");
        assert_eq!(run.scanner, "nmap");
        assert_eq!(run.start, Some(1_700_000_000));
        assert_eq!(run.scan_info.len(), 1);
        assert_eq!(run.task_begin.len(), 1);
        assert_eq!(run.task_end[0].extra_info, "1000 total ports");

        let host = &run.hosts[0];
        assert_eq!(host.status.state, "up");
        assert_eq!(host.start_time, Some(1_700_000_001));
        assert_eq!(host.addresses.len(), 2);
        assert_eq!(host.addresses[1].vendor, "Acme");
        assert_eq!(host.hostnames.len(), 2);
        assert_eq!(host.ports.extra[0].count, 997);
        assert_eq!(host.ports.entries.len(), 3);

        let ssh = &host.ports.entries[0];
        assert_eq!(ssh.id, 22);
        assert!(ssh.is_open());
        assert_eq!(ssh.service.product, "OpenSSH");
        assert_eq!(ssh.service.confidence, 10);
        assert_eq!(ssh.service.cpes, vec!["cpe:/a:openbsd:openssh:9.6".to_string()]);

        let https = &host.ports.entries[1];
        assert_eq!(https.scripts[0].id, "ssl-cert");
        assert_eq!(https.scripts[0].tables[0].elements[0].value, "web.example.com");

        assert_eq!(host.os.matches[0].classes[0].family, "Linux");
        assert_eq!(host.host_scripts[0].id, "smb2-time");
        let stats = run.stats.as_ref().expect("runstats present");
        assert_eq!(stats.hosts.as_ref().map(|counts| counts.up), Some(1));
    }

    #[test]
    fn rendered_document_starts_with_preamble() {
        let run = parse_scan(SAMPLE_SCAN).expect("sample parses");
        let document = render_document(&run).expect("render succeeds");
        assert!(document.starts_with(XML_HEADER));
        assert!(document[XML_HEADER.len()..].starts_with("<nmaprun"));
        assert!(document.contains("  <host"));
    }

    #[test]
    fn rendered_document_parses_back_to_same_run() {
        let run = parse_scan(SAMPLE_SCAN).expect("sample parses");
        let document = render_document(&run).expect("render succeeds");
        let reparsed = parse_scan(&document).expect("rendered document parses");
        assert_eq!(reparsed, run);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = parse_scan(
            r#"<nmaprun><host><ports><port protocol="tcp" portid="http"/></ports></host></nmaprun>"#,
        )
        .expect_err("port id is not a number");
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("hostmerge-missing-scan.xml");
        let _ = fs::remove_file(&path);
        let err = load_scan(&path).expect_err("file is missing");
        assert!(err.to_string().contains("hostmerge-missing-scan.xml"));
    }

    #[test]
    fn write_document_creates_parent_directories() {
        let dir = std::env::temp_dir().join("hostmerge-document-test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("10.0.0.5").join("scan.xml");

        let run = parse_scan(SAMPLE_SCAN).expect("sample parses");
        write_document(&run, &path).expect("write succeeds");

        let loaded = load_scan(&path).expect("written file loads");
        assert_eq!(loaded.hosts.len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
