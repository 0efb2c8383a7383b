//! Shells out to the `svnlook` repository-introspection tool to implement
//! the `RepositoryProbe` the Untangler consumes, per §4.4's "specified
//! only at the interface level" contract.
//!
//! Grounded on `other_examples/5952f4ab_Freaky-rust-svnlook__src-lib.rs.rs`'s
//! `Command::new("svnlook").arg(...).output()` pattern — the pack's only
//! other example that drives the `svnlook` binary as a child process.
//! Property-list XML is parsed with `quick-xml`, the same crate
//! `dsvn-webdav/src/xml.rs` uses for its own WebDAV multistatus bodies.

use dsvnfilter_core::{FilterError, NodeKind, ProbeEntry, ProbeResult, PropertyBlock, Result};
use quick_xml::events::Event;
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct SvnlookProbe {
    repo_path: PathBuf,
}

impl SvnlookProbe {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self { repo_path: repo_path.into() }
    }

    fn run(&self, args: &[&str], path: &str) -> std::io::Result<std::process::Output> {
        Command::new("svnlook").args(args).arg(&self.repo_path).arg(path).output()
    }

    fn proplist(&self, rev: u64, path: &str) -> Result<PropertyBlock> {
        let rev_arg = rev.to_string();
        let output = self
            .run(&["proplist", "--xml", "-r", &rev_arg], path)
            .map_err(|e| probe_error(rev, path, format!("spawning svnlook proplist: {e}")))?;
        if !output.status.success() {
            return Err(probe_error(rev, path, String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        parse_proplist_xml(&output.stdout).map_err(|e| probe_error(rev, path, e))
    }
}

impl dsvnfilter_core::RepositoryProbe for SvnlookProbe {
    fn lookup(&mut self, rev: u64, path: &str) -> Result<ProbeResult> {
        let rev_arg = rev.to_string();
        let cat = self
            .run(&["cat", "-r", &rev_arg], path)
            .map_err(|e| probe_error(rev, path, format!("spawning svnlook cat: {e}")))?;

        if cat.status.success() {
            let props = self.proplist(rev, path)?;
            return Ok(ProbeResult::Found { kind: NodeKind::File, props, content: Some(cat.stdout) });
        }

        let stderr = String::from_utf8_lossy(&cat.stderr);
        if is_not_found(&stderr) {
            return Ok(ProbeResult::NotFound);
        }
        if is_not_a_file(&stderr) {
            let props = self.proplist(rev, path)?;
            return Ok(ProbeResult::Found { kind: NodeKind::Dir, props, content: None });
        }
        Err(probe_error(rev, path, stderr.into_owned()))
    }

    fn list_dir(&mut self, rev: u64, path: &str) -> Result<Vec<ProbeEntry>> {
        let rev_arg = rev.to_string();
        let output = self
            .run(&["tree", "-N", "--full-paths", "-r", &rev_arg], path)
            .map_err(|e| probe_error(rev, path, format!("spawning svnlook tree: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_not_found(&stderr) {
                return Ok(Vec::new());
            }
            return Err(probe_error(rev, path, stderr.into_owned()));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let root = normalize_trailing_slash(path);
        let mut entries = Vec::new();
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let is_dir = line.ends_with('/');
            let trimmed = normalize_trailing_slash(line);
            if trimmed == root {
                continue;
            }
            let name = Path::new(&trimmed).file_name().map(|n| n.to_string_lossy().into_owned());
            if let Some(name) = name {
                entries.push(ProbeEntry { name, kind: if is_dir { NodeKind::Dir } else { NodeKind::File } });
            }
        }
        Ok(entries)
    }
}

/// Used when the caller gave no `-r <repo_path>`. Filtering that never
/// needs to untangle a copy never touches this; one that does gets a
/// precise `ProbeError` instead of a confusing panic or silent omission.
pub struct NullProbe;

impl dsvnfilter_core::RepositoryProbe for NullProbe {
    fn lookup(&mut self, rev: u64, path: &str) -> Result<ProbeResult> {
        Err(probe_error(rev, path, "no -r <repo_path> was given; cannot retrieve untangle content".into()))
    }

    fn list_dir(&mut self, rev: u64, path: &str) -> Result<Vec<ProbeEntry>> {
        Err(probe_error(rev, path, "no -r <repo_path> was given; cannot list untangle content".into()))
    }
}

fn normalize_trailing_slash(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("E160013") || stderr.contains("not found") || stderr.contains("path not found")
}

fn is_not_a_file(stderr: &str) -> bool {
    stderr.contains("E160017") || stderr.contains("Unexpected node kind") || stderr.contains("is not a file")
}

fn probe_error(rev: u64, path: &str, message: String) -> FilterError {
    FilterError::ProbeError { rev, path: path.to_string(), message }
}

/// Parses `svnlook proplist --xml` output:
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <properties>
/// <target path="...">
/// <property name="svn:eol-style">native</property>
/// </target>
/// </properties>
/// ```
fn parse_proplist_xml(xml: &[u8]) -> std::result::Result<PropertyBlock, String> {
    let text = std::str::from_utf8(xml).map_err(|e| format!("non-utf8 proplist xml: {e}"))?;
    let mut reader = quick_xml::Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut block = PropertyBlock::new();
    let mut current_name: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"property" => {
                let name = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"name")
                    .and_then(|a| a.unescape_value().ok())
                    .map(|v| v.into_owned());
                current_name = name;
            }
            Ok(Event::Text(text)) => {
                if let Some(name) = current_name.take() {
                    let value = text.unescape().map_err(|e| format!("bad property text: {e}"))?.into_owned();
                    block.set(name.into_bytes(), value.into_bytes());
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"property" => {
                current_name = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("parsing proplist xml: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_properties_from_proplist_xml() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<properties>
<target path="trunk/foo">
<property name="svn:eol-style">native</property>
<property name="svn:mime-type">text/plain</property>
</target>
</properties>
"#;
        let block = parse_proplist_xml(xml).unwrap();
        assert_eq!(block.get(b"svn:eol-style"), Some(b"native".as_slice()));
        assert_eq!(block.get(b"svn:mime-type"), Some(b"text/plain".as_slice()));
    }

    #[test]
    fn recognizes_not_found_and_not_a_file_markers() {
        assert!(is_not_found("svnlook: E160013: File not found: revision 5, path 'x'"));
        assert!(is_not_a_file("svnlook: E160017: Unexpected node kind"));
    }
}
