//! An alternate driver that answers "would untangling be needed?" without
//! writing any output, per §4.11.
//!
//! Grounded on `dsvn-admin-cli/src/verify_mod.rs`'s `verify_repository`
//! two-pass "collect problems, then report" shape — its `missing_objects`
//! accumulator is the direct model for this module's `findings` vector.

use crate::config::FilterConfig;
use crate::error::{FilterError, Result};
use crate::matcher::PathMatcher;
use crate::parser::{DumpParser, Record};
use crate::renumber::RenumberMap;
use crate::untangle;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rev: u64,
    pub path: String,
    pub copyfrom_rev: u64,
    pub copyfrom_path: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{} {} <- r{}:{}", self.rev, self.path, self.copyfrom_rev, self.copyfrom_path)
    }
}

pub struct ScanDriver {
    matcher: PathMatcher,
    renumber: RenumberMap,
}

impl ScanDriver {
    pub fn new(config: &FilterConfig) -> Self {
        Self { matcher: PathMatcher::new(config.mode.into(), &config.prefixes), renumber: RenumberMap::new(config.renumber_policy()) }
    }

    pub fn run<R: Read>(mut self, parser: DumpParser<R>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let mut records = parser.peekable();

        match records.next() {
            Some(Ok(Record::Format { version })) => {
                if version > 3 {
                    return Err(FilterError::UnsupportedFormatVersion { version });
                }
            }
            Some(Ok(_)) => {
                return Err(FilterError::UnexpectedRecord { position: 0, message: "expected format header first".into() })
            }
            Some(Err(e)) => return Err(e),
            None => return Ok(findings),
        }

        if matches!(records.peek(), Some(Ok(Record::Uuid { .. }))) {
            records.next();
        }

        loop {
            match records.next() {
                None => return Ok(findings),
                Some(Err(e)) => return Err(e),
                Some(Ok(Record::Revision(rev))) => {
                    let input_rev = rev.input_number;
                    let mut had_content = false;
                    loop {
                        match records.peek() {
                            Some(Ok(Record::Node(_))) => {
                                if let Some(Ok(Record::Node(node))) = records.next() {
                                    let Some(path) = node.path() else { continue };
                                    if !self.matcher.is_included(path) {
                                        continue;
                                    }
                                    had_content = true;
                                    if untangle::needs_untangle(&node, &self.matcher, &self.renumber) {
                                        let (copyfrom_rev, copyfrom_path) = node.copyfrom().expect("needs_untangle implies copyfrom");
                                        findings.push(Finding {
                                            rev: input_rev,
                                            path: path.to_string(),
                                            copyfrom_rev,
                                            copyfrom_path,
                                        });
                                    }
                                }
                            }
                            _ => break,
                        }
                    }
                    self.renumber.close_revision(input_rev, had_content);
                }
                Some(Ok(_)) => {
                    return Err(FilterError::UnexpectedRecord { position: 0, message: "expected a revision record".into() })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchModeConfig;
    use std::io::Cursor;

    fn config(prefixes: &[&str]) -> FilterConfig {
        FilterConfig {
            mode: MatchModeConfig::Include,
            prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            preserve_empty: false,
            stop_renumbering: false,
            strip_mergeinfo: false,
            start_revision: 0,
        }
    }

    #[test]
    fn reports_an_untangle_trigger_without_touching_the_probe() {
        let input = concat!(
            "SVN-fs-dump-format-version: 3\n\n",
            "Revision-number: 10\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n",
            "Node-path: a/x\nNode-kind: file\nNode-action: add\n",
            "Node-copyfrom-rev: 7\nNode-copyfrom-path: b/y\n\n\n",
        );
        let scanner = ScanDriver::new(&config(&["a"]));
        let parser = DumpParser::new(Cursor::new(input.as_bytes().to_vec()));
        let findings = scanner.run(parser).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rev, 10);
        assert_eq!(findings[0].copyfrom_path, "b/y");
    }

    #[test]
    fn finds_nothing_when_copyfrom_source_is_also_included() {
        let input = concat!(
            "SVN-fs-dump-format-version: 3\n\n",
            "Revision-number: 1\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n",
            "Node-path: a/y\nNode-kind: file\nNode-action: add\n\n\n",
            "Revision-number: 2\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n",
            "Node-path: a/x\nNode-kind: file\nNode-action: add\n",
            "Node-copyfrom-rev: 1\nNode-copyfrom-path: a/y\n\n\n",
        );
        let scanner = ScanDriver::new(&config(&["a"]));
        let parser = DumpParser::new(Cursor::new(input.as_bytes().to_vec()));
        let findings = scanner.run(parser).unwrap();
        assert!(findings.is_empty());
    }
}
