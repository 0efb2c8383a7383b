//! The revision lifecycle: pulls records from the Parser, classifies them,
//! and drives the Matcher/Untangler/Synthesizer/Emitter, per §4.9.
//!
//! Grounded on `dsvn-admin-cli/src/load.rs`'s revision-grouping loop (the
//! `RevisionGroup` accumulator that commits the previous group when a new
//! `Revision-number` arrives) — the same per-revision buffering shape,
//! retargeted from "commit to a repository" to "decide whether to emit,
//! then emit."

use crate::emitter;
use crate::error::{FilterError, Result};
use crate::matcher::PathMatcher;
use crate::parser::{DumpParser, NodeKind, NodeRecord, Record, RevisionRecord};
use crate::probe::RepositoryProbe;
use crate::renumber::RenumberMap;
use crate::synth::{self, EmittedDirs};
use crate::untangle;
use crate::FilterConfig;
use std::io::{Read, Write};
use std::iter::Peekable;

pub struct Driver<'p> {
    matcher: PathMatcher,
    probe: &'p mut dyn RepositoryProbe,
    renumber: RenumberMap,
    dirs: EmittedDirs,
    strip_mergeinfo: bool,
    start_revision: u64,
}

impl<'p> Driver<'p> {
    pub fn new(config: &FilterConfig, probe: &'p mut dyn RepositoryProbe) -> Self {
        let matcher = PathMatcher::new(config.mode.into(), &config.prefixes);
        let renumber = RenumberMap::new(config.renumber_policy());
        Self {
            matcher,
            probe,
            renumber,
            dirs: EmittedDirs::new(),
            strip_mergeinfo: config.strip_mergeinfo,
            start_revision: config.start_revision,
        }
    }

    pub fn run<R: Read, W: Write>(mut self, parser: DumpParser<R>, mut out: W) -> Result<()> {
        let mut records = parser.peekable();

        match records.next() {
            Some(Ok(Record::Format { version })) => {
                if version > 3 {
                    return Err(FilterError::UnsupportedFormatVersion { version });
                }
                emitter::emit_format(&mut out, version)?;
            }
            Some(Ok(_)) => {
                return Err(FilterError::UnexpectedRecord { position: 0, message: "expected format header first".into() })
            }
            Some(Err(e)) => return Err(e),
            None => return Ok(()),
        }

        if matches!(records.peek(), Some(Ok(Record::Uuid { .. }))) {
            if let Some(Ok(Record::Uuid { uuid })) = records.next() {
                emitter::emit_uuid(&mut out, &uuid)?;
            }
        }

        loop {
            match records.next() {
                None => return Ok(()),
                Some(Err(e)) => return Err(e),
                Some(Ok(Record::Revision(rev))) => {
                    self.process_revision(rev, &mut records, &mut out)?;
                }
                Some(Ok(_)) => {
                    return Err(FilterError::UnexpectedRecord {
                        position: 0,
                        message: "expected a revision record".into(),
                    })
                }
            }
        }
    }

    fn process_revision<R: Read, W: Write>(
        &mut self,
        rev: RevisionRecord,
        records: &mut Peekable<DumpParser<R>>,
        out: &mut W,
    ) -> Result<()> {
        let input_rev = rev.input_number;
        tracing::debug!(input_rev, "opening revision");
        let mut buffered: Vec<NodeRecord> = Vec::new();

        loop {
            match records.peek() {
                Some(Ok(Record::Node(_))) => {
                    if let Some(Ok(Record::Node(node))) = records.next() {
                        self.process_node(input_rev, node, &mut buffered)?;
                    }
                }
                _ => break,
            }
        }

        let had_content = !buffered.is_empty();
        let output_rev = self.renumber.close_revision(input_rev, had_content);

        if input_rev < self.start_revision {
            tracing::debug!(input_rev, self.start_revision, "revision precedes start-revision; not emitted");
            return Ok(());
        }

        if let Some(output_rev) = output_rev {
            for node in &mut buffered {
                self.rewrite_copyfrom_rev(node)?;
            }
            tracing::info!(input_rev, output_rev, nodes = buffered.len(), "emitting revision");
            emitter::emit_revision(out, &rev, output_rev)?;
            for node in &buffered {
                emitter::emit_node(out, node)?;
            }
        } else {
            tracing::debug!(input_rev, "dropping empty revision");
        }
        Ok(())
    }

    fn process_node(&mut self, input_rev: u64, node: NodeRecord, buffered: &mut Vec<NodeRecord>) -> Result<()> {
        let path = node
            .path()
            .ok_or_else(|| FilterError::MalformedHeader { position: 0, message: "node record missing Node-path".into() })?
            .to_string();

        if !self.matcher.is_included(&path) {
            return Ok(());
        }

        let nodes = if untangle::needs_untangle(&node, &self.matcher, &self.renumber) {
            tracing::info!(input_rev, path = %path, "untangling copyfrom from excluded source");
            untangle::untangle(&node, self.probe, input_rev)?
        } else {
            vec![node]
        };

        for mut n in nodes {
            if self.strip_mergeinfo {
                if let Some(props) = n.props.as_mut() {
                    props.strip_mergeinfo();
                }
            }
            let p = n.path().expect("synthesized node always carries Node-path").to_string();
            for dir in synth::missing_ancestors(&p, &self.matcher, &mut self.dirs) {
                buffered.push(dir);
            }
            if n.kind() == Some(NodeKind::Dir) {
                self.dirs.mark(&p);
            }
            buffered.push(n);
        }
        Ok(())
    }

    fn rewrite_copyfrom_rev(&self, node: &mut NodeRecord) -> Result<()> {
        if let Some((src_rev, _)) = node.copyfrom() {
            let path = node.path().unwrap_or_default().to_string();
            let output_rev = self.renumber.translate_copyfrom(src_rev, &path)?;
            node.set_copyfrom_rev(output_rev);
        }
        Ok(())
    }
}
