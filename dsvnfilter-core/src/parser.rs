//! The record-level state machine: turns a byte stream into a sequence of
//! [`Record`]s.
//!
//! The old admin-cli `dump.rs` parsed headers line-by-line with
//! `BufRead::lines()` and `starts_with` checks, discarding properties and
//! text bodies entirely since it only needed `svn:author`/`svn:log`. This
//! parser keeps everything: header order, raw property/text bytes, and
//! enough structure for the emitter to reproduce what it didn't touch.

use crate::error::{FilterError, Result};
use crate::properties::PropertyBlock;
use crate::reader::ByteReader;
use std::io::Read;

/// Header lines in the order they appeared. Values are raw bytes, not
/// `String`: path bytes are not guaranteed valid UTF-8 by the format, only
/// newline-free.
pub type HeaderList = Vec<(String, Vec<u8>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Add,
    Delete,
    Replace,
    Change,
}

#[derive(Debug, Clone)]
pub struct RevisionRecord {
    pub input_number: u64,
    pub headers: HeaderList,
    pub props: PropertyBlock,
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub headers: HeaderList,
    pub props: Option<PropertyBlock>,
    pub text: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub enum Record {
    Format { version: u32 },
    Uuid { uuid: String },
    Revision(RevisionRecord),
    Node(NodeRecord),
}

pub fn header_bytes<'a>(headers: &'a HeaderList, key: &str) -> Option<&'a [u8]> {
    headers.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
}

pub fn header_str<'a>(headers: &'a HeaderList, key: &str) -> Option<&'a str> {
    header_bytes(headers, key).and_then(|v| std::str::from_utf8(v).ok())
}

pub fn header_u64(headers: &HeaderList, key: &str) -> Option<u64> {
    header_str(headers, key).and_then(|s| s.trim().parse().ok())
}

pub fn set_header(headers: &mut HeaderList, key: &str, value: Vec<u8>) {
    if let Some(entry) = headers.iter_mut().find(|(k, _)| k == key) {
        entry.1 = value;
    } else {
        headers.push((key.to_string(), value));
    }
}

impl NodeRecord {
    pub fn path(&self) -> Option<&str> {
        header_str(&self.headers, "Node-path")
    }

    pub fn kind(&self) -> Option<NodeKind> {
        match header_bytes(&self.headers, "Node-kind")? {
            b"file" => Some(NodeKind::File),
            b"dir" => Some(NodeKind::Dir),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<NodeAction> {
        match header_bytes(&self.headers, "Node-action")? {
            b"add" => Some(NodeAction::Add),
            b"delete" => Some(NodeAction::Delete),
            b"replace" => Some(NodeAction::Replace),
            b"change" => Some(NodeAction::Change),
            _ => None,
        }
    }

    pub fn copyfrom(&self) -> Option<(u64, String)> {
        let rev = header_u64(&self.headers, "Node-copyfrom-rev")?;
        let path = header_str(&self.headers, "Node-copyfrom-path")?.to_string();
        Some((rev, path))
    }

    pub fn set_copyfrom_rev(&mut self, rev: u64) {
        set_header(&mut self.headers, "Node-copyfrom-rev", rev.to_string().into_bytes());
    }

    pub fn props_mut(&mut self) -> Option<&mut PropertyBlock> {
        self.props.as_mut()
    }

    /// Builds a bare `add` node with just the three identity headers, in
    /// [`CANONICAL_NODE_HEADER_ORDER`] order; callers set `props`/`text` and
    /// then call `finalize_canonical_headers`.
    pub fn new_add(path: &str, kind: NodeKind) -> Self {
        let mut headers = HeaderList::new();
        for key in CANONICAL_NODE_HEADER_ORDER {
            match *key {
                "Node-path" => headers.push((key.to_string(), path.as_bytes().to_vec())),
                "Node-kind" => headers.push((
                    key.to_string(),
                    match kind {
                        NodeKind::File => b"file".to_vec(),
                        NodeKind::Dir => b"dir".to_vec(),
                    },
                )),
                "Node-action" => headers.push((key.to_string(), b"add".to_vec())),
                _ => {}
            }
        }
        Self { headers, props: None, text: None }
    }

    /// Appends the trailing length/hash header keys implied by whatever
    /// `props`/`text` are currently set, in [`CANONICAL_NODE_HEADER_ORDER`]
    /// order. Values are placeholders: the emitter recomputes them from the
    /// actual serialized bytes.
    pub fn finalize_canonical_headers(&mut self) {
        let has_text = self.text.is_some();
        let has_props = self.props.is_some();
        for key in CANONICAL_NODE_HEADER_ORDER {
            let applies = match *key {
                "Text-content-md5" | "Text-content-sha1" | "Text-content-length" => has_text,
                "Prop-content-length" => has_props,
                "Content-length" => true,
                _ => false,
            };
            if applies {
                self.headers.push((key.to_string(), Vec::new()));
            }
        }
    }
}

/// The canonical header order for synthetic node records, per §4.8. Real
/// (passthrough) records keep the order the Parser saw; only records the
/// Untangler or Synthesizer builds from scratch via [`NodeRecord::new_add`]/
/// [`NodeRecord::finalize_canonical_headers`] use this order, which both
/// methods iterate directly rather than hardcoding their own sequence.
pub const CANONICAL_NODE_HEADER_ORDER: &[&str] = &[
    "Node-path",
    "Node-kind",
    "Node-action",
    "Node-copyfrom-rev",
    "Node-copyfrom-path",
    "Text-copy-source-md5",
    "Text-copy-source-sha1",
    "Text-content-md5",
    "Text-content-sha1",
    "Prop-content-length",
    "Text-content-length",
    "Content-length",
];

fn is_blank_line(line: &[u8]) -> bool {
    line == b"\n"
}

fn parse_header_line(line: &[u8], position: u64) -> Result<(String, Vec<u8>)> {
    let body = &line[..line.len() - 1];
    let idx = body.iter().position(|&b| b == b':').ok_or_else(|| FilterError::MalformedHeader {
        position,
        message: format!("header line missing ':': {:?}", String::from_utf8_lossy(body)),
    })?;
    let key = std::str::from_utf8(&body[..idx])
        .map_err(|_| FilterError::MalformedHeader { position, message: "header key not valid utf8".into() })?
        .to_string();
    let mut vstart = idx + 1;
    if body.get(vstart) == Some(&b' ') {
        vstart += 1;
    }
    Ok((key, body[vstart..].to_vec()))
}

/// Iterates the stream record by record.
pub struct DumpParser<R: Read> {
    reader: ByteReader<R>,
}

impl<R: Read> DumpParser<R> {
    pub fn new(inner: R) -> Self {
        Self { reader: ByteReader::new(inner) }
    }

    fn expect_blank_line(&mut self) -> Result<()> {
        if self.reader.at_eof()? {
            return Ok(());
        }
        let line = self.reader.read_line()?;
        if !is_blank_line(&line) {
            return Err(FilterError::MalformedHeader {
                position: self.reader.position(),
                message: "expected blank line terminator".into(),
            });
        }
        Ok(())
    }

    fn read_header_block(&mut self) -> Result<Option<HeaderList>> {
        loop {
            if self.reader.at_eof()? {
                return Ok(None);
            }
            let line = self.reader.read_line()?;
            if is_blank_line(&line) {
                continue;
            }
            let mut headers = vec![parse_header_line(&line, self.reader.position())?];
            loop {
                if self.reader.at_eof()? {
                    return Err(FilterError::MalformedHeader {
                        position: self.reader.position(),
                        message: "unterminated header block".into(),
                    });
                }
                let line = self.reader.read_line()?;
                if is_blank_line(&line) {
                    break;
                }
                headers.push(parse_header_line(&line, self.reader.position())?);
            }
            return Ok(Some(headers));
        }
    }

    fn read_record(&mut self) -> Result<Option<Record>> {
        let headers = match self.read_header_block()? {
            Some(h) => h,
            None => return Ok(None),
        };

        if let Some(version) = header_u64(&headers, "SVN-fs-dump-format-version") {
            return Ok(Some(Record::Format { version: version as u32 }));
        }
        if let Some(uuid) = header_str(&headers, "UUID") {
            return Ok(Some(Record::Uuid { uuid: uuid.to_string() }));
        }
        if let Some(input_number) = header_u64(&headers, "Revision-number") {
            let props = match header_u64(&headers, "Prop-content-length") {
                Some(len) => {
                    let bytes = self.reader.read_exact(len as usize)?;
                    let props = PropertyBlock::parse(&bytes)?;
                    self.expect_blank_line()?;
                    props
                }
                None => PropertyBlock::new(),
            };
            return Ok(Some(Record::Revision(RevisionRecord { input_number, headers, props })));
        }
        if header_bytes(&headers, "Node-path").is_some() {
            let prop_len = header_u64(&headers, "Prop-content-length");
            let text_len = header_u64(&headers, "Text-content-length");
            let props = match prop_len {
                Some(len) => Some(PropertyBlock::parse(&self.reader.read_exact(len as usize)?)?),
                None => None,
            };
            let text = match text_len {
                Some(len) => Some(self.reader.read_exact(len as usize)?),
                None => None,
            };
            if props.is_some() || text.is_some() {
                self.expect_blank_line()?;
                self.expect_blank_line()?;
            }
            return Ok(Some(Record::Node(NodeRecord { headers, props, text })));
        }

        Err(FilterError::UnexpectedRecord {
            position: self.reader.position(),
            message: "header block is neither format version, UUID, revision, nor node".into(),
        })
    }
}

impl<R: Read> Iterator for DumpParser<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
