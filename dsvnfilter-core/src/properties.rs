//! The `K len\nkey\nV len\nvalue\n` / `D len\nkey\n` property block, terminated
//! by `PROPS-END\n`.
//!
//! `dsvn-core`'s `PropertySet` is a `HashMap<String, PropertyValue>`, which
//! is the right model for a live repository's property store but loses
//! entry order. Order is significant here: two property blocks that set
//! the same keys in a different order serialize to different bytes, and
//! byte-exact passthrough depends on reproducing the order a block was
//! read in. `PropertyBlock` is an ordered `Vec` instead.

use crate::error::{FilterError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropEntry {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBlock {
    entries: Vec<PropEntry>,
}

const PROPS_END: &[u8] = b"PROPS-END\n";
const MARKER_KEY: &[u8] = b"svndumpfilter generated";
const MARKER_VALUE: &[u8] = b"True";
const MERGEINFO_KEY: &[u8] = b"svn:mergeinfo";

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PropEntry] {
        &self.entries
    }

    /// Parses a raw property block (the exact bytes named by
    /// `Prop-content-length`), requiring `PROPS-END\n` to account for
    /// every remaining byte.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0usize;
        loop {
            if bytes[pos..].starts_with(PROPS_END) {
                pos += PROPS_END.len();
                break;
            }
            match bytes.get(pos) {
                Some(b'K') => {
                    let (len, next) = read_length_line(bytes, pos, b'K')?;
                    pos = next;
                    let key = take(bytes, pos, len)?;
                    pos += len;
                    pos = expect_newline(bytes, pos)?;
                    let (vlen, next) = read_length_line(bytes, pos, b'V')?;
                    pos = next;
                    let value = take(bytes, pos, vlen)?;
                    pos += vlen;
                    pos = expect_newline(bytes, pos)?;
                    entries.push(PropEntry::Set { key, value });
                }
                Some(b'D') => {
                    let (len, next) = read_length_line(bytes, pos, b'D')?;
                    pos = next;
                    let key = take(bytes, pos, len)?;
                    pos += len;
                    pos = expect_newline(bytes, pos)?;
                    entries.push(PropEntry::Delete { key });
                }
                _ => {
                    return Err(FilterError::MalformedHeader {
                        position: pos as u64,
                        message: "expected 'K', 'D', or PROPS-END in property block".into(),
                    });
                }
            }
        }
        if pos != bytes.len() {
            return Err(FilterError::MalformedHeader {
                position: pos as u64,
                message: "trailing bytes after PROPS-END".into(),
            });
        }
        Ok(Self { entries })
    }

    /// Re-serializes in entry order, always terminated by `PROPS-END\n`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                PropEntry::Set { key, value } => {
                    out.extend_from_slice(format!("K {}\n", key.len()).as_bytes());
                    out.extend_from_slice(key);
                    out.push(b'\n');
                    out.extend_from_slice(format!("V {}\n", value.len()).as_bytes());
                    out.extend_from_slice(value);
                    out.push(b'\n');
                }
                PropEntry::Delete { key } => {
                    out.extend_from_slice(format!("D {}\n", key.len()).as_bytes());
                    out.extend_from_slice(key);
                    out.push(b'\n');
                }
            }
        }
        out.extend_from_slice(PROPS_END);
        out
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.iter().find_map(|e| match e {
            PropEntry::Set { key: k, value } if k == key => Some(value.as_slice()),
            _ => None,
        })
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.iter().any(|e| match e {
            PropEntry::Set { key: k, .. } | PropEntry::Delete { key: k } => k == key,
        })
    }

    /// Sets `key`, updating an existing `Set` entry in place to preserve
    /// its position, or appending a new one.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| matches!(e, PropEntry::Set { key: k, .. } if *k == key))
        {
            if let PropEntry::Set { value: v, .. } = entry {
                *v = value;
            }
        } else {
            self.entries.push(PropEntry::Set { key, value });
        }
    }

    /// Removes every entry for `key`, returning whether anything changed.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| match e {
            PropEntry::Set { key: k, .. } | PropEntry::Delete { key: k } => k != key,
        });
        self.entries.len() != before
    }

    pub fn strip_mergeinfo(&mut self) -> bool {
        self.remove(MERGEINFO_KEY)
    }

    /// Fills in keys from `retrieved` that this block does not already
    /// have an opinion on (neither a `Set` nor a `Delete`). The caller's
    /// own entries always win on collision.
    pub fn merge_retrieved(&mut self, retrieved: &PropertyBlock) {
        for entry in &retrieved.entries {
            if let PropEntry::Set { key, value } = entry {
                if !self.contains_key(key) {
                    self.entries.push(PropEntry::Set { key: key.clone(), value: value.clone() });
                }
            }
        }
    }

    pub fn add_marker(&mut self) {
        self.set(MARKER_KEY.to_vec(), MARKER_VALUE.to_vec());
    }

    pub fn has_marker(&self) -> bool {
        self.get(MARKER_KEY) == Some(MARKER_VALUE)
    }
}

fn read_length_line(bytes: &[u8], pos: usize, tag: u8) -> Result<(usize, usize)> {
    if bytes.get(pos) != Some(&tag) {
        return Err(FilterError::MalformedHeader {
            position: pos as u64,
            message: format!("expected '{}' tag", tag as char),
        });
    }
    let line_end = bytes[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| FilterError::MalformedHeader {
            position: pos as u64,
            message: "unterminated length line in property block".into(),
        })?
        + pos;
    let line = &bytes[pos..line_end];
    // line looks like "K 123"
    let len_str = std::str::from_utf8(&line[2..]).map_err(|_| FilterError::MalformedHeader {
        position: pos as u64,
        message: "non-utf8 length in property block".into(),
    })?;
    let len: usize = len_str.trim().parse().map_err(|_| FilterError::MalformedHeader {
        position: pos as u64,
        message: format!("invalid length '{len_str}' in property block"),
    })?;
    Ok((len, line_end + 1))
}

fn take(bytes: &[u8], pos: usize, len: usize) -> Result<Vec<u8>> {
    bytes.get(pos..pos + len).map(|s| s.to_vec()).ok_or_else(|| FilterError::TruncatedBody {
        position: pos as u64,
        message: "property block shorter than declared key/value length".into(),
    })
}

fn expect_newline(bytes: &[u8], pos: usize) -> Result<usize> {
    if bytes.get(pos) == Some(&b'\n') {
        Ok(pos + 1)
    } else {
        Err(FilterError::MalformedHeader {
            position: pos as u64,
            message: "expected newline after key/value data".into(),
        })
    }
}
