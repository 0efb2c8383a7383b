//! Core of the dump-stream path filter and untangler: the record model,
//! parser, matcher, renumber map, dependent-directory synthesizer,
//! untangler, emitter, and the two drivers (emit and scan) that wire them
//! together. No process spawning, no async runtime, no CLI parsing — see
//! `dsvnfilter-cli` for those.

pub mod config;
pub mod driver;
pub mod emitter;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod pathutil;
pub mod probe;
pub mod properties;
pub mod reader;
pub mod renumber;
pub mod scan;
pub mod synth;
pub mod untangle;

pub use config::{FilterConfig, MatchModeConfig};
pub use driver::Driver;
pub use error::{FilterError, Result};
pub use matcher::{MatchMode, PathMatcher};
pub use parser::{CANONICAL_NODE_HEADER_ORDER, DumpParser, NodeAction, NodeKind, NodeRecord, Record, RevisionRecord};
pub use probe::{ProbeEntry, ProbeResult, RepositoryProbe};
pub use properties::PropertyBlock;
pub use renumber::{RenumberMap, RenumberPolicy};
pub use scan::{Finding, ScanDriver};

#[cfg(any(test, feature = "test-util"))]
pub use probe::fixture;
