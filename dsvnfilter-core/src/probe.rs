//! The repository-introspection capability the Untangler consumes.
//!
//! Grounded on `dsvn-core/src/storage.rs`'s `ObjectStore` trait: a small,
//! `Send`-free capability trait returning `Result<T, FilterError>`. Made
//! synchronous (no `async_trait`) since §5 mandates a single-threaded,
//! strictly sequential pipeline with no concurrent Probe callers.

use crate::error::Result;
use crate::parser::NodeKind;
use crate::properties::PropertyBlock;

/// One directory entry as seen by the probe, used when the Untangler has
/// to recurse into an excluded source directory.
#[derive(Debug, Clone)]
pub struct ProbeEntry {
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum ProbeResult {
    Found { kind: NodeKind, props: PropertyBlock, content: Option<Vec<u8>> },
    NotFound,
}

/// `lookup(rev, path) -> node kind, properties, content, or not-found`, per
/// §4.4. Implementations may recurse arbitrarily (shelling out, hitting a
/// live repository API, or an in-memory fixture); the core never depends on
/// how.
pub trait RepositoryProbe {
    fn lookup(&mut self, rev: u64, path: &str) -> Result<ProbeResult>;

    /// Lists the immediate children of a directory at `rev`, used by the
    /// Untangler to recurse into a directory source (§4.7 step 4). Default
    /// implementations that cannot enumerate directories may return an
    /// empty list; callers treat an empty list for a non-empty directory as
    /// a probe limitation, not as "the directory is empty".
    fn list_dir(&mut self, rev: u64, path: &str) -> Result<Vec<ProbeEntry>>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixture {
    //! In-memory fixture used by this crate's own tests and by the
    //! top-level integration suite; not used in production (the CLI
    //! wires a real `RepositoryProbe` that shells out to a repository
    //! tool).

    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    pub struct FixtureNode {
        pub kind: NodeKind,
        pub props: PropertyBlock,
        pub content: Option<Vec<u8>>,
    }

    /// Keyed by `(rev, normalized path)`. A directory's children are
    /// discovered by matching other fixture entries at the same revision
    /// one component deeper, mirroring how a real repository's tree would
    /// be walked.
    #[derive(Debug, Clone, Default)]
    pub struct FixtureProbe {
        nodes: HashMap<(u64, String), FixtureNode>,
    }

    impl FixtureProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, rev: u64, path: &str, node: FixtureNode) {
            self.nodes.insert((rev, crate::pathutil::normalize(path)), node);
        }
    }

    impl RepositoryProbe for FixtureProbe {
        fn lookup(&mut self, rev: u64, path: &str) -> Result<ProbeResult> {
            let key = (rev, crate::pathutil::normalize(path));
            Ok(match self.nodes.get(&key) {
                Some(n) => ProbeResult::Found { kind: n.kind, props: n.props.clone(), content: n.content.clone() },
                None => ProbeResult::NotFound,
            })
        }

        fn list_dir(&mut self, rev: u64, path: &str) -> Result<Vec<ProbeEntry>> {
            let prefix = crate::pathutil::normalize(path);
            let prefix_components = crate::pathutil::components(&prefix);
            let mut entries = Vec::new();
            for (r, p) in self.nodes.keys() {
                if *r != rev {
                    continue;
                }
                let comps = crate::pathutil::components(p);
                if comps.len() == prefix_components.len() + 1 && comps.starts_with(&prefix_components) {
                    let name = comps.last().unwrap().to_string();
                    let kind = self.nodes[&(rev, p.clone())].kind;
                    entries.push(ProbeEntry { name, kind });
                }
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        }
    }
}
