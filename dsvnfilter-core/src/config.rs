//! Filter configuration surface, shared by the CLI and by tests/fixtures.
//!
//! Grounded on `dsvn-admin-cli/src/dump_format.rs`'s `#[derive(Serialize,
//! Deserialize)]` convention for data structures that may be embedded in
//! test fixtures.

use crate::error::{FilterError, Result};
use crate::matcher::MatchMode;
use crate::renumber::RenumberPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub mode: MatchModeConfig,
    pub prefixes: Vec<String>,
    pub preserve_empty: bool,
    pub stop_renumbering: bool,
    pub strip_mergeinfo: bool,
    pub start_revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchModeConfig {
    Include,
    Exclude,
}

impl From<MatchModeConfig> for MatchMode {
    fn from(value: MatchModeConfig) -> Self {
        match value {
            MatchModeConfig::Include => MatchMode::Include,
            MatchModeConfig::Exclude => MatchMode::Exclude,
        }
    }
}

impl FilterConfig {
    pub fn renumber_policy(&self) -> RenumberPolicy {
        RenumberPolicy { preserve_empty: self.preserve_empty, stop_renumbering: self.stop_renumbering }
    }

    /// §7 names `-s` (stop-renumbering) with the default drop mode as a
    /// rejected combination: keeping input revision numbers verbatim is
    /// incompatible with dropping empty revisions, since a drop would leave
    /// a gap in the numbering `-s` promises not to introduce. `-k` must
    /// accompany `-s`.
    pub fn validate(&self) -> Result<()> {
        if self.prefixes.is_empty() {
            return Err(FilterError::ConfigError("no include/exclude paths were given".into()));
        }
        if self.stop_renumbering && !self.preserve_empty {
            return Err(FilterError::ConfigError(
                "-s/--stop-renumbering requires -k/--preserve-empty: dropping empty revisions would break the promise to keep input revision numbers".into(),
            ));
        }
        Ok(())
    }
}
