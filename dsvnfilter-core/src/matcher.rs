//! Path inclusion predicate over a prefix set.
//!
//! Grounded on `dsvn-core/src/repository.rs`'s path-component splitting
//! (`path.trim_start_matches('/').split('/')`), reused here via
//! [`crate::pathutil`] for the component-wise prefix test §4.3 requires
//! instead of a substring match.

use crate::pathutil::{components, is_component_prefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
pub struct PathMatcher {
    mode: MatchMode,
    prefixes: Vec<Vec<String>>,
}

impl PathMatcher {
    pub fn new(mode: MatchMode, prefixes: &[String]) -> Self {
        let prefixes = prefixes
            .iter()
            .map(|p| components(p).into_iter().map(str::to_string).collect())
            .collect();
        Self { mode, prefixes }
    }

    /// True iff `path` is included under this matcher's mode and prefix set.
    pub fn is_included(&self, path: &str) -> bool {
        let path_components = components(path);
        let matches_any = self.prefixes.iter().any(|prefix| {
            let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
            is_component_prefix(&prefix, &path_components)
        });
        match self.mode {
            MatchMode::Include => matches_any,
            MatchMode::Exclude => !matches_any,
        }
    }
}
