//! The monotonic input-revision → output-revision mapping, per §4.5.
//!
//! No direct teacher analogue: `dsvn-core/src/repository.rs` always
//! renumbers from its own monotonic commit counter and never needs to
//! represent "this revision was dropped". Built fresh using the same
//! `HashMap` + running-counter idiom the teacher uses for its own revision
//! bookkeeping (`current_rev`).

use crate::error::{FilterError, Result};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
pub struct RenumberPolicy {
    pub preserve_empty: bool,
    pub stop_renumbering: bool,
}

#[derive(Debug, Clone)]
pub struct RenumberMap {
    policy: RenumberPolicy,
    /// input_rev -> output_rev, populated as revisions close.
    map: HashMap<u64, u64>,
    /// input revisions that were assigned their own output revision,
    /// as opposed to falling back to a prior surviving one.
    surviving: HashSet<u64>,
    next_output: u64,
    last_output: u64,
}

impl RenumberMap {
    pub fn new(policy: RenumberPolicy) -> Self {
        Self { policy, map: HashMap::new(), surviving: HashSet::new(), next_output: 1, last_output: 0 }
    }

    /// Called when a Revision record is read; does not yet commit an
    /// output number (that happens in `close_revision`, once we know
    /// whether the revision had content). Returns the number that would be
    /// assigned if `close_revision(input_rev, true)` were called next,
    /// without mutating state — the Driver only needs the final decision,
    /// which is made at close time.
    pub fn open_revision(&self, input_rev: u64) -> u64 {
        if self.policy.stop_renumbering {
            input_rev
        } else {
            self.next_output
        }
    }

    /// Closes `input_rev`. If `had_content` is true, or preserve-empty is
    /// on, assigns and records the next output revision; otherwise records
    /// that `input_rev` maps to whatever the last surviving output
    /// revision was (so a later `copyfrom-rev` pointing at it resolves to
    /// that ancestor, or fails if there is none).
    pub fn close_revision(&mut self, input_rev: u64, had_content: bool) -> Option<u64> {
        if self.policy.stop_renumbering {
            self.map.insert(input_rev, input_rev);
            self.surviving.insert(input_rev);
            self.last_output = input_rev;
            return Some(input_rev);
        }
        if had_content || self.policy.preserve_empty {
            let out = self.next_output;
            self.next_output += 1;
            self.map.insert(input_rev, out);
            self.surviving.insert(input_rev);
            self.last_output = out;
            Some(out)
        } else {
            self.map.insert(input_rev, self.last_output);
            None
        }
    }

    /// Resolves an input revision referenced by a `copyfrom-rev` header to
    /// its output revision number. `InvalidCopyfromRev` if the revision was
    /// dropped and there was no prior surviving revision to fall back to
    /// (i.e. it maps to output revision 0, which was never emitted as a
    /// real revision for content purposes).
    pub fn translate_copyfrom(&self, input_rev: u64, path: &str) -> Result<u64> {
        match self.map.get(&input_rev) {
            Some(0) => Err(FilterError::InvalidCopyfromRev { input_rev, path: path.to_string() }),
            Some(out) => Ok(*out),
            None => Err(FilterError::InvalidCopyfromRev { input_rev, path: path.to_string() }),
        }
    }

    /// True if `input_rev` was dropped (mapped to a fallback, not assigned
    /// its own output revision). Used by the Untangler to decide whether a
    /// copyfrom source whose path *is* included still needs untangling
    /// because its revision vanished (§4.7, "source revision dropped").
    pub fn was_dropped(&self, input_rev: u64) -> bool {
        // A revision not yet closed cannot have been dropped (copyfrom
        // always references a prior revision).
        self.map.contains_key(&input_rev) && !self.surviving.contains(&input_rev)
    }
}
