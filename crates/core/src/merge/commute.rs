//! Commutation check for two edit scripts against the same base.
//!
//! Two scripts commute when every pair of edits (one from each side) either
//! touches disjoint base lines or is the same intended change. Commuting
//! scripts can be applied in one combined pass without a human deciding
//! which side wins.

use tracing::debug;

use super::edit::{Edit, EditKind};

/// Knobs for the commutation check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommutePolicy {
    /// Keep inserts from both sides at the same base position instead of
    /// treating them as a conflict. Ours is emitted before theirs.
    pub allow_insert_union: bool,
}

impl CommutePolicy {
    /// Same-position inserts conflict.
    pub const STRICT: Self = Self {
        allow_insert_union: false,
    };

    /// Same-position inserts are unioned, ours first.
    pub const UNION: Self = Self {
        allow_insert_union: true,
    };
}

impl Edit<'_> {
    /// Whether two edits express the same change to the base.
    ///
    /// Base range and replacement lines must match. Kinds must match too,
    /// except that delete and replace are interchangeable since a delete is a
    /// replace with empty content.
    pub fn is_equivalent(&self, other: &Edit<'_>) -> bool {
        self.base_start == other.base_start
            && self.base_end == other.base_end
            && self.new_lines == other.new_lines
            && (self.kind == other.kind || (self.kind.consumes_base() && other.kind.consumes_base()))
    }

    /// Whether this edit and `other` cannot both be applied unambiguously.
    fn conflicts_with(&self, other: &Edit<'_>, policy: CommutePolicy) -> bool {
        match (self.kind, other.kind) {
            (EditKind::Insert, EditKind::Insert) => {
                self.base_start == other.base_start && !policy.allow_insert_union
            }
            (EditKind::Insert, _) => other.strictly_contains(self.base_start),
            (_, EditKind::Insert) => self.strictly_contains(other.base_start),
            _ => self.base_start < other.base_end && other.base_start < self.base_end,
        }
    }

    /// Whether `pos` lies inside the base range, not on its boundary.
    fn strictly_contains(&self, pos: usize) -> bool {
        self.base_start < pos && pos < self.base_end
    }
}

/// Check whether `ours` and `theirs` commute.
///
/// Returns the combined edit list sorted by base position (inserts before
/// replacements at the same position, ours before theirs), or `None` as soon
/// as one pair of edits conflicts. Edits in `theirs` equivalent to an edit in
/// `ours` are dropped first.
pub fn commute<'a>(
    ours: &[Edit<'a>],
    theirs: &[Edit<'a>],
    policy: CommutePolicy,
) -> Option<Vec<Edit<'a>>> {
    let theirs: Vec<&Edit<'a>> = theirs
        .iter()
        .filter(|t| !ours.iter().any(|o| o.is_equivalent(t)))
        .collect();

    for o in ours {
        if let Some(t) = theirs.iter().find(|t| o.conflicts_with(t, policy)) {
            debug!(
                ours_kind = %o.kind,
                ours_range = ?(o.base_start..o.base_end),
                theirs_kind = %t.kind,
                theirs_range = ?(t.base_start..t.base_end),
                "edits do not commute"
            );
            return None;
        }
    }

    let mut combined = ours.to_vec();
    combined.extend(theirs.into_iter().cloned());
    combined.sort_by_key(|e| (e.base_start, e.kind.rank(), e.side));
    Some(combined)
}
