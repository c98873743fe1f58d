// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the fiber tree: identifiers, effect tags, and commit summaries.

/// Identifier for a fiber in a [`FiberTree`](crate::FiberTree).
///
/// A small, copyable handle made of a slot index and a generation counter.
/// All fiber links (parent, child, sibling, alternate) are stored as `FiberId`s,
/// so a retired tree can be freed while ids into it are still held elsewhere:
/// those ids simply stop being [alive](crate::FiberTree::is_alive).
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On removal, the slot is freed and every `FiberId` pointing at it becomes stale.
/// - On reuse of a freed slot, its generation is incremented.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FiberId(pub(crate) u32, pub(crate) u32);

impl FiberId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Effect computed for a fiber during the render phase and applied during commit.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum EffectTag {
    /// No host work (the root, or a fiber not yet reconciled).
    #[default]
    None,
    /// Attach a newly created host node to its host parent.
    Create,
    /// Reuse the alternate's host node and apply the property diff.
    Update,
    /// Detach and release the fiber's host node. Only set on fibers of the committed tree.
    Delete,
}

bitflags::bitflags! {
    /// Kinds of mutation performed by a pass, as summarized in [`CommitReport::flags`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CommitFlags: u8 {
        /// At least one fiber was created.
        const CREATED    = 0b0000_0001;
        /// At least one fiber was updated in place.
        const UPDATED    = 0b0000_0010;
        /// At least one fiber was deleted.
        const DELETED    = 0b0000_0100;
        /// At least one host property, attribute, or listener changed.
        const PROPERTIES = 0b0000_1000;
    }
}

/// Summary of a committed pass, returned by the scheduler when a commit completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Fibers tagged [`EffectTag::Create`].
    pub created: usize,
    /// Fibers tagged [`EffectTag::Update`].
    pub updated: usize,
    /// Fibers tagged [`EffectTag::Delete`].
    pub deleted: usize,
    /// Host attribute, property, and listener operations issued by the pass.
    pub property_ops: usize,
    /// Which of the counters above are non-zero.
    pub flags: CommitFlags,
}

impl CommitReport {
    /// True if the pass changed nothing visible on the host.
    pub fn is_noop(&self) -> bool {
        !self
            .flags
            .intersects(CommitFlags::CREATED | CommitFlags::DELETED | CommitFlags::PROPERTIES)
    }

    pub(crate) fn finish(mut self) -> Self {
        self.flags.set(CommitFlags::CREATED, self.created > 0);
        self.flags.set(CommitFlags::UPDATED, self.updated > 0);
        self.flags.set(CommitFlags::DELETED, self.deleted > 0);
        self.flags.set(CommitFlags::PROPERTIES, self.property_ops > 0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_derives_flags_from_counts() {
        let report = CommitReport {
            updated: 3,
            ..Default::default()
        }
        .finish();
        assert_eq!(report.flags, CommitFlags::UPDATED);
        assert!(report.is_noop(), "updates without property changes are invisible");

        let report = CommitReport {
            deleted: 1,
            created: 1,
            ..Default::default()
        }
        .finish();
        assert!(report.flags.contains(CommitFlags::CREATED | CommitFlags::DELETED));
        assert!(!report.is_noop());
    }
}
