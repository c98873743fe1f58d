// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit phase: apply a finished work-in-progress tree to the host.
//!
//! Commit runs in one step. Deletions are detached first, then the new tree is
//! walked in postorder, placing created nodes and diffing the properties of
//! updated ones. Only after every host operation succeeded are hook queues
//! settled and the trees swapped.
//!
//! ## Failures
//!
//! Nothing is rolled back. If a host operation fails before the commit changed
//! the host tree, the committed tree and its state cells stay current. Once it
//! may have changed, the committed tree no longer describes the host, so it
//! is discarded: every node either tree placed in the container is detached
//! and released, and the next render mounts from scratch. In both cases the
//! nodes created for the abandoned tree are released.

use alloc::vec::Vec;

use crate::error::HostError;
use crate::fiber::FiberKind;
use crate::host::{HostAdapter, apply_props};
use crate::scheduler::Runtime;
use crate::types::{CommitReport, EffectTag, FiberId};

impl<H: HostAdapter> Runtime<H> {
    pub(crate) fn commit_root(&mut self) -> Result<CommitReport, HostError> {
        let Some(root) = self.pass.wip_root else {
            return Ok(CommitReport::default());
        };

        for i in 0..self.pass.deletions.len() {
            let id = self.pass.deletions[i];
            self.commit_deletion(id)?;
            self.pass.report.deleted += 1;
        }
        if let Some(child) = self.tree.child(root) {
            self.commit_work(child)?;
        }

        self.finalize(root);
        self.pass.deletions.clear();
        self.pass.wip_root = None;
        let previous = self.pass.current_root.replace(root);
        if let Some(previous) = previous {
            self.tree.remove_chain(previous);
        }

        let report = core::mem::take(&mut self.pass.report).finish();
        tracing::debug!(
            ?root,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            property_ops = report.property_ops,
            "committed"
        );
        Ok(report)
    }

    fn commit_deletion(&mut self, id: FiberId) -> Result<(), HostError> {
        let Some(parent) = self.host_parent(id) else {
            return Ok(());
        };
        self.detach(parent, id)
    }

    /// Detach the host node of `id`, or of its nearest node-bearing
    /// descendants if `id` is a component.
    fn detach(&mut self, parent: H::Node, id: FiberId) -> Result<(), HostError> {
        if let Some(node) = self.tree.host_node(id) {
            tracing::trace!(?id, ?node, "detaching");
            self.host.remove_child(parent, node)?;
            self.pass.touched_host = true;
            return self.host.release_node(node);
        }
        let mut child = self.tree.child(id);
        while let Some(c) = child {
            self.detach(parent, c)?;
            child = self.tree.sibling(c);
        }
        Ok(())
    }

    /// Commit the chain starting at `first`, children before parents.
    fn commit_work(&mut self, first: FiberId) -> Result<(), HostError> {
        let mut cursor = Some(first);
        while let Some(id) = cursor {
            if let Some(child) = self.tree.child(id) {
                self.commit_work(child)?;
            }
            self.commit_fiber(id)?;
            cursor = self.tree.sibling(id);
        }
        Ok(())
    }

    fn commit_fiber(&mut self, id: FiberId) -> Result<(), HostError> {
        let fiber = self.tree.get(id);
        let (effect, node, alternate) = (fiber.effect, fiber.node, fiber.alternate);
        match effect {
            EffectTag::Create => {
                self.pass.report.created += 1;
                let Some(node) = node else {
                    // Components own no host node; their descendants are placed.
                    return Ok(());
                };
                let Some(parent) = self.host_parent(id) else {
                    return Ok(());
                };
                match self.host_sibling(id) {
                    Some(before) => self.host.insert_before(parent, node, before)?,
                    None => self.host.append_child(parent, node)?,
                }
                self.pass.touched_host = true;
                tracing::trace!(?id, ?node, "placed");
            }
            EffectTag::Update => {
                self.pass.report.updated += 1;
                if let (Some(node), Some(alternate)) = (node, alternate) {
                    let old = self.tree.get(alternate).props.clone();
                    let new = self.tree.get(id).props.clone();
                    // A partial diff may already be on the host if this fails.
                    self.pass.touched_host |= old != new;
                    self.pass.report.property_ops +=
                        apply_props(&mut self.host, node, &old, &new)?;
                }
            }
            EffectTag::None | EffectTag::Delete => {}
        }
        Ok(())
    }

    /// Settle hook queues and drop the links to the retiring tree.
    fn finalize(&mut self, root: FiberId) {
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let fiber = self.tree.get_mut(id);
            for hook in &fiber.hooks {
                hook.commit();
            }
            fiber.effect = EffectTag::None;
            fiber.alternate = None;
            stack.extend(fiber.child);
            stack.extend(fiber.sibling);
        }
    }

    /// Release the host nodes created for the abandoned tree under `root`,
    /// descendants before their ancestors.
    pub(crate) fn release_created(&mut self, root: FiberId) {
        let mut created = Vec::new();
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let fiber = self.tree.get(id);
            if fiber.effect == EffectTag::Create
                && let Some(node) = fiber.node
            {
                created.push(node);
            }
            stack.extend(fiber.child);
            stack.extend(fiber.sibling);
        }
        for node in created.into_iter().rev() {
            if let Err(error) = self.host.release_node(node) {
                tracing::debug!(?node, %error, "release of abandoned node failed");
            }
        }
    }

    /// Forget the committed tree after a commit failed part way through.
    ///
    /// Detaches every node the committed tree or the abandoned tree under
    /// `wip_root` placed directly in the container, and releases the
    /// committed ones. Errors are logged and skipped since some of those
    /// nodes were already detached or released by the failed commit.
    pub(crate) fn discard_committed(&mut self, wip_root: FiberId) {
        let Some(current) = self.pass.current_root.take() else {
            return;
        };
        tracing::warn!(?current, "committed tree discarded after a partial commit");
        let Some(container) = self.tree.host_node(current) else {
            self.tree.remove_chain(current);
            return;
        };
        let committed = self.top_host_nodes(current);
        let mut placed = committed.clone();
        for node in self.top_host_nodes(wip_root) {
            if !placed.contains(&node) {
                placed.push(node);
            }
        }
        for node in placed {
            if let Err(error) = self.host.remove_child(container, node) {
                tracing::debug!(?node, %error, "detach of discarded node failed");
            }
        }
        for node in committed {
            if let Err(error) = self.host.release_node(node) {
                tracing::debug!(?node, %error, "release of discarded node failed");
            }
        }
        self.tree.remove_chain(current);
    }

    /// Host nodes of the topmost node-bearing fibers under `root`.
    fn top_host_nodes(&self, root: FiberId) -> Vec<H::Node> {
        let mut nodes = Vec::new();
        let mut stack: Vec<FiberId> = self.tree.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            match self.tree.host_node(id) {
                Some(node) => nodes.push(node),
                None => {
                    let first = stack.len();
                    stack.extend(self.tree.children(id));
                    stack[first..].reverse();
                }
            }
        }
        nodes
    }

    /// Host node of the nearest node-bearing ancestor.
    fn host_parent(&self, id: FiberId) -> Option<H::Node> {
        let mut cursor = self.tree.parent(id);
        while let Some(p) = cursor {
            if let Some(node) = self.tree.host_node(p) {
                return Some(node);
            }
            cursor = self.tree.parent(p);
        }
        None
    }

    /// The already attached host node that `id`'s node must precede, if any.
    ///
    /// Looks through following siblings, descending into components and
    /// climbing out of them, for the first node-bearing fiber that was
    /// updated in place. Created fibers are skipped since they are not
    /// placed yet.
    fn host_sibling(&self, id: FiberId) -> Option<H::Node> {
        let mut cursor = id;
        'siblings: loop {
            while self.tree.sibling(cursor).is_none() {
                let parent = self.tree.parent(cursor)?;
                if !matches!(self.tree.kind(parent), Some(FiberKind::Component(_))) {
                    return None;
                }
                cursor = parent;
            }
            cursor = self.tree.sibling(cursor)?;
            while matches!(self.tree.kind(cursor), Some(FiberKind::Component(_))) {
                match self.tree.child(cursor) {
                    Some(child) => cursor = child,
                    None => continue 'siblings,
                }
            }
            if self.tree.effect_tag(cursor) == Some(EffectTag::Update) {
                return self.tree.host_node(cursor);
            }
        }
    }
}
