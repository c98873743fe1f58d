// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime: pass state, the interruptible work loop, and the render phase.
//!
//! ## Passes
//!
//! A pass starts from [`Runtime::mount`], [`Runtime::render`], or a queued
//! state update, and moves through these states:
//!
//! - Idle: no work-in-progress root.
//! - Pending: a work-in-progress root exists and is the next unit of work.
//! - Rendering: [`Runtime::work_loop`] performs one unit of work (one fiber) at
//!   a time in depth-first preorder, yielding between units when the
//!   [`Deadline`] runs low.
//! - Committing: once no unit remains, the pass is committed in one step and
//!   the runtime returns to idle.
//!
//! The render phase creates detached host nodes and sets their initial
//! properties but never attaches anything, so a yielded pass leaves the
//! visible host tree untouched.
//!
//! ## Driving
//!
//! The embedder owns the event loop. Each time it gets an idle slice it calls
//! [`Runtime::work_loop`] with a deadline for that slice, or
//! [`Runtime::run_until_idle`] to finish everything synchronously.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::time::Duration;

use crate::element::{Element, NODE_VALUE, Props};
use crate::error::{HostError, RenderError};
use crate::fiber::{Fiber, FiberKind, FiberTree};
use crate::hooks::{RenderCx, UpdateSignal};
use crate::host::{HostAdapter, apply_props};
use crate::reconcile::reconcile_children;
use crate::types::{CommitReport, EffectTag, FiberId};

/// Remaining-time estimate for the current slice.
pub trait Deadline {
    /// Time left before the loop should hand control back.
    fn time_remaining(&self) -> Duration;
}

/// A deadline that never expires.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// A deadline measured in units of work instead of time.
///
/// A `Budget` of `n` lets a slice perform `n` units before yielding (at least
/// one). The loop consults the deadline once per completed unit.
#[derive(Debug)]
pub struct Budget {
    units: Cell<u32>,
}

impl Budget {
    /// A budget of `units` units of work.
    pub fn new(units: u32) -> Self {
        Self {
            units: Cell::new(units),
        }
    }

    /// Units left in this budget.
    pub fn remaining(&self) -> u32 {
        self.units.get()
    }
}

impl Deadline for Budget {
    fn time_remaining(&self) -> Duration {
        let left = self.units.get().saturating_sub(1);
        self.units.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}

/// Tunables for the work loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Yield once the deadline reports less than this much time remaining.
    pub yield_threshold: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
        }
    }
}

/// Outcome of one [`Runtime::work_loop`] slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopStatus {
    /// Nothing to do.
    Idle,
    /// A pass is in progress and will resume on the next call.
    Yielded,
    /// A pass was committed.
    Committed(CommitReport),
}

/// State of the pass being rendered, plus the committed root.
#[derive(Debug, Default)]
pub(crate) struct PassState {
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) report: CommitReport,
    // Set once the commit has changed the attached host tree.
    pub(crate) touched_host: bool,
}

/// The reconciliation runtime for one container on one host.
pub struct Runtime<H: HostAdapter> {
    pub(crate) host: H,
    pub(crate) tree: FiberTree<H::Node>,
    pub(crate) pass: PassState,
    config: SchedulerConfig,
    signal: UpdateSignal,
    container: Option<H::Node>,
    // A root render requested while a pass was in progress.
    queued: Option<(Rc<[Element]>, H::Node)>,
}

impl<H: HostAdapter + core::fmt::Debug> core::fmt::Debug for Runtime<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runtime")
            .field("host", &self.host)
            .field("tree", &self.tree)
            .field("pass", &self.pass)
            .field("config", &self.config)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl<H: HostAdapter> Runtime<H> {
    /// Create a runtime with the default [`SchedulerConfig`].
    pub fn new(host: H) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    /// Create a runtime with an explicit configuration.
    pub fn with_config(host: H, config: SchedulerConfig) -> Self {
        Self {
            host,
            tree: FiberTree::new(),
            pass: PassState::default(),
            config,
            signal: UpdateSignal::default(),
            container: None,
            queued: None,
        }
    }

    /// The host adapter.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host adapter, mutably. Use between slices, e.g. to dispatch events.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The fiber arena, holding the committed tree and any work in progress.
    pub fn fibers(&self) -> &FiberTree<H::Node> {
        &self.tree
    }

    /// Root of the last committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.pass.current_root
    }

    /// Root of the tree being rendered.
    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        self.pass.wip_root
    }

    /// The active configuration.
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// True if no pass is in progress.
    pub fn is_idle(&self) -> bool {
        self.pass.wip_root.is_none()
    }

    /// True if a state update or a root render is waiting for the next pass.
    pub fn has_pending_update(&self) -> bool {
        self.signal.is_raised() || self.queued.is_some()
    }

    /// Render `element` into `container`.
    ///
    /// No work happens until the loop runs. If a pass is in progress the render
    /// is queued and starts once that pass commits; a later call replaces an
    /// earlier queued one. Mounting into a different container than the
    /// committed tree removes the committed tree from its old container.
    pub fn mount(&mut self, element: Element, container: H::Node) {
        self.container = Some(container);
        let children: Rc<[Element]> = Rc::from([element]);
        if self.is_idle() {
            self.begin_pass(children, container);
        } else {
            tracing::debug!(?container, "render queued behind pass in progress");
            self.queued = Some((children, container));
        }
    }

    /// Render `element` into the container given to [`Runtime::mount`].
    pub fn render(&mut self, element: Element) -> Result<(), RenderError> {
        let container = self.container.ok_or(RenderError::NotMounted)?;
        self.mount(element, container);
        Ok(())
    }

    /// Run one slice of work.
    ///
    /// Starts a pass if one is pending, performs units of work until either
    /// none remain or `deadline` drops below the yield threshold, and commits
    /// when the render phase finishes. At least one unit is performed per
    /// call while a pass is in progress.
    ///
    /// A host failure abandons the pass and is returned, and the runtime is
    /// idle again. The committed tree stays current unless the commit had
    /// already changed the host, in which case it is discarded and the next
    /// render mounts from scratch.
    pub fn work_loop(&mut self, deadline: &impl Deadline) -> Result<LoopStatus, RenderError> {
        if self.is_idle() && !self.start_pending() {
            return Ok(LoopStatus::Idle);
        }
        while let Some(unit) = self.pass.next_unit {
            let next = match self.perform_unit_of_work(unit) {
                Ok(next) => next,
                Err(error) => return Err(self.abort_pass(error)),
            };
            self.pass.next_unit = next;
            if next.is_some() && deadline.time_remaining() < self.config.yield_threshold {
                tracing::debug!(?next, "yielding");
                return Ok(LoopStatus::Yielded);
            }
        }
        match self.commit_root() {
            Ok(report) => Ok(LoopStatus::Committed(report)),
            Err(error) => Err(self.abort_pass(error)),
        }
    }

    /// Run passes until nothing is pending, returning the last commit report.
    ///
    /// A component that updates its own state on every render keeps this
    /// from returning.
    pub fn run_until_idle(&mut self) -> Result<Option<CommitReport>, RenderError> {
        let mut last = None;
        loop {
            match self.work_loop(&Unbounded)? {
                LoopStatus::Idle => return Ok(last),
                LoopStatus::Yielded => {}
                LoopStatus::Committed(report) => last = Some(report),
            }
        }
    }

    /// Turn a queued render or a raised update signal into a new pass.
    fn start_pending(&mut self) -> bool {
        if let Some((children, container)) = self.queued.take() {
            self.begin_pass(children, container);
            return true;
        }
        if !self.signal.take() {
            return false;
        }
        let Some(current) = self.pass.current_root else {
            return false;
        };
        let root = self.tree.get(current);
        let (children, container) = (root.children.clone(), root.node);
        match container {
            Some(container) => {
                self.begin_pass(children, container);
                true
            }
            None => false,
        }
    }

    fn begin_pass(&mut self, children: Rc<[Element]>, container: H::Node) {
        let pass = self.signal.begin_pass();
        // Every pass renders every component, so it covers all queued updates.
        self.signal.take();
        let current = self.pass.current_root;
        let alternate = current.filter(|r| self.tree.host_node(*r) == Some(container));
        let root = self.tree.insert(Fiber::root(container, children, alternate));
        self.pass.wip_root = Some(root);
        self.pass.next_unit = Some(root);
        self.pass.deletions.clear();
        self.pass.report = CommitReport::default();
        self.pass.touched_host = false;
        if let Some(old) = current
            && alternate.is_none()
        {
            // New container: the whole committed tree goes away.
            let old_children: Vec<_> = self.tree.children(old).collect();
            for child in old_children {
                self.tree.get_mut(child).effect = EffectTag::Delete;
                self.pass.deletions.push(child);
            }
        }
        tracing::debug!(pass, ?root, ?alternate, "pass started");
    }

    /// Process one fiber and return the next one in preorder.
    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, HostError> {
        if matches!(self.tree.get(id).kind, FiberKind::Component(_)) {
            self.update_function_component(id);
        } else {
            self.update_host_component(id)?;
        }
        Ok(self.next_unit_after(id))
    }

    fn update_host_component(&mut self, id: FiberId) -> Result<(), HostError> {
        let fiber = self.tree.get(id);
        if fiber.node.is_none() {
            let props = fiber.props.clone();
            let node = match &fiber.kind {
                FiberKind::Text => {
                    let text = props
                        .get(NODE_VALUE)
                        .map(alloc::string::ToString::to_string)
                        .unwrap_or_default();
                    self.host.create_text_node(&text)?
                }
                FiberKind::Host(tag) => {
                    let node = self.host.create_node(tag)?;
                    self.pass.report.property_ops +=
                        apply_props(&mut self.host, node, &Props::new(), &props)?;
                    node
                }
                FiberKind::Root | FiberKind::Component(_) => return Ok(()),
            };
            tracing::trace!(?id, ?node, "created host node");
            self.tree.get_mut(id).node = Some(node);
        }
        let children = self.tree.get(id).children.clone();
        reconcile_children(&mut self.tree, id, &children, &mut self.pass.deletions);
        Ok(())
    }

    fn update_function_component(&mut self, id: FiberId) {
        let fiber = self.tree.get(id);
        let FiberKind::Component(component) = &fiber.kind else {
            return;
        };
        let component = component.clone();
        let props = fiber.props.clone();
        let children = fiber.children.clone();
        let previous = fiber
            .alternate
            .map(|alt| self.tree.get(alt).hooks.as_slice());

        let mut cx = RenderCx::new(component.name(), previous, &children, &self.signal);
        let child = component.render(&props, &mut cx);
        let hooks = cx.finish();
        tracing::trace!(
            ?id,
            component = component.name(),
            hooks = hooks.len(),
            "rendered component"
        );

        self.tree.get_mut(id).hooks = hooks;
        reconcile_children(
            &mut self.tree,
            id,
            core::slice::from_ref(&child),
            &mut self.pass.deletions,
        );
    }

    /// Depth-first preorder successor of `id` within the work-in-progress tree.
    fn next_unit_after(&self, id: FiberId) -> Option<FiberId> {
        if let Some(child) = self.tree.child(id) {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(fiber) = cursor {
            if Some(fiber) == self.pass.wip_root {
                return None;
            }
            if let Some(sibling) = self.tree.sibling(fiber) {
                return Some(sibling);
            }
            cursor = self.tree.parent(fiber);
        }
        None
    }

    /// Drop the work-in-progress tree and the host nodes created for it.
    fn abort_pass(&mut self, error: HostError) -> RenderError {
        tracing::debug!(%error, "pass abandoned");
        if let Some(root) = self.pass.wip_root.take() {
            if core::mem::take(&mut self.pass.touched_host) {
                self.discard_committed(root);
            }
            self.release_created(root);
            self.tree.remove_chain(root);
        }
        for id in self.pass.deletions.drain(..) {
            if self.tree.is_alive(id) {
                self.tree.get_mut(id).effect = EffectTag::None;
            }
        }
        self.pass.next_unit = None;
        error.into()
    }
}
