// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber storage: a generational arena of fibers linked by [`FiberId`].
//!
//! Both the committed tree and the work-in-progress tree live in the same
//! arena. A new tree never mutates the fibers it is diffed against, apart from
//! tagging deletions, and the old tree is freed as a whole once the new one
//! is committed.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::{Component, Element, ElementKind, Props};
use crate::hooks::HookSlot;
use crate::types::{EffectTag, FiberId};

/// What a fiber renders.
#[derive(Clone, Debug, PartialEq)]
pub enum FiberKind {
    /// The root fiber; its host node is the container.
    Root,
    /// A host node with the given tag name.
    Host(alloc::string::String),
    /// A text node.
    Text,
    /// A component.
    Component(Component),
}

impl FiberKind {
    /// True if an element of `kind` may reuse a fiber of this kind.
    pub fn matches(&self, kind: &ElementKind) -> bool {
        match (self, kind) {
            (Self::Host(a), ElementKind::Host(b)) => a == b,
            (Self::Text, ElementKind::Text) => true,
            (Self::Component(a), ElementKind::Component(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&ElementKind> for FiberKind {
    fn from(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Host(tag) => Self::Host(tag.clone()),
            ElementKind::Text => Self::Text,
            ElementKind::Component(c) => Self::Component(c.clone()),
        }
    }
}

pub(crate) struct Fiber<N> {
    generation: u32,
    pub(crate) kind: FiberKind,
    pub(crate) props: Rc<Props>,
    pub(crate) children: Rc<[Element]>,
    pub(crate) node: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: EffectTag,
    pub(crate) hooks: Vec<HookSlot>,
}

impl<N> Fiber<N> {
    /// A root fiber bound to `container`.
    pub(crate) fn root(container: N, children: Rc<[Element]>, alternate: Option<FiberId>) -> Self {
        Self {
            generation: 0,
            kind: FiberKind::Root,
            props: Rc::new(Props::new()),
            children,
            node: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: EffectTag::None,
            hooks: Vec::new(),
        }
    }

    /// A fiber for `element` under `parent`, with no host node yet.
    pub(crate) fn from_element(element: &Element, parent: FiberId, effect: EffectTag) -> Self {
        Self {
            generation: 0,
            kind: element.kind().into(),
            props: element.shared_props(),
            children: element.shared_children(),
            node: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect,
            hooks: Vec::new(),
        }
    }
}

impl<N: Copy> Default for FiberTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena holding every live fiber.
pub struct FiberTree<N> {
    fibers: Vec<Option<Fiber<N>>>, // slots
    generations: Vec<u32>,         // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl<N: Copy> core::fmt::Debug for FiberTree<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FiberTree")
            .field("fibers_total", &self.fibers.len())
            .field("fibers_alive", &self.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<N: Copy> FiberTree<N> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            fibers: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, mut fiber: Fiber<N>) -> FiberId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            fiber.generation = generation;
            self.fibers[idx] = Some(fiber);
            idx
        } else {
            fiber.generation = 1;
            self.fibers.push(Some(fiber));
            self.generations.push(1);
            self.fibers.len() - 1
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "FiberId uses 32-bit indices by design."
        )]
        FiberId::new(idx as u32, self.generations[idx])
    }

    /// Free `id`, its descendants, and the siblings that follow it.
    pub(crate) fn remove_chain(&mut self, id: FiberId) {
        let mut stack = alloc::vec![id];
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.fiber_opt(id) else {
                continue;
            };
            stack.extend(fiber.child);
            stack.extend(fiber.sibling);
            self.fibers[id.idx()] = None;
            self.free_list.push(id.idx());
        }
    }

    /// Access a fiber; panics if `id` is stale.
    pub(crate) fn get(&self, id: FiberId) -> &Fiber<N> {
        self.fiber_opt(id).expect("dangling FiberId")
    }

    /// Access a fiber mutably; panics if `id` is stale.
    pub(crate) fn get_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        let f = self.fibers[id.idx()].as_mut().expect("dangling FiberId");
        assert_eq!(f.generation, id.1, "dangling FiberId");
        f
    }

    fn fiber_opt(&self, id: FiberId) -> Option<&Fiber<N>> {
        let f = self.fibers.get(id.idx())?.as_ref()?;
        (f.generation == id.1).then_some(f)
    }

    // --- queries ---

    /// Returns true if `id` refers to a live fiber.
    pub fn is_alive(&self, id: FiberId) -> bool {
        self.fiber_opt(id).is_some()
    }

    /// Number of live fibers across all trees held by the arena.
    pub fn len(&self) -> usize {
        self.fibers.iter().filter(|f| f.is_some()).count()
    }

    /// True if no fiber is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of a live fiber.
    pub fn kind(&self, id: FiberId) -> Option<&FiberKind> {
        self.fiber_opt(id).map(|f| &f.kind)
    }

    /// Properties of a live fiber.
    pub fn props(&self, id: FiberId) -> Option<&Props> {
        self.fiber_opt(id).map(|f| &*f.props)
    }

    /// Effect tag of a live fiber.
    pub fn effect_tag(&self, id: FiberId) -> Option<EffectTag> {
        self.fiber_opt(id).map(|f| f.effect)
    }

    /// Host node of a live fiber, if it has one.
    pub fn host_node(&self, id: FiberId) -> Option<N> {
        self.fiber_opt(id)?.node
    }

    /// Parent link.
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.fiber_opt(id)?.parent
    }

    /// First-child link.
    pub fn child(&self, id: FiberId) -> Option<FiberId> {
        self.fiber_opt(id)?.child
    }

    /// Next-sibling link.
    pub fn sibling(&self, id: FiberId) -> Option<FiberId> {
        self.fiber_opt(id)?.sibling
    }

    /// Alternate link: the same-position fiber of the tree this one was diffed against.
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.fiber_opt(id)?.alternate
    }

    /// Number of hook cells recorded on a component fiber.
    pub fn hook_count(&self, id: FiberId) -> usize {
        self.fiber_opt(id).map_or(0, |f| f.hooks.len())
    }

    /// Iterate over the child chain of `id`.
    pub fn children(&self, id: FiberId) -> impl Iterator<Item = FiberId> + '_ {
        core::iter::successors(self.child(id), move |c| self.sibling(*c))
    }
}
