// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document: node identifiers, node payloads, listeners, and errors.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

/// Identifier for a node in a [`Document`](crate::Document).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On [`Document::remove`](crate::Document::remove), the slot is freed and every
///   `NodeId` pointing at it becomes stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Stale `NodeId`s never alias a different live node because the generation must match.
/// Use [`Document::is_alive`](crate::Document::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Event listener callback stored on an element.
///
/// Listeners are compared by pointer identity, so removing a listener requires
/// the same `Rc` that was registered.
pub type Listener = Rc<dyn Fn()>;

/// Errors reported by [`Document`](crate::Document) mutations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node handle is stale or was never issued by this document.
    #[error("node {0:?} is not alive")]
    StaleNode(NodeId),
    /// An element-only operation was applied to a text node.
    #[error("node {0:?} is a text node")]
    NotAnElement(NodeId),
    /// `remove_child` was called with a node that is not a child of `parent`.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Parent passed to the operation.
        parent: NodeId,
        /// Child passed to the operation.
        child: NodeId,
    },
    /// Appending would make a node its own ancestor.
    #[error("appending {child:?} under {parent:?} would create a cycle")]
    WouldCycle {
        /// Parent passed to the operation.
        parent: NodeId,
        /// Child passed to the operation.
        child: NodeId,
    },
}

/// Payload of an element node.
#[derive(Clone, Default)]
pub struct ElementData {
    /// Tag name, e.g. `div`.
    pub tag: String,
    /// Host-visible attributes, serialized by [`Document::to_markup`](crate::Document::to_markup).
    pub attributes: BTreeMap<String, String>,
    /// Properties written directly onto the node object. Not serialized.
    pub properties: BTreeMap<String, String>,
    pub(crate) listeners: Vec<(String, Listener)>,
}

impl core::fmt::Debug for ElementData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let events: Vec<&str> = self.listeners.iter().map(|(e, _)| e.as_str()).collect();
        f.debug_struct("ElementData")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("properties", &self.properties)
            .field("listeners", &events)
            .finish()
    }
}

/// Payload of a node.
#[derive(Clone, Debug)]
pub enum NodeData {
    /// An element with a tag, attributes, properties and listeners.
    Element(ElementData),
    /// A text node carrying its character data.
    Text(String),
}
