// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: node storage, mutations, dispatch, and snapshots.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::types::{DomError, ElementData, Listener, NodeData, NodeId};

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-memory display tree.
///
/// Nodes are created detached and attached with [`Document::append_child`].
/// A node may have at most one parent; appending an attached node moves it.
pub struct Document {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    created: u64,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            created: 0,
        }
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeData::Element(ElementData {
            tag: tag.to_string(),
            ..Default::default()
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(NodeData::Text(text.to_string()))
    }

    fn insert(&mut self, data: NodeData) -> NodeId {
        self.created += 1;
        let node = |generation| Node {
            generation,
            parent: None,
            children: Vec::new(),
            data,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node(generation));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(node(generation)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, generation)
    }

    /// Remove a node and its subtree, detaching it from its parent first.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Set an attribute on an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        el.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Remove an attribute from an element. Removing a missing attribute is not an error.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        el.attributes.remove(name);
        Ok(())
    }

    /// Write (`Some`) or clear (`None`) a property on the node object.
    ///
    /// On a text node only `nodeValue` is accepted; it replaces the character data.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let node = self.node_opt_mut(id).ok_or(DomError::StaleNode(id))?;
        match &mut node.data {
            NodeData::Text(text) if name == "nodeValue" => {
                *text = value.unwrap_or_default().to_string();
                Ok(())
            }
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
            NodeData::Element(el) => {
                match value {
                    Some(v) => {
                        el.properties.insert(name.to_string(), v.to_string());
                    }
                    None => {
                        el.properties.remove(name);
                    }
                }
                Ok(())
            }
        }
    }

    /// Register a listener for `event`.
    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        el.listeners.push((event.to_string(), listener));
        Ok(())
    }

    /// Unregister the first listener for `event` that is pointer-identical to `listener`.
    pub fn remove_event_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        if let Some(pos) = el
            .listeners
            .iter()
            .position(|(e, l)| e == event && Listener::ptr_eq(l, listener))
        {
            el.listeners.remove(pos);
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.detach_for_insert(parent, child)?;
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Insert `child` under `parent` immediately before `reference`, moving it
    /// if already attached. `reference` must be a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        if self.node_opt(reference).and_then(|n| n.parent) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        if child == reference {
            return Ok(());
        }
        self.detach_for_insert(parent, child)?;
        let siblings = &mut self.node_mut(parent).children;
        let pos = siblings
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Validate an insertion of `child` under `parent` and detach `child` from
    /// its current parent.
    fn detach_for_insert(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element_mut(parent)?;
        if !self.is_alive(child) {
            return Err(DomError::StaleNode(child));
        }
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == child {
                return Err(DomError::WouldCycle { parent, child });
            }
            cursor = self.node(c).parent;
        }
        if let Some(old) = self.node(child).parent {
            self.node_mut(old).children.retain(|c| *c != child);
        }
        Ok(())
    }

    /// Detach `child` from `parent`. The child stays alive until [`Document::remove`].
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.is_alive(parent) {
            return Err(DomError::StaleNode(parent));
        }
        if !self.is_alive(child) {
            return Err(DomError::StaleNode(child));
        }
        if self.node(child).parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.node_mut(parent).children.retain(|c| *c != child);
        self.node_mut(child).parent = None;
        Ok(())
    }

    /// Invoke every listener registered on `id` for `event`, in registration order.
    ///
    /// Returns the number of listeners invoked. Listeners run after the
    /// document borrow ends, so they may freely capture shared state.
    pub fn dispatch(&self, id: NodeId, event: &str) -> Result<usize, DomError> {
        let node = self.node_opt(id).ok_or(DomError::StaleNode(id))?;
        let NodeData::Element(el) = &node.data else {
            return Err(DomError::NotAnElement(id));
        };
        let listeners: Vec<Listener> = el
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, l)| l.clone())
            .collect();
        for l in &listeners {
            l();
        }
        Ok(listeners.len())
    }

    // --- queries ---

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// True if the document holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of nodes ever created by this document.
    pub fn created_count(&self) -> u64 {
        self.created
    }

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)?.parent
    }

    /// Children of a live node, in order. Stale ids yield an empty slice.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Node payload.
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node_opt(id).map(|n| &n.data)
    }

    /// Tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element(el) => Some(&el.tag),
            NodeData::Text(_) => None,
        }
    }

    /// Character data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    /// Attribute value of an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element(el) => el.attributes.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    /// Property value of an element.
    pub fn property(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element(el) => el.properties.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    /// Number of listeners registered on `id` for `event`.
    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        match self.data(id) {
            Some(NodeData::Element(el)) => el.listeners.iter().filter(|(e, _)| e == event).count(),
            _ => 0,
        }
    }

    /// Concatenated character data of every text node under `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(t)) => out.push_str(t),
            Some(NodeData::Element(_)) => {
                for c in self.children(id) {
                    self.collect_text(*c, out);
                }
            }
            None => {}
        }
    }

    /// Every element under `root` (inclusive) with the given tag, in preorder.
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            if self.tag(id) == Some(tag) {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Serialize the subtree under `id` as markup.
    ///
    /// Attributes are emitted in name order; properties and listeners are not serialized.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(t)) => escape_into(t, out),
            Some(NodeData::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (k, v) in &el.attributes {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    escape_into(v, out);
                    out.push('"');
                }
                out.push('>');
                for c in self.children(id) {
                    self.write_markup(*c, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            None => {}
        }
    }

    // --- internals ---

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        let node = self.node_opt_mut(id).ok_or(DomError::StaleNode(id))?;
        match &mut node.data {
            NodeData::Element(el) => Ok(el),
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }
}

fn escape_into(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
