// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A host that records every operation, for unit tests.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::element::{EventHandler, NODE_VALUE, PropValue};
use crate::error::HostError;
use crate::host::HostAdapter;

/// One recorded host call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Create(u32, String),
    CreateText(u32, String),
    SetAttr(u32, String, String),
    RemoveAttr(u32, String),
    SetProp(u32, String, Option<String>),
    AddListener(u32, String),
    RemoveListener(u32, String),
    Append(u32, u32),
    InsertBefore(u32, u32, u32),
    Remove(u32, u32),
    Release(u32),
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Self::Create(..) => "create_node",
            Self::CreateText(..) => "create_text_node",
            Self::SetAttr(..) => "set_attribute",
            Self::RemoveAttr(..) => "remove_attribute",
            Self::SetProp(..) => "set_property",
            Self::AddListener(..) => "add_event_listener",
            Self::RemoveListener(..) => "remove_event_listener",
            Self::Append(..) => "append_child",
            Self::InsertBefore(..) => "insert_before",
            Self::Remove(..) => "remove_child",
            Self::Release(..) => "release_node",
        }
    }
}

#[derive(Default)]
struct Node {
    // `None` for text nodes.
    tag: Option<String>,
    text: String,
    attrs: BTreeMap<String, String>,
    props: BTreeMap<String, String>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<u32>,
    parent: Option<u32>,
    released: bool,
}

/// Host nodes are plain `u32`s; node `0` is the container.
#[derive(Default)]
pub(crate) struct RecordingHost {
    nodes: Vec<Node>,
    ops: Vec<Op>,
    fail_on: Option<&'static str>,
}

impl RecordingHost {
    pub(crate) const CONTAINER: u32 = 0;

    pub(crate) fn new() -> Self {
        let mut host = Self::default();
        host.nodes.push(Node {
            tag: Some("root".into()),
            ..Default::default()
        });
        host
    }

    /// Make every subsequent call to `op` fail.
    pub(crate) fn fail_on(&mut self, op: Option<&'static str>) {
        self.fail_on = op;
    }

    pub(crate) fn take_ops(&mut self) -> Vec<Op> {
        core::mem::take(&mut self.ops)
    }

    pub(crate) fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of nodes ever created, the container included.
    pub(crate) fn created(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn children_of(&self, node: u32) -> &[u32] {
        &self.nodes[node as usize].children
    }

    pub(crate) fn parent_of(&self, node: u32) -> Option<u32> {
        self.nodes[node as usize].parent
    }

    pub(crate) fn is_released(&self, node: u32) -> bool {
        self.nodes[node as usize].released
    }

    pub(crate) fn listener_count(&self, node: u32, event: &str) -> usize {
        self.nodes[node as usize]
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .count()
    }

    /// First attached node with `tag`, in preorder from the container.
    pub(crate) fn find(&self, tag: &str) -> Option<u32> {
        let mut stack = alloc::vec![Self::CONTAINER];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n as usize];
            if n != Self::CONTAINER && node.tag.as_deref() == Some(tag) {
                return Some(n);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// First attached element whose `id` attribute is `id`.
    pub(crate) fn find_id(&self, id: &str) -> Option<u32> {
        let mut stack = alloc::vec![Self::CONTAINER];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n as usize];
            if node.attrs.get("id").map(String::as_str) == Some(id) {
                return Some(n);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Invoke the listeners for `event` on `node`.
    pub(crate) fn fire(&self, node: u32, event: &str) {
        let handlers: Vec<EventHandler> = self.nodes[node as usize]
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, h)| h.clone())
            .collect();
        for h in handlers {
            h.call();
        }
    }

    /// Markup of everything under the container.
    pub(crate) fn snapshot(&self) -> String {
        let mut out = String::new();
        for &c in &self.nodes[Self::CONTAINER as usize].children {
            self.write(c, &mut out);
        }
        out
    }

    fn write(&self, n: u32, out: &mut String) {
        let node = &self.nodes[n as usize];
        let Some(tag) = &node.tag else {
            out.push_str(&node.text);
            return;
        };
        out.push('<');
        out.push_str(tag);
        for (k, v) in &node.attrs {
            out.push_str(&format!(" {k}=\"{v}\""));
        }
        out.push('>');
        for &c in &node.children {
            self.write(c, out);
        }
        out.push_str(&format!("</{tag}>"));
    }

    fn record(&mut self, op: Op) -> Result<(), HostError> {
        if self.fail_on == Some(op.name()) {
            return Err(HostError::Rejected {
                op: op.name(),
                reason: "injected failure".into(),
            });
        }
        self.ops.push(op);
        Ok(())
    }

    fn node_mut(&mut self, n: u32) -> Result<&mut Node, HostError> {
        self.nodes
            .get_mut(n as usize)
            .filter(|node| !node.released)
            .ok_or(HostError::StaleNode)
    }

    fn next_id(&self) -> u32 {
        u32::try_from(self.nodes.len()).unwrap()
    }
}

impl HostAdapter for RecordingHost {
    type Node = u32;

    fn create_node(&mut self, kind: &str) -> Result<u32, HostError> {
        let id = self.next_id();
        self.record(Op::Create(id, kind.to_string()))?;
        self.nodes.push(Node {
            tag: Some(kind.to_string()),
            ..Default::default()
        });
        Ok(id)
    }

    fn create_text_node(&mut self, text: &str) -> Result<u32, HostError> {
        let id = self.next_id();
        self.record(Op::CreateText(id, text.to_string()))?;
        self.nodes.push(Node {
            text: text.to_string(),
            ..Default::default()
        });
        Ok(id)
    }

    fn set_attribute(&mut self, node: u32, name: &str, value: &PropValue) -> Result<(), HostError> {
        self.record(Op::SetAttr(node, name.to_string(), value.to_string()))?;
        self.node_mut(node)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: u32, name: &str) -> Result<(), HostError> {
        self.record(Op::RemoveAttr(node, name.to_string()))?;
        self.node_mut(node)?.attrs.remove(name);
        Ok(())
    }

    fn set_property(
        &mut self,
        node: u32,
        name: &str,
        value: Option<&PropValue>,
    ) -> Result<(), HostError> {
        let value = value.map(ToString::to_string);
        self.record(Op::SetProp(node, name.to_string(), value.clone()))?;
        let n = self.node_mut(node)?;
        match (n.tag.is_none() && name == NODE_VALUE, value) {
            (true, v) => n.text = v.unwrap_or_default(),
            (false, Some(v)) => {
                n.props.insert(name.to_string(), v);
            }
            (false, None) => {
                n.props.remove(name);
            }
        }
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: u32,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.record(Op::AddListener(node, event.to_string()))?;
        self.node_mut(node)?
            .listeners
            .push((event.to_string(), handler.clone()));
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: u32,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.record(Op::RemoveListener(node, event.to_string()))?;
        let n = self.node_mut(node)?;
        if let Some(pos) = n
            .listeners
            .iter()
            .position(|(e, h)| e == event && h == handler)
        {
            n.listeners.remove(pos);
        }
        Ok(())
    }

    fn append_child(&mut self, parent: u32, child: u32) -> Result<(), HostError> {
        self.record(Op::Append(parent, child))?;
        self.node_mut(child)?;
        if let Some(old) = self.nodes[child as usize].parent {
            self.nodes[old as usize].children.retain(|c| *c != child);
        }
        self.node_mut(parent)?.children.push(child);
        self.nodes[child as usize].parent = Some(parent);
        Ok(())
    }

    fn insert_before(&mut self, parent: u32, child: u32, before: u32) -> Result<(), HostError> {
        self.record(Op::InsertBefore(parent, child, before))?;
        self.node_mut(child)?;
        if let Some(old) = self.nodes[child as usize].parent {
            self.nodes[old as usize].children.retain(|c| *c != child);
        }
        let p = self.node_mut(parent)?;
        let Some(pos) = p.children.iter().position(|c| *c == before) else {
            return Err(HostError::NotAChild);
        };
        p.children.insert(pos, child);
        self.nodes[child as usize].parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: u32, child: u32) -> Result<(), HostError> {
        self.record(Op::Remove(parent, child))?;
        let p = self.node_mut(parent)?;
        let Some(pos) = p.children.iter().position(|c| *c == child) else {
            return Err(HostError::NotAChild);
        };
        p.children.remove(pos);
        self.nodes[child as usize].parent = None;
        Ok(())
    }

    fn release_node(&mut self, node: u32) -> Result<(), HostError> {
        self.record(Op::Release(node))?;
        self.node_mut(node)?.released = true;
        Ok(())
    }

    fn is_recognized_attribute(&self, name: &str) -> bool {
        matches!(name, "id" | "class" | "className" | "title" | "href")
    }

    fn attribute_name<'k>(&self, key: &'k str) -> &'k str {
        match key {
            "className" => "class",
            other => other,
        }
    }
}
