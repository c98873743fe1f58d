// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host adapter for Understory DOM.
//!
//! ## Feature
//!
//! Enable with `dom_adapter` (on by default).
//!
//! ## Notes
//!
//! Property values are written as strings using their `Display` form.
//! Attribute recognition and the `className` / `htmlFor` renames come from
//! [`understory_dom::attributes`]. Deleted nodes are destroyed with
//! [`Document::remove`], which frees their subtree.

use alloc::string::{String, ToString};

use understory_dom::{Document, DomError, NodeId, attributes};

use crate::element::{EventHandler, PropValue};
use crate::error::HostError;
use crate::host::HostAdapter;

fn host_error(op: &'static str) -> impl FnOnce(DomError) -> HostError {
    move |err| match err {
        DomError::StaleNode(_) => HostError::StaleNode,
        DomError::NotAChild { .. } => HostError::NotAChild,
        other => HostError::Rejected {
            op,
            reason: other.to_string(),
        },
    }
}

impl HostAdapter for Document {
    type Node = NodeId;

    fn create_node(&mut self, kind: &str) -> Result<NodeId, HostError> {
        Ok(self.create_element(kind))
    }

    fn create_text_node(&mut self, text: &str) -> Result<NodeId, HostError> {
        Ok(self.create_text(text))
    }

    fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        Self::set_attribute(self, node, name, &value.to_string())
            .map_err(host_error("set_attribute"))
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        Self::remove_attribute(self, node, name).map_err(host_error("remove_attribute"))
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<&PropValue>,
    ) -> Result<(), HostError> {
        let value: Option<String> = value.map(ToString::to_string);
        Self::set_property(self, node, name, value.as_deref())
            .map_err(host_error("set_property"))
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        Self::add_event_listener(self, node, event, handler.callback().clone())
            .map_err(host_error("add_event_listener"))
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        Self::remove_event_listener(self, node, event, handler.callback())
            .map_err(host_error("remove_event_listener"))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        Self::append_child(self, parent, child).map_err(host_error("append_child"))
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), HostError> {
        Self::insert_before(self, parent, child, before).map_err(host_error("insert_before"))
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        Self::remove_child(self, parent, child).map_err(host_error("remove_child"))
    }

    fn release_node(&mut self, node: NodeId) -> Result<(), HostError> {
        self.remove(node);
        Ok(())
    }

    fn is_recognized_attribute(&self, name: &str) -> bool {
        attributes::is_known_attribute(name)
    }

    fn attribute_name<'k>(&self, key: &'k str) -> &'k str {
        attributes::attribute_name(key)
    }
}
