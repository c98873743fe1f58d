// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host adapter contract and the property diff applied through it.
//!
//! ## Overview
//!
//! The reconciler never touches a display tree directly. Every node creation,
//! attribute write, listener change, and child insertion goes through a
//! [`HostAdapter`]. The adapter owns the host nodes; fibers only hold copies of
//! their [`HostAdapter::Node`] handles.
//!
//! ## Property classification
//!
//! Each property key is classified once into a [`PropClass`]:
//!
//! - [`PropClass::Reserved`]: structural keys such as `children`; never sent to the host.
//! - [`PropClass::Event`]: `on<Event>` keys, routed to add/remove listener with the
//!   lowercased event name (`onClick` → `click`).
//! - [`PropClass::Attribute`]: keys the host recognizes as attributes, routed to
//!   set/remove attribute, possibly under a different name (`className` → `class`).
//! - [`PropClass::Property`]: everything else, written directly onto the node object.
//!
//! The default [`HostAdapter::classify`] implements this using
//! [`is_reserved_key`], [`event_name`], and the adapter's
//! [`is_recognized_attribute`](HostAdapter::is_recognized_attribute) and
//! [`attribute_name`](HostAdapter::attribute_name).

use alloc::string::{String, ToString};

use crate::element::{EventHandler, PropValue, Props};
use crate::error::HostError;

/// Closed classification of a property key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropClass {
    /// Not forwarded to the host.
    Reserved,
    /// Event listener for the contained event name.
    Event(String),
    /// Host attribute with the contained name.
    Attribute(String),
    /// Written onto the host node object under the key itself.
    Property,
}

/// Keys that describe structure rather than host state.
pub fn is_reserved_key(key: &str) -> bool {
    matches!(key, "children" | "key")
}

/// Event name for an `on<Event>` key, lowercased; `None` if `key` is not an event key.
///
/// The remainder after `on` must be a non-empty run of ASCII letters, so
/// `onClick` and `onclick` both yield `click` while `on` and `on-click` do not
/// qualify. Adapters that need a stricter rule can override
/// [`HostAdapter::classify`].
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

/// Operations the reconciler needs from a host display tree.
///
/// All mutating operations are invoked from the render phase (creating
/// detached nodes and setting their initial properties) or from the commit
/// phase. Errors abort the current pass.
pub trait HostAdapter {
    /// Handle to a host node. Owned by the adapter; the reconciler only copies it.
    type Node: Copy + Eq + core::fmt::Debug;

    /// Create a detached node for a host element kind.
    fn create_node(&mut self, kind: &str) -> Result<Self::Node, HostError>;

    /// Create a detached text node.
    fn create_text_node(&mut self, text: &str) -> Result<Self::Node, HostError>;

    /// Set an attribute.
    fn set_attribute(
        &mut self,
        node: Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    /// Remove an attribute.
    fn remove_attribute(&mut self, node: Self::Node, name: &str) -> Result<(), HostError>;

    /// Write (`Some`) or clear (`None`) a property on the node object.
    ///
    /// Text payload updates arrive here under [`NODE_VALUE`](crate::NODE_VALUE).
    fn set_property(
        &mut self,
        node: Self::Node,
        name: &str,
        value: Option<&PropValue>,
    ) -> Result<(), HostError>;

    /// Register a listener.
    fn add_event_listener(
        &mut self,
        node: Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Unregister a listener previously registered with the same handler.
    fn remove_event_listener(
        &mut self,
        node: Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), HostError>;

    /// Insert `child` under `parent` immediately before `before`, which must
    /// already be a child of `parent`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        before: Self::Node,
    ) -> Result<(), HostError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), HostError>;

    /// Destroy a detached node and its subtree. The default does nothing.
    fn release_node(&mut self, node: Self::Node) -> Result<(), HostError> {
        let _ = node;
        Ok(())
    }

    /// True if `name` is an attribute the host understands.
    fn is_recognized_attribute(&self, name: &str) -> bool;

    /// Host attribute name for a recognized key. The default is the key itself.
    fn attribute_name<'k>(&self, key: &'k str) -> &'k str {
        key
    }

    /// Classify a property key.
    fn classify(&self, key: &str) -> PropClass {
        if is_reserved_key(key) {
            PropClass::Reserved
        } else if let Some(event) = event_name(key) {
            PropClass::Event(event)
        } else if self.is_recognized_attribute(key) {
            PropClass::Attribute(self.attribute_name(key).to_string())
        } else {
            PropClass::Property
        }
    }
}

/// Apply the difference between `old` and `new` to `node`.
///
/// Keys present in `old` but absent from `new` are removed, keys whose value
/// changed are (re)set, and equal keys are left alone. A changed handler is
/// removed before its replacement is added. Returns the number of host
/// operations issued.
pub fn apply_props<H: HostAdapter + ?Sized>(
    host: &mut H,
    node: H::Node,
    old: &Props,
    new: &Props,
) -> Result<usize, HostError> {
    let mut ops = 0;
    for (key, old_value) in old.iter() {
        let next = new.get(key);
        if next == Some(old_value) {
            continue;
        }
        match host.classify(key) {
            PropClass::Reserved => {}
            PropClass::Event(event) => {
                if let Some(handler) = old_value.as_handler() {
                    host.remove_event_listener(node, &event, handler)?;
                    ops += 1;
                }
            }
            PropClass::Attribute(name) if next.is_none() => {
                host.remove_attribute(node, &name)?;
                ops += 1;
            }
            PropClass::Property if next.is_none() => {
                host.set_property(node, key, None)?;
                ops += 1;
            }
            // Changed values are overwritten below.
            PropClass::Attribute(_) | PropClass::Property => {}
        }
    }
    for (key, value) in new.iter() {
        if old.get(key) == Some(value) {
            continue;
        }
        match host.classify(key) {
            PropClass::Reserved => {}
            PropClass::Event(event) => match value.as_handler() {
                Some(handler) => {
                    host.add_event_listener(node, &event, handler)?;
                    ops += 1;
                }
                None => tracing::trace!(key, "ignoring non-handler value for event key"),
            },
            PropClass::Attribute(name) => {
                host.set_attribute(node, &name, value)?;
                ops += 1;
            }
            PropClass::Property => {
                host.set_property(node, key, Some(value))?;
                ops += 1;
            }
        }
    }
    Ok(ops)
}
