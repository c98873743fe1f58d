// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom --heading-base-level=0

//! Understory DOM: a small in-memory host display tree.
//!
//! This crate is the reference host for reconcilers such as `understory_fiber`.
//! It models just enough of a document to be driven by a diffing renderer and
//! inspected by tests and demos:
//!
//! - Element and text nodes addressed by generational [`NodeId`] handles.
//! - Attributes (serialized), properties (written onto the node object, not serialized),
//!   and event listeners compared by identity.
//! - Ordered child lists with `append_child` / `insert_before` / `remove_child` semantics.
//! - [`Document::dispatch`] to invoke listeners, and [`Document::to_markup`] for snapshots.
//!
//! The [`attributes`] module holds the lookup table a reconciler consults to decide
//! whether a property key names a real attribute.
//!
//! ## Minimal usage
//!
//! ```
//! use understory_dom::Document;
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("div");
//! let text = doc.create_text("hello");
//! doc.set_attribute(root, "class", "greeting").unwrap();
//! doc.append_child(root, text).unwrap();
//!
//! assert_eq!(doc.to_markup(root), "<div class=\"greeting\">hello</div>");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod attributes;
mod document;
mod types;

pub use document::Document;
pub use types::{DomError, ElementData, Listener, NodeData, NodeId};
