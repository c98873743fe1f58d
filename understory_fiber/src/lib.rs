// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_fiber --heading-base-level=0

//! Understory Fiber: an incremental, interruptible reconciler for declarative UI trees.
//!
//! ## Overview
//!
//! Client code describes its UI as immutable [`Element`] trees. The runtime
//! keeps a persistent fiber tree shadowing the last committed description, and
//! on each pass diffs a new description against it to produce the minimal set
//! of host mutations. The host display tree is reached only through a
//! [`HostAdapter`].
//!
//! A pass has two phases:
//!
//! - Render: one fiber per unit of work, in depth-first preorder. Component
//!   functions run here and children are reconciled positionally. This phase
//!   can yield between units when the [`Deadline`] for the current slice runs
//!   low, and resumes where it left off.
//! - Commit: deletions are detached, created nodes are placed, and property
//!   diffs are applied, all in one step. The new tree then becomes current and
//!   the old one is freed.
//!
//! ## State
//!
//! Components are plain functions `Fn(&Props, &mut RenderCx<'_>) -> Element`.
//! [`RenderCx::use_state`] declares a state cell matched across renders by
//! call order. Its [`SetState`] handle queues pure update functions; the
//! runtime picks them up in the next pass.
//!
//! ## Identity and matching
//!
//! Children are matched by position only, with no keys. At each position an
//! old fiber and a new element of the same kind produce an update that reuses
//! the host node; anything else replaces the node. Component kinds are
//! identified by the Rust type of their render function.
//!
//! ## Storage
//!
//! Fibers live in a generational arena ([`FiberTree`]) and link to each other
//! by [`FiberId`]. The tree being rendered and the committed tree coexist
//! there, connected by `alternate` links, and stale ids are detected by
//! generation.
//!
//! ## Minimal usage
//!
//! ```
//! use understory_dom::Document;
//! use understory_fiber::{Element, Props, RenderCx, Runtime};
//!
//! fn counter(_: &Props, cx: &mut RenderCx<'_>) -> Element {
//!     let (count, set) = cx.use_state(0_i64);
//!     Element::host("button")
//!         .on("onClick", move || set.update(|c| c + 1))
//!         .child(count)
//!         .build()
//! }
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("main");
//! let mut runtime = Runtime::new(doc);
//!
//! runtime.mount(Element::component(counter).build(), root);
//! runtime.run_until_idle().unwrap();
//!
//! let button = runtime.host().children(root)[0];
//! runtime.host().dispatch(button, "click").unwrap();
//! runtime.run_until_idle().unwrap();
//!
//! assert_eq!(runtime.host().to_markup(root), "<main><button>1</button></main>");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
mod commit;
mod element;
mod error;
mod fiber;
mod hooks;
mod host;
mod reconcile;
mod scheduler;
#[cfg(test)]
mod testing;
mod types;

pub use element::{
    Component, Element, ElementBuilder, ElementKind, EventHandler, NODE_VALUE, PropValue, Props,
    RenderFn, create_element,
};
pub use error::{HostError, RenderError};
pub use fiber::{FiberKind, FiberTree};
pub use hooks::{RenderCx, SetState};
pub use host::{HostAdapter, PropClass, apply_props, event_name, is_reserved_key};
pub use scheduler::{Budget, Deadline, LoopStatus, Runtime, SchedulerConfig, Unbounded};
pub use types::{CommitFlags, CommitReport, EffectTag, FiberId};
