// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for host operations and render passes.

use alloc::string::String;

/// Failure reported by a [`HostAdapter`](crate::HostAdapter) operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The node handle no longer refers to a live host node.
    #[error("host node is no longer alive")]
    StaleNode,
    /// `remove_child` was asked to detach a node from a parent it is not under.
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// The host refused the operation.
    #[error("host rejected `{op}`: {reason}")]
    Rejected {
        /// Name of the rejected operation.
        op: &'static str,
        /// Host-provided explanation.
        reason: String,
    },
}

/// Failure of a render pass.
///
/// A pass that fails is abandoned: its work-in-progress fibers are freed and
/// the committed tree stays current. Host mutations already applied by a
/// failing commit are not rolled back.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A host operation failed during the render or commit phase.
    #[error("host operation failed: {0}")]
    Host(#[from] HostError),
    /// A root re-render was requested before anything was mounted.
    #[error("nothing is mounted")]
    NotMounted,
}
