// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to drive other Understory crates as hosts.
//!
//! Enabled via feature flags so the core stays small.

#[cfg(feature = "dom_adapter")]
pub mod dom;
