// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by tree mutations.

use crate::types::NodeId;

/// Misuse of the tree structure.
///
/// These are programmer errors: they are reported instead of panicking, but a
/// caller is not expected to recover from them at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    /// The node is not a child of the given parent.
    #[error("not a child")]
    NotAChild,
    /// The id refers to a disposed node.
    #[error("stale node {0:?}")]
    StaleNode(NodeId),
    /// A child index past the end of the child list.
    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },
    /// Linking would make a node its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    WouldCycle {
        /// Requested parent.
        parent: NodeId,
        /// Requested child.
        child: NodeId,
    },
    /// The stage is always the root; it cannot be parented or disposed.
    #[error("the stage cannot be reparented or disposed")]
    StageRoot,
}
