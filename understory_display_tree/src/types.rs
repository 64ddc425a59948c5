// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the display tree: node identifiers and flags.

/// Identifier for a node in a [`DisplayTree`](crate::DisplayTree) (generational).
///
/// Ids stay cheap to copy and never dangle: once a node is disposed its id is
/// stale, getters return `None`, and setters do nothing.
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

bitflags::bitflags! {
    /// Node flags controlling picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node takes part in touch picks.
        const TOUCHABLE      = 0b0000_0001;
        /// Node and its subtree are skipped by every pick.
        const TOUCH_DISABLED = 0b0000_0010;
        /// Node reports itself when the point lies in its content rect and no
        /// child was hit.
        const OPAQUE         = 0b0000_0100;
        /// The mask admits points outside of it instead of inside.
        const REVERSED_MASK  = 0b0000_1000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::TOUCHABLE
    }
}
