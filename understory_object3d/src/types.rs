// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object identifiers and render-layer masks.

/// Identifier for an object in a [`Graph`](crate::Graph) (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObjectId(pub(crate) u32, pub(crate) u32);

impl ObjectId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// A 32-slot render-layer mask.
///
/// Renderers draw an object only when its mask shares a bit with the camera's
/// mask. New objects live on layer 0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Layers(u32);

impl Default for Layers {
    fn default() -> Self {
        Self(1)
    }
}

impl Layers {
    /// A mask with no layers enabled.
    pub const NONE: Self = Self(0);

    /// Create a mask from raw bits.
    #[inline]
    pub const fn from_mask(mask: u32) -> Self {
        Self(mask)
    }

    /// A mask with only `layer` enabled. Layers wrap modulo 32.
    #[inline]
    pub const fn single(layer: u8) -> Self {
        Self(1 << (layer % 32))
    }

    /// Raw mask bits.
    #[inline]
    pub const fn mask(self) -> u32 {
        self.0
    }

    /// Make `layer` the only enabled layer.
    #[inline]
    pub fn set(&mut self, layer: u8) {
        *self = Self::single(layer);
    }

    /// Enable `layer` in addition to the current ones.
    #[inline]
    pub fn enable(&mut self, layer: u8) {
        self.0 |= Self::single(layer).0;
    }

    /// Disable `layer`.
    #[inline]
    pub fn disable(&mut self, layer: u8) {
        self.0 &= !Self::single(layer).0;
    }

    /// Whether the two masks share at least one layer.
    #[inline]
    pub const fn test(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}
