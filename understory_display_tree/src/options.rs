// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage configuration.

use kurbo::Size;

/// Configuration of a [`DisplayTree`](crate::DisplayTree).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageOptions {
    /// Screen size used by the default camera.
    pub viewport: Size,
    /// Render layer assigned to newly created nodes and to the default camera.
    pub ui_layer: u8,
    /// Skip the lazy matrix validation done by coordinate conversions and picks.
    ///
    /// Callers that enable this must call
    /// [`DisplayTree::validate_matrix`](crate::DisplayTree::validate_matrix) or
    /// [`DisplayTree::validate_all`](crate::DisplayTree::validate_all) themselves
    /// before querying.
    pub disable_matrix_validation: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            viewport: Size::new(1920.0, 1080.0),
            ui_layer: 0,
            disable_matrix_validation: false,
        }
    }
}
