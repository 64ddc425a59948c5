// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph composition: attaching, detaching, reordering, disposal.

use smallvec::SmallVec;
use tracing::debug;
use understory_object3d::ObjectId;

use crate::error::DisplayError;
use crate::events::StageEvent;
use crate::tree::DisplayTree;
use crate::types::NodeId;

impl DisplayTree {
    /// Append `child` as the topmost child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize, DisplayError> {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Insert `child` into `parent`'s children at `index`, clamped to the end.
    ///
    /// The child is first unlinked from its current parent. It takes over the
    /// parent's render layers and is marked dirty. If `parent` is on stage, the
    /// child's subtree receives [`StageEvent::AddedToStage`]. Returns the
    /// index the child ended up at.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<usize, DisplayError> {
        let parent_object = self.live_object(parent)?;
        let child_object = self.live_object(child)?;
        if child == self.stage {
            return Err(DisplayError::StageRoot);
        }
        if parent == child
            || self
                .graph
                .ancestors(parent_object)
                .any(|o| o == child_object)
        {
            return Err(DisplayError::WouldCycle { parent, child });
        }

        let index = self
            .graph
            .insert_child(parent_object, index, child_object)
            .ok_or(DisplayError::StaleNode(child))?;
        if let Some(layers) = self.graph.layers(parent_object) {
            self.graph.set_layers(child_object, layers);
        }
        self.mark_subtree_dirty(child_object);
        debug!(?parent, ?child, index, "attached child");

        if self.is_on_stage(parent) {
            self.broadcast(child_object, StageEvent::AddedToStage);
        }
        Ok(index)
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DisplayError> {
        let index = self.get_index(parent, child)?;
        self.remove_child_at(parent, index)
    }

    /// Remove the child at `index`.
    ///
    /// If `parent` is on stage, the child's subtree receives
    /// [`StageEvent::RemovedFromStage`] before it is unlinked. The child is not
    /// disposed.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<(), DisplayError> {
        let parent_object = self.live_object(parent)?;
        let children = self.graph.children(parent_object);
        let Some(&child_object) = children.get(index) else {
            return Err(DisplayError::IndexOutOfRange {
                index,
                len: children.len(),
            });
        };
        self.unlink(parent, child_object);
        Ok(())
    }

    /// Remove `child` from whatever it is attached to. Does nothing for
    /// detached nodes.
    pub fn remove_from_parent(&mut self, child: NodeId) -> Result<(), DisplayError> {
        let child_object = self.live_object(child)?;
        if child == self.stage {
            return Err(DisplayError::StageRoot);
        }
        if let Some(parent_object) = self.graph.parent(child_object) {
            let parent = self.owner_of(parent_object);
            self.announce_removal(parent_object, child_object);
            self.graph.detach(child_object);
            self.mark_subtree_dirty(child_object);
            debug!(?parent, ?child, "detached child");
        }
        Ok(())
    }

    /// Move `child` to `index` among `parent`'s children, clamped to the end.
    pub fn set_child_index(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), DisplayError> {
        let old = self.get_index(parent, child)?;
        if old == index {
            return Ok(());
        }
        let parent_object = self.live_object(parent)?;
        let child_object = self.live_object(child)?;
        self.graph.insert_child(parent_object, index, child_object);
        debug!(?parent, ?child, old, index, "reordered child");
        Ok(())
    }

    /// Position of `child` among `parent`'s children.
    pub fn get_index(&self, parent: NodeId, child: NodeId) -> Result<usize, DisplayError> {
        let parent_object = self.live_object(parent)?;
        let child_object = self.live_object(child)?;
        self.graph
            .children(parent_object)
            .iter()
            .position(|&o| o == child_object)
            .ok_or(DisplayError::NotAChild)
    }

    /// Child node at `index`, or `None` when out of range or when the slot
    /// holds a raw backend object.
    pub fn get_child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        let object = *self.graph.children(self.object_of(parent)?).get(index)?;
        self.owner_of(object)
    }

    /// Number of children, raw backend objects included.
    pub fn num_children(&self, parent: NodeId) -> usize {
        self.object_of(parent)
            .map_or(0, |o| self.graph.children(o).len())
    }

    /// Release a node.
    ///
    /// The node is unlinked from its parent without lifecycle events; its
    /// children are not disposed and become detached, with their matrices
    /// marked dirty. Its graphics, hit area,
    /// and listeners are dropped and its id turns stale.
    pub fn dispose(&mut self, id: NodeId) -> Result<(), DisplayError> {
        let object = self.live_object(id)?;
        if id == self.stage {
            return Err(DisplayError::StageRoot);
        }
        self.drop_listeners(id);
        let orphans: SmallVec<[ObjectId; 8]> = self.graph.children(object).into();
        self.graph.destroy(object);
        for orphan in orphans {
            self.mark_subtree_dirty(orphan);
        }
        self.release_slot(id);
        debug!(?id, "disposed node");
        Ok(())
    }

    fn unlink(&mut self, parent: NodeId, child_object: ObjectId) {
        let Some(parent_object) = self.object_of(parent) else {
            return;
        };
        self.announce_removal(parent_object, child_object);
        self.graph.detach(child_object);
        self.mark_subtree_dirty(child_object);
        debug!(?parent, ?child_object, "detached child");
    }

    fn announce_removal(&mut self, parent_object: ObjectId, child_object: ObjectId) {
        let on_stage = self
            .graph
            .root(parent_object)
            .is_some_and(|root| self.graph.is_scene(root));
        if on_stage {
            self.broadcast(child_object, StageEvent::RemovedFromStage);
        }
    }

    fn live_object(&self, id: NodeId) -> Result<ObjectId, DisplayError> {
        self.object_of(id).ok_or(DisplayError::StaleNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use glam::DVec3;

    #[test]
    fn insert_index_is_clamped() {
        let mut tree = DisplayTree::new();
        let p = tree.create_node();
        let a = tree.create_node();
        let b = tree.create_node();
        assert_eq!(tree.add_child_at(p, a, 7), Ok(0));
        assert_eq!(tree.add_child_at(p, b, 0), Ok(0));
        assert_eq!(tree.children(p).collect::<Vec<_>>(), [b, a]);
        assert_eq!(tree.get_child_at(p, 1), Some(a));
        assert_eq!(tree.get_child_at(p, 2), None);
    }

    #[test]
    fn misuse_is_reported() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let p = tree.create_node();
        let c = tree.create_node();
        let stranger = tree.create_node();
        tree.add_child(p, c).unwrap();

        assert_eq!(tree.remove_child(p, stranger), Err(DisplayError::NotAChild));
        assert_eq!(tree.get_index(p, stranger), Err(DisplayError::NotAChild));
        assert_eq!(tree.set_child_index(p, stranger, 0), Err(DisplayError::NotAChild));
        assert_eq!(
            tree.remove_child_at(p, 3),
            Err(DisplayError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(
            tree.add_child(c, p),
            Err(DisplayError::WouldCycle { parent: c, child: p })
        );
        assert_eq!(
            tree.add_child(p, p),
            Err(DisplayError::WouldCycle { parent: p, child: p })
        );
        assert_eq!(tree.add_child(p, stage), Err(DisplayError::StageRoot));
        assert_eq!(tree.dispose(stage), Err(DisplayError::StageRoot));

        tree.dispose(stranger).unwrap();
        assert_eq!(
            tree.add_child(p, stranger),
            Err(DisplayError::StaleNode(stranger))
        );
    }

    #[test]
    fn set_child_index_reorders() {
        let mut tree = DisplayTree::new();
        let p = tree.create_node();
        let kids: Vec<_> = (0..3).map(|_| tree.create_node()).collect();
        for &k in &kids {
            tree.add_child(p, k).unwrap();
        }
        tree.set_child_index(p, kids[0], 10).unwrap();
        assert_eq!(tree.children(p).collect::<Vec<_>>(), [kids[1], kids[2], kids[0]]);
        tree.set_child_index(p, kids[0], 0).unwrap();
        assert_eq!(tree.get_index(p, kids[0]), Ok(0));
        assert_eq!(tree.num_children(p), 3);
    }

    #[test]
    fn removal_announces_before_unlinking() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(stage, a).unwrap();
        tree.add_child(a, b).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        for n in [a, b] {
            let log = Rc::clone(&log);
            tree.on(n, StageEvent::RemovedFromStage, move |id, event| {
                log.borrow_mut().push((id, event));
            });
        }
        tree.remove_child(stage, a).unwrap();
        assert_eq!(
            *log.borrow(),
            [(a, StageEvent::RemovedFromStage), (b, StageEvent::RemovedFromStage)]
        );
        assert!(!tree.is_on_stage(b));
        assert_eq!(tree.parent(b), Some(a));

        // Off stage: no further notifications.
        log.borrow_mut().clear();
        tree.remove_from_parent(b).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn detaching_invalidates_world_matrices() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let parent = tree.create_node();
        let child = tree.create_node();
        let grandchild = tree.create_node();
        tree.add_child(stage, parent).unwrap();
        tree.add_child(parent, child).unwrap();
        tree.add_child(child, grandchild).unwrap();
        tree.set_x(parent, 100.0);
        tree.set_x(grandchild, 5.0);
        tree.validate_all();
        assert_eq!(
            tree.local_to_world(grandchild, DVec3::ZERO),
            Some(DVec3::new(105.0, 0.0, 0.0))
        );

        tree.remove_child(parent, child).unwrap();
        assert_eq!(tree.is_matrix_dirty(child), Some(true));
        assert_eq!(tree.is_matrix_dirty(grandchild), Some(true));
        assert_eq!(tree.local_to_world(child, DVec3::ZERO), Some(DVec3::ZERO));
        assert_eq!(
            tree.local_to_world(grandchild, DVec3::ZERO),
            Some(DVec3::new(5.0, 0.0, 0.0))
        );

        tree.add_child(parent, child).unwrap();
        tree.validate_all();
        tree.remove_from_parent(child).unwrap();
        assert_eq!(tree.is_matrix_dirty(child), Some(true));
        assert_eq!(tree.local_to_world(child, DVec3::ZERO), Some(DVec3::ZERO));
    }

    #[test]
    fn disposing_invalidates_orphans() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let parent = tree.create_node();
        let child = tree.create_node();
        tree.add_child(stage, parent).unwrap();
        tree.add_child(parent, child).unwrap();
        tree.set_position(parent, 100.0, 40.0, 0.0);
        tree.validate_all();
        assert_eq!(
            tree.local_to_world(child, DVec3::ZERO),
            Some(DVec3::new(100.0, -40.0, 0.0))
        );

        tree.dispose(parent).unwrap();
        assert_eq!(tree.is_matrix_dirty(child), Some(true));
        assert_eq!(tree.local_to_world(child, DVec3::ZERO), Some(DVec3::ZERO));
    }

    #[test]
    fn dispose_orphans_children_silently() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(stage, a).unwrap();
        tree.add_child(a, b).unwrap();
        let removed = Rc::new(RefCell::new(0_u32));
        let r = Rc::clone(&removed);
        tree.on(b, StageEvent::RemovedFromStage, move |_, _| *r.borrow_mut() += 1);

        tree.dispose(a).unwrap();
        assert!(!tree.is_alive(a));
        assert_eq!(tree.num_children(stage), 0);
        assert!(tree.is_alive(b));
        assert_eq!(tree.parent(b), None);
        assert_eq!(*removed.borrow(), 0);
    }
}
