// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage lifecycle events.

use alloc::boxed::Box;
use smallvec::SmallVec;
use tracing::debug;
use understory_object3d::ObjectId;

use crate::tree::DisplayTree;
use crate::types::NodeId;

/// Lifecycle notifications for nodes entering or leaving the stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StageEvent {
    /// The node became reachable from the stage.
    AddedToStage,
    /// The node is about to stop being reachable from the stage.
    RemovedFromStage,
}

/// Handle of a registered listener, used to unregister it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct Listener {
    id: ListenerId,
    event: StageEvent,
    callback: Box<dyn FnMut(NodeId, StageEvent)>,
}

impl core::fmt::Debug for Listener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl DisplayTree {
    /// Register `listener` for `event` on a node.
    ///
    /// Returns `None` if the node is stale.
    pub fn on(
        &mut self,
        id: NodeId,
        event: StageEvent,
        listener: impl FnMut(NodeId, StageEvent) + 'static,
    ) -> Option<ListenerId> {
        if !self.is_alive(id) {
            return None;
        }
        self.next_listener += 1;
        let handle = ListenerId(self.next_listener);
        self.listeners.entry(id).or_default().push(Listener {
            id: handle,
            event,
            callback: Box::new(listener),
        });
        Some(handle)
    }

    /// Unregister a listener. Returns whether it was found.
    pub fn off(&mut self, id: NodeId, listener: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&id) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != listener);
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.remove(&id);
        }
        removed
    }

    /// Call the node's listeners for `event`, in registration order.
    pub fn emit(&mut self, id: NodeId, event: StageEvent) {
        if let Some(list) = self.listeners.get_mut(&id) {
            for l in list.iter_mut().filter(|l| l.event == event) {
                (l.callback)(id, event);
            }
        }
    }

    /// Emit `event` on every node in the backend subtree of `object`, in
    /// pre-order.
    pub(crate) fn broadcast(&mut self, object: ObjectId, event: StageEvent) {
        let mut targets: SmallVec<[NodeId; 16]> = SmallVec::new();
        self.graph.traverse(object, |o| {
            if let Some(&n) = self.owners.get(&o) {
                targets.push(n);
            }
        });
        debug!(?object, ?event, count = targets.len(), "broadcasting stage event");
        for n in targets {
            self.emit(n, event);
        }
    }

    pub(crate) fn drop_listeners(&mut self, id: NodeId) {
        self.listeners.remove(&id);
    }
}
