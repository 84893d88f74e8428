//! Hand-off point for payloads loaded off the frame thread.
//!
//! Loaders run independently of the frame loop. When one finishes it pushes a
//! ready-to-use [`Renderable`] into the inbox; the frame loop swaps pending
//! payloads in at the start of the next frame, before any update or resolve
//! work, so a load can never race a resolve pass.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::scene::{NodeId, Renderable, Scene};

/// A payload that finished loading, addressed to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPayload {
    pub node: NodeId,
    pub renderable: Renderable,
}

/// Cloneable multi-producer queue of finished payload loads
#[derive(Debug, Clone, Default)]
pub struct PayloadInbox {
    pending: Arc<Mutex<Vec<PendingPayload>>>,
}

impl PayloadInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by a loader when `renderable` is ready for `node`.
    pub fn deliver(&self, node: NodeId, renderable: Renderable) {
        self.pending.lock().push(PendingPayload { node, renderable });
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Takes every pending delivery, oldest first.
    pub fn drain(&self) -> Vec<PendingPayload> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Swaps all pending payloads into `scene`. Returns how many were applied.
    ///
    /// Deliveries for nodes that no longer exist are dropped.
    pub fn apply(&self, scene: &mut Scene) -> usize {
        let mut applied = 0;
        for PendingPayload { node, renderable } in self.drain() {
            match scene.set_renderable(node, renderable) {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("Dropping loaded payload: {err}"),
            }
        }
        if applied > 0 {
            log::debug!("Applied {applied} loaded payload(s)");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    #[test]
    fn deliveries_from_other_threads_apply_in_order() {
        let mut scene = Scene::new();
        let node = scene.spawn_root(Transform::IDENTITY);
        let inbox = PayloadInbox::new();

        let producer = inbox.clone();
        std::thread::spawn(move || {
            producer.deliver(node, Renderable::new(1, 1));
            producer.deliver(node, Renderable::new(2, 2));
        })
        .join()
        .unwrap();

        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.apply(&mut scene), 2);
        assert!(inbox.is_empty());
        // Last delivery wins
        assert_eq!(scene.renderable(node), Some(Renderable::new(2, 2)));
    }

    #[test]
    fn deliveries_for_despawned_nodes_are_dropped() {
        let mut scene = Scene::new();
        let node = scene.spawn_root(Transform::IDENTITY);
        scene.despawn_recursive(node);

        let inbox = PayloadInbox::new();
        inbox.deliver(node, Renderable::new(0, 0));
        assert_eq!(inbox.apply(&mut scene), 0);
        assert!(inbox.is_empty());
    }
}
