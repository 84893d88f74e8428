//! Parent-child hierarchy operations.
//!
//! All operations keep [`ChildOf`] and [`Children`] consistent. Structural
//! changes are explicit: attaching a node that already has a place in the
//! graph is rejected, it must be detached first.
//!
//! ```
//! use scene_engine::scene::{Scene, Transform};
//!
//! let mut scene = Scene::new();
//! let root = scene.spawn_root(Transform::IDENTITY);
//! let child = scene.spawn(Transform::from_xyz(1.0, 0.0, 0.0));
//! scene.add_child(root, child).unwrap();
//! assert!(scene.add_child(child, root).is_err());
//! assert!(scene.remove_child(root, child));
//! assert!(!scene.remove_child(root, child));
//! ```

use bevy_ecs::component::Component;
use bevy_ecs::world::World;

use super::{NodeId, Scene, Transform};
use crate::error::{SceneError, SceneResult};

/// Marks a node as the child of another node.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildOf(pub NodeId);

/// Ordered list of child nodes, in insertion order.
///
/// Managed by the [`Scene`] hierarchy methods; never edit directly.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Children(pub(crate) Vec<NodeId>);

impl Children {
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }
}

/// Returns whether `ancestor` appears on the parent chain of `node`.
///
/// The walk is bounded by the number of live entities so a corrupted
/// hierarchy cannot make it spin forever.
pub(crate) fn is_ancestor(world: &World, ancestor: NodeId, node: NodeId) -> bool {
    let mut remaining = world.entities().len();
    let mut current = node;
    while let Some(&ChildOf(parent)) = world.get::<ChildOf>(current) {
        if parent == ancestor {
            return true;
        }
        if remaining == 0 {
            return false;
        }
        remaining -= 1;
        current = parent;
    }
    false
}

/// Links `child` under `parent` without any validation (internal).
fn link(world: &mut World, parent: NodeId, child: NodeId) {
    world.entity_mut(child).insert(ChildOf(parent));
    if let Some(mut children) = world.get_mut::<Children>(parent) {
        children.0.push(child);
    } else {
        world.entity_mut(parent).insert(Children(vec![child]));
    }
}

/// Unlinks `child` from its parent, returning the former parent (internal).
fn unlink(world: &mut World, child: NodeId) -> Option<NodeId> {
    let ChildOf(parent) = world.entity_mut(child).take::<ChildOf>()?;
    if let Some(mut children) = world.get_mut::<Children>(parent) {
        children.0.retain(|&c| c != child);
    }
    Some(parent)
}

/// Despawns a node and all its descendants, depth-first (internal).
fn despawn_subtree(world: &mut World, node: NodeId) {
    let children = world
        .entity_mut(node)
        .take::<Children>()
        .map(|c| c.0)
        .unwrap_or_default();

    for child in children {
        if world.get::<ChildOf>(child).is_some() {
            despawn_subtree(world, child);
        }
    }

    world.despawn(node);
}

impl Scene {
    /// Attaches a detached node at the top level of the scene.
    pub fn add_root(&mut self, node: NodeId) -> SceneResult<()> {
        self.ensure_exists(node)?;
        if self.has_place(node) {
            return Err(SceneError::AlreadyAttached(node));
        }
        self.roots.push(node);
        log::debug!("Added root {node:?}");
        Ok(())
    }

    /// Attaches `child` (and its subtree) under `parent`.
    ///
    /// Fails without touching the graph when `child` is `parent` itself or
    /// one of its ancestors, or when `child` already has a parent or is a
    /// root. `parent` does not need to be attached to the scene: subtrees can
    /// be assembled before they are added.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.ensure_exists(parent)?;
        self.ensure_exists(child)?;

        if parent == child || is_ancestor(&self.world, child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }
        if self.has_place(child) {
            return Err(SceneError::AlreadyAttached(child));
        }

        link(&mut self.world, parent, child);
        log::debug!("Attached {child:?} under {parent:?}");
        Ok(())
    }

    /// Detaches `child` from `parent`. The subtree is left intact.
    ///
    /// Returns `false` and does nothing when `child` is not currently a
    /// child of `parent`: already-orphaned, despawned or attached elsewhere.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        unlink(&mut self.world, child);
        log::debug!("Detached {child:?} from {parent:?}");
        true
    }

    /// Removes a node from the top level. Returns `false` if it is not a root.
    pub fn remove_root(&mut self, node: NodeId) -> bool {
        let Some(index) = self.roots.iter().position(|&r| r == node) else {
            return false;
        };
        self.roots.remove(index);
        log::debug!("Removed root {node:?}");
        true
    }

    /// Detaches a node from wherever it sits (parent or top level).
    pub fn detach(&mut self, node: NodeId) -> bool {
        match self.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => self.remove_root(node),
        }
    }

    /// Detaches and destroys a node and all its descendants.
    ///
    /// Returns `false` if the node does not exist.
    pub fn despawn_recursive(&mut self, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        self.detach(node);
        despawn_subtree(&mut self.world, node);

        let views = self.views.len();
        let world = &self.world;
        self.views
            .retain(|view| world.get::<Transform>(view.camera).is_some());
        if self.views.len() != views {
            log::debug!(
                "Dropped {} views whose camera was despawned",
                views - self.views.len()
            );
        }
        true
    }

    /// Parent of `node`, if it has one.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.world.get::<ChildOf>(node).map(|c| c.0)
    }

    /// Children of `node` in insertion order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.world
            .get::<Children>(node)
            .map(Children::as_slice)
            .unwrap_or(&[])
    }

    /// Top-level nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_root(&self, node: NodeId) -> bool {
        self.roots.contains(&node)
    }

    /// Whether `node` is reachable from a scene root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        let mut top = node;
        let mut remaining = self.world.entities().len();
        while let Some(parent) = self.parent(top) {
            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            top = parent;
        }
        self.is_root(top)
    }

    /// Whether `ancestor` appears on the parent chain of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        is_ancestor(&self.world, ancestor, node)
    }

    /// All attached nodes, parent before children, roots and siblings in
    /// insertion order (pre-order depth-first).
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_with_depth()
            .into_iter()
            .map(|(node, _)| node)
            .collect()
    }

    /// Same walk as [`Scene::preorder`], paired with each node's depth (roots are 0).
    pub fn preorder_with_depth(&self) -> Vec<(NodeId, usize)> {
        let mut order = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            order.push((node, depth));
            stack.extend(self.children(node).iter().rev().map(|&c| (c, depth + 1)));
        }
        order
    }

    /// Nodes of the subtree rooted at `node` in pre-order, attached or not.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        if !self.contains(node) {
            return Vec::new();
        }
        let mut order = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    /// A node has a place if it is a root or has a parent.
    fn has_place(&self, node: NodeId) -> bool {
        self.parent(node).is_some() || self.is_root(node)
    }

    /// Links `child` under `parent` with no checks. Test-only escape hatch for
    /// building hierarchies the public API refuses to build.
    #[cfg(test)]
    pub(crate) fn link_unchecked(&mut self, parent: NodeId, child: NodeId) {
        link(&mut self.world, parent, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    #[test]
    fn add_child_creates_relationship() {
        let mut scene = Scene::new();
        let parent = scene.spawn_root(Transform::IDENTITY);
        let child = scene.spawn(Transform::IDENTITY);

        scene.add_child(parent, child).unwrap();

        assert_eq!(scene.parent(child), Some(parent));
        assert_eq!(scene.children(parent), &[child]);
        assert!(scene.is_attached(child));
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut scene = Scene::new();
        let parent = scene.spawn_root(Transform::IDENTITY);
        let a = scene.spawn(Transform::IDENTITY);
        let b = scene.spawn(Transform::IDENTITY);
        let c = scene.spawn(Transform::IDENTITY);

        scene.add_child(parent, b).unwrap();
        scene.add_child(parent, a).unwrap();
        scene.add_child(parent, c).unwrap();

        assert_eq!(scene.children(parent), &[b, a, c]);
    }

    #[test]
    fn add_child_to_self_is_a_cycle() {
        let mut scene = Scene::new();
        let node = scene.spawn_root(Transform::IDENTITY);
        assert_eq!(
            scene.add_child(node, node),
            Err(SceneError::CycleDetected {
                parent: node,
                child: node
            })
        );
    }

    #[test]
    fn add_child_rejects_second_parent() {
        let mut scene = Scene::new();
        let a = scene.spawn_root(Transform::IDENTITY);
        let b = scene.spawn_root(Transform::IDENTITY);
        let child = scene.spawn(Transform::IDENTITY);

        scene.add_child(a, child).unwrap();
        assert_eq!(scene.add_child(b, child), Err(SceneError::AlreadyAttached(child)));
        assert_eq!(scene.parent(child), Some(a));
        assert!(scene.children(b).is_empty());

        // Explicit detach, then reattach
        assert!(scene.remove_child(a, child));
        scene.add_child(b, child).unwrap();
        assert_eq!(scene.parent(child), Some(b));
        assert!(scene.children(a).is_empty());
    }

    #[test]
    fn add_child_rejects_root() {
        let mut scene = Scene::new();
        let a = scene.spawn_root(Transform::IDENTITY);
        let b = scene.spawn_root(Transform::IDENTITY);
        assert_eq!(scene.add_child(a, b), Err(SceneError::AlreadyAttached(b)));
        assert!(scene.remove_root(b));
        scene.add_child(a, b).unwrap();
    }

    #[test]
    fn add_root_twice_fails() {
        let mut scene = Scene::new();
        let node = scene.spawn_root(Transform::IDENTITY);
        assert_eq!(scene.add_root(node), Err(SceneError::AlreadyAttached(node)));
        assert_eq!(scene.roots(), &[node]);
    }

    #[test]
    fn remove_child_noop_for_orphan() {
        let mut scene = Scene::new();
        let parent = scene.spawn_root(Transform::IDENTITY);
        let orphan = scene.spawn(Transform::IDENTITY);
        assert!(!scene.remove_child(parent, orphan));
        assert!(!scene.detach(orphan));
    }

    #[test]
    fn despawn_recursive_removes_subtree() {
        let mut scene = Scene::new();
        let root = scene.spawn_root(Transform::IDENTITY);
        let child_a = scene.spawn_child(root, Transform::IDENTITY).unwrap();
        let child_b = scene.spawn_child(root, Transform::IDENTITY).unwrap();
        let grandchild = scene.spawn_child(child_a, Transform::IDENTITY).unwrap();

        assert_eq!(scene.node_count(), 4);
        assert!(scene.despawn_recursive(child_a));

        assert_eq!(scene.node_count(), 2);
        assert!(!scene.contains(child_a));
        assert!(!scene.contains(grandchild));
        assert_eq!(scene.children(root), &[child_b]);

        assert!(!scene.despawn_recursive(child_a));
    }

    #[test]
    fn subtree_of_detached_node() {
        let mut scene = Scene::new();
        let group = scene.spawn(Transform::IDENTITY);
        let a = scene.spawn_child(group, Transform::IDENTITY).unwrap();
        let b = scene.spawn_child(a, Transform::IDENTITY).unwrap();

        assert!(!scene.is_attached(b));
        assert_eq!(scene.subtree(group), vec![group, a, b]);
        assert!(scene.preorder().is_empty());
    }
}
