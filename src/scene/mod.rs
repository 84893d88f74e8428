//! Scene management
//!
//! A [`Scene`] is a forest of nodes stored in a Bevy ECS [`World`]. Every node
//! carries a local [`Transform`], a resolved [`GlobalTransform`] and a
//! [`Visibility`] flag; payloads, cameras, names and motion rules are optional
//! components. Nodes are created detached and become part of the scene once
//! they are added as a root or under an attached parent.
//!
//! A scene is drawn through one or more [`View`]s, each pairing a camera node
//! with a viewport. It may also own [`RenderTarget`]s: secondary scenes that
//! are rendered into textures first.

mod camera;
mod hierarchy;
mod node;
mod target;
mod transform;

pub use camera::*;
pub use hierarchy::{ChildOf, Children};
pub use node::*;
pub use target::{RenderTarget, TargetId};
pub use transform::*;

use bevy_ecs::entity::Entity;
use bevy_ecs::world::{Mut, World};
use glam::Vec3;

use crate::error::{SceneError, SceneResult};
use crate::motion::Motion;

/// Node handle
pub type NodeId = Entity;

/// The scene graph and everything attached to it
pub struct Scene {
    pub(crate) world: World,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) views: Vec<View>,
    pub(crate) targets: Vec<RenderTarget>,
    surface_size: (u32, u32),
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            roots: Vec::new(),
            views: Vec::new(),
            targets: Vec::new(),
            // Default canvas size
            surface_size: (300, 150),
        }
    }

    /// Creates a detached node.
    pub fn spawn(&mut self, transform: Transform) -> NodeId {
        self.world
            .spawn((transform, GlobalTransform::from(transform), Visibility::VISIBLE))
            .id()
    }

    /// Creates a node and adds it at the top level.
    pub fn spawn_root(&mut self, transform: Transform) -> NodeId {
        let node = self.spawn(transform);
        self.roots.push(node);
        node
    }

    /// Creates a node under `parent`.
    pub fn spawn_child(&mut self, parent: NodeId, transform: Transform) -> SceneResult<NodeId> {
        self.ensure_exists(parent)?;
        let node = self.spawn(transform);
        self.add_child(parent, node)?;
        Ok(node)
    }

    /// Creates a detached node carrying a renderable payload.
    pub fn spawn_mesh(&mut self, transform: Transform, renderable: Renderable) -> NodeId {
        let node = self.spawn(transform);
        self.world.entity_mut(node).insert(renderable);
        node
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.world.get::<Transform>(node).is_some()
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    pub(crate) fn ensure_exists(&self, node: NodeId) -> SceneResult<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(SceneError::NodeNotFound(node))
        }
    }

    /// Read access to the underlying ECS world (for renderer extensions).
    pub fn world(&self) -> &World {
        &self.world
    }

    // ---- Transforms ----

    pub fn transform(&self, node: NodeId) -> Option<&Transform> {
        self.world.get::<Transform>(node)
    }

    pub fn transform_mut(&mut self, node: NodeId) -> Option<Mut<'_, Transform>> {
        self.world.get_mut::<Transform>(node)
    }

    pub fn set_transform(&mut self, node: NodeId, transform: Transform) -> SceneResult<()> {
        let mut current = self
            .transform_mut(node)
            .ok_or(SceneError::NodeNotFound(node))?;
        *current = transform;
        Ok(())
    }

    /// Mutates a node's local transform in place.
    pub fn update_transform(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut Transform),
    ) -> SceneResult<()> {
        let mut transform = self
            .transform_mut(node)
            .ok_or(SceneError::NodeNotFound(node))?;
        f(&mut *transform);
        Ok(())
    }

    /// World transform as of the last successful resolve pass.
    pub fn global_transform(&self, node: NodeId) -> Option<GlobalTransform> {
        self.world.get::<GlobalTransform>(node).copied()
    }

    /// Composes local transforms up the ancestor chain right now.
    ///
    /// Unlike [`Scene::global_transform`] this never returns a value from a
    /// previous frame, so update code can aim at nodes that moved earlier in
    /// the same update.
    pub fn compute_world_transform(&self, node: NodeId) -> SceneResult<GlobalTransform> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        let mut remaining = self.node_count();

        while let Some(id) = current {
            let local = self.transform(id).ok_or(SceneError::NodeNotFound(id))?;
            chain.push(*local);
            if remaining == 0 {
                return Err(SceneError::CycleDetected {
                    parent: id,
                    child: node,
                });
            }
            remaining -= 1;
            current = self.parent(id);
        }

        Ok(chain
            .iter()
            .rev()
            .fold(GlobalTransform::IDENTITY, |world, local| {
                world.mul_transform(local)
            }))
    }

    /// Orients `node` towards a world-space point.
    ///
    /// Cameras turn their -Z axis to the target, other nodes their +Z axis.
    /// The target is converted into the parent's space first, so this works
    /// for nodes deep in a moving hierarchy.
    pub fn look_at_world(&mut self, node: NodeId, target: Vec3, up: Vec3) -> SceneResult<()> {
        let parent_world = match self.parent(node) {
            Some(parent) => self.compute_world_transform(parent)?,
            None => GlobalTransform::IDENTITY,
        };
        let to_parent = parent_world.inverse().affine();
        let local_target = to_parent.transform_point3(target);
        let local_up = to_parent.transform_vector3(up);
        let is_camera = self.world.get::<Camera>(node).is_some();

        self.update_transform(node, |transform| {
            if is_camera {
                transform.look_at(local_target, local_up);
            } else {
                transform.face_towards(local_target, local_up);
            }
        })
    }

    // ---- Payloads, visibility, names ----

    pub fn renderable(&self, node: NodeId) -> Option<Renderable> {
        self.world.get::<Renderable>(node).copied()
    }

    /// Sets or swaps a node's payload.
    pub fn set_renderable(&mut self, node: NodeId, renderable: Renderable) -> SceneResult<()> {
        self.ensure_exists(node)?;
        self.world.entity_mut(node).insert(renderable);
        Ok(())
    }

    /// Removes a node's payload, turning it into a grouping node.
    pub fn clear_renderable(&mut self, node: NodeId) -> Option<Renderable> {
        if !self.contains(node) {
            return None;
        }
        self.world.entity_mut(node).take::<Renderable>()
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.world
            .get::<Visibility>(node)
            .is_some_and(|v| v.is_visible())
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) -> SceneResult<()> {
        let mut visibility = self
            .world
            .get_mut::<Visibility>(node)
            .ok_or(SceneError::NodeNotFound(node))?;
        *visibility = Visibility(visible);
        Ok(())
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.world.get::<Name>(node).map(Name::as_str)
    }

    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> SceneResult<()> {
        self.ensure_exists(node)?;
        self.world.entity_mut(node).insert(Name::new(name));
        Ok(())
    }

    /// Finds the first attached node with the given name, in pre-order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|&node| self.name(node) == Some(name))
    }

    // ---- Motion ----

    pub fn set_motion(&mut self, node: NodeId, motion: Motion) -> SceneResult<()> {
        self.ensure_exists(node)?;
        self.world.entity_mut(node).insert(motion);
        Ok(())
    }

    /// Applies every node's motion rule for the given elapsed time.
    ///
    /// Each rule is a pure function of time, so the order nodes are visited
    /// in does not matter.
    pub fn apply_motions(&mut self, time: f32) {
        let mut query = self.world.query::<(&Motion, &mut Transform)>();
        for (motion, mut transform) in query.iter_mut(&mut self.world) {
            motion.apply(&mut *transform, time);
        }
    }

    // ---- Cameras ----

    /// Makes `node` a camera. The projection's aspect is synced to the surface.
    pub fn set_camera(&mut self, node: NodeId, mut camera: Camera) -> SceneResult<()> {
        self.ensure_exists(node)?;
        let (width, height) = self.surface_size;
        camera.set_aspect(width as f32, height as f32);
        self.world.entity_mut(node).insert(camera);
        Ok(())
    }

    pub fn camera(&self, node: NodeId) -> Option<&Camera> {
        self.world.get::<Camera>(node)
    }

    fn ensure_camera(&self, node: NodeId) -> SceneResult<()> {
        self.ensure_exists(node)?;
        if self.camera(node).is_none() {
            return Err(SceneError::NotACamera(node));
        }
        Ok(())
    }

    /// Draws the scene through `node` alone, covering the whole surface.
    pub fn set_active_camera(&mut self, node: NodeId) -> SceneResult<()> {
        self.ensure_camera(node)?;
        self.views.clear();
        self.views.push(View::full(node));
        Ok(())
    }

    /// Camera of the first view.
    pub fn active_camera(&self) -> Option<NodeId> {
        self.views.first().map(|view| view.camera)
    }

    /// Adds a view drawn after the existing ones. Each view gets the aspect
    /// ratio of its own viewport.
    pub fn add_view(&mut self, camera: NodeId, viewport: Viewport) -> SceneResult<()> {
        self.ensure_camera(camera)?;
        if !viewport.is_valid() {
            return Err(SceneError::InvalidViewport);
        }
        self.views.push(View { camera, viewport });
        Ok(())
    }

    /// Views in draw order.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn clear_views(&mut self) {
        self.views.clear();
    }

    // ---- Render targets ----

    /// Takes ownership of a render target. A target that follows the surface
    /// is resized to it right away.
    pub fn add_render_target(&mut self, mut target: RenderTarget) -> TargetId {
        if target.follows_surface() {
            let (width, height) = self.surface_size;
            target.resize(width, height);
        }
        self.targets.push(target);
        self.targets.len() - 1
    }

    pub fn render_target(&self, id: TargetId) -> Option<&RenderTarget> {
        self.targets.get(id)
    }

    pub fn render_target_mut(&mut self, id: TargetId) -> SceneResult<&mut RenderTarget> {
        self.targets
            .get_mut(id)
            .ok_or(SceneError::RenderTargetNotFound(id))
    }

    pub fn render_targets(&self) -> &[RenderTarget] {
        &self.targets
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    /// Records the output surface size and updates every camera's aspect ratio.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
        let mut query = self.world.query::<&mut Camera>();
        for mut camera in query.iter_mut(&mut self.world) {
            camera.set_aspect(width as f32, height as f32);
        }
        for target in self.targets.iter_mut().filter(|t| t.follows_surface()) {
            target.resize(width, height);
        }
        log::debug!("Surface resized to {width}x{height}");
    }

    /// Destroys every node.
    pub fn clear(&mut self) {
        self.world.clear_entities();
        self.roots.clear();
        self.views.clear();
        self.targets.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
