//! Transform propagation for hierarchy-based transforms.
//!
//! Computes [`GlobalTransform`] from local [`Transform`] components, walking
//! each root's subtree depth-first so parents are always resolved before their
//! children. World transforms are staged and only written back once the whole
//! pass succeeded: a failed pass leaves the previous frame's values in place.

use std::collections::HashSet;

use crate::error::ResolveError;
use crate::scene::{Children, GlobalTransform, NodeId, Scene, Transform};

/// Summary of one resolve pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveStats {
    /// Attached nodes whose world transform was recomputed.
    pub nodes: usize,
    /// Deepest level reached (roots are 0).
    pub max_depth: usize,
}

/// Recomputes the world transform of every attached node.
///
/// `world(root) = local(root)` and `world(child) = world(parent) * local(child)`.
/// Every node is recomputed every pass. Detached subtrees are not visited and
/// keep whatever world transform they had when they were last attached.
/// Scenes owned by render targets are resolved in the same pass; if any of
/// them fails, no scene is written.
///
/// Call this once per frame after the update step and before rendering.
pub fn resolve_transforms(scene: &mut Scene) -> Result<ResolveStats, ResolveError> {
    let staged = StagedScene::stage(scene)?;

    let mut stats = ResolveStats::default();
    staged.commit(scene, &mut stats);

    log::trace!(
        "Resolved {} nodes (max depth {})",
        stats.nodes,
        stats.max_depth
    );
    Ok(stats)
}

/// World transforms of one scene and its render targets, not yet written
struct StagedScene {
    nodes: Vec<(NodeId, GlobalTransform, usize)>,
    targets: Vec<StagedScene>,
}

impl StagedScene {
    fn stage(scene: &Scene) -> Result<Self, ResolveError> {
        Ok(Self {
            nodes: stage_world_transforms(scene)?,
            targets: scene
                .targets
                .iter()
                .map(|target| Self::stage(target.scene()))
                .collect::<Result<_, _>>()?,
        })
    }

    fn commit(&self, scene: &mut Scene, stats: &mut ResolveStats) {
        for &(node, global, depth) in &self.nodes {
            if let Some(mut current) = scene.world.get_mut::<GlobalTransform>(node) {
                *current = global;
            }
            stats.max_depth = stats.max_depth.max(depth);
        }
        stats.nodes += self.nodes.len();

        for (staged, target) in self.targets.iter().zip(scene.targets.iter_mut()) {
            staged.commit(target.scene_mut(), stats);
        }
    }
}

/// Walks the forest and computes world transforms without writing them.
fn stage_world_transforms(
    scene: &Scene,
) -> Result<Vec<(NodeId, GlobalTransform, usize)>, ResolveError> {
    let world = &scene.world;
    let mut staged = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<(NodeId, GlobalTransform, usize)> = scene
        .roots
        .iter()
        .rev()
        .map(|&root| (root, GlobalTransform::IDENTITY, 0))
        .collect();

    while let Some((node, parent_global, depth)) = stack.pop() {
        if !visited.insert(node) {
            return Err(ResolveError::CycleDetected(node));
        }
        let local = world
            .get::<Transform>(node)
            .ok_or(ResolveError::DanglingNode(node))?;
        let global = parent_global.mul_transform(local);
        staged.push((node, global, depth));

        if let Some(children) = world.get::<Children>(node) {
            stack.extend(children.iter().rev().map(|child| (child, global, depth + 1)));
        }
    }

    Ok(staged)
}
