//! Per-node components besides transforms and hierarchy links.

use bevy_ecs::component::Component;

use super::TargetId;

/// Opaque handle to something the renderer knows how to draw.
///
/// The scene never looks inside: a node either carries a payload or it
/// doesn't. Nodes without one are grouping nodes and draw nothing.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Renderable {
    pub mesh_id: usize,
    pub material_id: usize,
    /// Render target whose texture the material samples.
    pub texture: Option<TargetId>,
}

impl Renderable {
    pub fn new(mesh_id: usize, material_id: usize) -> Self {
        Self {
            mesh_id,
            material_id,
            texture: None,
        }
    }

    #[must_use]
    pub fn with_texture(mut self, target: TargetId) -> Self {
        self.texture = Some(target);
        self
    }
}

/// Visibility flag. A hidden node hides its whole subtree from rendering.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility(pub bool);

impl Visibility {
    pub const VISIBLE: Self = Self(true);
    pub const HIDDEN: Self = Self(false);

    #[inline]
    pub fn is_visible(self) -> bool {
        self.0
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Debug label
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
