//! Offscreen render targets
//!
//! A render target owns a secondary [`Scene`] that is drawn into a texture
//! before the main scene's views. Nodes in the main scene sample that texture
//! through [`Renderable::texture`](super::Renderable::texture).

use super::Scene;

/// Index of a render target within its owning scene
pub type TargetId = usize;

/// A secondary scene rendered into a texture of its own size
pub struct RenderTarget {
    scene: Scene,
    follows_surface: bool,
}

impl RenderTarget {
    /// Wraps `scene` in a `width` x `height` target.
    ///
    /// The target size doubles as the secondary scene's surface size, so its
    /// cameras take the target's aspect ratio.
    pub fn new(mut scene: Scene, width: u32, height: u32) -> Self {
        scene.set_surface_size(width, height);
        Self {
            scene,
            follows_surface: false,
        }
    }

    /// Makes the target resize together with the owning scene's surface.
    #[must_use]
    pub fn following_surface(mut self) -> Self {
        self.follows_surface = true;
        self
    }

    pub fn follows_surface(&self) -> bool {
        self.follows_surface
    }

    pub fn size(&self) -> (u32, u32) {
        self.scene.surface_size()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.set_surface_size(width, height);
    }
}
