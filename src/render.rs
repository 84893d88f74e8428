//! Renderer boundary
//!
//! The engine does not rasterize anything. Each frame it extracts a
//! [`RenderFrame`] and hands it to a [`Renderer`]. A frame holds, in the
//! order they must be drawn:
//!
//! - one [`TargetFrame`] per render target, each with its own views and draws
//! - the main scene's views (camera plus viewport, each with its own aspect)
//! - the main scene's draw items with fully resolved world transforms

use crate::error::RenderError;
use crate::scene::{
    Camera, CameraUniformData, GlobalTransform, NodeId, Projection, Renderable, Scene,
    TargetId, TransformUniformData, Viewport,
};

/// Camera parameters for one view of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub node: NodeId,
    pub viewport: Viewport,
    /// The camera's projection with the viewport's aspect ratio applied.
    pub projection: Projection,
    pub uniform: CameraUniformData,
}

/// One visible node with a payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub renderable: Renderable,
    pub transform: TransformUniformData,
}

/// A render target's scene, drawn into its texture
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFrame {
    pub target: TargetId,
    pub size: (u32, u32),
    pub views: Vec<CameraView>,
    pub draws: Vec<DrawItem>,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub time: f32,
    pub surface_size: (u32, u32),
    /// Drawn before the main views so their textures are ready.
    pub targets: Vec<TargetFrame>,
    pub views: Vec<CameraView>,
    /// Draw order is scene pre-order: parents before children, siblings in
    /// insertion order.
    pub draws: Vec<DrawItem>,
}

impl RenderFrame {
    /// Builds a frame from the scene's current world transforms.
    ///
    /// Hidden nodes are skipped together with their whole subtree; nodes
    /// without a payload contribute nothing but their children are still
    /// considered. Views whose camera is gone are dropped.
    pub fn extract(scene: &Scene, frame_index: u64, time: f32) -> Self {
        let targets = scene
            .render_targets()
            .iter()
            .enumerate()
            .map(|(target, render_target)| {
                let target_scene = render_target.scene();
                TargetFrame {
                    target,
                    size: render_target.size(),
                    views: extract_views(target_scene),
                    draws: extract_draws(target_scene),
                }
            })
            .collect();

        Self {
            frame_index,
            time,
            surface_size: scene.surface_size(),
            targets,
            views: extract_views(scene),
            draws: extract_draws(scene),
        }
    }

    /// The first view, which covers the whole surface unless the scene set
    /// up several.
    pub fn camera(&self) -> Option<&CameraView> {
        self.views.first()
    }
}

fn extract_draws(scene: &Scene) -> Vec<DrawItem> {
    let mut draws = Vec::new();
    let mut stack: Vec<NodeId> = scene.roots().iter().rev().copied().collect();

    while let Some(node) = stack.pop() {
        if !scene.is_visible(node) {
            continue;
        }
        if let (Some(renderable), Some(global)) =
            (scene.renderable(node), scene.global_transform(node))
        {
            draws.push(DrawItem {
                node,
                renderable,
                transform: global.uniform_data(),
            });
        }
        stack.extend(scene.children(node).iter().rev().copied());
    }
    draws
}

fn extract_views(scene: &Scene) -> Vec<CameraView> {
    scene
        .views()
        .iter()
        .filter_map(|view| {
            let camera = scene.camera(view.camera)?;
            let world = camera_world_transform(scene, view.camera)?;
            let (width, height) = scene.surface_size();
            let mut projection = camera.projection;
            if let Some(aspect) = view.viewport.aspect_ratio(width, height) {
                projection.set_aspect(aspect);
            }
            Some(CameraView {
                node: view.camera,
                viewport: view.viewport,
                projection,
                uniform: Camera { projection }.uniform_data(&world),
            })
        })
        .collect()
}

/// Cameras often live outside the graph, where the resolver never reaches
/// them; those get their chain composed on the spot.
fn camera_world_transform(scene: &Scene, node: NodeId) -> Option<GlobalTransform> {
    if scene.is_attached(node) {
        scene.global_transform(node)
    } else {
        scene.compute_world_transform(node).ok()
    }
}

/// Consumer of resolved frames
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError>;
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _frame: &RenderFrame) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Logs a one-line summary of each frame
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        let camera = frame.camera().ok_or(RenderError::NoActiveCamera)?;
        self.frames += 1;

        for target in &frame.targets {
            log::debug!(
                "  target {} {}x{} views={} draws={}",
                target.target,
                target.size.0,
                target.size.1,
                target.views.len(),
                target.draws.len()
            );
        }
        log::info!(
            "frame {:>5} t={:>7.3}s camera={:?} at {:?} views={} draws={}",
            frame.frame_index,
            frame.time,
            camera.node,
            camera.uniform.position.truncate(),
            frame.views.len(),
            frame.draws.len()
        );
        if let Some(first) = frame.draws.first() {
            log::debug!(
                "  first draw {:?} mesh={} at {:?}",
                first.node,
                first.renderable.mesh_id,
                first.transform.model.w_axis.truncate()
            );
        }
        Ok(())
    }
}

/// Keeps every frame it is handed, for inspection after the fact
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub frames: Vec<RenderFrame>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&RenderFrame> {
        self.frames.last()
    }
}

impl Renderer for FrameRecorder {
    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        (**self).render(frame)
    }
}
