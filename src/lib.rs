//! Scene Engine - a scene graph with per-frame procedural animation
//!
//! The engine owns three things:
//! - a **scene graph**: a forest of transformable nodes stored in a Bevy ECS
//!   world, each optionally carrying an opaque renderable payload
//! - an **update driver**: a [`Demo`] mutates local transforms once per frame
//!   as a pure function of elapsed time and asks for the next frame explicitly
//! - a **transform resolver**: composes local transforms root-to-leaf into
//!   world transforms before every render
//!
//! Rasterization is out of scope. Each frame is handed to a [`Renderer`] as a
//! list of views (camera plus viewport), any offscreen render target passes,
//! and a pre-ordered list of draw items.
//!
//! # Features
//! - Hierarchy edits validated up front (no cycles, single parent)
//! - Resolve passes that either fully succeed or leave the previous frame intact
//! - Cameras as nodes, so they can ride the hierarchy
//! - Several views per frame, each with its own viewport aspect
//! - Render targets that draw a secondary scene into a texture
//! - Thread-safe inbox for payloads loaded off the frame thread
//! - A catalogue of demo scenes (spinning cubes, solar system, tank, bouncing
//!   spheres, snow globe, split view, render to texture)

pub mod curve;
pub mod demos;
pub mod error;
pub mod frame;
pub mod loader;
pub mod motion;
pub mod render;
pub mod scene;
pub mod systems;

pub use curve::SplineCurve;
pub use demos::DemoKind;
pub use error::{FrameError, RenderError, ResolveError, SceneError, SceneResult};
pub use frame::{Demo, FrameClock, FrameContext, FrameLoop, FrameStatus, HeadlessHost, RunSummary};
pub use loader::PayloadInbox;
pub use motion::Motion;
pub use render::{
    CameraView, DrawItem, FrameRecorder, LogRenderer, NullRenderer, RenderFrame, Renderer,
    TargetFrame,
};
pub use scene::{NodeId, RenderTarget, Scene, TargetId, View, Viewport};
pub use systems::resolve_transforms;

/// Configuration for a frame loop host
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Window title
    pub title: String,
    /// Initial surface width
    pub width: u32,
    /// Initial surface height
    pub height: u32,
    /// Display refresh rate the host ticks at
    pub refresh_rate_hz: u32,
    /// Upper bound on frames a headless run will issue
    pub max_frames: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "Scene Engine".to_string(),
            width: 1280,
            height: 720,
            refresh_rate_hz: 60,
            max_frames: 600,
        }
    }
}

impl HostConfig {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
