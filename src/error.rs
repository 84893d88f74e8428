//! Error types
//!
//! Structural errors are rejected at the mutation call and leave the graph
//! unchanged. Resolve and render errors abort the current frame.

use thiserror::Error;

use crate::scene::{NodeId, TargetId};

/// Structural scene-graph error
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("Node {0:?} does not exist")]
    NodeNotFound(NodeId),
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("Node {0:?} is already attached; detach it first")]
    AlreadyAttached(NodeId),
    #[error("Node {0:?} has no camera")]
    NotACamera(NodeId),
    #[error("Viewport must be non-empty and inside the surface")]
    InvalidViewport,
    #[error("Render target {0} does not exist")]
    RenderTargetNotFound(TargetId),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Resolve pass failure. The frame is aborted and nothing is rendered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Node {0:?} was reached twice during the resolve pass (cyclic hierarchy)")]
    CycleDetected(NodeId),
    #[error("Hierarchy references node {0:?} which has no transform")]
    DanglingNode(NodeId),
}

/// Renderer-side failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("No active camera to render with")]
    NoActiveCamera,
    #[error("Renderer failed: {0}")]
    Backend(String),
}

/// Failure of one frame of the update/resolve/render sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Resolve pass failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error("Scene operation failed: {0}")]
    Scene(#[from] SceneError),
}
