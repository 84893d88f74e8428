//! Demo scenes
//!
//! Each demo builds a scene once and then drives it frame by frame. Every
//! update is a pure function of elapsed time, so replaying the same
//! timestamps reproduces the same world transforms.

mod bouncing_spheres;
mod fundamentals;
mod render_to_texture;
mod snow_globe;
mod solar_system;
mod split_view;
mod tank;

pub use bouncing_spheres::BouncingSpheres;
pub use fundamentals::Fundamentals;
pub use render_to_texture::RenderToTexture;
pub use snow_globe::SnowGlobe;
pub use solar_system::SolarSystem;
pub use split_view::SplitView;
pub use tank::Tank;

use std::fmt;
use std::str::FromStr;

use crate::error::SceneResult;
use crate::frame::Demo;
use crate::scene::{Camera, NodeId, Scene, Transform};

/// Payload handles shared by the demos. The renderer owns what they point to.
pub mod meshes {
    pub const CUBE: usize = 0;
    pub const SPHERE: usize = 1;
    pub const PLANE: usize = 2;
    pub const BOX: usize = 3;
    pub const CYLINDER: usize = 4;
    pub const DOME: usize = 5;
    pub const CONE: usize = 6;
    pub const TETRAHEDRON: usize = 7;
    pub const CIRCLE: usize = 8;
    pub const LINE: usize = 9;
}

/// The built-in demo catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DemoKind {
    /// Three spinning cubes
    #[default]
    Fundamentals,
    /// Sun, earth and moon driven by nested orbits
    SolarSystem,
    /// A tank following a spline and tracking a moving target
    Tank,
    /// Spheres bouncing around a ring
    BouncingSpheres,
    /// Falling, spinning snow flakes around a tree
    SnowGlobe,
    /// One scene drawn through two cameras side by side
    SplitView,
    /// A cube textured with a live render of a second scene
    RenderToTexture,
}

impl DemoKind {
    pub const ALL: [DemoKind; 7] = [
        DemoKind::Fundamentals,
        DemoKind::SolarSystem,
        DemoKind::Tank,
        DemoKind::BouncingSpheres,
        DemoKind::SnowGlobe,
        DemoKind::SplitView,
        DemoKind::RenderToTexture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Fundamentals => "fundamentals",
            DemoKind::SolarSystem => "solar-system",
            DemoKind::Tank => "tank",
            DemoKind::BouncingSpheres => "bouncing-spheres",
            DemoKind::SnowGlobe => "snow-globe",
            DemoKind::SplitView => "split-view",
            DemoKind::RenderToTexture => "render-to-texture",
        }
    }

    /// Instantiates the demo with its default parameters.
    pub fn create(self) -> Box<dyn Demo> {
        match self {
            DemoKind::Fundamentals => Box::new(Fundamentals::new()),
            DemoKind::SolarSystem => Box::new(SolarSystem::new()),
            DemoKind::Tank => Box::new(Tank::new()),
            DemoKind::BouncingSpheres => Box::new(BouncingSpheres::new()),
            DemoKind::SnowGlobe => Box::new(SnowGlobe::new()),
            DemoKind::SplitView => Box::new(SplitView::new()),
            DemoKind::RenderToTexture => Box::new(RenderToTexture::new()),
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        DemoKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = DemoKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown demo '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Spawns a root camera, names it and makes it the active one.
fn spawn_camera(
    scene: &mut Scene,
    name: &str,
    transform: Transform,
    camera: Camera,
) -> SceneResult<NodeId> {
    let node = scene.spawn_root(transform);
    scene.set_name(node, name)?;
    scene.set_camera(node, camera)?;
    scene.set_active_camera(node)?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLoop;
    use crate::render::FrameRecorder;
    use crate::HostConfig;

    #[test]
    fn names_round_trip() {
        for kind in DemoKind::ALL {
            assert_eq!(kind.name().parse::<DemoKind>(), Ok(kind));
        }
        assert_eq!("Solar_System".parse::<DemoKind>(), Ok(DemoKind::SolarSystem));
        assert!("teapot".parse::<DemoKind>().is_err());
    }

    #[test]
    fn every_demo_builds_and_runs() {
        let config = HostConfig::default();
        for kind in DemoKind::ALL {
            let mut frame_loop =
                FrameLoop::new(kind.create(), FrameRecorder::new(), &config).unwrap();
            assert_eq!(frame_loop.demo().name(), kind.name());
            for i in 0..3 {
                frame_loop.tick(i as f64 * 16.0).unwrap();
            }
            assert!(frame_loop.is_running(), "{kind} stopped requesting frames");

            let frame = frame_loop.renderer().last().unwrap();
            assert!(frame.camera().is_some(), "{kind} has no active camera");
            assert!(!frame.draws.is_empty(), "{kind} draws nothing");
        }
    }
}
