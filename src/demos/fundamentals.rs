use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::motion::Motion;
use crate::scene::{Camera, NodeId, Renderable, Scene, Transform};
use crate::HostConfig;

use super::{meshes, spawn_camera};

/// Three cubes side by side, each tumbling a little faster than the last.
#[derive(Debug, Default)]
pub struct Fundamentals {
    cubes: Vec<NodeId>,
}

impl Fundamentals {
    const POSITIONS: [f32; 3] = [0.0, -2.0, 2.0];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn cubes(&self) -> &[NodeId] {
        &self.cubes
    }

    /// Tumble rate of the cube at `index`, in radians per second.
    pub fn speed(index: usize) -> f32 {
        1.0 + index as f32 * 0.1
    }
}

impl Demo for Fundamentals {
    fn name(&self) -> &'static str {
        "fundamentals"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        spawn_camera(
            scene,
            "camera",
            Transform::from_xyz(0.0, 0.0, 2.0),
            Camera::perspective(75.0, config.aspect(), 0.1, 5.0),
        )?;

        self.cubes.clear();
        for (index, x) in Self::POSITIONS.into_iter().enumerate() {
            let cube = scene.spawn_mesh(
                Transform::from_xyz(x, 0.0, 0.0),
                Renderable::new(meshes::CUBE, index),
            );
            scene.add_root(cube)?;
            scene.set_motion(cube, Motion::tumble(Self::speed(index)))?;
            self.cubes.push(cube);
        }
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        scene.apply_motions(frame.time());
        frame.request_next_frame();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLoop;
    use crate::render::NullRenderer;
    use glam::{EulerRot, Quat};

    #[test]
    fn cubes_tumble_at_increasing_rates() {
        let mut frame_loop =
            FrameLoop::new(Fundamentals::new(), NullRenderer, &HostConfig::default()).unwrap();
        frame_loop.tick(0.0).unwrap();
        frame_loop.tick(1500.0).unwrap();

        let scene = frame_loop.scene();
        for (index, &cube) in frame_loop.demo().cubes().iter().enumerate() {
            let rot = 1.5 * Fundamentals::speed(index);
            let expected = Quat::from_euler(EulerRot::XYZ, rot, rot, 0.0);
            let (_, rotation, translation) =
                scene.global_transform(cube).unwrap().to_scale_rotation_translation();
            assert!(rotation.abs_diff_eq(expected, 1e-4) || rotation.abs_diff_eq(-expected, 1e-4));
            assert!((translation.x - Fundamentals::POSITIONS[index]).abs() < 1e-5);
        }
    }

    #[test]
    fn camera_matches_scene_setup() {
        let mut scene = Scene::new();
        let mut demo = Fundamentals::new();
        demo.build(&mut scene, &HostConfig::default()).unwrap();

        let camera = scene.active_camera().unwrap();
        assert_eq!(scene.name(camera), Some("camera"));
        let projection = scene.camera(camera).unwrap().projection;
        assert!((projection.near() - 0.1).abs() < 1e-6);
        assert!((projection.far() - 5.0).abs() < 1e-6);
        assert_eq!(scene.roots().len(), 4);
    }
}
