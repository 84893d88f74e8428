//! A spinning cube textured with a live render of another scene.
//!
//! The secondary scene holds three tumbling cubes and its own camera. It is
//! owned by a render target that follows the surface size, so its camera
//! keeps the same aspect ratio as the main one across resizes.

use glam::Vec3;

use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::motion::Motion;
use crate::scene::{Camera, NodeId, RenderTarget, Renderable, Scene, TargetId, Transform};
use crate::HostConfig;

use super::{meshes, spawn_camera};

/// Size the target starts at before the first surface sync.
const TARGET_SIZE: u32 = 512;
const POSITIONS: [f32; 3] = [0.0, -2.0, 2.0];

const TEXTURED: usize = 0;

#[derive(Debug, Default)]
pub struct RenderToTexture {
    target: Option<TargetId>,
    cube: Option<NodeId>,
    inner_cubes: Vec<NodeId>,
}

impl RenderToTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    /// The cube in the main scene that shows the target's texture.
    pub fn cube(&self) -> Option<NodeId> {
        self.cube
    }

    /// Cubes inside the render target's scene.
    pub fn inner_cubes(&self) -> &[NodeId] {
        &self.inner_cubes
    }

    /// Tumble rate of inner cube `index`, radians per second.
    pub fn speed(index: usize) -> f32 {
        1.0 + index as f32 * 0.1
    }

    fn build_inner_scene(&mut self) -> SceneResult<Scene> {
        let mut scene = Scene::new();
        scene.set_surface_size(TARGET_SIZE, TARGET_SIZE);
        spawn_camera(
            &mut scene,
            "target_camera",
            Transform::from_xyz(0.0, 0.0, 2.0),
            Camera::perspective(75.0, 1.0, 0.1, 5.0),
        )?;

        self.inner_cubes.clear();
        for (index, x) in POSITIONS.into_iter().enumerate() {
            let cube = scene.spawn_mesh(
                Transform::from_xyz(x, 0.0, 0.0),
                Renderable::new(meshes::CUBE, index + 1),
            );
            scene.add_root(cube)?;
            scene.set_motion(cube, Motion::tumble(Self::speed(index)))?;
            self.inner_cubes.push(cube);
        }
        Ok(scene)
    }
}

impl Demo for RenderToTexture {
    fn name(&self) -> &'static str {
        "render-to-texture"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        let inner = self.build_inner_scene()?;
        let target = scene.add_render_target(
            RenderTarget::new(inner, TARGET_SIZE, TARGET_SIZE).following_surface(),
        );

        spawn_camera(
            scene,
            "camera",
            Transform::from_xyz(0.0, 0.0, 2.0),
            Camera::perspective(75.0, config.aspect(), 0.1, 5.0),
        )?;

        let cube = scene.spawn_mesh(
            Transform::IDENTITY,
            Renderable::new(meshes::CUBE, TEXTURED).with_texture(target),
        );
        scene.set_name(cube, "textured_cube")?;
        scene.add_root(cube)?;
        scene.set_motion(
            cube,
            Motion::Spin {
                rates: Vec3::new(1.0, 1.1, 0.0),
                phase: Vec3::ZERO,
            },
        )?;

        self.target = Some(target);
        self.cube = Some(cube);
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        let time = frame.time();
        if let Some(target) = self.target {
            scene.render_target_mut(target)?.scene_mut().apply_motions(time);
        }
        scene.apply_motions(time);
        frame.request_next_frame();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLoop;
    use crate::render::FrameRecorder;
    use glam::{EulerRot, Quat};

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
    }

    #[test]
    fn target_scene_animates_and_is_drawn_first() {
        let mut frame_loop =
            FrameLoop::new(RenderToTexture::new(), FrameRecorder::new(), &HostConfig::default())
                .unwrap();
        frame_loop.tick(0.0).unwrap();
        frame_loop.tick(2000.0).unwrap();

        let demo = frame_loop.demo();
        let id = demo.target().unwrap();
        let inner = frame_loop.scene().render_target(id).unwrap().scene();
        for (index, &cube) in demo.inner_cubes().iter().enumerate() {
            let rot = 2.0 * RenderToTexture::speed(index);
            let expected = Quat::from_euler(EulerRot::XYZ, rot, rot, 0.0);
            let global = inner.global_transform(cube).unwrap();
            let (_, rotation, _) = global.to_scale_rotation_translation();
            assert!(same_rotation(rotation, expected), "inner cube {index}");
        }

        let outer = frame_loop.scene().global_transform(demo.cube().unwrap()).unwrap();
        let expected = Quat::from_euler(EulerRot::XYZ, 2.0, 2.2, 0.0);
        assert!(same_rotation(outer.to_scale_rotation_translation().1, expected));

        let frame = frame_loop.renderer().last().unwrap();
        assert_eq!(frame.targets.len(), 1);
        assert_eq!(frame.targets[0].draws.len(), 3);
        assert_eq!(frame.draws.len(), 1);
        assert_eq!(frame.draws[0].renderable.texture, Some(id));
    }

    #[test]
    fn target_camera_tracks_the_main_aspect() {
        let mut frame_loop =
            FrameLoop::new(RenderToTexture::new(), FrameRecorder::new(), &HostConfig::default())
                .unwrap();
        frame_loop.tick(0.0).unwrap();
        frame_loop.resize(900, 300);
        frame_loop.tick(16.0).unwrap();

        let frames = &frame_loop.renderer().frames;
        for (frame, size) in frames.iter().zip([(1280, 720), (900, 300)]) {
            let target = &frame.targets[0];
            assert_eq!(target.size, size);
            let main = frame.camera().unwrap().projection.aspect().unwrap();
            let inner = target.views[0].projection.aspect().unwrap();
            assert!((main - inner).abs() < 1e-6);
        }
    }
}
