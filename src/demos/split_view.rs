//! One scene seen through two cameras side by side.
//!
//! The left half shows the main camera with a near plane so small that the
//! row of spheres behind the big one starts to z-fight. The right half watches
//! from further out. Neither camera is part of the graph: they are detached
//! nodes, placed by their local transform alone.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::scene::{Camera, NodeId, Renderable, Scene, Transform, Viewport};
use crate::HostConfig;

use super::meshes;

const PLANE_SIZE: f32 = 40.0;
const CUBE_SIZE: f32 = 4.0;
const SPHERE_RADIUS: f32 = 3.0;
const SPHERE_ROW: usize = 20;
/// Where both cameras aim.
const FOCUS: Vec3 = Vec3::new(0.0, 5.0, 0.0);

// Material slots
const CHECKER: usize = 0;
const CUBE: usize = 1;
const SPHERE: usize = 2;
const ROW: usize = 3;

#[derive(Debug, Default)]
pub struct SplitView {
    cameras: Option<[NodeId; 2]>,
}

impl SplitView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Main camera (left half) and overview camera (right half).
    pub fn cameras(&self) -> Option<[NodeId; 2]> {
        self.cameras
    }

    fn spawn_camera(
        scene: &mut Scene,
        name: &str,
        position: Vec3,
        camera: Camera,
    ) -> SceneResult<NodeId> {
        let node = scene.spawn(Transform::from_translation(position).looking_at(FOCUS, Vec3::Y));
        scene.set_name(node, name)?;
        scene.set_camera(node, camera)?;
        Ok(node)
    }
}

impl Demo for SplitView {
    fn name(&self) -> &'static str {
        "split-view"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        let main = Self::spawn_camera(
            scene,
            "main_camera",
            Vec3::new(0.0, 10.0, 20.0),
            Camera::perspective(45.0, config.aspect(), 0.00001, 100.0),
        )?;
        let overview = Self::spawn_camera(
            scene,
            "overview_camera",
            Vec3::new(40.0, 10.0, 30.0),
            Camera::perspective(60.0, config.aspect(), 0.1, 500.0),
        )?;
        scene.clear_views();
        scene.add_view(main, Viewport::LEFT_HALF)?;
        scene.add_view(overview, Viewport::RIGHT_HALF)?;
        self.cameras = Some([main, overview]);

        let ground = scene.spawn_mesh(
            Transform::IDENTITY
                .with_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
                .with_scale(Vec3::new(PLANE_SIZE, PLANE_SIZE, 1.0)),
            Renderable::new(meshes::PLANE, CHECKER),
        );
        scene.set_name(ground, "ground")?;
        scene.add_root(ground)?;

        let cube = scene.spawn_mesh(
            Transform::from_xyz(CUBE_SIZE + 1.0, CUBE_SIZE / 2.0, 0.0)
                .with_scale(Vec3::splat(CUBE_SIZE)),
            Renderable::new(meshes::CUBE, CUBE),
        );
        scene.add_root(cube)?;

        let sphere_at = |z: f32| {
            Transform::from_xyz(-SPHERE_RADIUS - 1.0, SPHERE_RADIUS + 2.0, z)
                .with_scale(Vec3::splat(SPHERE_RADIUS))
        };
        let sphere = scene.spawn_mesh(sphere_at(0.0), Renderable::new(meshes::SPHERE, SPHERE));
        scene.add_root(sphere)?;

        // Same spot as the big sphere for the first one, then marching away
        for index in 0..SPHERE_ROW {
            let z = index as f32 * SPHERE_RADIUS * -2.2;
            let node = scene.spawn_mesh(sphere_at(z), Renderable::new(meshes::SPHERE, ROW + index));
            scene.add_root(node)?;
        }
        Ok(())
    }

    fn update(&mut self, _scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        frame.request_next_frame();
        Ok(())
    }
}
