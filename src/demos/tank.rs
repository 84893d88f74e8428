//! A tank driving along a closed spline while its turret tracks a target
//! that orbits, rises and bobs above the ground.
//!
//! Four cameras take turns every four seconds: a fixed overview, one on the
//! turret, one riding with the target and one behind the tank. The mounted
//! cameras are ordinary nodes deep in the hierarchy, so they follow whatever
//! they are attached to without any extra bookkeeping.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};

use crate::curve::SplineCurve;
use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::motion::Motion;
use crate::scene::{Camera, NodeId, Renderable, Scene, Transform};
use crate::HostConfig;

use super::meshes;

const CAR_WIDTH: f32 = 4.0;
const CAR_HEIGHT: f32 = 1.0;
const CAR_LENGTH: f32 = 8.0;
const WHEEL_THICKNESS: f32 = 0.5;
const TURRET_LENGTH: f32 = CAR_LENGTH * 0.75 * 0.2;

/// Fraction of the path travelled per second.
const TANK_SPEED: f32 = 0.05;
/// How far ahead along the path the tank faces.
const LOOK_AHEAD: f32 = 0.01;
const SECONDS_PER_CAMERA: f32 = 4.0;

const PATH: [Vec2; 10] = [
    Vec2::new(-10.0, 0.0),
    Vec2::new(-5.0, 5.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(5.0, -5.0),
    Vec2::new(10.0, 0.0),
    Vec2::new(5.0, 10.0),
    Vec2::new(-5.0, 10.0),
    Vec2::new(-10.0, -10.0),
    Vec2::new(-15.0, -8.0),
    Vec2::new(-10.0, 0.0),
];

// Material slots
const GROUND: usize = 0;
const BODY: usize = 1;
const WHEEL: usize = 2;
const TARGET: usize = 3;
const PATH_LINE: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct TankNodes {
    pub tank: NodeId,
    pub body: NodeId,
    pub turret_pivot: NodeId,
    pub turret_camera: NodeId,
    pub target_mesh: NodeId,
    pub target_camera_pivot: NodeId,
    /// Cycled in this order: overview, turret, target, tank.
    pub cameras: [NodeId; 4],
}

#[derive(Debug, Default)]
pub struct Tank {
    path: Option<SplineCurve>,
    nodes: Option<TankNodes>,
    wheels: Vec<NodeId>,
}

impl Tank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> Option<TankNodes> {
        self.nodes
    }

    pub fn wheels(&self) -> &[NodeId] {
        &self.wheels
    }

    pub fn path(&self) -> Option<&SplineCurve> {
        self.path.as_ref()
    }

    /// Index into [`TankNodes::cameras`] active at `time`.
    pub fn camera_index(time: f32) -> usize {
        (time / SECONDS_PER_CAMERA).max(0.0) as usize % 4
    }

    /// Where the tank is and where it faces at `time`, on the ground plane.
    pub fn path_position(path: &SplineCurve, time: f32) -> (Vec3, Vec3) {
        let tank_time = time * TANK_SPEED;
        let position = path.point_at(tank_time.rem_euclid(1.0));
        let ahead = path.point_at((tank_time + LOOK_AHEAD).rem_euclid(1.0));
        (
            Vec3::new(position.x, 0.0, position.y),
            Vec3::new(ahead.x, 0.0, ahead.y),
        )
    }

    fn build_tank(
        &mut self,
        scene: &mut Scene,
    ) -> SceneResult<(NodeId, NodeId, NodeId, NodeId, NodeId)> {
        let tank = scene.spawn_root(Transform::IDENTITY);
        scene.set_name(tank, "tank")?;

        let body = scene.spawn_mesh(
            Transform::from_xyz(0.0, 1.4, 0.0),
            Renderable::new(meshes::BOX, BODY),
        );
        scene.set_name(body, "body")?;
        scene.add_child(tank, body)?;

        let tank_camera = scene.spawn_child(
            body,
            Transform::from_xyz(0.0, 3.0, -6.0).with_euler(Vec3::new(0.0, PI, 0.0)),
        )?;
        scene.set_name(tank_camera, "tank_camera")?;
        scene.set_camera(tank_camera, Camera::perspective(75.0, 2.0, 0.1, 1000.0))?;

        let wheel_x = CAR_WIDTH / 2.0 + WHEEL_THICKNESS / 2.0;
        self.wheels.clear();
        for z in [CAR_LENGTH / 3.0, 0.0, -CAR_LENGTH / 3.0] {
            for x in [-wheel_x, wheel_x] {
                let wheel = scene.spawn_mesh(
                    Transform::from_xyz(x, -CAR_HEIGHT / 2.0, z)
                        .with_euler(Vec3::new(0.0, 0.0, FRAC_PI_2)),
                    Renderable::new(meshes::CYLINDER, WHEEL),
                );
                scene.add_child(body, wheel)?;
                // Roll about X on top of the fixed quarter turn about Z
                scene.set_motion(
                    wheel,
                    Motion::Spin {
                        rates: Vec3::new(3.0, 0.0, 0.0),
                        phase: Vec3::new(0.0, 0.0, FRAC_PI_2),
                    },
                )?;
                self.wheels.push(wheel);
            }
        }

        let dome = scene.spawn_mesh(
            Transform::from_xyz(0.0, 0.5, 0.0),
            Renderable::new(meshes::DOME, BODY),
        );
        scene.set_name(dome, "dome")?;
        scene.add_child(body, dome)?;

        let turret_pivot = scene.spawn_child(
            body,
            Transform::from_xyz(0.0, 0.5, 0.0).with_scale(Vec3::splat(5.0)),
        )?;
        scene.set_name(turret_pivot, "turret_pivot")?;

        let turret = scene.spawn_mesh(
            Transform::from_xyz(0.0, 0.0, TURRET_LENGTH * 0.5),
            Renderable::new(meshes::BOX, BODY),
        );
        scene.set_name(turret, "turret")?;
        scene.add_child(turret_pivot, turret)?;

        let turret_camera = scene.spawn_child(turret, Transform::from_xyz(0.0, 0.75 * 0.2, 0.0))?;
        scene.set_name(turret_camera, "turret_camera")?;
        scene.set_camera(turret_camera, Camera::perspective(40.0, 2.0, 0.1, 1000.0))?;

        Ok((tank, body, tank_camera, turret_pivot, turret_camera))
    }

    fn build_target(scene: &mut Scene) -> SceneResult<(NodeId, NodeId, NodeId)> {
        let orbit = scene.spawn_root(Transform::IDENTITY);
        scene.set_name(orbit, "target_orbit")?;
        scene.set_motion(orbit, Motion::Orbit { angular_speed: 0.27 })?;

        let elevation = scene.spawn_child(orbit, Transform::from_xyz(0.0, 8.0, CAR_LENGTH * 2.0))?;
        scene.set_name(elevation, "target_elevation")?;

        let bob = scene.spawn_child(elevation, Transform::IDENTITY)?;
        scene.set_name(bob, "target_bob")?;
        scene.set_motion(bob, Motion::bob(0.0, 4.0, 2.0))?;

        let mesh = scene.spawn_mesh(Transform::IDENTITY, Renderable::new(meshes::SPHERE, TARGET));
        scene.set_name(mesh, "target")?;
        scene.add_child(bob, mesh)?;
        scene.set_motion(
            mesh,
            Motion::Spin {
                rates: Vec3::new(7.0, 13.0, 0.0),
                phase: Vec3::ZERO,
            },
        )?;

        let camera_pivot = scene.spawn_child(bob, Transform::IDENTITY)?;
        scene.set_name(camera_pivot, "target_camera_pivot")?;

        let camera = scene.spawn_child(
            camera_pivot,
            Transform::from_xyz(0.0, 1.0, -2.0).with_euler(Vec3::new(0.0, PI, 0.0)),
        )?;
        scene.set_name(camera, "target_camera")?;
        scene.set_camera(camera, Camera::perspective(40.0, 2.0, 0.1, 1000.0))?;

        Ok((mesh, camera_pivot, camera))
    }
}

impl Demo for Tank {
    fn name(&self) -> &'static str {
        "tank"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        let overview = scene.spawn_root(
            Transform::from_translation(Vec3::new(8.0, 4.0, 10.0) * 3.0)
                .looking_at(Vec3::ZERO, Vec3::Y),
        );
        scene.set_name(overview, "overview_camera")?;
        scene.set_camera(overview, Camera::perspective(40.0, config.aspect(), 0.1, 1000.0))?;
        scene.set_active_camera(overview)?;

        let ground = scene.spawn_mesh(
            Transform::IDENTITY.with_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
            Renderable::new(meshes::PLANE, GROUND),
        );
        scene.set_name(ground, "ground")?;
        scene.add_root(ground)?;

        let (tank, body, tank_camera, turret_pivot, turret_camera) = self.build_tank(scene)?;
        let (target_mesh, target_camera_pivot, target_camera) = Self::build_target(scene)?;

        // Drawn slightly above the ground in the XZ plane
        let path_line = scene.spawn_mesh(
            Transform::from_xyz(0.0, 0.05, 0.0).with_euler(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
            Renderable::new(meshes::LINE, PATH_LINE),
        );
        scene.set_name(path_line, "path")?;
        scene.add_root(path_line)?;

        self.path = SplineCurve::new(PATH.to_vec());
        self.nodes = Some(TankNodes {
            tank,
            body,
            turret_pivot,
            turret_camera,
            target_mesh,
            target_camera_pivot,
            cameras: [overview, turret_camera, target_camera, tank_camera],
        });
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        let time = frame.time();
        // Target motion and wheel spin
        scene.apply_motions(time);

        let Some(nodes) = self.nodes else {
            return Ok(());
        };

        if let Some(path) = &self.path {
            let (position, ahead) = Self::path_position(path, time);
            scene.update_transform(nodes.tank, |t| t.translation = position)?;
            scene.look_at_world(nodes.tank, ahead, Vec3::Y)?;
        }

        // Aim using this frame's positions, not the previous resolve
        let target = scene.compute_world_transform(nodes.target_mesh)?.translation();
        scene.look_at_world(nodes.turret_pivot, target, Vec3::Y)?;
        scene.look_at_world(nodes.turret_camera, target, Vec3::Y)?;

        let tank = scene.compute_world_transform(nodes.tank)?.translation();
        scene.look_at_world(nodes.target_camera_pivot, tank, Vec3::Y)?;

        let active = nodes.cameras[Self::camera_index(time)];
        if scene.active_camera() != Some(active) {
            log::debug!("Switching to camera {:?}", scene.name(active));
            scene.set_active_camera(active)?;
        }

        frame.request_next_frame();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLoop;
    use crate::render::FrameRecorder;

    fn run_until(seconds: f64) -> FrameLoop<Tank, FrameRecorder> {
        let mut frame_loop =
            FrameLoop::new(Tank::new(), FrameRecorder::new(), &HostConfig::default()).unwrap();
        frame_loop.tick(0.0).unwrap();
        frame_loop.tick(seconds * 1000.0).unwrap();
        frame_loop
    }

    fn world_z_axis(frame_loop: &FrameLoop<Tank, FrameRecorder>, node: NodeId) -> Vec3 {
        let affine = frame_loop.scene().global_transform(node).unwrap().affine();
        Vec3::from(affine.matrix3.z_axis).normalize()
    }

    #[test]
    fn tank_follows_path() {
        for seconds in [0.5, 3.0, 11.0, 27.5] {
            let frame_loop = run_until(seconds);
            let demo = frame_loop.demo();
            let nodes = demo.nodes().unwrap();
            let (expected, ahead) = Tank::path_position(demo.path().unwrap(), seconds as f32);

            let tank = frame_loop.scene().global_transform(nodes.tank).unwrap();
            assert!((tank.translation() - expected).length() < 1e-3);

            let heading = world_z_axis(&frame_loop, nodes.tank);
            assert!(heading.abs_diff_eq((ahead - expected).normalize(), 1e-3));
        }
    }

    #[test]
    fn turret_tracks_target() {
        for seconds in [0.0, 1.3, 6.0, 14.2] {
            let frame_loop = run_until(seconds);
            let nodes = frame_loop.demo().nodes().unwrap();
            let scene = frame_loop.scene();

            let target = scene.global_transform(nodes.target_mesh).unwrap().translation();
            let pivot = scene.global_transform(nodes.turret_pivot).unwrap().translation();
            let aim = world_z_axis(&frame_loop, nodes.turret_pivot);
            assert!(
                aim.abs_diff_eq((target - pivot).normalize(), 1e-3),
                "t={seconds}: aim {aim:?}"
            );

            let camera = scene.global_transform(nodes.turret_camera).unwrap();
            let to_target = (target - camera.translation()).normalize();
            assert!(camera.forward().abs_diff_eq(to_target, 1e-3));
        }
    }

    #[test]
    fn target_camera_pivot_faces_tank() {
        let frame_loop = run_until(7.0);
        let nodes = frame_loop.demo().nodes().unwrap();
        let scene = frame_loop.scene();

        let tank = scene.global_transform(nodes.tank).unwrap().translation();
        let pivot = scene.global_transform(nodes.target_camera_pivot).unwrap().translation();
        let facing = world_z_axis(&frame_loop, nodes.target_camera_pivot);
        assert!(facing.abs_diff_eq((tank - pivot).normalize(), 1e-3));
    }

    #[test]
    fn target_bobs_above_elevation() {
        let seconds = 0.6_f32;
        let frame_loop = run_until(seconds as f64);
        let nodes = frame_loop.demo().nodes().unwrap();
        let target = frame_loop
            .scene()
            .global_transform(nodes.target_mesh)
            .unwrap()
            .translation();

        let expected_y = 8.0 + (seconds * 2.0).sin() * 4.0;
        assert!((target.y - expected_y).abs() < 1e-3);
        // Orbit radius is unaffected by the bob
        let radius = Vec2::new(target.x, target.z).length();
        assert!((radius - CAR_LENGTH * 2.0).abs() < 1e-3);
    }

    #[test]
    fn cameras_cycle_every_four_seconds() {
        assert_eq!(Tank::camera_index(0.0), 0);
        assert_eq!(Tank::camera_index(3.99), 0);
        assert_eq!(Tank::camera_index(4.0), 1);
        assert_eq!(Tank::camera_index(9.0), 2);
        assert_eq!(Tank::camera_index(13.0), 3);
        assert_eq!(Tank::camera_index(17.0), 0);

        let frame_loop = run_until(9.0);
        let nodes = frame_loop.demo().nodes().unwrap();
        let frame = frame_loop.renderer().last().unwrap();
        assert_eq!(frame.camera().unwrap().node, nodes.cameras[2]);
    }

    #[test]
    fn wheels_roll() {
        let frame_loop = run_until(0.5);
        let demo = frame_loop.demo();
        assert_eq!(demo.wheels().len(), 6);
        for &wheel in demo.wheels() {
            let local = frame_loop.scene().transform(wheel).unwrap();
            let expected = Transform::IDENTITY.with_euler(Vec3::new(1.5, 0.0, FRAC_PI_2));
            assert!(local.rotation.abs_diff_eq(expected.rotation, 1e-5));
        }
    }
}
