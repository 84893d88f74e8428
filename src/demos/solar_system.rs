//! Nested orbits
//!
//! ```text
//! solar_system (spin)
//! ├── sun (scale 5, spin)
//! └── earth_orbit (+10 x, spin)
//!     ├── earth (spin)
//!     └── moon_orbit (+2 x)
//!         └── moon (scale 0.5, spin)
//! ```
//!
//! Only `solar_system` and `earth_orbit` carry their children around. The sun
//! and earth spin in place, so the sun's scale never leaks into the earth.

use glam::Vec3;

use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::motion::Motion;
use crate::scene::{Camera, NodeId, Renderable, Scene, Transform};
use crate::HostConfig;

use super::{meshes, spawn_camera};

const SUN: usize = 0;
const EARTH: usize = 1;
const MOON: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct SolarNodes {
    pub solar_system: NodeId,
    pub sun: NodeId,
    pub earth_orbit: NodeId,
    pub earth: NodeId,
    pub moon_orbit: NodeId,
    pub moon: NodeId,
}

#[derive(Debug, Default)]
pub struct SolarSystem {
    nodes: Option<SolarNodes>,
}

impl SolarSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> Option<SolarNodes> {
        self.nodes
    }
}

impl Demo for SolarSystem {
    fn name(&self) -> &'static str {
        "solar-system"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        spawn_camera(
            scene,
            "camera",
            Transform::from_xyz(0.0, 50.0, 0.0).looking_at(Vec3::ZERO, Vec3::Z),
            Camera::perspective(40.0, config.aspect(), 0.1, 1000.0),
        )?;

        let solar_system = scene.spawn_root(Transform::IDENTITY);
        scene.set_name(solar_system, "solar_system")?;

        let sun = scene.spawn_mesh(
            Transform::from_scale(Vec3::splat(5.0)),
            Renderable::new(meshes::SPHERE, SUN),
        );
        scene.set_name(sun, "sun")?;
        scene.add_child(solar_system, sun)?;

        let earth_orbit = scene.spawn_child(solar_system, Transform::from_xyz(10.0, 0.0, 0.0))?;
        scene.set_name(earth_orbit, "earth_orbit")?;

        let earth = scene.spawn_mesh(Transform::IDENTITY, Renderable::new(meshes::SPHERE, EARTH));
        scene.set_name(earth, "earth")?;
        scene.add_child(earth_orbit, earth)?;

        let moon_orbit = scene.spawn_child(earth_orbit, Transform::from_xyz(2.0, 0.0, 0.0))?;
        scene.set_name(moon_orbit, "moon_orbit")?;

        let moon = scene.spawn_mesh(
            Transform::from_scale(Vec3::splat(0.5)),
            Renderable::new(meshes::SPHERE, MOON),
        );
        scene.set_name(moon, "moon")?;
        scene.add_child(moon_orbit, moon)?;

        for node in [solar_system, sun, earth_orbit, earth, moon] {
            scene.set_motion(node, Motion::Orbit { angular_speed: 1.0 })?;
        }

        self.nodes = Some(SolarNodes {
            solar_system,
            sun,
            earth_orbit,
            earth,
            moon_orbit,
            moon,
        });
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
    use crate::render::FrameRecorder;
    use std::f32::consts::FRAC_PI_2;

    fn run_until(seconds: f64) -> FrameLoop<SolarSystem, FrameRecorder> {
        let mut frame_loop =
            FrameLoop::new(SolarSystem::new(), FrameRecorder::new(), &HostConfig::default())
                .unwrap();
        frame_loop.tick(0.0).unwrap();
        frame_loop.tick(seconds * 1000.0).unwrap();
        frame_loop
    }

    #[test]
    fn earth_orbits_sun_at_distance_ten() {
        let frame_loop = run_until(FRAC_PI_2 as f64);
        let nodes = frame_loop.demo().nodes().unwrap();
        let earth = frame_loop.scene().global_transform(nodes.earth).unwrap();

        // Quarter turn about +Y carries +X to -Z
        assert!((earth.translation() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-3);
    }

    #[test]
    fn moon_stays_two_units_from_earth_and_is_not_scaled_by_sun() {
        for seconds in [0.0, 0.7, 2.3, 5.0] {
            let frame_loop = run_until(seconds);
            let nodes = frame_loop.demo().nodes().unwrap();
            let scene = frame_loop.scene();
            let earth = scene.global_transform(nodes.earth).unwrap();
            let moon = scene.global_transform(nodes.moon).unwrap();

            let distance = earth.translation().distance(moon.translation());
            assert!((distance - 2.0).abs() < 1e-3, "t={seconds}: {distance}");

            let (scale, _, _) = moon.to_scale_rotation_translation();
            assert!(scale.abs_diff_eq(Vec3::splat(0.5), 1e-4));
        }
    }

    #[test]
    fn camera_looks_straight_down() {
        let frame_loop = run_until(0.5);
        let scene = frame_loop.scene();
        let camera = scene.active_camera().unwrap();
        let forward = scene.global_transform(camera).unwrap().forward();
        assert!(forward.abs_diff_eq(Vec3::NEG_Y, 1e-5));

        let draws = &frame_loop.renderer().last().unwrap().draws;
        assert_eq!(draws.len(), 3);
    }
}
