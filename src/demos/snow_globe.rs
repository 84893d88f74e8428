//! Snow falling around a small tree.
//!
//! Flakes are scattered once from a seeded generator. From then on each
//! flake's transform is a closed-form function of time: it spins at a fixed
//! rate and falls at a fixed speed, wrapping back to the top when it drops
//! below the floor. The two halves of the flake set spin in opposite
//! directions and fall at slightly different speeds.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::motion::{wrap, Motion};
use crate::scene::{Camera, NodeId, Renderable, Scene, Transform};
use crate::HostConfig;

use super::{meshes, spawn_camera};

const DEFAULT_FLAKES: usize = 9000;
const DEFAULT_SEED: u64 = 0x5EED_F1A4;

/// Horizontal extent of the flake cloud.
const SPREAD_XZ: f32 = 40.0;
/// Vertical extent of the initial scatter.
const SPREAD_Y: f32 = 20.0;
const FLOOR: f32 = -4.0;
/// Slow turn of the whole snow group about Y, radians per second.
const SNOW_DRIFT: f32 = -0.054;

const WHITE: usize = 0;
const TRUNK: usize = 1;
const LEAVES: usize = 2;

/// How one half of the flake set moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlakeMotion {
    /// Euler spin rates, radians per second.
    pub spin: Vec3,
    /// Fall speed, units per second.
    pub fall_speed: f32,
    /// Height a flake climbs back up by when it passes the floor.
    pub wrap_span: f32,
}

impl FlakeMotion {
    pub const FIRST_HALF: Self = Self {
        spin: Vec3::new(1.2, 0.6, 1.8),
        fall_speed: 1.08,
        wrap_span: 10.0,
    };

    pub const SECOND_HALF: Self = Self {
        spin: Vec3::new(-1.8, -1.8, -1.2),
        fall_speed: 0.96,
        wrap_span: 9.5,
    };

    /// Local transform of a flake that started at `origin`, at `time`.
    ///
    /// A flake scattered above the wrap band falls freely until it first
    /// passes the floor; only then does it start cycling through the band.
    pub fn transform_at(&self, origin: Vec3, time: f32) -> Transform {
        let fallen = origin.y - self.fall_speed * time;
        let y = if fallen >= FLOOR {
            fallen
        } else {
            wrap(fallen, FLOOR, self.wrap_span)
        };
        Transform::from_xyz(origin.x, y, origin.z).with_euler(self.spin * time)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Flake {
    pub node: NodeId,
    pub origin: Vec3,
    pub motion: FlakeMotion,
}

#[derive(Debug)]
pub struct SnowGlobe {
    flake_count: usize,
    seed: u64,
    snow: Option<NodeId>,
    flakes: Vec<Flake>,
}

impl Default for SnowGlobe {
    fn default() -> Self {
        Self::with_flakes(DEFAULT_FLAKES, DEFAULT_SEED)
    }
}

impl SnowGlobe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flakes(flake_count: usize, seed: u64) -> Self {
        Self {
            flake_count,
            seed,
            snow: None,
            flakes: Vec::with_capacity(flake_count),
        }
    }

    pub fn flakes(&self) -> &[Flake] {
        &self.flakes
    }

    /// Group node all flakes hang off.
    pub fn snow(&self) -> Option<NodeId> {
        self.snow
    }

    fn build_tree(scene: &mut Scene) -> SceneResult<NodeId> {
        let tree = scene.spawn_root(Transform::from_xyz(0.0, -1.3, 0.0));
        scene.set_name(tree, "tree")?;

        let trunk = scene.spawn_mesh(Transform::IDENTITY, Renderable::new(meshes::CYLINDER, TRUNK));
        scene.add_child(tree, trunk)?;

        for y in [1.2, 2.2, 3.2] {
            let leaves = scene.spawn_mesh(
                Transform::from_xyz(0.0, y, 0.0),
                Renderable::new(meshes::CONE, LEAVES),
            );
            scene.add_child(tree, leaves)?;
        }
        Ok(tree)
    }
}

impl Demo for SnowGlobe {
    fn name(&self) -> &'static str {
        "snow-globe"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        spawn_camera(
            scene,
            "camera",
            Transform::from_xyz(0.0, 1.0, 15.0).looking_at(Vec3::ZERO, Vec3::Y),
            Camera::perspective(75.0, config.aspect(), 1.0, 50.0),
        )?;

        let snow = scene.spawn_root(Transform::IDENTITY);
        scene.set_name(snow, "snow")?;
        scene.set_motion(snow, Motion::spin_y(SNOW_DRIFT))?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let half = self.flake_count / 2;
        self.flakes.clear();
        for index in 0..self.flake_count {
            let origin = Vec3::new(
                (rng.random::<f32>() - 0.5) * SPREAD_XZ,
                (rng.random::<f32>() - 0.5) * SPREAD_Y,
                (rng.random::<f32>() - 0.5) * SPREAD_XZ,
            );
            let motion = if index < half {
                FlakeMotion::FIRST_HALF
            } else {
                FlakeMotion::SECOND_HALF
            };

            let node = scene.spawn_mesh(
                motion.transform_at(origin, 0.0),
                Renderable::new(meshes::TETRAHEDRON, WHITE),
            );
            scene.add_child(snow, node)?;
            self.flakes.push(Flake {
                node,
                origin,
                motion,
            });
        }
        self.snow = Some(snow);

        let ground = scene.spawn_mesh(
            Transform::from_xyz(0.0, -1.8, 0.0).with_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
            Renderable::new(meshes::CIRCLE, WHITE),
        );
        scene.set_name(ground, "ground")?;
        scene.add_root(ground)?;

        Self::build_tree(scene)?;

        log::debug!(
            "Scattered {} flakes with seed {:#x}",
            self.flakes.len(),
            self.seed
        );
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        let time = frame.time();
        scene.apply_motions(time);
        for flake in &self.flakes {
            scene.set_transform(flake.node, flake.motion.transform_at(flake.origin, time))?;
        }
        frame.request_next_frame();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLoop;
    use crate::render::NullRenderer;

    fn run(demo: SnowGlobe, timestamps: &[f64]) -> FrameLoop<SnowGlobe, NullRenderer> {
        let mut frame_loop = FrameLoop::new(demo, NullRenderer, &HostConfig::default()).unwrap();
        for &ms in timestamps {
            frame_loop.tick(ms).unwrap();
        }
        frame_loop
    }

    #[test]
    fn same_seed_scatters_identically() {
        let a = run(SnowGlobe::with_flakes(64, 7), &[0.0]);
        let b = run(SnowGlobe::with_flakes(64, 7), &[0.0]);
        let c = run(SnowGlobe::with_flakes(64, 8), &[0.0]);

        let origins = |l: &FrameLoop<SnowGlobe, NullRenderer>| -> Vec<Vec3> {
            l.demo().flakes().iter().map(|f| f.origin).collect()
        };
        assert_eq!(origins(&a), origins(&b));
        assert_ne!(origins(&a), origins(&c));
    }

    #[test]
    fn flakes_fall_then_cycle_through_the_band() {
        let frame_loop = run(SnowGlobe::with_flakes(200, 1), &[0.0, 3_000.0, 47_500.0]);
        let scene = frame_loop.scene();
        for flake in frame_loop.demo().flakes() {
            let local = scene.transform(flake.node).unwrap();
            let top = FLOOR + flake.motion.wrap_span;
            // Anything scattered high enough is still above the band after 47.5s
            let free_fall = flake.origin.y - flake.motion.fall_speed * 47.5;
            if free_fall >= FLOOR {
                assert!((local.translation.y - free_fall).abs() < 1e-3);
            } else {
                assert!(local.translation.y >= FLOOR);
                assert!(local.translation.y < top + 1e-4);
            }
            assert_eq!(local.translation.x, flake.origin.x);
            assert_eq!(local.translation.z, flake.origin.z);
        }
    }

    #[test]
    fn high_flake_keeps_its_height_until_it_passes_the_floor() {
        let motion = FlakeMotion::FIRST_HALF;
        let origin = Vec3::new(1.0, 9.5, -2.0);

        let start = motion.transform_at(origin, 0.0);
        assert_eq!(start.translation, origin);

        // Still above the band top after two seconds, no wrap yet
        let early = motion.transform_at(origin, 2.0);
        assert!((early.translation.y - (9.5 - 2.16)).abs() < 1e-4);

        // Falling 14 units lands half a unit below the floor
        let wrapped = motion.transform_at(origin, 14.0 / motion.fall_speed);
        let expected = FLOOR - 0.5 + motion.wrap_span;
        assert!((wrapped.translation.y - expected).abs() < 1e-3);
    }

    #[test]
    fn replaying_a_time_gives_the_same_frame() {
        // Skipping straight to 12s lands where stepping through frames does
        let stepped = run(
            SnowGlobe::with_flakes(50, 3),
            &[0.0, 4_000.0, 8_000.0, 12_000.0],
        );
        let jumped = run(SnowGlobe::with_flakes(50, 3), &[0.0, 12_000.0]);

        for (a, b) in stepped
            .demo()
            .flakes()
            .iter()
            .zip(jumped.demo().flakes())
        {
            let wa = stepped.scene().global_transform(a.node).unwrap();
            let wb = jumped.scene().global_transform(b.node).unwrap();
            assert!(wa.abs_diff_eq(&wb, 1e-4));
        }
    }

    #[test]
    fn halves_spin_in_opposite_directions() {
        let globe = run(SnowGlobe::with_flakes(10, 0), &[0.0]);
        let flakes = globe.demo().flakes();
        assert_eq!(flakes[0].motion, FlakeMotion::FIRST_HALF);
        assert_eq!(flakes[9].motion, FlakeMotion::SECOND_HALF);
        assert!(FlakeMotion::FIRST_HALF.spin.cmpgt(Vec3::ZERO).all());
        assert!(FlakeMotion::SECOND_HALF.spin.cmplt(Vec3::ZERO).all());
    }
}
