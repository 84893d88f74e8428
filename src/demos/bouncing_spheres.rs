//! Spheres bouncing around a wandering ring.
//!
//! Each sphere hangs off a base node that slides across the ground; a flat
//! shadow quad shares the base, so moving the base moves both.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;

use crate::error::SceneResult;
use crate::frame::{Demo, FrameContext};
use crate::motion::Motion;
use crate::scene::{Camera, NodeId, Renderable, Scene, Transform};
use crate::HostConfig;

use super::{meshes, spawn_camera};

const SPHERE_RADIUS: f32 = 1.0;
/// Resting height of a sphere above its base.
const REST_HEIGHT: f32 = SPHERE_RADIUS + 2.0;
const SHADOW_SIZE: f32 = SPHERE_RADIUS * 4.0;

const GROUND: usize = 0;
const SHADOW: usize = 1;
const SPHERE: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub base: NodeId,
    pub sphere: NodeId,
    pub shadow: NodeId,
}

#[derive(Debug)]
pub struct BouncingSpheres {
    count: usize,
    balls: Vec<Ball>,
}

impl Default for BouncingSpheres {
    fn default() -> Self {
        Self::with_count(15)
    }
}

impl BouncingSpheres {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            balls: Vec::with_capacity(count),
        }
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    /// Position of ball `index`'s base on the ground at `time`.
    pub fn base_position(index: usize, count: usize, time: f32) -> Vec3 {
        let u = index as f32 / count.max(1) as f32;
        let speed = time * 0.2;
        let angle = speed - u * TAU;
        let radius = (speed - index as f32).sin() * 10.0;
        Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
    }
}

impl Demo for BouncingSpheres {
    fn name(&self) -> &'static str {
        "bouncing-spheres"
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        spawn_camera(
            scene,
            "camera",
            Transform::from_xyz(0.0, 10.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
            Camera::perspective(45.0, config.aspect(), 0.1, 100.0),
        )?;

        let ground = scene.spawn_mesh(
            Transform::IDENTITY.with_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
            Renderable::new(meshes::PLANE, GROUND),
        );
        scene.set_name(ground, "ground")?;
        scene.add_root(ground)?;

        self.balls.clear();
        for index in 0..self.count {
            let base = scene.spawn_root(Transform::IDENTITY);

            // Just above the ground so it never fights with it
            let shadow = scene.spawn_mesh(
                Transform::from_xyz(0.0, 0.001, 0.0)
                    .with_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
                    .with_scale(Vec3::splat(SHADOW_SIZE)),
                Renderable::new(meshes::PLANE, SHADOW),
            );
            scene.add_child(base, shadow)?;

            let sphere = scene.spawn_mesh(
                Transform::from_xyz(0.0, REST_HEIGHT, 0.0),
                Renderable::new(meshes::SPHERE, SPHERE + index),
            );
            scene.add_child(base, sphere)?;
            scene.set_motion(
                sphere,
                Motion::Bounce {
                    low: REST_HEIGHT - 2.0,
                    high: REST_HEIGHT + 2.0,
                    frequency: 2.0,
                    phase: index as f32,
                },
            )?;

            self.balls.push(Ball {
                base,
                sphere,
                shadow,
            });
        }
        log::debug!("Spawned {} bouncing spheres", self.balls.len());
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        let time = frame.time();
        scene.apply_motions(time);
        let count = self.balls.len();
        for (index, ball) in self.balls.iter().enumerate() {
            let position = Self::base_position(index, count, time);
            scene.update_transform(ball.base, |t| t.translation = position)?;
        }
        frame.request_next_frame();
        Ok(())
    }
}
