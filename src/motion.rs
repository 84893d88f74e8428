//! Procedural motion rules
//!
//! Every rule maps elapsed time to part of a local transform and holds no
//! state of its own, so replaying the same time sequence always yields the
//! same transforms.

use bevy_ecs::component::Component;
use glam::{Quat, Vec3};

use crate::scene::Transform;

/// Time-driven motion attached to a node.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// `rotation = euler(phase + rates * t)`
    Spin { rates: Vec3, phase: Vec3 },
    /// `rotation.y = t * angular_speed`, carrying children around the node.
    Orbit { angular_speed: f32 },
    /// `translation.y = baseline + amplitude * sin(t * frequency + phase)`
    Bob {
        baseline: f32,
        amplitude: f32,
        frequency: f32,
        phase: f32,
    },
    /// `translation.y = lerp(low, high, |sin(t * frequency + phase)|)`
    Bounce {
        low: f32,
        high: f32,
        frequency: f32,
        phase: f32,
    },
}

impl Motion {
    /// Spin about X and Y at the same rate, the classic rotating-cube motion.
    pub fn tumble(rate: f32) -> Self {
        Motion::Spin {
            rates: Vec3::new(rate, rate, 0.0),
            phase: Vec3::ZERO,
        }
    }

    pub fn spin_y(rate: f32) -> Self {
        Motion::Spin {
            rates: Vec3::new(0.0, rate, 0.0),
            phase: Vec3::ZERO,
        }
    }

    pub fn bob(baseline: f32, amplitude: f32, frequency: f32) -> Self {
        Motion::Bob {
            baseline,
            amplitude,
            frequency,
            phase: 0.0,
        }
    }

    /// Writes this rule's contribution for time `t` (seconds) into `transform`.
    pub fn apply(&self, transform: &mut Transform, t: f32) {
        match *self {
            Motion::Spin { rates, phase } => transform.set_euler(phase + rates * t),
            Motion::Orbit { angular_speed } => {
                transform.rotation = Quat::from_rotation_y(t * angular_speed);
            }
            Motion::Bob {
                baseline,
                amplitude,
                frequency,
                phase,
            } => transform.translation.y = bob(baseline, amplitude, frequency, phase, t),
            Motion::Bounce {
                low,
                high,
                frequency,
                phase,
            } => transform.translation.y = bounce(low, high, frequency, phase, t),
        }
    }
}

pub fn bob(baseline: f32, amplitude: f32, frequency: f32, phase: f32, t: f32) -> f32 {
    baseline + amplitude * (t * frequency + phase).sin()
}

pub fn bounce(low: f32, high: f32, frequency: f32, phase: f32, t: f32) -> f32 {
    lerp(low, high, (t * frequency + phase).sin().abs())
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Wraps `value` into `[min, min + span)`.
#[inline]
pub fn wrap(value: f32, min: f32, span: f32) -> f32 {
    min + (value - min).rem_euclid(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn orbit_rotates_about_y() {
        let mut t = Transform::IDENTITY;
        Motion::Orbit { angular_speed: 1.0 }.apply(&mut t, FRAC_PI_2);
        assert!(t.rotation.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-6));
    }

    #[test]
    fn bob_only_touches_height() {
        let mut t = Transform::from_xyz(3.0, 0.0, -1.0);
        Motion::bob(8.0, 4.0, 2.0).apply(&mut t, 0.25 * std::f32::consts::PI);
        assert!((t.translation - Vec3::new(3.0, 12.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn bounce_stays_in_range() {
        for i in 0..100 {
            let y = bounce(-2.0, 2.0, 2.0, 0.5, i as f32 * 0.037);
            assert!((-2.0..=2.0).contains(&y));
        }
    }

    #[test]
    fn spin_is_pure_in_time() {
        let motion = Motion::tumble(1.1);
        let mut a = Transform::IDENTITY;
        let mut b = Transform::from_xyz(1.0, 0.0, 0.0);
        motion.apply(&mut a, 3.0);
        motion.apply(&mut b, 7.0);
        motion.apply(&mut b, 3.0);
        assert_eq!(a.rotation, b.rotation);
    }

    #[test]
    fn wrap_handles_negative_offsets() {
        assert!((wrap(-4.5, -4.0, 10.0) - 5.5).abs() < 1e-5);
        assert!((wrap(3.0, -4.0, 10.0) - 3.0).abs() < 1e-5);
        assert!((wrap(6.0, -4.0, 10.0) - -4.0).abs() < 1e-5);
    }
}
