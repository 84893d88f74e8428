//! Frame loop
//!
//! The host calls [`FrameLoop::tick`] once per display refresh with a
//! millisecond timestamp. One tick runs the whole sequence on the calling
//! thread:
//!
//! 1. advance the clock
//! 2. swap in payloads that finished loading
//! 3. apply a pending surface resize to every camera and render target
//! 4. let the [`Demo`] mutate local transforms
//! 5. resolve world transforms (failure aborts the frame)
//! 6. hand the extracted frame to the renderer
//!
//! A demo keeps the loop alive by calling
//! [`FrameContext::request_next_frame`] during its update. Forgetting to do so
//! is not an error: the loop simply halts after that frame.

use crate::error::{FrameError, SceneResult};
use crate::loader::PayloadInbox;
use crate::render::{RenderFrame, Renderer};
use crate::scene::Scene;
use crate::systems::resolve_transforms;
use crate::HostConfig;

/// Monotonic elapsed time derived from host timestamps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    start_ms: Option<f64>,
    last_ms: f64,
    elapsed: f32,
    delta: f32,
    frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the host timestamp (milliseconds). Returns elapsed seconds.
    ///
    /// The first timestamp becomes time zero. A timestamp earlier than the
    /// previous one is clamped so time never runs backwards.
    pub fn advance(&mut self, timestamp_ms: f64) -> f32 {
        let start = *self.start_ms.get_or_insert(timestamp_ms);
        let mut now = timestamp_ms;
        if self.frame > 0 && now < self.last_ms {
            log::warn!(
                "Host timestamp went backwards ({now:.3}ms < {:.3}ms); clamping",
                self.last_ms
            );
            now = self.last_ms;
        }

        let elapsed = ((now - start) * 0.001) as f32;
        self.delta = if self.frame == 0 {
            0.0
        } else {
            elapsed - self.elapsed
        };
        self.elapsed = elapsed;
        self.last_ms = now;
        self.frame += 1;
        elapsed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Number of times the clock has been advanced.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    /// Back to time zero; the next timestamp becomes the new origin.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What a demo sees during one update
#[derive(Debug)]
pub struct FrameContext {
    time: f32,
    delta: f32,
    frame_index: u64,
    next_frame_requested: bool,
}

impl FrameContext {
    pub fn new(time: f32, delta: f32, frame_index: u64) -> Self {
        Self {
            time,
            delta,
            frame_index,
            next_frame_requested: false,
        }
    }

    /// Elapsed seconds since the first frame.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Asks the host for another frame after this one.
    pub fn request_next_frame(&mut self) {
        self.next_frame_requested = true;
    }

    pub fn next_frame_requested(&self) -> bool {
        self.next_frame_requested
    }
}

/// A scene builder plus its per-frame update driver.
///
/// # Lifecycle
///
/// 1. `build` - called once to populate an empty scene
/// 2. `update` - called every frame before the resolve pass
/// 3. `teardown` - called once when the loop is shut down
pub trait Demo {
    fn name(&self) -> &'static str;

    /// Populates the scene: nodes, hierarchy, cameras.
    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()>;

    /// Mutates local transforms for the frame's time.
    ///
    /// Must return promptly and must not read world transforms produced by
    /// the resolver for this frame (use
    /// [`Scene::compute_world_transform`] to aim at moving nodes). Call
    /// `frame.request_next_frame()` to keep running.
    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()>;

    fn teardown(&mut self, _scene: &mut Scene) {}
}

impl<D: Demo + ?Sized> Demo for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn build(&mut self, scene: &mut Scene, config: &HostConfig) -> SceneResult<()> {
        (**self).build(scene, config)
    }

    fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
        (**self).update(scene, frame)
    }

    fn teardown(&mut self, scene: &mut Scene) {
        (**self).teardown(scene)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Frame rendered, another one was requested.
    Continue,
    /// Frame rendered, no further frame requested. The loop is stopped.
    Halted,
    /// The loop was already stopped; nothing ran.
    Stopped,
}

/// Owns a scene, its demo and a renderer, and runs frames on demand.
pub struct FrameLoop<D: Demo, R: Renderer> {
    scene: Scene,
    demo: D,
    renderer: R,
    clock: FrameClock,
    inbox: PayloadInbox,
    pending_resize: Option<(u32, u32)>,
    running: bool,
}

impl<D: Demo, R: Renderer> FrameLoop<D, R> {
    /// Builds the demo's scene and prepares the loop.
    pub fn new(mut demo: D, renderer: R, config: &HostConfig) -> SceneResult<Self> {
        let mut scene = Scene::new();
        scene.set_surface_size(config.width, config.height);
        demo.build(&mut scene, config)?;
        log::info!(
            "Built demo '{}' with {} nodes",
            demo.name(),
            scene.node_count()
        );

        Ok(Self {
            scene,
            demo,
            renderer,
            clock: FrameClock::new(),
            inbox: PayloadInbox::new(),
            pending_resize: None,
            running: true,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access between frames (setup, tests).
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn demo(&self) -> &D {
        &self.demo
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Handle loaders use to deliver finished payloads.
    pub fn inbox(&self) -> PayloadInbox {
        self.inbox.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Records a surface resize; cameras pick it up at the start of the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pending_resize = Some((width, height));
    }

    /// Runs one frame at host timestamp `timestamp_ms`.
    ///
    /// Resolve and render failures are fatal: nothing is rendered for the
    /// frame and the loop stops.
    pub fn tick(&mut self, timestamp_ms: f64) -> Result<FrameStatus, FrameError> {
        if !self.running {
            return Ok(FrameStatus::Stopped);
        }

        let time = self.clock.advance(timestamp_ms);
        let frame_index = self.clock.frames() - 1;

        self.inbox.apply(&mut self.scene);
        if let Some((width, height)) = self.pending_resize.take() {
            self.scene.set_surface_size(width, height);
        }

        let mut ctx = FrameContext::new(time, self.clock.delta(), frame_index);
        if let Err(err) = self.demo.update(&mut self.scene, &mut ctx) {
            self.running = false;
            log::error!("Update failed on frame {frame_index}: {err}");
            return Err(err.into());
        }

        if let Err(err) = resolve_transforms(&mut self.scene) {
            self.running = false;
            log::error!("Aborting frame {frame_index}: {err}");
            return Err(err.into());
        }

        let frame = RenderFrame::extract(&self.scene, frame_index, time);
        if let Err(err) = self.renderer.render(&frame) {
            self.running = false;
            log::error!("Render failed on frame {frame_index}: {err}");
            return Err(err.into());
        }

        if ctx.next_frame_requested() {
            Ok(FrameStatus::Continue)
        } else {
            log::debug!(
                "Demo '{}' did not request another frame; halting after frame {frame_index}",
                self.demo.name()
            );
            self.running = false;
            Ok(FrameStatus::Halted)
        }
    }

    /// Runs the demo's teardown and destroys the scene. Returns the renderer.
    pub fn teardown(mut self) -> R {
        self.demo.teardown(&mut self.scene);
        self.scene.clear();
        log::info!(
            "Tore down demo '{}' after {} frames",
            self.demo.name(),
            self.clock.frames()
        );
        self.renderer
    }
}

/// Summary of a headless run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    /// `true` if the demo stopped requesting frames before the frame limit.
    pub halted: bool,
}

/// Simulated display: issues timestamps at a fixed refresh rate.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    refresh_rate_hz: f64,
    max_frames: u64,
}

impl HeadlessHost {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            refresh_rate_hz: f64::from(config.refresh_rate_hz.max(1)),
            max_frames: config.max_frames,
        }
    }

    /// Timestamp of frame `index`, in milliseconds.
    pub fn timestamp(&self, index: u64) -> f64 {
        index as f64 * 1000.0 / self.refresh_rate_hz
    }

    /// Ticks the loop until it halts or the frame limit is reached.
    pub fn run<D: Demo, R: Renderer>(
        &self,
        frame_loop: &mut FrameLoop<D, R>,
    ) -> Result<RunSummary, FrameError> {
        let mut frames = 0;
        while frames < self.max_frames {
            let status = frame_loop.tick(self.timestamp(frames))?;
            if status == FrameStatus::Stopped {
                break;
            }
            frames += 1;
            if status == FrameStatus::Halted {
                return Ok(RunSummary {
                    frames,
                    halted: true,
                });
            }
        }
        Ok(RunSummary {
            frames,
            halted: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Motion;
    use crate::render::FrameRecorder;
    use crate::scene::{Camera, NodeId, Renderable, Transform};

    /// Spins one cube and keeps running for `frames` frames.
    struct Spinner {
        frames: u64,
        cube: Option<NodeId>,
    }

    impl Demo for Spinner {
        fn name(&self) -> &'static str {
            "spinner"
        }

        fn build(&mut self, scene: &mut Scene, _config: &HostConfig) -> SceneResult<()> {
            let camera = scene.spawn_root(Transform::from_xyz(0.0, 0.0, 2.0));
            scene.set_camera(camera, Camera::default())?;
            scene.set_active_camera(camera)?;

            let cube = scene.spawn_mesh(Transform::IDENTITY, Renderable::new(0, 0));
            scene.add_root(cube)?;
            scene.set_motion(cube, Motion::tumble(1.0))?;
            self.cube = Some(cube);
            Ok(())
        }

        fn update(&mut self, scene: &mut Scene, frame: &mut FrameContext) -> SceneResult<()> {
            scene.apply_motions(frame.time());
            if frame.frame_index() + 1 < self.frames {
                frame.request_next_frame();
            }
            Ok(())
        }
    }

    #[test]
    fn clock_starts_at_zero_and_never_rewinds() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(5000.0), 0.0);
        assert!((clock.advance(6000.0) - 1.0).abs() < 1e-6);
        assert!((clock.delta() - 1.0).abs() < 1e-6);

        assert!((clock.advance(5500.0) - 1.0).abs() < 1e-6);
        assert_eq!(clock.delta(), 0.0);

        clock.reset();
        assert_eq!(clock.advance(100.0), 0.0);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn loop_halts_when_next_frame_not_requested() {
        let config = HostConfig {
            max_frames: 100,
            ..HostConfig::default()
        };
        let demo = Spinner {
            frames: 3,
            cube: None,
        };
        let mut frame_loop = FrameLoop::new(demo, FrameRecorder::new(), &config).unwrap();

        let summary = HeadlessHost::new(&config).run(&mut frame_loop).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                frames: 3,
                halted: true
            }
        );
        assert!(!frame_loop.is_running());
        assert_eq!(frame_loop.tick(1e6), Ok(FrameStatus::Stopped));
        assert_eq!(frame_loop.renderer().frames.len(), 3);
    }

    #[test]
    fn frame_limit_stops_a_running_demo() {
        let config = HostConfig {
            max_frames: 5,
            ..HostConfig::default()
        };
        let demo = Spinner {
            frames: u64::MAX,
            cube: None,
        };
        let mut frame_loop = FrameLoop::new(demo, FrameRecorder::new(), &config).unwrap();

        let summary = HeadlessHost::new(&config).run(&mut frame_loop).unwrap();

        assert_eq!(summary.frames, 5);
        assert!(!summary.halted);
        assert!(frame_loop.is_running());
    }

    #[test]
    fn resize_reaches_cameras_next_frame() {
        let config = HostConfig::default();
        let demo = Spinner {
            frames: u64::MAX,
            cube: None,
        };
        let mut frame_loop = FrameLoop::new(demo, FrameRecorder::new(), &config).unwrap();
        frame_loop.resize(1000, 500);
        frame_loop.tick(0.0).unwrap();

        let frame = frame_loop.renderer().last().unwrap();
        let aspect = frame.camera().unwrap().projection.aspect().unwrap();
        assert!((aspect - 2.0).abs() < 1e-6);
        assert_eq!(frame_loop.scene().surface_size(), (1000, 500));
    }

    #[test]
    fn loaded_payload_appears_next_frame() {
        let config = HostConfig::default();
        let demo = Spinner {
            frames: u64::MAX,
            cube: None,
        };
        let mut frame_loop = FrameLoop::new(demo, FrameRecorder::new(), &config).unwrap();
        let cube = frame_loop.demo().cube.unwrap();
        frame_loop.scene_mut().clear_renderable(cube);

        frame_loop.tick(0.0).unwrap();
        assert!(frame_loop.renderer().last().unwrap().draws.is_empty());

        frame_loop.inbox().deliver(cube, Renderable::new(7, 7));
        frame_loop.tick(16.0).unwrap();
        let draws = &frame_loop.renderer().last().unwrap().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].renderable, Renderable::new(7, 7));
    }

    #[test]
    fn resolve_failure_aborts_frame_and_stops_loop() {
        let config = HostConfig::default();
        let demo = Spinner {
            frames: u64::MAX,
            cube: None,
        };
        let mut frame_loop = FrameLoop::new(demo, FrameRecorder::new(), &config).unwrap();
        frame_loop.tick(0.0).unwrap();

        let cube = frame_loop.demo().cube.unwrap();
        let camera = frame_loop.scene().active_camera().unwrap();
        // A root also listed as someone's child gets reached twice
        frame_loop.scene_mut().link_unchecked(cube, camera);

        let result = frame_loop.tick(16.0);
        assert!(matches!(result, Err(FrameError::Resolve(_))), "{result:?}");
        assert!(!frame_loop.is_running());
        // Nothing was rendered for the failed frame
        assert_eq!(frame_loop.renderer().frames.len(), 1);
    }

    #[test]
    fn teardown_clears_scene() {
        let config = HostConfig::default();
        let demo = Spinner {
            frames: 1,
            cube: None,
        };
        let mut frame_loop = FrameLoop::new(demo, FrameRecorder::new(), &config).unwrap();
        frame_loop.tick(0.0).unwrap();
        let recorder = frame_loop.teardown();
        assert_eq!(recorder.frames.len(), 1);
    }
}
