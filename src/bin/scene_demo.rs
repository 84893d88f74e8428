//! Headless demo runner
//!
//! Builds one of the demo scenes and drives it at a simulated display refresh
//! rate, logging a summary of every rendered frame.
//!
//! ```bash
//! # Show help
//! scene_demo --help
//!
//! # Watch the tank for ten seconds at 60 Hz
//! RUST_LOG=info scene_demo --demo tank --max-frames 600
//!
//! # Solar system on a square surface
//! scene_demo --demo solar-system --width 800 --height 800
//! ```

use std::process::ExitCode;

use clap::Parser;
use scene_engine::{DemoKind, FrameLoop, HeadlessHost, HostConfig, LogRenderer};

/// Demo selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliDemo {
    /// Three spinning cubes.
    #[default]
    Fundamentals,
    /// Sun, earth and moon on nested orbits.
    SolarSystem,
    /// Tank following a path and aiming at a moving target.
    Tank,
    /// Spheres bouncing around a ring.
    BouncingSpheres,
    /// Snow falling around a tree.
    SnowGlobe,
    /// Two cameras on one scene, side by side.
    SplitView,
    /// Cube textured with a live render of another scene.
    RenderToTexture,
}

impl From<CliDemo> for DemoKind {
    fn from(cli: CliDemo) -> Self {
        match cli {
            CliDemo::Fundamentals => DemoKind::Fundamentals,
            CliDemo::SolarSystem => DemoKind::SolarSystem,
            CliDemo::Tank => DemoKind::Tank,
            CliDemo::BouncingSpheres => DemoKind::BouncingSpheres,
            CliDemo::SnowGlobe => DemoKind::SnowGlobe,
            CliDemo::SplitView => DemoKind::SplitView,
            CliDemo::RenderToTexture => DemoKind::RenderToTexture,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "scene_demo", version, about = "Run a scene-graph demo headlessly")]
struct Cli {
    /// Demo scene to run.
    #[arg(long, value_enum, default_value_t = CliDemo::Fundamentals)]
    demo: CliDemo,

    /// Surface width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Surface height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Simulated display refresh rate.
    #[arg(long = "refresh-rate", default_value_t = 60)]
    refresh_rate: u32,

    /// Stop after this many frames.
    #[arg(long = "max-frames", default_value_t = 600)]
    max_frames: u64,
}

impl Cli {
    fn host_config(&self) -> HostConfig {
        let kind = DemoKind::from(self.demo);
        HostConfig {
            title: format!("Scene Engine - {kind}"),
            width: self.width,
            height: self.height,
            refresh_rate_hz: self.refresh_rate,
            max_frames: self.max_frames,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.host_config();
    let kind = DemoKind::from(cli.demo);
    log::info!("Starting {}", config.title);

    let mut frame_loop = match FrameLoop::new(kind.create(), LogRenderer::new(), &config) {
        Ok(frame_loop) => frame_loop,
        Err(err) => {
            log::error!("Failed to build demo '{kind}': {err}");
            return ExitCode::FAILURE;
        }
    };

    let host = HeadlessHost::new(&config);
    let result = host.run(&mut frame_loop);
    let renderer = frame_loop.teardown();

    match result {
        Ok(summary) => {
            log::info!(
                "Rendered {} frames ({})",
                renderer.frames(),
                if summary.halted {
                    "demo halted"
                } else {
                    "frame limit reached"
                }
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Frame loop stopped: {err}");
            ExitCode::FAILURE
        }
    }
}
