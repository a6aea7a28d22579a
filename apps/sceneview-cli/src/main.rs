use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use sceneview_common::{DeviceId, Key};
use sceneview_input::{CaptureMode, InputRouter, StaticDevices};
use sceneview_render::RecordingGraphics;
use sceneview_scene::{SceneRegistry, ViewerConfig, ViewerScene};
use sceneview_tools::{TracingOverlay, ViewerInspector};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const KEYBOARD: DeviceId = DeviceId(0);
const MOUSE: DeviceId = DeviceId(1);

#[derive(Parser)]
#[command(name = "sceneview-cli", about = "Headless tools for the SceneView viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter, overrides --verbose (e.g. "sceneview_input=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Viewer configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the viewer frame loop against a recording backend
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f64,
        /// Keys held for the whole run, comma separated (e.g. W,D,ShiftLeft)
        #[arg(long, value_delimiter = ',', value_parser = parse_key)]
        hold: Vec<Key>,
        /// Mouse motion per frame as DX,DY
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        look: Option<Vec2>,
        /// Leave the cursor uncaptured (movement and free-look stay inactive)
        #[arg(long)]
        uncaptured: bool,
        /// Print the camera path as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Debug, Serialize)]
struct FrameSample {
    frame: u32,
    position: [f32; 3],
    yaw: f32,
    pitch: f32,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    frames: u32,
    dt: f64,
    held: Vec<Key>,
    captured: bool,
    models_drawn: usize,
    samples: Vec<FrameSample>,
}

struct SimulateOptions {
    frames: u32,
    dt: f64,
    hold: Vec<Key>,
    look: Option<Vec2>,
    captured: bool,
}

fn parse_key(s: &str) -> Result<Key, String> {
    let name = s.trim();
    let name = match name.chars().next() {
        Some(c) if name.len() == 1 && c.is_ascii_alphabetic() => c.to_ascii_uppercase().to_string(),
        Some(c) if name.len() == 1 && c.is_ascii_digit() => format!("Digit{c}"),
        _ => name.to_string(),
    };
    serde_json::from_value(serde_json::Value::String(name.clone())).map_err(|_| format!("unknown key: {name}"))
}

fn parse_vec2(s: &str) -> Result<Vec2, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected DX,DY, got {s}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad DX: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad DY: {e}"))?;
    Ok(Vec2::new(x, y))
}

fn simulate(config: ViewerConfig, opts: &SimulateOptions) -> anyhow::Result<(SimulationReport, RecordingGraphics)> {
    tracing::debug!(
        frames = opts.frames,
        dt = opts.dt,
        held = ?opts.hold,
        captured = opts.captured,
        "simulation starting"
    );
    let mut router = InputRouter::new();
    router.attach(Some(StaticDevices::single().into_shared()));
    let mut registry = SceneRegistry::new(config);
    let viewer = registry.register(
        "viewer",
        ViewerScene::demo("viewer").with_overlay(Box::new(TracingOverlay::default())),
    )?;
    registry.start(&mut router)?;
    if opts.captured {
        router.set_capture_mode(CaptureMode::Captured);
    }

    let mut cursor = Vec2::ZERO;
    router.mouse_move(MOUSE, cursor);
    for key in &opts.hold {
        router.key_down(KEYBOARD, *key, 0);
    }

    let mut gfx = RecordingGraphics::new();
    let mut samples = Vec::with_capacity(opts.frames as usize);
    for frame in 0..opts.frames {
        if let Some(delta) = opts.look {
            cursor += delta;
            router.mouse_move(MOUSE, cursor);
        }
        registry.frame(opts.dt, &mut router, &mut gfx)?;

        let viewer = viewer.borrow();
        let camera = viewer.camera().context("viewer scene did not load")?;
        let info = ViewerInspector::camera(camera);
        samples.push(FrameSample {
            frame,
            position: info.position,
            yaw: info.yaw,
            pitch: info.pitch,
        });
    }

    let state = router.input_state();
    let report = SimulationReport {
        frames: opts.frames,
        dt: opts.dt,
        held: ViewerInspector::pressed_keys(&state.borrow()),
        captured: router.capture_mode().is_captured(),
        models_drawn: viewer.borrow().models_drawn(),
        samples,
    };
    tracing::info!(frames = report.frames, drawn = report.models_drawn, "simulation finished");
    Ok((report, gfx))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = cli
        .log_level
        .clone()
        .unwrap_or_else(|| (if cli.verbose { "debug" } else { "info" }).to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = ViewerConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("sceneview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", sceneview_input::crate_info());
            println!("render: {}", sceneview_render::crate_info());
            println!("scene: {}", sceneview_scene::crate_info());
            println!("tools: {}", sceneview_tools::crate_info());
        }
        Commands::Simulate {
            frames,
            dt,
            hold,
            look,
            uncaptured,
            json,
        } => {
            let opts = SimulateOptions {
                frames,
                dt,
                hold,
                look,
                captured: !uncaptured,
            };
            let (report, gfx) = simulate(config, &opts)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Simulated {} frames at dt={} (held: {:?}, captured: {})",
                    report.frames, report.dt, opts.hold, report.captured
                );
                let step = (report.samples.len() / 10).max(1);
                for s in report.samples.iter().step_by(step) {
                    println!(
                        "  frame {:>4}: pos=({:.3}, {:.3}, {:.3}) yaw={:.2} pitch={:.2}",
                        s.frame, s.position[0], s.position[1], s.position[2], s.yaw, s.pitch
                    );
                }
                if let Some(last) = report.samples.last() {
                    println!(
                        "Final: pos=({:.3}, {:.3}, {:.3}) yaw={:.2} pitch={:.2}",
                        last.position[0], last.position[1], last.position[2], last.yaw, last.pitch
                    );
                }
                print!("{}", gfx.describe_last_frame());
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(frames: u32, dt: f64, hold: Vec<Key>) -> SimulateOptions {
        SimulateOptions {
            frames,
            dt,
            hold,
            look: None,
            captured: true,
        }
    }

    #[test]
    fn parse_key_names() {
        assert_eq!(parse_key("w"), Ok(Key::W));
        assert_eq!(parse_key("D"), Ok(Key::D));
        assert_eq!(parse_key("ShiftLeft"), Ok(Key::ShiftLeft));
        assert_eq!(parse_key("3"), Ok(Key::Digit3));
        assert!(parse_key("Hyper").is_err());
    }

    #[test]
    fn parse_vec2_pairs() {
        assert_eq!(parse_vec2("5,-2.5"), Ok(Vec2::new(5.0, -2.5)));
        assert!(parse_vec2("5").is_err());
        assert!(parse_vec2("a,1").is_err());
    }

    #[test]
    fn holding_forward_moves_base_speed_per_second() {
        let (report, gfx) = simulate(ViewerConfig::default(), &opts(10, 0.1, vec![Key::W])).unwrap();
        assert_eq!(report.samples.len(), 10);
        let last = report.samples.last().unwrap();
        // Default camera starts at z=3 facing -Z.
        assert!((last.position[2] - (3.0 - 2.5)).abs() < 1e-4);
        assert_eq!(report.held, vec![Key::W]);
        assert_eq!(gfx.frames(), 10);
        assert_eq!(report.models_drawn, 4);
    }

    #[test]
    fn uncaptured_run_stays_put() {
        let mut o = opts(5, 0.1, vec![Key::W]);
        o.captured = false;
        o.look = Some(Vec2::new(10.0, 0.0));
        let (report, _) = simulate(ViewerConfig::default(), &o).unwrap();
        let last = report.samples.last().unwrap();
        assert_eq!(last.position, [0.0, 0.0, 3.0]);
        assert_eq!(last.yaw, -90.0);
    }

    #[test]
    fn look_rotates_each_frame() {
        let mut o = opts(3, 0.016, Vec::new());
        o.look = Some(Vec2::new(10.0, 0.0));
        let (report, _) = simulate(ViewerConfig::default(), &o).unwrap();
        let last = report.samples.last().unwrap();
        assert!((last.yaw - (-90.0 + 3.0 * 10.0 * 0.1)).abs() < 1e-4);
    }

    #[test]
    fn report_serializes() {
        let (report, _) = simulate(ViewerConfig::default(), &opts(2, 0.016, vec![Key::A])).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"held\":[\"A\"]"));
        assert!(json.contains("\"samples\""));
    }
}
