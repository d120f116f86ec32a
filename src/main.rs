//! Odori - Procedural Avatar Animation Demo Driver
//!
//! Runs one animation session headlessly at a fixed frame rate and logs a
//! once-per-second summary of the composited frame targets.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use odori::{
    ActivityState, AnimationSession, Axis, BoneRotation, ClipTable, Config, GestureClip,
    ProceduralModifier, ReactionStep, StepAction,
};

/// Odori - Procedural Avatar Animation Demo Driver
#[derive(Parser, Debug)]
#[command(name = "odori", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gesture clip table (TOML); a built-in demo set is used when absent
    #[arg(long)]
    clips: Option<PathBuf>,

    /// Idle preset name from the config's [idle_presets] table
    #[arg(short, long)]
    preset: Option<String>,

    /// Host activity state (idle, talking, listening, thinking)
    #[arg(short, long, default_value = "idle", value_parser = parse_activity)]
    activity: ActivityState,

    /// Frames per second to tick at
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Stop after this many seconds instead of running until Ctrl+C
    #[arg(short, long)]
    duration: Option<f32>,

    /// Walk speed in stride cycles per second (0 disables the walk layer)
    #[arg(short, long, default_value_t = 0.0)]
    walk: f32,

    /// RNG seed for reproducible idle motion
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_activity(s: &str) -> Result<ActivityState, String> {
    match s.to_ascii_lowercase().as_str() {
        "idle" => Ok(ActivityState::Idle),
        "talking" => Ok(ActivityState::Talking),
        "listening" => Ok(ActivityState::Listening),
        "thinking" => Ok(ActivityState::Thinking),
        other => Err(format!("unknown activity state '{}'", other)),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", odori::NAME, odori::VERSION);

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(ref preset) = args.preset {
        let preset_config = config.idle_preset(preset).clone();
        config.idle = preset_config;
        info!("Idle preset: {}", preset);
    }

    // Validate configuration
    config.validate()?;

    // Load the clip table
    let clips = if let Some(ref path) = args.clips {
        ClipTable::from_file(path)?
    } else {
        demo_clips()
    };
    info!("Loaded {} gesture clips", clips.len());

    info!("Activity: {}", args.activity);
    info!("Breathing: {}", config.idle.breathing.enabled);
    info!("Blinking: {}", config.idle.blinking.enabled);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_session(&args, config, clips))?;

    info!("Odori stopped");
    Ok(())
}

/// Tick the session until the duration limit or a shutdown signal.
async fn run_session(args: &Args, config: Config, clips: ClipTable) -> anyhow::Result<()> {
    let mut session = match args.seed {
        Some(seed) => AnimationSession::with_seed(config, clips, seed),
        None => AnimationSession::new(config, clips),
    };

    session.set_activity(args.activity);
    session.set_walk_speed(args.walk);
    if args.walk > 0.0 {
        info!("Walk cycle enabled (speed {:.2})", args.walk);
    }

    // Script a short opening so the first seconds always show motion
    session.enqueue_gesture("wave", None);
    session.execute_reaction_steps(&demo_reaction());

    let fps = args.fps.max(1.0);
    let frame_dt = 1.0 / fps;
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs_f32(frame_dt));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!("Ticking at {:.0} fps", fps);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut next_report = 1.0f32;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let _ = session.tick(frame_dt);

                if session.clock() >= next_report {
                    next_report = session.clock().floor() + 1.0;
                    let targets = session.targets();
                    info!(
                        "t={:.2}s bones={} expressions={} offset={:+.4} gesture={} queued={} pending={}",
                        session.clock(),
                        targets.bone_count(),
                        targets.expression_count(),
                        targets.vertical_offset,
                        session.current_gesture().unwrap_or("-"),
                        session.queued_gestures(),
                        session.pending_reactions(),
                    );
                }

                if let Some(limit) = args.duration {
                    if session.clock() >= limit {
                        info!("Run duration reached ({:.1}s)", limit);
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Built-in clip set covering every gesture the idle cycle can request.
fn demo_clips() -> ClipTable {
    let mut table = ClipTable::new();

    table.add(
        GestureClip::new("wave")
            .with_duration(1.5)
            .with_transition_speed(2.0)
            .with_bone("rightUpperArm", BoneRotation::new(0.0, 0.0, -2.2))
            .with_bone("rightLowerArm", BoneRotation::new(0.0, 0.0, -0.6))
            .with_modifier(ProceduralModifier::Sinusoid {
                bone: "rightLowerArm".to_string(),
                axis: Axis::Z,
                freq: 2.0,
                amp: 0.35,
                phase_offset: 0.0,
            }),
    );
    table.add(
        GestureClip::new("bow")
            .with_duration(2.0)
            .with_bone("spine", BoneRotation::new(0.7, 0.0, 0.0))
            .with_bone("head", BoneRotation::new(0.35, 0.0, 0.0)),
    );
    table.add(
        GestureClip::new("nod")
            .with_duration(0.8)
            .with_transition_speed(2.5)
            .with_bone("head", BoneRotation::new(0.3, 0.0, 0.0)),
    );
    table.add(
        GestureClip::new("head_tilt")
            .with_duration(1.2)
            .with_bone("head", BoneRotation::new(0.0, 0.0, 0.25)),
    );
    table.add(
        GestureClip::new("sway")
            .with_duration(1.6)
            .with_bone("hips", BoneRotation::new(0.0, 0.0, 0.12))
            .with_bone("spine", BoneRotation::new(0.0, 0.0, 0.08)),
    );
    table.add(
        GestureClip::new("hand_wave")
            .with_duration(1.2)
            .with_intensity(0.8)
            .with_bone("rightUpperArm", BoneRotation::new(0.0, 0.0, -1.8))
            .with_modifier(ProceduralModifier::Sinusoid {
                bone: "rightUpperArm".to_string(),
                axis: Axis::Z,
                freq: 1.5,
                amp: 0.2,
                phase_offset: 0.0,
            }),
    );
    table.add(
        GestureClip::new("shoulder_shrug")
            .with_duration(1.0)
            .with_bone("leftShoulder", BoneRotation::new(0.0, 0.0, 0.35))
            .with_bone("rightShoulder", BoneRotation::new(0.0, 0.0, -0.35)),
    );

    table
}

/// Scripted multi-step reaction fired a couple of seconds in.
fn demo_reaction() -> Vec<ReactionStep> {
    vec![
        ReactionStep::new(StepAction::Expression {
            name: "surprised".to_string(),
            weight: 0.9,
        })
        .with_delay(2.0),
        ReactionStep::new(StepAction::Pose {
            bones: HashMap::from([("spine".to_string(), [12.0, 0.0, 0.0])]),
        })
        .with_delay(0.4)
        .with_duration(1.0),
        ReactionStep::new(StepAction::Gesture {
            name: "nod".to_string(),
        })
        .with_delay(0.2),
        ReactionStep::new(StepAction::Expression {
            name: "surprised".to_string(),
            weight: 0.0,
        })
        .with_delay(1.0),
    ]
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
