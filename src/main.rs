//! Dune runner headless driver.
//!
//! Runs a scripted session against the core library without a window:
//!
//! 1. Load `config.ini` and the JSON sound bank (built-in cues if missing)
//! 2. Build the ECS world with [`dunerunner::game::setup`] and start the
//!    headless audio thread
//! 3. Step a fixed number of frames, publishing the lifecycle signals a
//!    player would trigger (start, dialogue pass, pause, hit, restart, ending)
//! 4. Log a summary and join the audio thread
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --frames 900 --seed 7
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};

use dunerunner::components::spawner::Spawner;
use dunerunner::error::ConfigError;
use dunerunner::events::signal::Signal;
use dunerunner::game::{self, SessionStats};
use dunerunner::resources::audio::{setup_audio, shutdown_audio};
use dunerunner::resources::eventbus::publish_signal;
use dunerunner::resources::gameconfig::GameConfig;
use dunerunner::resources::soundbank::SoundBank;
use dunerunner::systems::time::update_world_time;

/// Cues used when no sound bank file is available.
const BUILTIN_BANK: &str = r#"[
    { "name": "theme", "category": "music", "clips": ["theme.ogg"], "volume": 0.8, "priority": 0, "looped": true },
    { "name": "hit", "category": "sfx", "clips": ["hit1.wav", "hit2.wav"], "priority": 64, "length": 0.4 },
    { "name": "step", "category": "sfx", "clips": ["step1.wav", "step2.wav", "step3.wav"], "volume": 0.5, "priority": 200, "length": 0.25, "allow_concurrent": true }
]"#;

/// Dune runner headless session
#[derive(Parser)]
#[command(version, about = "Runs a scripted headless dune runner session")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON sound bank; overrides `[audio] sound_bank`.
    #[arg(long, value_name = "PATH")]
    sounds: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 1200)]
    frames: u32,

    /// Seed for every random source; overrides `[session] seed`.
    #[arg(long)]
    seed: Option<u64>,
}

/// Signal published at a given frame of the scripted session.
fn scripted_signal(frame: u32, frames: u32) -> Option<Signal> {
    let at = |fraction: f32| (frames as f32 * fraction) as u32;
    match frame {
        0 => Some(Signal::game_start()),
        f if f == at(0.05) => Some(Signal::first_dialogue_pass()),
        f if f == at(0.40) => Some(Signal::game_pause(true)),
        f if f == at(0.45) => Some(Signal::game_pause(false)),
        f if f == at(0.60) => Some(Signal::cactus_hit()),
        f if f == at(0.61) => Some(Signal::game_over()),
        f if f == at(0.65) => Some(Signal::game_restart()),
        f if f == at(0.70) => Some(Signal::volume_change(0.5)),
        f if f == at(0.95) => Some(Signal::game_ending()),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    match config.load_from_file() {
        Ok(()) => {}
        Err(e @ ConfigError::Io(_)) => warn!("{}; using defaults", e),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(path) = cli.sounds {
        config.sound_bank = path;
    }

    let bank = match SoundBank::load_from_file(&config.sound_bank) {
        Ok(bank) => bank,
        Err(e) => {
            warn!("{}; using built-in cues", e);
            match SoundBank::from_json_str(BUILTIN_BANK) {
                Ok(bank) => bank,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut world = World::new();
    let obstacles = match game::setup(&mut world, &config, bank) {
        Ok(entity) => entity,
        Err(e) => {
            error!("Failed to set up session: {}", e);
            std::process::exit(1);
        }
    };
    setup_audio(&mut world);

    let mut update = game::build_schedule();
    if let Err(e) = update.initialize(&mut world) {
        error!("Failed to initialize schedule: {}", e);
        std::process::exit(1);
    }

    // --------------- Main loop ---------------
    for frame in 0..cli.frames {
        update_world_time(&mut world, config.frame_dt);
        if let Some(signal) = scripted_signal(frame, cli.frames) {
            info!("frame {}: {:?}", frame, signal.kind);
            publish_signal(&mut world, &signal);
        }
        update.run(&mut world);
        world.clear_trackers();
    }

    let stats = world.get_resource::<SessionStats>().cloned().unwrap_or_default();
    if let Some(spawner) = world.get::<Spawner>(obstacles) {
        info!(
            "Obstacles: pool of {} ({} active), interval {:.2}s, speed {:.2}",
            spawner.len(),
            spawner.active_count(),
            spawner.spawn_interval(),
            spawner.speed()
        );
    }
    info!(
        "Session: {} accelerations, {} hits, {} restarts, ended={}",
        stats.accelerations, stats.hits, stats.restarts, stats.ended
    );
    if let Some(commands) = shutdown_audio(&mut world) {
        info!("Audio backend handled {} commands", commands);
    }
}
