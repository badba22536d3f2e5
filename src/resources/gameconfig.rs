//! Session configuration resource.
//!
//! Settings are loaded from an INI file. Every value has a safe default, so a
//! missing file section or key simply keeps the default; a value that is
//! present but cannot be parsed or is out of range is a [`ConfigError`].
//!
//! # Configuration File Format
//!
//! ```ini
//! [session]
//! seed = 7
//! frame_dt = 0.016
//!
//! [spawner]
//! templates = cactus_small, cactus_tall, cactus_group:3
//! pool_size = 5
//! interval = 1.0
//! spawn_on_start = false
//! speed = 3.0
//!
//! [accelerator]
//! period = 3.0
//! interval_step = 0.2
//! min_interval = 0.5
//! speed_step = 0.2
//! max_speed = 10.0
//!
//! [audio]
//! music_channels = 1
//! sfx_channels = 3
//! mute_music = false
//! mute_sfx = false
//! master_volume = 1.0
//! sound_bank = ./sounds.json
//! ```
//!
//! A template written `name:N` is a group of `N` members laid out in a row,
//! [`GROUP_MEMBER_SPACING`] apart.

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::info;
use std::path::PathBuf;

use crate::components::pooled::SpawnTemplate;
use crate::error::ConfigError;
use crate::resources::audiochannel::MAX_CHANNELS;

/// Default safe values for startup
const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_TEMPLATES: [&str; 3] = ["cactus_small", "cactus_tall", "cactus_group:3"];
const DEFAULT_POOL_SIZE: usize = 5;
const DEFAULT_SPAWN_INTERVAL: f32 = 1.0;
const DEFAULT_SPEED: f32 = 3.0;
const DEFAULT_ACCEL_PERIOD: f32 = 3.0;
const DEFAULT_INTERVAL_STEP: f32 = 0.2;
const DEFAULT_MIN_INTERVAL: f32 = 0.5;
const DEFAULT_SPEED_STEP: f32 = 0.2;
const DEFAULT_MAX_SPEED: f32 = 10.0;
const DEFAULT_MUSIC_CHANNELS: usize = 1;
const DEFAULT_SFX_CHANNELS: usize = 3;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_SOUND_BANK: &str = "./sounds.json";

/// Horizontal distance between the members of a group template.
pub const GROUP_MEMBER_SPACING: f32 = 1.5;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Seed for every random source; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Fixed frame delta of the headless driver, in seconds.
    pub frame_dt: f32,
    pub templates: Vec<String>,
    pub pool_size: usize,
    pub spawn_interval: f32,
    pub spawn_on_start: bool,
    pub speed: f32,
    pub accel_period: f32,
    pub interval_step: f32,
    pub min_interval: f32,
    pub speed_step: f32,
    pub max_speed: f32,
    pub music_channels: usize,
    pub sfx_channels: usize,
    pub mute_music: bool,
    pub mute_sfx: bool,
    pub master_volume: f32,
    pub sound_bank: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(section: &'static str, key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        section,
        key,
        reason: reason.into(),
    }
}

fn get_uint(config: &Ini, section: &'static str, key: &'static str) -> Result<Option<u64>, ConfigError> {
    config.getuint(section, key).map_err(|e| invalid(section, key, e))
}

fn get_float(config: &Ini, section: &'static str, key: &'static str) -> Result<Option<f32>, ConfigError> {
    config
        .getfloat(section, key)
        .map(|v| v.map(|f| f as f32))
        .map_err(|e| invalid(section, key, e))
}

fn get_bool(config: &Ini, section: &'static str, key: &'static str) -> Result<Option<bool>, ConfigError> {
    config.getbool(section, key).map_err(|e| invalid(section, key, e))
}

fn parse_template(text: &str) -> Result<SpawnTemplate, ConfigError> {
    match text.split_once(':') {
        None => Ok(SpawnTemplate::single(text)),
        Some((name, count)) => {
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| invalid("spawner", "templates", format!("bad member count in '{text}'")))?;
            if count == 0 {
                return Err(invalid("spawner", "templates", format!("'{text}' has no members")));
            }
            let offsets = (0..count).map(|i| Vec2::new(i as f32 * GROUP_MEMBER_SPACING, 0.0));
            Ok(SpawnTemplate::group(name.trim(), offsets))
        }
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            seed: None,
            frame_dt: DEFAULT_FRAME_DT,
            templates: DEFAULT_TEMPLATES.iter().map(|s| s.to_string()).collect(),
            pool_size: DEFAULT_POOL_SIZE,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            spawn_on_start: false,
            speed: DEFAULT_SPEED,
            accel_period: DEFAULT_ACCEL_PERIOD,
            interval_step: DEFAULT_INTERVAL_STEP,
            min_interval: DEFAULT_MIN_INTERVAL,
            speed_step: DEFAULT_SPEED_STEP,
            max_speed: DEFAULT_MAX_SPEED,
            music_channels: DEFAULT_MUSIC_CHANNELS,
            sfx_channels: DEFAULT_SFX_CHANNELS,
            mute_music: false,
            mute_sfx: false,
            master_volume: 1.0,
            sound_bank: PathBuf::from(DEFAULT_SOUND_BANK),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| ConfigError::Io(format!("Failed to load config file: {}", e)))?;
        self.apply_all(&config)?;
        info!(
            "Loaded config from {:?}: {} templates, pool={}, interval={}s, channels music={} sfx={}",
            self.config_path,
            self.templates.len(),
            self.pool_size,
            self.spawn_interval,
            self.music_channels,
            self.sfx_channels
        );
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| ConfigError::Io(format!("Failed to parse config: {}", e)))?;
        self.apply_all(&config)
    }

    // Values are applied to a copy so a rejected key leaves `self` untouched.
    fn apply_all(&mut self, config: &Ini) -> Result<(), ConfigError> {
        let mut next = self.clone();
        next.apply(config)?;
        *self = next;
        Ok(())
    }

    fn apply(&mut self, config: &Ini) -> Result<(), ConfigError> {
        // [session] section
        if let Some(seed) = get_uint(config, "session", "seed")? {
            self.seed = Some(seed);
        }
        if let Some(dt) = get_float(config, "session", "frame_dt")? {
            if dt.is_nan() || dt <= 0.0 {
                return Err(invalid("session", "frame_dt", "must be positive"));
            }
            self.frame_dt = dt;
        }

        // [spawner] section
        if let Some(list) = config.get("spawner", "templates") {
            let templates: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if templates.is_empty() {
                return Err(invalid("spawner", "templates", "no template listed"));
            }
            for t in &templates {
                parse_template(t)?;
            }
            self.templates = templates;
        }
        if let Some(size) = get_uint(config, "spawner", "pool_size")? {
            self.pool_size = size as usize;
        }
        if let Some(interval) = get_float(config, "spawner", "interval")? {
            self.spawn_interval = interval;
        }
        if let Some(on_start) = get_bool(config, "spawner", "spawn_on_start")? {
            self.spawn_on_start = on_start;
        }
        if let Some(speed) = get_float(config, "spawner", "speed")? {
            self.speed = speed;
        }

        // [accelerator] section
        if let Some(period) = get_float(config, "accelerator", "period")? {
            if period.is_nan() || period <= 0.0 {
                return Err(invalid("accelerator", "period", "must be positive"));
            }
            self.accel_period = period;
        }
        if let Some(step) = get_float(config, "accelerator", "interval_step")? {
            self.interval_step = step;
        }
        if let Some(min) = get_float(config, "accelerator", "min_interval")? {
            self.min_interval = min;
        }
        if let Some(step) = get_float(config, "accelerator", "speed_step")? {
            self.speed_step = step;
        }
        if let Some(max) = get_float(config, "accelerator", "max_speed")? {
            self.max_speed = max;
        }

        // [audio] section
        for (key, slot) in [
            ("music_channels", &mut self.music_channels),
            ("sfx_channels", &mut self.sfx_channels),
        ] {
            if let Some(n) = get_uint(config, "audio", key)? {
                if n == 0 || n as usize > MAX_CHANNELS {
                    return Err(invalid("audio", key, format!("must be between 1 and {MAX_CHANNELS}")));
                }
                *slot = n as usize;
            }
        }
        if let Some(mute) = get_bool(config, "audio", "mute_music")? {
            self.mute_music = mute;
        }
        if let Some(mute) = get_bool(config, "audio", "mute_sfx")? {
            self.mute_sfx = mute;
        }
        if let Some(volume) = get_float(config, "audio", "master_volume")? {
            if !(0.0..=1.0).contains(&volume) {
                return Err(invalid("audio", "master_volume", "must be between 0 and 1"));
            }
            self.master_volume = volume;
        }
        if let Some(path) = config.get("audio", "sound_bank") {
            self.sound_bank = PathBuf::from(path);
        }
        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        if let Some(seed) = self.seed {
            config.set("session", "seed", Some(seed.to_string()));
        }
        config.set("session", "frame_dt", Some(self.frame_dt.to_string()));

        config.set("spawner", "templates", Some(self.templates.join(", ")));
        config.set("spawner", "pool_size", Some(self.pool_size.to_string()));
        config.set("spawner", "interval", Some(self.spawn_interval.to_string()));
        config.set("spawner", "spawn_on_start", Some(self.spawn_on_start.to_string()));
        config.set("spawner", "speed", Some(self.speed.to_string()));

        config.set("accelerator", "period", Some(self.accel_period.to_string()));
        config.set("accelerator", "interval_step", Some(self.interval_step.to_string()));
        config.set("accelerator", "min_interval", Some(self.min_interval.to_string()));
        config.set("accelerator", "speed_step", Some(self.speed_step.to_string()));
        config.set("accelerator", "max_speed", Some(self.max_speed.to_string()));

        config.set("audio", "music_channels", Some(self.music_channels.to_string()));
        config.set("audio", "sfx_channels", Some(self.sfx_channels.to_string()));
        config.set("audio", "mute_music", Some(self.mute_music.to_string()));
        config.set("audio", "mute_sfx", Some(self.mute_sfx.to_string()));
        config.set("audio", "master_volume", Some(self.master_volume.to_string()));
        config.set("audio", "sound_bank", Some(self.sound_bank.display().to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| ConfigError::Io(format!("Failed to save config file: {}", e)))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Spawn templates built from the `templates` list.
    pub fn spawn_templates(&self) -> Result<Vec<SpawnTemplate>, ConfigError> {
        self.templates.iter().map(|t| parse_template(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_keep_defaults() {
        let mut cfg = GameConfig::new();
        cfg.load_from_str("[spawner]\npool_size = 9\n").unwrap();
        assert_eq!(cfg.pool_size, 9);
        assert_eq!(cfg.sfx_channels, DEFAULT_SFX_CHANNELS);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn parses_every_section() {
        let mut cfg = GameConfig::new();
        cfg.load_from_str(
            "[session]\nseed = 42\nframe_dt = 0.02\n\
             [spawner]\ntemplates = a, b:2\nspawn_on_start = true\n\
             [accelerator]\nmax_speed = 6.5\n\
             [audio]\nsfx_channels = 4\nmute_music = true\nmaster_volume = 0.25\nsound_bank = bank.json\n",
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.templates, vec!["a", "b:2"]);
        assert!(cfg.spawn_on_start);
        assert_eq!(cfg.max_speed, 6.5);
        assert_eq!(cfg.sfx_channels, 4);
        assert!(cfg.mute_music);
        assert_eq!(cfg.master_volume, 0.25);
        assert_eq!(cfg.sound_bank, PathBuf::from("bank.json"));

        let templates = cfg.spawn_templates().unwrap();
        assert!(!templates[0].is_group());
        assert_eq!(templates[1].members, vec![Vec2::ZERO, Vec2::new(GROUP_MEMBER_SPACING, 0.0)]);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = GameConfig::new();
        assert!(matches!(
            cfg.load_from_str("[audio]\nsfx_channels = 0\n"),
            Err(ConfigError::Invalid { key: "sfx_channels", .. })
        ));
        assert!(matches!(
            cfg.load_from_str("[spawner]\npool_size = lots\n"),
            Err(ConfigError::Invalid { key: "pool_size", .. })
        ));
        assert!(matches!(
            cfg.load_from_str("[spawner]\ntemplates = a, b:x\n"),
            Err(ConfigError::Invalid { key: "templates", .. })
        ));
        assert!(matches!(
            cfg.load_from_str("[audio]\nmaster_volume = 2\n"),
            Err(ConfigError::Invalid { key: "master_volume", .. })
        ));
    }

    #[test]
    fn rejected_file_leaves_config_unchanged() {
        let mut cfg = GameConfig::new();
        let before = cfg.clone();
        let result = cfg.load_from_str(
            "[session]\nseed = 5\n[spawner]\npool_size = 12\n[audio]\nsfx_channels = 99\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid { key: "sfx_channels", .. })));
        assert_eq!(cfg, before);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("dunerunner-config-{}.ini", std::process::id()));
        let mut saved = GameConfig::with_path(&path);
        saved.seed = Some(11);
        saved.sfx_channels = 5;
        saved.spawn_on_start = true;
        saved.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, saved);
    }
}
