//! Sound definitions and the bank they are looked up in.
//!
//! A [`SoundDefinition`] is an immutable template: a name, one or more clip
//! variants (one is picked at random on every play) and the playback
//! properties copied onto a channel when the sound starts. Definitions are
//! grouped by [`SoundCategory`]; looking a music name up in the sfx bank
//! fails the same way an unknown name does.
//!
//! Names are matched case-insensitively.
//!
//! `length` is the clip duration in seconds. A one-shot with a known length
//! frees its channel once that much playing time has passed; without it the
//! channel stays busy until stopped or until the backend reports the clip
//! finished.
//!
//! # File format
//!
//! ```json
//! [
//!   { "name": "theme", "category": "music", "clips": ["theme.ogg"], "looped": true },
//!   { "name": "step", "category": "sfx", "clips": ["step1.wav", "step2.wav"],
//!     "volume": 0.6, "priority": 200, "length": 0.25, "allow_concurrent": true }
//! ]
//! ```

use std::fmt;
use std::path::Path;

use bevy_ecs::prelude::Resource;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Lowest audible importance a sound can have.
pub const MAX_PRIORITY: u16 = 256;
pub const DEFAULT_PRIORITY: u16 = 128;

/// Channel group a sound plays in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Music,
    Sfx,
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundCategory::Music => write!(f, "music"),
            SoundCategory::Sfx => write!(f, "sfx"),
        }
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_priority() -> u16 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDefinition {
    pub name: String,
    pub category: SoundCategory,
    /// Clip variants; one is chosen at random on each play.
    pub clips: Vec<String>,
    /// 0.0 to 1.0.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// 0 to 256, lower values are more important.
    #[serde(default = "default_priority")]
    pub priority: u16,
    /// -1.0 (left) to 1.0 (right).
    #[serde(default)]
    pub pan: f32,
    #[serde(default)]
    pub looped: bool,
    /// Clip duration in seconds, if known.
    #[serde(default)]
    pub length: Option<f32>,
    /// Several instances may play at once in the same group.
    #[serde(default)]
    pub allow_concurrent: bool,
}

impl SoundDefinition {
    pub fn new(name: impl Into<String>, category: SoundCategory, clips: Vec<String>) -> Self {
        SoundDefinition {
            name: name.into(),
            category,
            clips,
            volume: default_volume(),
            priority: DEFAULT_PRIORITY,
            pan: 0.0,
            looped: false,
            length: None,
            allow_concurrent: false,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }

    pub fn with_length(mut self, seconds: f32) -> Self {
        self.length = Some(seconds);
        self
    }

    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    pub fn concurrent(mut self) -> Self {
        self.allow_concurrent = true;
        self
    }

    // Clamp numeric properties into range, warning about each fix.
    fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.volume) {
            warn!("sound '{}' volume {} out of range, clamping", self.name, self.volume);
            self.volume = if self.volume.is_nan() { 1.0 } else { self.volume.clamp(0.0, 1.0) };
        }
        if self.priority > MAX_PRIORITY {
            warn!("sound '{}' priority {} out of range, clamping", self.name, self.priority);
            self.priority = MAX_PRIORITY;
        }
        if !(-1.0..=1.0).contains(&self.pan) {
            warn!("sound '{}' pan {} out of range, clamping", self.name, self.pan);
            self.pan = if self.pan.is_nan() { 0.0 } else { self.pan.clamp(-1.0, 1.0) };
        }
        if let Some(length) = self.length
            && (length.is_nan() || length <= 0.0)
        {
            warn!("sound '{}' length {} is not positive, ignoring it", self.name, length);
            self.length = None;
        }
        self
    }
}

/// Registry of sound definitions keyed by category and lowercase name.
#[derive(Resource, Debug, Default, Clone)]
pub struct SoundBank {
    sounds: FxHashMap<(SoundCategory, String), SoundDefinition>,
}

impl SoundBank {
    pub fn new() -> Self {
        SoundBank::default()
    }

    /// Build a bank from a JSON array of definitions.
    pub fn from_json_str(json: &str) -> Result<Self, AudioError> {
        let definitions: Vec<SoundDefinition> =
            serde_json::from_str(json).map_err(|e| AudioError::InvalidBank(e.to_string()))?;
        let mut bank = SoundBank::new();
        for def in definitions {
            bank.insert(def)?;
        }
        Ok(bank)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AudioError::InvalidBank(format!("{}: {}", path.display(), e)))?;
        let bank = Self::from_json_str(&json)?;
        info!("Loaded {} sounds from {}", bank.len(), path.display());
        Ok(bank)
    }

    /// Add a definition. Fails if it has no clip or its name is taken in
    /// the same category.
    pub fn insert(&mut self, definition: SoundDefinition) -> Result<(), AudioError> {
        if definition.clips.is_empty() {
            return Err(AudioError::NoClips(definition.name));
        }
        let key = (definition.category, definition.name.to_lowercase());
        if self.sounds.contains_key(&key) {
            return Err(AudioError::DuplicateSound(definition.name));
        }
        self.sounds.insert(key, definition.sanitized());
        Ok(())
    }

    pub fn get(&self, name: &str, category: SoundCategory) -> Option<&SoundDefinition> {
        self.sounds.get(&(category, name.to_lowercase()))
    }

    /// Like [`SoundBank::get`] but with a typed error for unknown names.
    pub fn find(&self, name: &str, category: SoundCategory) -> Result<&SoundDefinition, AudioError> {
        self.get(name, category).ok_or_else(|| AudioError::UnknownSound {
            name: name.to_string(),
            category,
        })
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK: &str = r#"[
        { "name": "Theme", "category": "music", "clips": ["theme.ogg"], "looped": true },
        { "name": "step", "category": "sfx", "clips": ["a.wav", "b.wav"],
          "volume": 0.5, "priority": 200, "length": 0.3, "allow_concurrent": true }
    ]"#;

    #[test]
    fn parses_with_defaults() {
        let bank = SoundBank::from_json_str(BANK).unwrap();
        assert_eq!(bank.len(), 2);
        let theme = bank.get("theme", SoundCategory::Music).unwrap();
        assert_eq!(theme.volume, 1.0);
        assert_eq!(theme.priority, DEFAULT_PRIORITY);
        assert!(theme.looped);
        assert!(!theme.allow_concurrent);
        assert_eq!(theme.length, None);
        let step = bank.get("STEP", SoundCategory::Sfx).unwrap();
        assert_eq!(step.clips.len(), 2);
        assert!(step.allow_concurrent);
        assert_eq!(step.length, Some(0.3));
    }

    #[test]
    fn wrong_category_is_unknown() {
        let bank = SoundBank::from_json_str(BANK).unwrap();
        assert!(bank.get("theme", SoundCategory::Sfx).is_none());
        assert_eq!(
            bank.find("theme", SoundCategory::Sfx).unwrap_err(),
            AudioError::UnknownSound {
                name: "theme".into(),
                category: SoundCategory::Sfx
            }
        );
    }

    #[test]
    fn rejects_empty_clips_and_duplicates() {
        let mut bank = SoundBank::new();
        let err = bank
            .insert(SoundDefinition::new("mute", SoundCategory::Sfx, vec![]))
            .unwrap_err();
        assert_eq!(err, AudioError::NoClips("mute".into()));

        let hit = SoundDefinition::new("hit", SoundCategory::Sfx, vec!["hit.wav".into()]);
        bank.insert(hit.clone()).unwrap();
        let dup = SoundDefinition { name: "HIT".into(), ..hit };
        assert_eq!(bank.insert(dup), Err(AudioError::DuplicateSound("HIT".into())));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut bank = SoundBank::new();
        bank.insert(
            SoundDefinition::new("loud", SoundCategory::Sfx, vec!["x.wav".into()])
                .with_volume(3.0)
                .with_priority(999)
                .with_pan(-4.0)
                .with_length(-1.0),
        )
        .unwrap();
        let loud = bank.get("loud", SoundCategory::Sfx).unwrap();
        assert_eq!(loud.volume, 1.0);
        assert_eq!(loud.priority, MAX_PRIORITY);
        assert_eq!(loud.pan, -1.0);
        assert_eq!(loud.length, None);
    }

    #[test]
    fn malformed_json_is_invalid_bank() {
        assert!(matches!(
            SoundBank::from_json_str("{ not json"),
            Err(AudioError::InvalidBank(_))
        ));
    }
}
