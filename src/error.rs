//! Error types shared by the pool, audio router, signal and configuration
//! layers.
//!
//! Configuration faults (empty candidate sets, unknown sounds, too few
//! channels for a cross-fade) are surfaced as `Err` at setup or at first use.
//! Running out of audio channels is *not* an error: the router returns
//! `Ok(None)`. Out-of-range numeric arguments such as spawn intervals are
//! clamped and logged rather than rejected.

use crate::events::signal::{PayloadShape, SignalKind};
use crate::resources::soundbank::SoundCategory;
use thiserror::Error;

/// Errors raised by [`Spawner`](crate::components::spawner::Spawner).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The candidate set is empty, so the pool can never grow.
    #[error("spawner has no candidate templates")]
    NoCandidates,
    /// The entry id does not belong to this pool.
    #[error("no pool entry with id {0}")]
    UnknownEntry(usize),
    /// The member index does not exist on the entry.
    #[error("pool entry {entry} has no member {member}")]
    UnknownMember { entry: usize, member: usize },
}

/// Errors raised by the audio router and sound bank.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The sound is not defined in the bank for this category.
    #[error("can't find sound '{name}' in the {category} bank")]
    UnknownSound { name: String, category: SoundCategory },
    /// A sound definition lists no clip variants.
    #[error("sound '{0}' has no audio clip")]
    NoClips(String),
    /// The same sound name is defined twice.
    #[error("sound '{0}' is defined more than once")]
    DuplicateSound(String),
    /// A channel group was configured with an unsupported size.
    #[error("{category} group needs between 1 and {max} channels, got {requested}")]
    ChannelCount {
        category: SoundCategory,
        requested: usize,
        max: usize,
    },
    /// Cross-fading requires two channels in the same group.
    #[error("cross-fade needs at least 2 channels in the {category} group, found {available}")]
    CrossFadeNeedsTwoChannels {
        category: SoundCategory,
        available: usize,
    },
    /// The sound bank file could not be read or parsed.
    #[error("invalid sound bank: {0}")]
    InvalidBank(String),
}

/// Errors raised while loading or validating [`GameConfig`](crate::resources::gameconfig::GameConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The INI file could not be read, parsed or written.
    #[error("config file error: {0}")]
    Io(String),
    /// A value is present but has the wrong type or is out of range.
    #[error("invalid value for [{section}] {key}: {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        reason: String,
    },
}

/// Errors raised when building a [`Signal`](crate::events::signal::Signal).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// The payload does not have the shape the signal kind carries.
    #[error("signal {kind:?} expects a {expected:?} payload, got {found:?}")]
    PayloadMismatch {
        kind: SignalKind,
        expected: PayloadShape,
        found: PayloadShape,
    },
}

/// Errors raised while building a session with [`crate::game::setup`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
