use glam::Vec2;

use crate::resources::audiochannel::ChannelHandle;
use crate::resources::soundbank::SoundCategory;

/// Commands sent *to* the audio backend thread.
///
/// The router owns all playback decisions; the backend only mirrors them.
/// Volumes are effective values (mute and master volume already applied).
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCmd {
    Play {
        channel: ChannelHandle,
        /// Echoed back in [`AudioMessage::Finished`].
        playback: u64,
        sound: String,
        clip: String,
        volume: f32,
        pan: f32,
        looped: bool,
        /// Clip duration in seconds, when known.
        length: Option<f32>,
        /// Set for spatial playback.
        position: Option<Vec2>,
    },
    Stop { channel: ChannelHandle },
    Pause { channel: ChannelHandle },
    Resume { channel: ChannelHandle },
    Volume { channel: ChannelHandle, volume: f32 },
    Position { channel: ChannelHandle, position: Vec2 },
    LowPass { category: SoundCategory, cutoff_hz: f32 },
    Shutdown,
}

/// Reports sent *back* from the audio backend.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMessage {
    /// A one-shot reached its end without being stopped.
    Finished { channel: ChannelHandle, playback: u64 },
}
