//! Per-channel tasks advanced by the audio router every frame.
//!
//! A channel carries at most one task. Starting a new one replaces whatever
//! was running, so a fade never fights a control loop for the same channel.

use log::warn;

use crate::components::timer::Timer;

// NaN and negative durations behave as an instant fade.
fn fade_duration(seconds: f32) -> f32 {
    if seconds.is_nan() || seconds < 0.0 {
        warn!("fade duration {} is invalid, using 0", seconds);
        0.0
    } else {
        seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// Linear volume ramp.
///
/// Progress only accumulates while the channel is playing; paused time does
/// not count. A fade-in ends at exactly `to`, a fade-out at exactly `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    pub direction: FadeDirection,
    pub duration: f32,
    pub elapsed: f32,
    pub from: f32,
    pub to: f32,
}

impl Fade {
    /// Ramp from silence up to `target`.
    pub fn fade_in(duration: f32, target: f32) -> Self {
        Fade {
            direction: FadeDirection::In,
            duration: fade_duration(duration),
            elapsed: 0.0,
            from: 0.0,
            to: target,
        }
    }

    /// Ramp from `current` down to silence.
    pub fn fade_out(duration: f32, current: f32) -> Self {
        Fade {
            direction: FadeDirection::Out,
            duration: fade_duration(duration),
            elapsed: 0.0,
            from: current,
            to: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.duration <= 0.0 || self.elapsed >= self.duration
    }

    /// Advance by `dt` if `playing`; returns the volume for this frame.
    pub fn advance(&mut self, dt: f32, playing: bool) -> f32 {
        if playing && self.duration > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.volume()
    }

    pub fn volume(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        self.from + (self.to - self.from) * t
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelTask {
    Fade(Fade),
    /// Re-trigger `sound` on the same channel every time the timer fires.
    ControlLoop { sound: String, timer: Timer },
}
