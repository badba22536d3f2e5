//! Broadcast signal types carried by the [`EventBus`](crate::resources::eventbus::EventBus).
//!
//! A [`Signal`] pairs a [`SignalKind`] with a fixed-arity [`Payload`]. The
//! built-in kinds are the lifecycle and gameplay notifications of the runner
//! (game start/over/restart/ending, pause, acceleration, camera shake, ...);
//! [`SignalKind::Custom`] lets collaborators define their own.
//!
//! Each built-in kind carries exactly one payload shape. Use the typed
//! constructors (`Signal::acceleration`, `Signal::game_pause`, ...) or
//! [`Signal::new`], which validates the payload against the kind.

use crate::error::SignalError;

/// Identifies a signal channel on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Scroll speed increased by the payload amount.
    Acceleration,
    /// The player hit an obstacle.
    CactusHit,
    /// Camera shake request: iterations, strength, interval.
    CamShake,
    /// The first dialogue line was acknowledged; gameplay spawning may begin.
    FirstDialoguePass,
    /// The game was paused (`true`) or resumed (`false`).
    GamePause,
    GameStart,
    GameOver,
    GameRestart,
    /// The player reached the end of the run.
    GameEnding,
    GameReload,
    /// Global volume changed, payload in `0.0..=1.0`.
    VolumeChange,
    /// User-defined signal; accepts any payload.
    Custom(String),
}

/// Payload data attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    None,
    Scalar(f32),
    Flag(bool),
    Shake {
        iterations: i32,
        strength: f32,
        interval: f32,
    },
}

/// Shape of a [`Payload`], used to validate signals against their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    None,
    Scalar,
    Flag,
    Shake,
}

impl Payload {
    pub fn shape(&self) -> PayloadShape {
        match self {
            Payload::None => PayloadShape::None,
            Payload::Scalar(_) => PayloadShape::Scalar,
            Payload::Flag(_) => PayloadShape::Flag,
            Payload::Shake { .. } => PayloadShape::Shake,
        }
    }
}

impl SignalKind {
    /// Payload shape this kind carries, or `None` for custom kinds.
    pub fn payload_shape(&self) -> Option<PayloadShape> {
        match self {
            SignalKind::Acceleration | SignalKind::VolumeChange => Some(PayloadShape::Scalar),
            SignalKind::GamePause => Some(PayloadShape::Flag),
            SignalKind::CamShake => Some(PayloadShape::Shake),
            SignalKind::CactusHit
            | SignalKind::FirstDialoguePass
            | SignalKind::GameStart
            | SignalKind::GameOver
            | SignalKind::GameRestart
            | SignalKind::GameEnding
            | SignalKind::GameReload => Some(PayloadShape::None),
            SignalKind::Custom(_) => None,
        }
    }
}

/// A signal instance ready to be published.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub payload: Payload,
}

impl Signal {
    /// Build a signal, checking the payload against the kind's shape.
    pub fn new(kind: SignalKind, payload: Payload) -> Result<Self, SignalError> {
        if let Some(expected) = kind.payload_shape() {
            let found = payload.shape();
            if expected != found {
                return Err(SignalError::PayloadMismatch {
                    kind,
                    expected,
                    found,
                });
            }
        }
        Ok(Signal { kind, payload })
    }

    fn bare(kind: SignalKind) -> Self {
        Signal {
            kind,
            payload: Payload::None,
        }
    }

    pub fn acceleration(amount: f32) -> Self {
        Signal {
            kind: SignalKind::Acceleration,
            payload: Payload::Scalar(amount),
        }
    }
    pub fn cactus_hit() -> Self {
        Self::bare(SignalKind::CactusHit)
    }
    pub fn cam_shake(iterations: i32, strength: f32, interval: f32) -> Self {
        Signal {
            kind: SignalKind::CamShake,
            payload: Payload::Shake {
                iterations,
                strength,
                interval,
            },
        }
    }
    pub fn first_dialogue_pass() -> Self {
        Self::bare(SignalKind::FirstDialoguePass)
    }
    pub fn game_pause(paused: bool) -> Self {
        Signal {
            kind: SignalKind::GamePause,
            payload: Payload::Flag(paused),
        }
    }
    pub fn game_start() -> Self {
        Self::bare(SignalKind::GameStart)
    }
    pub fn game_over() -> Self {
        Self::bare(SignalKind::GameOver)
    }
    pub fn game_restart() -> Self {
        Self::bare(SignalKind::GameRestart)
    }
    pub fn game_ending() -> Self {
        Self::bare(SignalKind::GameEnding)
    }
    pub fn game_reload() -> Self {
        Self::bare(SignalKind::GameReload)
    }
    pub fn volume_change(volume: f32) -> Self {
        Signal {
            kind: SignalKind::VolumeChange,
            payload: Payload::Scalar(volume),
        }
    }
    pub fn custom(name: impl Into<String>, payload: Payload) -> Self {
        Signal {
            kind: SignalKind::Custom(name.into()),
            payload,
        }
    }

    /// Scalar payload, if any.
    pub fn scalar(&self) -> Option<f32> {
        match self.payload {
            Payload::Scalar(v) => Some(v),
            _ => None,
        }
    }
    /// Boolean payload, if any.
    pub fn flag(&self) -> Option<bool> {
        match self.payload {
            Payload::Flag(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_constructors_match_kind_shape() {
        let signals = [
            Signal::acceleration(0.2),
            Signal::cactus_hit(),
            Signal::cam_shake(1, 0.05, 0.05),
            Signal::first_dialogue_pass(),
            Signal::game_pause(true),
            Signal::game_start(),
            Signal::game_over(),
            Signal::game_restart(),
            Signal::game_ending(),
            Signal::game_reload(),
            Signal::volume_change(0.5),
        ];
        for s in signals {
            assert_eq!(
                s.kind.payload_shape(),
                Some(s.payload.shape()),
                "{:?} built with wrong payload",
                s.kind
            );
        }
    }

    #[test]
    fn new_rejects_mismatched_payload() {
        let err = Signal::new(SignalKind::GamePause, Payload::Scalar(1.0)).unwrap_err();
        assert_eq!(
            err,
            SignalError::PayloadMismatch {
                kind: SignalKind::GamePause,
                expected: PayloadShape::Flag,
                found: PayloadShape::Scalar,
            }
        );
    }

    #[test]
    fn custom_kind_accepts_any_payload() {
        let kind = SignalKind::Custom("door_opened".into());
        assert!(Signal::new(kind.clone(), Payload::None).is_ok());
        assert!(Signal::new(kind, Payload::Flag(true)).is_ok());
    }

    #[test]
    fn payload_accessors() {
        assert_eq!(Signal::acceleration(0.5).scalar(), Some(0.5));
        assert_eq!(Signal::game_pause(false).flag(), Some(false));
        assert_eq!(Signal::game_over().scalar(), None);
    }
}
