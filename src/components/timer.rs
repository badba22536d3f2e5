// Periodic countdown shared by spawners, accelerators and audio control loops.

/// Accumulates elapsed seconds and fires once `duration` is reached.
///
/// On firing, `elapsed` resets to zero rather than carrying the remainder,
/// so one large frame never produces more than one firing.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub duration: f32,
    pub elapsed: f32,
}
impl Timer {
    pub fn new(duration: f32) -> Self {
        Timer {
            duration,
            elapsed: 0.0,
        }
    }
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
    /// Advance by `dt`; returns `true` (and resets) when the duration is reached.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.reset();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_duration_reached() {
        let mut t = Timer::new(1.0);
        assert!(!t.tick(0.4));
        assert!(!t.tick(0.4));
        assert!(t.tick(0.4));
        assert_eq!(t.elapsed, 0.0);
    }

    #[test]
    fn large_step_fires_only_once() {
        let mut t = Timer::new(0.5);
        assert!(t.tick(3.0));
        assert!(!t.tick(0.1));
    }
}
