use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameTime {
    /// Milliseconds since the clock started; drives the world rotation.
    pub time_ms: u64,

    /// Frames ticked before this one.
    pub frame_index: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Source {
    /// Wall clock.
    Monotonic(Instant),
    /// Advances by a fixed step per tick, independent of wall time.
    FixedStep(Duration),
}

/// Frame clock producing `FrameTime` snapshots.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    elapsed: Duration,
    frame_index: u64,
}

impl FrameClock {
    /// Creates a wall-clock driven clock starting now.
    pub fn new() -> Self {
        Self::with_source(Source::Monotonic(Instant::now()))
    }

    /// Creates a deterministic clock: every tick advances time by `step`.
    pub fn fixed_step(step: Duration) -> Self {
        Self::with_source(Source::FixedStep(step))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            elapsed: Duration::ZERO,
            frame_index: 0,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.elapsed = match self.source {
            // Instant is monotonic, but keep time_ms non-decreasing regardless.
            Source::Monotonic(start) => start.elapsed().max(self.elapsed),
            Source::FixedStep(step) => self.elapsed + step,
        };

        let ft = FrameTime {
            time_ms: self.elapsed.as_millis() as u64,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_advances_time_exactly() {
        let mut clock = FrameClock::fixed_step(Duration::from_millis(16));
        let times: Vec<u64> = (0..4).map(|_| clock.tick().time_ms).collect();
        assert_eq!(times, vec![16, 32, 48, 64]);
    }

    #[test]
    fn frame_index_counts_from_zero() {
        let mut clock = FrameClock::fixed_step(Duration::from_millis(1));
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
    }

    #[test]
    fn long_steps_are_not_clamped() {
        let mut clock = FrameClock::fixed_step(Duration::from_secs(2));
        assert_eq!(clock.tick().time_ms, 2_000);
        assert_eq!(clock.tick().time_ms, 4_000);
    }

    #[test]
    fn monotonic_time_does_not_go_backwards() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.time_ms >= a.time_ms);
        assert_eq!(b.frame_index, a.frame_index + 1);
    }
}
