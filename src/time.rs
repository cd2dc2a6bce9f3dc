use std::time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Seconds since the clock started.
    pub elapsed: f64,
    pub frame_index: u64,
}

impl FrameTime {
    /// Timing of frame `frame_index` in a run stepping by a constant `dt`.
    pub fn fixed(frame_index: u64, dt: f32) -> Self {
        Self {
            dt,
            elapsed: frame_index as f64 * dt as f64,
            frame_index,
        }
    }
}

/// Monotonic frame clock.
///
/// Unlike a game loop clock this does not clamp the delta: the animation and
/// camera are expected to move by exactly the wall time that passed.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
        }
    }

    /// Resets the previous-frame timestamp without touching elapsed time.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        let time = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f64(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
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
    use std::time::Duration;

    #[test]
    fn tick_measures_since_previous_tick() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        let first = clock.tick_at(start + Duration::from_millis(16));
        let second = clock.tick_at(start + Duration::from_millis(48));
        assert_eq!(first.frame_index, 0);
        assert!((first.dt - 0.016).abs() < 1e-6);
        assert!((second.dt - 0.032).abs() < 1e-6);
        assert!((second.elapsed - 0.048).abs() < 1e-9);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn fixed_steps_accumulate_elapsed() {
        let time = FrameTime::fixed(30, 0.5);
        assert_eq!(time.elapsed, 15.0);
        assert_eq!(time.dt, 0.5);
    }
}
