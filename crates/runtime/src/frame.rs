use foundation::time::Time;

/// Upper bound on a single frame step; a backgrounded tab must not produce a
/// multi-second jump in rotation.
pub const DEFAULT_MAX_DT_MS: f64 = 100.0;

/// Per-frame metadata handed to every system that advances with time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Time since the previous frame (milliseconds).
    pub dt_ms: f64,
    /// Host clock at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_ms: f64, time: Time) -> Self {
        Self { index, dt_ms, time }
    }

    pub fn dt_s(&self) -> f64 {
        self.dt_ms / 1000.0
    }
}

/// Turns host timestamps (e.g. `requestAnimationFrame`) into [`Frame`]s.
#[derive(Debug, Clone)]
pub struct FrameClock {
    next_index: u64,
    last: Option<Time>,
    max_dt_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DT_MS)
    }
}

impl FrameClock {
    pub fn new(max_dt_ms: f64) -> Self {
        Self {
            next_index: 0,
            last: None,
            max_dt_ms: max_dt_ms.max(0.0),
        }
    }

    /// Starts a frame at `now`. The first frame has `dt_ms == 0`.
    pub fn tick(&mut self, now: Time) -> Frame {
        let dt = match self.last {
            Some(prev) => now.since(prev).min(self.max_dt_ms),
            None => 0.0,
        };
        self.last = Some(now);
        let frame = Frame::new(self.next_index, dt, now);
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }

    pub fn frames_started(&self) -> u64 {
        self.next_index
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, FrameClock};
    use foundation::time::Time;

    #[test]
    fn first_frame_has_zero_dt() {
        let mut clock = FrameClock::default();
        let f = clock.tick(Time(1000.0));
        assert_eq!(f, Frame::new(0, 0.0, Time(1000.0)));
    }

    #[test]
    fn tick_advances_index_and_dt() {
        let mut clock = FrameClock::default();
        clock.tick(Time(0.0));
        let f1 = clock.tick(Time(16.0));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.dt_ms, 16.0);
        assert_eq!(f1.dt_s(), 0.016);
        assert_eq!(clock.frames_started(), 2);
    }

    #[test]
    fn long_gaps_are_capped() {
        let mut clock = FrameClock::new(50.0);
        clock.tick(Time(0.0));
        assert_eq!(clock.tick(Time(5000.0)).dt_ms, 50.0);
        // clock going backwards yields a zero step
        assert_eq!(clock.tick(Time(10.0)).dt_ms, 0.0);
    }
}
