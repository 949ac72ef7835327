use std::collections::VecDeque;
use web_time::{Duration, Instant};

/// Counts frames presented during the last second.
pub struct FpsCounter {
    frames: VecDeque<Instant>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: VecDeque::default(),
        }
    }

    pub fn tick(&mut self) -> u32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> u32 {
        let window_start = now.checked_sub(Duration::from_secs(1)).unwrap_or(now);
        self.frames.push_back(now);
        while self.frames.front().is_some_and(|t| *t < window_start) {
            self.frames.pop_front();
        }
        self.frames.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames_within_one_second() {
        let mut counter = FpsCounter::new();
        let start = Instant::now();
        for i in 0..10 {
            counter.tick_at(start + Duration::from_millis(i * 50));
        }
        assert_eq!(counter.tick_at(start + Duration::from_millis(500)), 11);
    }

    #[test]
    fn old_frames_fall_out() {
        let mut counter = FpsCounter::new();
        let start = Instant::now();
        counter.tick_at(start);
        counter.tick_at(start + Duration::from_millis(100));
        assert_eq!(counter.tick_at(start + Duration::from_millis(1500)), 1);
    }
}
