use crate::{Clock, Instant};

use super::TickCallback;

/// Counts ticks down, ignoring how much time each one took.
pub(crate) struct FrameDelay {
    remaining: i64,
}

impl FrameDelay {
    pub(crate) fn new(frames: i64) -> Self {
        Self { remaining: frames }
    }

    #[inline]
    pub(crate) fn step(&mut self) -> bool {
        self.remaining -= 1;
        self.remaining <= 0
    }
}

pub(crate) struct FrameUpdate {
    remaining: i64,
    on_update: TickCallback,
}

impl FrameUpdate {
    pub(crate) fn new(frames: i64, on_update: TickCallback) -> Self {
        Self {
            remaining: frames,
            on_update,
        }
    }

    pub(crate) fn step(&mut self, clock: &mut Clock, local: &Instant) -> bool {
        self.remaining -= 1;
        (self.on_update)(clock, local);
        self.remaining <= 0
    }
}

#[cfg(test)]
mod tests {
    use crate::{Clock, Instant, QueueId, Timer};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_frame_delay_ignores_delta() {
        let mut clock = Clock::new();
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        let mut timer = Timer::frame_delay(3, move |_, _| f.set(f.get() + 1)).starting_at(0.0);

        // wildly different frame lengths
        let ticks = [(0.001, 1), (100.0, 2), (100.5, 3), (200.0, 4)];
        let mut done = Vec::new();
        let mut prev = 0.0;
        for (time, tick) in ticks {
            let instant = Instant::new(QueueId::Update, time, time - prev, tick);
            done.push(timer.step(&mut clock, &instant));
            prev = time;
        }

        assert_eq!(done, vec![false, false, true, true]);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_frame_delay_non_positive_count() {
        let mut clock = Clock::new();
        let mut timer = Timer::frame_delay(0, |_, _| {});

        assert!(timer.step(&mut clock, &Instant::new(QueueId::Update, 0.0, 0.0, 1)));
    }

    #[test]
    fn test_frame_update_calls_before_completion() {
        let mut clock = Clock::new();
        let updates = Rc::new(Cell::new(0));
        let completed_after = Rc::new(Cell::new(0));
        let u = updates.clone();
        let (u2, c) = (updates.clone(), completed_after.clone());

        let mut timer = Timer::frame_update(2, move |_, _| u.set(u.get() + 1))
            .on_complete(move |_, _| c.set(u2.get()));

        for tick in 1..=2 {
            timer.step(&mut clock, &Instant::new(QueueId::Update, tick as f64, 1.0, tick));
        }

        assert_eq!(updates.get(), 2);
        // the final update ran before completion fired
        assert_eq!(completed_after.get(), 2);
    }
}
