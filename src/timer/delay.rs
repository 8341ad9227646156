use crate::{Clock, Instant};

use super::{ProgressCallback, progress};

/// Completes once `duration` seconds have elapsed. Fires nothing itself;
/// the completion callback lives on the owning [`Timer`](super::Timer).
pub(crate) struct Delay {
    duration: f64,
}

impl Delay {
    pub(crate) fn new(duration: f64) -> Self {
        Self { duration }
    }

    #[inline]
    pub(crate) fn step(&mut self, local: &Instant) -> bool {
        local.local_time() >= self.duration
    }
}

/// Reports clamped progress every tick for `duration` seconds.
pub(crate) struct Update {
    duration: f64,
    on_update: ProgressCallback,
}

impl Update {
    pub(crate) fn new(duration: f64, on_update: ProgressCallback) -> Self {
        Self {
            duration,
            on_update,
        }
    }

    pub(crate) fn step(&mut self, clock: &mut Clock, local: &Instant) -> bool {
        let percent = progress(local.local_time(), self.duration);
        (self.on_update)(clock, local, percent);
        percent >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use crate::{Clock, Instant, QueueId, Timer};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(time: f64, tick: u64) -> Instant {
        Instant::new(QueueId::Update, time, 1.0, tick)
    }

    #[test]
    fn test_delay_threshold_inclusive() {
        let mut clock = Clock::new();
        let mut timer = Timer::delay(2.0, |_, _| {}).starting_at(0.0);

        assert!(!timer.step(&mut clock, &at(1.999, 1)));
        assert!(timer.step(&mut clock, &at(2.0, 2)));
    }

    #[test]
    fn test_zero_delay_completes_immediately() {
        let mut clock = Clock::new();
        let mut timer = Timer::delay(0.0, |_, _| {}).starting_at(3.0);

        assert!(timer.step(&mut clock, &at(3.0, 1)));
    }

    #[test]
    fn test_update_reports_percent() {
        let mut clock = Clock::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();

        let mut timer = Timer::update(2.0, move |_, i, p| s.borrow_mut().push((i.local_time(), p)))
            .starting_at(10.0);

        assert!(!timer.step(&mut clock, &at(11.0, 1)));
        assert!(timer.step(&mut clock, &at(12.0, 2)));
        assert!(timer.step(&mut clock, &at(13.0, 3)));

        assert_eq!(*seen.borrow(), vec![(1.0, 0.5), (2.0, 1.0)]);
    }

    #[test]
    fn test_update_overshoot_clamped() {
        let mut clock = Clock::new();
        let last = Rc::new(RefCell::new(None));
        let l = last.clone();

        let mut timer =
            Timer::update(1.0, move |_, _, p| *l.borrow_mut() = Some(p)).starting_at(0.0);

        assert!(timer.step(&mut clock, &at(4.0, 1)));
        assert_eq!(*last.borrow(), Some(1.0));
    }
}
