use crate::{Clock, Instant};

use super::{Timer, TimerFactory};

/// Steps one sub-timer at a time, building the next from its factory when
/// the active one completes.
pub(crate) struct Sequence {
    factories: Vec<TimerFactory>,
    active: Option<Box<Timer>>,
    index: usize,
}

impl Sequence {
    pub(crate) fn new(factories: Vec<TimerFactory>) -> Self {
        Self {
            factories,
            active: None,
            index: 0,
        }
    }

    pub(crate) fn shift(&mut self, delta: f64) {
        if let Some(active) = self.active.as_mut() {
            active.shift_start(delta);
        }
    }

    /// `start` is the sequence's own start time, given to the first
    /// sub-timer. Later sub-timers start at the tick that built them.
    pub(crate) fn step(&mut self, clock: &mut Clock, instant: &Instant, start: f64) -> bool {
        if self.index >= self.factories.len() {
            return true;
        }

        let active = match self.active.as_mut() {
            Some(active) => active,
            None => {
                let mut first = (self.factories[self.index])();
                first.restart_at(start);
                self.active.insert(Box::new(first))
            }
        };

        if !active.step(clock, instant) {
            return false;
        }

        self.index += 1;
        if self.index < self.factories.len() {
            let mut next = (self.factories[self.index])();
            next.restart_at(instant.local_time());
            self.active = Some(Box::new(next));
            false
        } else {
            self.active = None;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Clock, Instant, QueueId, Timer, TimerFactory};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn at(time: f64, tick: u64) -> Instant {
        Instant::new(QueueId::Update, time, 1.0, tick)
    }

    #[test]
    fn test_empty_sequence_completes() {
        let mut clock = Clock::new();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        let mut timer = Timer::sequence(Vec::new()).on_complete(move |_, _| f.set(true));

        assert!(timer.step(&mut clock, &at(0.0, 1)));
        assert!(fired.get());
    }

    #[test]
    fn test_next_timer_starts_at_handoff_tick() {
        let mut clock = Clock::new();
        let starts = Rc::new(RefCell::new(Vec::new()));
        let s = starts.clone();

        let factories: Vec<TimerFactory> = vec![
            Box::new(|| Timer::frame_delay(2, |_, _| {})),
            Box::new(move || {
                let s = s.clone();
                Timer::delay(1.0, move |_, i| s.borrow_mut().push(i.local_time()))
            }),
        ];
        let done = Rc::new(Cell::new(0));
        let d = done.clone();
        let mut timer = Timer::sequence(factories)
            .starting_at(0.0)
            .on_complete(move |_, _| d.set(d.get() + 1));

        // frame delay finishes on the second tick, at t = 5
        assert!(!timer.step(&mut clock, &at(0.5, 1)));
        assert!(!timer.step(&mut clock, &at(5.0, 2)));

        // counted from t = 5, not t = 0
        assert!(!timer.step(&mut clock, &at(5.5, 3)));
        assert!(timer.step(&mut clock, &at(6.0, 4)));

        assert_eq!(*starts.borrow(), vec![1.0]);
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_pause_freezes_active_step() {
        let mut clock = Clock::new();
        let paused = Rc::new(Cell::new(false));
        let p = paused.clone();

        let factories: Vec<TimerFactory> = vec![Box::new(|| Timer::delay(2.0, |_, _| {}))];
        let mut timer = Timer::sequence(factories)
            .pause_when(move |_| p.get())
            .starting_at(0.0);

        assert!(!timer.step(&mut clock, &at(1.0, 1)));

        paused.set(true);
        for tick in 2..12 {
            assert!(!timer.step(&mut clock, &at(tick as f64, tick)));
        }

        // 1s run before the pause, 0.5s after
        paused.set(false);
        let half = Instant::new(QueueId::Update, 11.5, 0.5, 12);
        assert!(!timer.step(&mut clock, &half));

        let done = Instant::new(QueueId::Update, 12.0, 0.5, 13);
        assert!(timer.step(&mut clock, &done));
    }

    #[test]
    fn test_pause_before_first_step_delays_first_child() {
        let mut clock = Clock::new();
        let paused = Rc::new(Cell::new(true));
        let p = paused.clone();

        let factories: Vec<TimerFactory> = vec![Box::new(|| Timer::delay(1.0, |_, _| {}))];
        let mut timer = Timer::sequence(factories)
            .pause_when(move |_| p.get())
            .starting_at(0.0);

        assert!(!timer.step(&mut clock, &at(1.0, 1)));
        assert!(!timer.step(&mut clock, &at(2.0, 2)));

        paused.set(false);
        assert!(!timer.step(&mut clock, &at(2.5, 3)));
        assert!(timer.step(&mut clock, &at(3.0, 4)));
    }

    #[test]
    fn test_factories_called_lazily() {
        let mut clock = Clock::new();
        let built = Rc::new(Cell::new(0));
        let (b1, b2) = (built.clone(), built.clone());

        let factories: Vec<TimerFactory> = vec![
            Box::new(move || {
                b1.set(b1.get() + 1);
                Timer::frame_delay(1, |_, _| {})
            }),
            Box::new(move || {
                b2.set(b2.get() + 1);
                Timer::frame_delay(1, |_, _| {})
            }),
        ];
        let mut timer = Timer::sequence(factories);
        assert_eq!(built.get(), 0);

        assert!(!timer.step(&mut clock, &at(0.0, 1)));
        assert_eq!(built.get(), 2);
        assert!(timer.step(&mut clock, &at(1.0, 2)));
        assert_eq!(built.get(), 2);
    }
}
