mod animation;
mod delay;
mod frame;
mod predicate;
mod sequence;

use std::fmt;

use crate::{
    Clock, Instant,
    animation::{CompletableAnimation, FiniteAnimation},
};

use self::{
    animation::{AnimationStep, CompletableAnimationTimer, FiniteAnimationTimer},
    delay::{Delay, Update},
    frame::{FrameDelay, FrameUpdate},
    predicate::{DelayUntil, UpdateUntil},
    sequence::Sequence,
};

/// Called every tick with the timer-local instant.
pub type TickCallback = Box<dyn FnMut(&mut Clock, &Instant)>;

/// Called every tick with the timer-local instant and progress in `[0, 1]`.
pub type ProgressCallback = Box<dyn FnMut(&mut Clock, &Instant, f64)>;

/// Called once, on the tick a timer completes.
pub type CompletionCallback = Box<dyn FnOnce(&mut Clock, &Instant)>;

/// Checked every tick with the timer-local instant.
pub type Predicate = Box<dyn FnMut(&Instant) -> bool>;

/// Builds one step of a [`Timer::sequence`].
pub type TimerFactory = Box<dyn FnMut() -> Timer>;

pub(crate) enum TimerKind {
    Delay(Delay),
    Update(Update),
    FrameDelay(FrameDelay),
    FrameUpdate(FrameUpdate),
    DelayUntil(DelayUntil),
    UpdateUntil(UpdateUntil),
    Animation(Box<dyn AnimationStep>),
    Sequence(Sequence),
}

impl TimerKind {
    fn name(&self) -> &'static str {
        match self {
            TimerKind::Delay(_) => "delay",
            TimerKind::Update(_) => "update",
            TimerKind::FrameDelay(_) => "frame_delay",
            TimerKind::FrameUpdate(_) => "frame_update",
            TimerKind::DelayUntil(_) => "delay_until",
            TimerKind::UpdateUntil(_) => "update_until",
            TimerKind::Animation(_) => "animation",
            TimerKind::Sequence(_) => "sequence",
        }
    }
}

/// A unit of work stepped once per tick until it reports completion.
///
/// Build one with the constructor for the wanted behavior and hand it to
/// [`Clock::register_timer`]. The queue stamps the start time at
/// registration unless one was pinned with [`Timer::starting_at`].
///
/// Completion is terminal. Once a step returns `true`, every later step
/// returns `true` without calling anything, and completion callbacks are
/// `FnOnce` so they cannot fire twice.
pub struct Timer {
    start_time: Option<f64>,
    complete: bool,
    pause: Option<Predicate>,
    on_complete: Option<CompletionCallback>,
    kind: TimerKind,
}

impl Timer {
    fn from_kind(kind: TimerKind) -> Self {
        Self {
            start_time: None,
            complete: false,
            pause: None,
            on_complete: None,
            kind,
        }
    }

    // ==================== Constructors ====================

    /// Fires `on_complete` once `duration` seconds have elapsed.
    pub fn delay<F>(duration: f64, on_complete: F) -> Self
    where
        F: FnOnce(&mut Clock, &Instant) + 'static,
    {
        Self::from_kind(TimerKind::Delay(Delay::new(duration))).on_complete(on_complete)
    }

    /// Calls `on_update` every tick with the clamped progress until
    /// `duration` seconds have elapsed.
    pub fn update<F>(duration: f64, on_update: F) -> Self
    where
        F: FnMut(&mut Clock, &Instant, f64) + 'static,
    {
        Self::from_kind(TimerKind::Update(Update::new(duration, Box::new(on_update))))
    }

    /// Fires `on_complete` after `frames` ticks, whatever their length.
    pub fn frame_delay<F>(frames: i64, on_complete: F) -> Self
    where
        F: FnOnce(&mut Clock, &Instant) + 'static,
    {
        Self::from_kind(TimerKind::FrameDelay(FrameDelay::new(frames))).on_complete(on_complete)
    }

    /// Calls `on_update` on each of the next `frames` ticks.
    pub fn frame_update<F>(frames: i64, on_update: F) -> Self
    where
        F: FnMut(&mut Clock, &Instant) + 'static,
    {
        Self::from_kind(TimerKind::FrameUpdate(FrameUpdate::new(
            frames,
            Box::new(on_update),
        )))
    }

    /// Fires `on_complete` on the first tick `predicate` returns `true`.
    pub fn delay_until<P, F>(predicate: P, on_complete: F) -> Self
    where
        P: FnMut(&Instant) -> bool + 'static,
        F: FnOnce(&mut Clock, &Instant) + 'static,
    {
        Self::from_kind(TimerKind::DelayUntil(DelayUntil::new(Box::new(predicate))))
            .on_complete(on_complete)
    }

    /// Calls `on_update` every tick, then completes once `predicate`
    /// returns `true`.
    pub fn update_until<P, F>(predicate: P, on_update: F) -> Self
    where
        P: FnMut(&Instant) -> bool + 'static,
        F: FnMut(&mut Clock, &Instant) + 'static,
    {
        Self::from_kind(TimerKind::UpdateUntil(UpdateUntil::new(
            Box::new(predicate),
            Box::new(on_update),
        )))
    }

    /// Drives a fixed-duration animation, passing each evaluated value to
    /// `on_update` and the final one to `on_complete`.
    pub fn animate<V, A, U, C>(animation: A, on_update: U, on_complete: C) -> Self
    where
        V: Clone + 'static,
        A: FiniteAnimation<V> + 'static,
        U: FnMut(&mut Clock, V) + 'static,
        C: FnOnce(&mut Clock, V) + 'static,
    {
        Self::from_kind(TimerKind::Animation(Box::new(FiniteAnimationTimer::new(
            animation,
            Box::new(on_update),
            Box::new(on_complete),
        ))))
    }

    /// Drives an animation that decides for itself when it is done.
    pub fn animate_until_complete<V, A, U, C>(animation: A, on_update: U, on_complete: C) -> Self
    where
        V: Clone + 'static,
        A: CompletableAnimation<V> + 'static,
        U: FnMut(&mut Clock, V) + 'static,
        C: FnOnce(&mut Clock, V) + 'static,
    {
        Self::from_kind(TimerKind::Animation(Box::new(
            CompletableAnimationTimer::new(animation, Box::new(on_update), Box::new(on_complete)),
        )))
    }

    /// Runs the timers built by `factories` one after another.
    ///
    /// Each factory is called when its turn comes, and the new timer starts
    /// at the time of that tick. An empty sequence completes on its first
    /// step.
    pub fn sequence(factories: Vec<TimerFactory>) -> Self {
        Self::from_kind(TimerKind::Sequence(Sequence::new(factories)))
    }

    /// [`Timer::delay`] that stands still while `is_paused` returns `true`.
    pub fn pausable_delay<P, F>(duration: f64, is_paused: P, on_complete: F) -> Self
    where
        P: FnMut(&Instant) -> bool + 'static,
        F: FnOnce(&mut Clock, &Instant) + 'static,
    {
        Self::delay(duration, on_complete).pause_when(is_paused)
    }

    /// [`Timer::update`] that stands still while `is_paused` returns `true`.
    pub fn pausable_update<P, F>(duration: f64, is_paused: P, on_update: F) -> Self
    where
        P: FnMut(&Instant) -> bool + 'static,
        F: FnMut(&mut Clock, &Instant, f64) + 'static,
    {
        Self::update(duration, on_update).pause_when(is_paused)
    }

    // ==================== Builders ====================

    /// Attach a callback fired once on the completing tick, after any
    /// completion callback the timer kind fires itself. Replaces a
    /// previously attached one.
    pub fn on_complete<F>(mut self, on_complete: F) -> Self
    where
        F: FnOnce(&mut Clock, &Instant) + 'static,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Skip every tick where `is_paused` returns `true`. A skipped tick
    /// pushes the start time forward by that tick's delta, so elapsed time
    /// freezes, and does no other work.
    pub fn pause_when<P>(mut self, is_paused: P) -> Self
    where
        P: FnMut(&Instant) -> bool + 'static,
    {
        self.pause = Some(Box::new(is_paused));
        self
    }

    /// Pin the start time instead of taking the queue time at registration.
    pub fn starting_at(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    // ==================== State ====================

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// `None` until the timer is registered or first stepped.
    #[inline]
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub(crate) fn stamp_start(&mut self, now: f64) {
        self.start_time.get_or_insert(now);
    }

    pub(crate) fn restart_at(&mut self, now: f64) {
        self.start_time = Some(now);
    }

    /// Push the start time forward by `delta`, along with the running step
    /// of a sequence.
    pub(crate) fn shift_start(&mut self, delta: f64) {
        if let Some(start) = self.start_time.as_mut() {
            *start += delta;
        }
        if let TimerKind::Sequence(sequence) = &mut self.kind {
            sequence.shift(delta);
        }
    }

    /// Advance the timer by one tick. Returns `true` once complete.
    pub fn step(&mut self, clock: &mut Clock, instant: &Instant) -> bool {
        if self.complete {
            return true;
        }

        let start = *self.start_time.get_or_insert(instant.local_time());

        if let Some(is_paused) = self.pause.as_mut() {
            if is_paused(instant) {
                self.shift_start(instant.delta_time());
                return false;
            }
        }

        let local = instant.relative_to(start);

        let done = match &mut self.kind {
            TimerKind::Delay(t) => t.step(&local),
            TimerKind::Update(t) => t.step(clock, &local),
            TimerKind::FrameDelay(t) => t.step(),
            TimerKind::FrameUpdate(t) => t.step(clock, &local),
            TimerKind::DelayUntil(t) => t.step(&local),
            TimerKind::UpdateUntil(t) => t.step(clock, &local),
            TimerKind::Animation(t) => t.step(clock, &local),
            TimerKind::Sequence(t) => t.step(clock, instant, start),
        };

        if done {
            self.complete = true;
            if let Some(on_complete) = self.on_complete.take() {
                on_complete(clock, &local);
            }
        }

        done
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("kind", &self.kind.name())
            .field("start_time", &self.start_time)
            .field("complete", &self.complete)
            .field("pausable", &self.pause.is_some())
            .finish()
    }
}

/// `clamp(elapsed / duration, 0, 1)`, treating a non-positive duration as
/// already finished.
#[inline]
pub(crate) fn progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}
