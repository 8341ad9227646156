use crate::{
    Clock, Instant,
    animation::{CompletableAnimation, FiniteAnimation},
};

use super::progress;

pub(crate) type ValueCallback<V> = Box<dyn FnMut(&mut Clock, V)>;
pub(crate) type ValueCompletion<V> = Box<dyn FnOnce(&mut Clock, V)>;

/// Type-erased step for animation timers, so [`TimerKind`](super::TimerKind)
/// stays free of the value and animation type parameters.
pub(crate) trait AnimationStep {
    fn step(&mut self, clock: &mut Clock, local: &Instant) -> bool;
}

pub(crate) struct FiniteAnimationTimer<V, A> {
    animation: A,
    on_update: ValueCallback<V>,
    on_complete: Option<ValueCompletion<V>>,
}

impl<V, A> FiniteAnimationTimer<V, A> {
    pub(crate) fn new(
        animation: A,
        on_update: ValueCallback<V>,
        on_complete: ValueCompletion<V>,
    ) -> Self {
        Self {
            animation,
            on_update,
            on_complete: Some(on_complete),
        }
    }
}

impl<V, A> AnimationStep for FiniteAnimationTimer<V, A>
where
    V: Clone,
    A: FiniteAnimation<V>,
{
    fn step(&mut self, clock: &mut Clock, local: &Instant) -> bool {
        let percent = progress(local.local_time(), self.animation.duration());
        let value = self.animation.evaluate(local.local_time(), percent);
        let done = percent >= 1.0;

        finish_step(clock, value, done, &mut self.on_update, &mut self.on_complete);
        done
    }
}

pub(crate) struct CompletableAnimationTimer<V, A> {
    animation: A,
    on_update: ValueCallback<V>,
    on_complete: Option<ValueCompletion<V>>,
}

impl<V, A> CompletableAnimationTimer<V, A> {
    pub(crate) fn new(
        animation: A,
        on_update: ValueCallback<V>,
        on_complete: ValueCompletion<V>,
    ) -> Self {
        Self {
            animation,
            on_update,
            on_complete: Some(on_complete),
        }
    }
}

impl<V, A> AnimationStep for CompletableAnimationTimer<V, A>
where
    V: Clone,
    A: CompletableAnimation<V>,
{
    fn step(&mut self, clock: &mut Clock, local: &Instant) -> bool {
        // finished before it ever ran: nothing to report
        if self.animation.is_complete() {
            self.on_complete = None;
            return true;
        }

        let value = self.animation.evaluate(local.local_time(), f64::NAN);
        let done = self.animation.is_complete();

        finish_step(clock, value, done, &mut self.on_update, &mut self.on_complete);
        done
    }
}

#[inline]
fn finish_step<V: Clone>(
    clock: &mut Clock,
    value: V,
    done: bool,
    on_update: &mut ValueCallback<V>,
    on_complete: &mut Option<ValueCompletion<V>>,
) {
    if !done {
        on_update(clock, value);
        return;
    }

    on_update(clock, value.clone());
    if let Some(on_complete) = on_complete.take() {
        on_complete(clock, value);
    }
}
