//! Value-producing animations driven by animation timers.
//!
//! The curve math lives with the caller. Timers only need to evaluate a
//! value at a given elapsed time and learn when to stop, either from a
//! fixed duration ([`FiniteAnimation`]) or from the animation itself
//! ([`CompletableAnimation`]).

/// Evaluates a value from the time since the animation started.
pub trait Animation<V> {
    /// `percent` is `clamp(local_time / duration, 0, 1)` for finite
    /// animations and `NaN` for self-completing ones.
    fn evaluate(&mut self, local_time: f64, percent: f64) -> V;
}

/// Animation that ends after a fixed number of seconds.
pub trait FiniteAnimation<V>: Animation<V> {
    fn duration(&self) -> f64;
}

/// Animation that reports its own completion, e.g. a spring settling.
pub trait CompletableAnimation<V>: Animation<V> {
    fn is_complete(&self) -> bool;
}

/// Finite animation backed by a closure over `(local_time, percent)`.
pub struct FnAnimation<F> {
    duration: f64,
    f: F,
}

/// Wrap a closure as a [`FiniteAnimation`] lasting `duration` seconds.
pub fn from_fn<V, F>(duration: f64, f: F) -> FnAnimation<F>
where
    F: FnMut(f64, f64) -> V,
{
    FnAnimation { duration, f }
}

impl<V, F> Animation<V> for FnAnimation<F>
where
    F: FnMut(f64, f64) -> V,
{
    #[inline]
    fn evaluate(&mut self, local_time: f64, percent: f64) -> V {
        (self.f)(local_time, percent)
    }
}

impl<V, F> FiniteAnimation<V> for FnAnimation<F>
where
    F: FnMut(f64, f64) -> V,
{
    #[inline]
    fn duration(&self) -> f64 {
        self.duration
    }
}

/// Self-completing animation backed by an evaluation closure and a
/// completion check on the last produced value.
pub struct UntilAnimation<V, F, D> {
    f: F,
    done: D,
    last: Option<V>,
}

/// Wrap `f` as a [`CompletableAnimation`] that completes once `done`
/// accepts the most recently evaluated value.
pub fn until<V, F, D>(f: F, done: D) -> UntilAnimation<V, F, D>
where
    V: Clone,
    F: FnMut(f64) -> V,
    D: Fn(&V) -> bool,
{
    UntilAnimation {
        f,
        done,
        last: None,
    }
}

impl<V, F, D> Animation<V> for UntilAnimation<V, F, D>
where
    V: Clone,
    F: FnMut(f64) -> V,
    D: Fn(&V) -> bool,
{
    fn evaluate(&mut self, local_time: f64, _percent: f64) -> V {
        let value = (self.f)(local_time);
        self.last = Some(value.clone());
        value
    }
}

impl<V, F, D> CompletableAnimation<V> for UntilAnimation<V, F, D>
where
    V: Clone,
    F: FnMut(f64) -> V,
    D: Fn(&V) -> bool,
{
    fn is_complete(&self) -> bool {
        self.last.as_ref().is_some_and(|v| (self.done)(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_forwards_arguments() {
        let mut anim = from_fn(2.0, |t, p| t * 10.0 + p);

        assert_eq!(anim.duration(), 2.0);
        assert_eq!(anim.evaluate(1.0, 0.5), 10.5);
    }

    #[test]
    fn test_until_completes_on_value() {
        let mut anim = until(|t| t * 2.0, |v: &f64| *v >= 4.0);

        assert!(!anim.is_complete());
        anim.evaluate(1.0, f64::NAN);
        assert!(!anim.is_complete());
        anim.evaluate(2.0, f64::NAN);
        assert!(anim.is_complete());
    }
}
