use crate::{Clock, Instant};

/// Callback run once per tick on the queue it is registered with.
///
/// Subscribers have no completion condition; they run until removed.
/// Closures of the shape `FnMut(&mut Clock, &Instant)` implement this
/// directly.
pub trait Subscriber {
    fn on_update(&mut self, clock: &mut Clock, instant: &Instant);
}

impl<F> Subscriber for F
where
    F: FnMut(&mut Clock, &Instant),
{
    #[inline]
    fn on_update(&mut self, clock: &mut Clock, instant: &Instant) {
        self(clock, instant)
    }
}

/// A registered subscriber and its dispatch priority. Higher runs first.
pub(crate) struct SubscriberEntry {
    pub(crate) priority: i32,
    pub(crate) callback: Box<dyn Subscriber>,
}

impl SubscriberEntry {
    pub(crate) fn new(priority: i32, callback: Box<dyn Subscriber>) -> Self {
        Self { priority, callback }
    }
}
