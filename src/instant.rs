use crate::QueueId;

/// Snapshot of a queue's time for one tick.
///
/// Built once per [`advance`](crate::Clock::advance) and shared by every
/// subscriber and timer dispatched during that tick. Timers hand their
/// callbacks a view rebased onto their own start time, see
/// [`Instant::relative_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instant {
    queue: QueueId,
    local_time: f64,
    delta_time: f64,
    tick: u64,
}

impl Instant {
    pub(crate) fn new(queue: QueueId, local_time: f64, delta_time: f64, tick: u64) -> Self {
        Self {
            queue,
            local_time,
            delta_time,
            tick,
        }
    }

    /// Queue that produced this instant.
    #[inline]
    pub fn queue(&self) -> QueueId {
        self.queue
    }

    /// Queue time in seconds, or elapsed time for a rebased instant.
    #[inline]
    pub fn local_time(&self) -> f64 {
        self.local_time
    }

    /// Seconds since the previous tick. Zero on the first tick.
    #[inline]
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Number of ticks the queue has run, including this one.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Same instant with local time measured from `start`.
    #[inline]
    pub fn relative_to(&self, start: f64) -> Self {
        Self {
            local_time: self.local_time - start,
            ..*self
        }
    }
}
