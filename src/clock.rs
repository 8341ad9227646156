use crate::{
    ClockConfig, QueueId, Timer,
    key::{Key, KeyAllocator, KeyKind},
    queue::{InsertError, UpdateQueue},
    subscriber::{Subscriber, SubscriberEntry},
};

/// Session-wide scheduler: one [`UpdateQueue`] per [`QueueId`].
///
/// The host calls [`Clock::advance`] once per phase per frame. Every
/// callback receives `&mut Clock`, so work can be registered or stopped
/// from inside a tick on any queue. Changes to the queue being dispatched
/// take effect after the tick.
///
/// Calling `advance` for a queue from inside that same queue's dispatch is
/// not supported. The inner call treats the outer tick as abandoned.
pub struct Clock {
    queues: [UpdateQueue; 3],
    config: ClockConfig,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::with_config(ClockConfig::default())
    }

    pub fn with_config(config: ClockConfig) -> Self {
        let queues = QueueId::ALL.map(|id| {
            UpdateQueue::new(
                id,
                config.start_time,
                KeyAllocator::with_max(config.max_timer_key),
                KeyAllocator::with_max(config.max_subscriber_key),
            )
        });

        Self { queues, config }
    }

    #[inline]
    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Read-only view of one queue.
    #[inline]
    pub fn queue(&self, id: QueueId) -> &UpdateQueue {
        &self.queues[id.index()]
    }

    #[inline]
    fn queue_mut(&mut self, id: QueueId) -> &mut UpdateQueue {
        &mut self.queues[id.index()]
    }

    /// Current time of a queue.
    #[inline]
    pub fn now(&self, id: QueueId) -> f64 {
        self.queue(id).local_time()
    }

    // ==================== Tick ====================

    /// Run one tick of `id` at time `now` (seconds, non-decreasing).
    ///
    /// Subscribers run first by descending priority, then every timer that
    /// was live when the tick began, in registration order. Each runs at
    /// most once. Anything registered or stopped during the tick is applied
    /// once dispatch is done.
    pub fn advance(&mut self, id: QueueId, now: f64) {
        let Some(plan) = self.queue_mut(id).begin_tick(now) else {
            self.queue_mut(id).finish_tick();
            return;
        };

        let instant = plan.instant;
        let mut ran = 0usize;
        let mut completed = 0usize;

        for raw in plan.subscribers {
            let Some(mut entry) = self.queue_mut(id).checkout_subscriber(raw) else {
                continue;
            };
            entry.callback.on_update(self, &instant);
            self.queue_mut(id).checkin_subscriber(raw, entry);
            ran += 1;
        }

        for raw in plan.timers {
            let Some(mut timer) = self.queue_mut(id).checkout_timer(raw) else {
                continue;
            };
            let complete = timer.step(self, &instant);
            self.queue_mut(id).checkin_timer(raw, timer, complete);
            ran += 1;
            completed += complete as usize;
        }

        self.queue_mut(id).finish_tick();

        tracing::trace!(
            queue = ?id,
            tick = instant.tick(),
            time = now,
            ran,
            completed,
            "tick dispatched"
        );
    }

    // ==================== Timers ====================

    /// Register `timer` on `queue`. The key is valid immediately, even if
    /// the timer only starts running next tick.
    pub fn register_timer(&mut self, queue: QueueId, timer: Timer) -> Result<Key, InsertError<Timer>> {
        self.queue_mut(queue).register_timer(timer)
    }

    /// Is the key a timer that is live or waiting to go live?
    pub fn has_timer(&self, key: impl Into<Option<Key>>) -> bool {
        key.into()
            .is_some_and(|key| self.queue(key.queue()).has_timer(&key))
    }

    /// Stop a timer without firing its completion callback. Returns `false`
    /// for stale, foreign or absent keys.
    pub fn stop_timer(&mut self, key: impl Into<Option<Key>>) -> bool {
        key.into()
            .is_some_and(|key| self.queue_mut(key.queue()).stop_timer(&key))
    }

    pub fn has_timers<I>(&self, keys: I) -> Vec<bool>
    where
        I: IntoIterator,
        I::Item: Into<Option<Key>>,
    {
        keys.into_iter().map(|key| self.has_timer(key)).collect()
    }

    pub fn stop_timers<I>(&mut self, keys: I) -> Vec<bool>
    where
        I: IntoIterator,
        I::Item: Into<Option<Key>>,
    {
        keys.into_iter().map(|key| self.stop_timer(key)).collect()
    }

    /// Stop every timer on `queue`. Returns how many were stopped.
    pub fn stop_all_timers(&mut self, queue: QueueId) -> usize {
        let stopped = self.queue_mut(queue).stop_all_timers();
        tracing::debug!(queue = ?queue, stopped, "all timers stopped");
        stopped
    }

    // ==================== Subscribers ====================

    /// Register a per-tick callback. Higher `priority` runs first; equal
    /// priorities run in registration order.
    pub fn register_subscriber<S>(
        &mut self,
        queue: QueueId,
        priority: i32,
        subscriber: S,
    ) -> Result<Key, InsertError<Box<dyn Subscriber>>>
    where
        S: Subscriber + 'static,
    {
        let entry = SubscriberEntry::new(priority, Box::new(subscriber));

        self.queue_mut(queue)
            .register_subscriber(entry)
            .map_err(|err| InsertError {
                queue: err.queue,
                kind: err.kind,
                capacity: err.capacity,
                entry: err.entry.callback,
            })
    }

    pub fn has_subscriber(&self, key: impl Into<Option<Key>>) -> bool {
        key.into()
            .is_some_and(|key| self.queue(key.queue()).has_subscriber(&key))
    }

    pub fn remove_subscriber(&mut self, key: impl Into<Option<Key>>) -> bool {
        key.into()
            .is_some_and(|key| self.queue_mut(key.queue()).remove_subscriber(&key))
    }

    pub fn has_subscribers<I>(&self, keys: I) -> Vec<bool>
    where
        I: IntoIterator,
        I::Item: Into<Option<Key>>,
    {
        keys.into_iter().map(|key| self.has_subscriber(key)).collect()
    }

    pub fn remove_subscribers<I>(&mut self, keys: I) -> Vec<bool>
    where
        I: IntoIterator,
        I::Item: Into<Option<Key>>,
    {
        keys.into_iter()
            .map(|key| self.remove_subscriber(key))
            .collect()
    }

    pub fn remove_all_subscribers(&mut self, queue: QueueId) -> usize {
        let removed = self.queue_mut(queue).remove_all_subscribers();
        tracing::debug!(queue = ?queue, removed, "all subscribers removed");
        removed
    }

    // ==================== Lifecycle ====================

    /// Stop every timer and remove every subscriber on every queue.
    pub fn clear(&mut self) {
        for id in QueueId::ALL {
            self.stop_all_timers(id);
            self.remove_all_subscribers(id);
        }
    }

    /// Tear the clock down. Remaining entries are dropped without any
    /// completion callback. Returns how many were dropped.
    pub fn shutdown(mut self) -> usize {
        let dropped: usize = self.queues.iter_mut().map(UpdateQueue::discard).sum();
        tracing::debug!(dropped, "clock shut down");
        dropped
    }

    /// Whether `key` names an entry of its kind, regardless of kind.
    pub fn contains(&self, key: impl Into<Option<Key>>) -> bool {
        key.into().is_some_and(|key| match key.kind() {
            KeyKind::Timer => self.has_timer(key),
            KeyKind::Subscriber => self.has_subscriber(key),
        })
    }
}


#[cfg(test)]
mod latency_tests {
    use super::*;
    use crate::Instant;
    use hdrhistogram::Histogram;

    const WARMUP: u64 = 10_000;
    const ITERATIONS: u64 = 100_000;

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!("\n=== {} ===", name);
        println!("  count:  {}", hist.len());
        println!("  min:    {} ns", hist.min());
        println!("  max:    {} ns", hist.max());
        println!("  mean:   {:.1} ns", hist.mean());
        println!("  p50:    {} ns", hist.value_at_quantile(0.50));
        println!("  p99:    {} ns", hist.value_at_quantile(0.99));
        println!("  p99.9:  {} ns", hist.value_at_quantile(0.999));
    }

    #[test]
    #[ignore]
    fn hdr_advance_latency() {
        let mut clock = Clock::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for p in 0..16 {
            clock
                .register_subscriber(QueueId::Update, p, |_: &mut Clock, _: &Instant| {})
                .unwrap();
        }
        for _ in 0..256 {
            clock
                .register_timer(QueueId::Update, Timer::update_until(|_| false, |_, _| {}))
                .unwrap();
        }

        let mut now = 0.0;
        for _ in 0..WARMUP {
            now += 1.0 / 60.0;
            clock.advance(QueueId::Update, now);
        }

        for _ in 0..ITERATIONS {
            now += 1.0 / 60.0;
            let start = std::time::Instant::now();
            clock.advance(QueueId::Update, now);
            hist.record(start.elapsed().as_nanos() as u64).unwrap();
        }

        print_histogram("Advance (16 subscribers, 256 timers)", &hist);
    }

    #[test]
    #[ignore]
    fn hdr_register_stop_latency() {
        let mut clock = Clock::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for _ in 0..WARMUP {
            let key = clock
                .register_timer(QueueId::Update, Timer::delay(1.0, |_, _| {}))
                .unwrap();
            clock.stop_timer(key);
        }

        for _ in 0..ITERATIONS {
            let start = std::time::Instant::now();
            let key = clock
                .register_timer(QueueId::Update, Timer::delay(1.0, |_, _| {}))
                .unwrap();
            clock.stop_timer(key);
            hist.record(start.elapsed().as_nanos() as u64).unwrap();
        }

        print_histogram("Register + Stop", &hist);
    }
}
