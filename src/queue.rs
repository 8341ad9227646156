use std::fmt::{self, Debug};

use hashbrown::{HashMap, HashSet};

use crate::{
    Instant, QueueId, Timer,
    key::{Key, KeyAllocator, KeyKind},
    subscriber::SubscriberEntry,
};

/// Every raw key value for the entry kind is taken.
///
/// The rejected timer or subscriber is handed back in `entry`.
#[derive(thiserror::Error)]
#[error("queue {queue:?} cannot accommodate more {kind}s: all {capacity} keys are in use")]
pub struct InsertError<T> {
    pub queue: QueueId,
    pub kind: KeyKind,
    pub capacity: u64,
    pub entry: T,
}

impl<T> Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("queue", &self.queue)
            .field("kind", &self.kind)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Work captured at the start of a tick: the instant plus snapshots of the
/// keys to dispatch, in dispatch order.
pub(crate) struct TickPlan {
    pub(crate) instant: Instant,
    pub(crate) subscribers: Vec<u32>,
    pub(crate) timers: Vec<u32>,
}

/// One independently ticked lane of timers and subscribers.
///
/// The queue owns every registered entry. While a tick is being
/// dispatched, registrations land in pending buffers and removals are
/// deferred, so nothing registered or stopped mid-tick changes the set of
/// entries that tick visits. All buffered changes are applied once, after
/// dispatch.
///
/// Entries are checked out of their slot while their callback runs. The
/// slot itself stays in the map, so the entry still answers `has_*`
/// queries from inside its own callback.
pub struct UpdateQueue {
    id: QueueId,

    timers: HashMap<u32, Option<Timer>>,
    /// Registration order of live timers.
    timer_order: Vec<u32>,
    timer_order_dirty: bool,

    subscribers: HashMap<u32, Option<SubscriberEntry>>,
    /// `(priority, raw)` sorted by descending priority, stable.
    subscriber_order: Vec<(i32, u32)>,

    pending_timers: Vec<(u32, Timer)>,
    pending_subscribers: Vec<(u32, SubscriberEntry)>,
    removing_timers: HashSet<u32>,
    removing_subscribers: HashSet<u32>,

    timer_keys: KeyAllocator,
    subscriber_keys: KeyAllocator,

    local_time: f64,
    previous_time: f64,
    delta_time: f64,
    tick_count: u64,

    dispatching: bool,
}

impl UpdateQueue {
    pub(crate) fn new(
        id: QueueId,
        start_time: f64,
        timer_keys: KeyAllocator,
        subscriber_keys: KeyAllocator,
    ) -> Self {
        Self {
            id,
            timers: HashMap::new(),
            timer_order: Vec::new(),
            timer_order_dirty: false,
            subscribers: HashMap::new(),
            subscriber_order: Vec::new(),
            pending_timers: Vec::new(),
            pending_subscribers: Vec::new(),
            removing_timers: HashSet::new(),
            removing_subscribers: HashSet::new(),
            timer_keys,
            subscriber_keys,
            local_time: start_time,
            previous_time: start_time,
            delta_time: 0.0,
            tick_count: 0,
            dispatching: false,
        }
    }

    // ==================== Inspection ====================

    #[inline]
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Time passed to the most recent tick, or the start time before any.
    #[inline]
    pub fn local_time(&self) -> f64 {
        self.local_time
    }

    #[inline]
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Live timers, not counting pending registrations.
    #[inline]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Live subscribers, not counting pending registrations.
    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.subscribers.is_empty()
    }

    // ==================== Timers ====================

    pub(crate) fn register_timer(&mut self, mut timer: Timer) -> Result<Key, InsertError<Timer>> {
        let timers = &self.timers;
        let pending = &self.pending_timers;
        let raw = self.timer_keys.next(|raw| {
            timers.contains_key(&raw) || pending.iter().any(|(p, _)| *p == raw)
        });

        let Some(raw) = raw else {
            tracing::warn!(queue = ?self.id, "timer key space exhausted");
            return Err(InsertError {
                queue: self.id,
                kind: KeyKind::Timer,
                capacity: self.timer_keys.capacity(),
                entry: timer,
            });
        };

        // before the first tick the queue has no host time yet; the first
        // step stamps it instead
        if self.tick_count > 0 {
            timer.stamp_start(self.local_time);
        }
        tracing::debug!(queue = ?self.id, key = raw, ?timer, deferred = self.dispatching, "timer registered");

        if self.dispatching {
            self.pending_timers.push((raw, timer));
        } else {
            self.timers.insert(raw, Some(timer));
            self.timer_order.push(raw);
        }

        Ok(Key::new(self.id, KeyKind::Timer, raw))
    }

    pub(crate) fn has_timer(&self, key: &Key) -> bool {
        if !key.matches(self.id, KeyKind::Timer) {
            return false;
        }
        let raw = key.raw();

        if self.timers.contains_key(&raw) {
            return !self.removing_timers.contains(&raw);
        }
        self.pending_timers.iter().any(|(p, _)| *p == raw)
    }

    pub(crate) fn stop_timer(&mut self, key: &Key) -> bool {
        if !self.has_timer(key) {
            return false;
        }
        let raw = key.raw();

        if let Some(pos) = self.pending_timers.iter().position(|(p, _)| *p == raw) {
            self.pending_timers.remove(pos);
        } else if self.dispatching {
            self.removing_timers.insert(raw);
        } else {
            self.timers.remove(&raw);
            self.timer_order.retain(|k| *k != raw);
        }

        tracing::debug!(queue = ?self.id, key = raw, deferred = self.dispatching, "timer stopped");
        true
    }

    /// Stop every timer, pending ones included. Returns how many stopped.
    pub(crate) fn stop_all_timers(&mut self) -> usize {
        let pending = self.pending_timers.len();
        self.pending_timers.clear();

        let live = if self.dispatching {
            let before = self.removing_timers.len();
            self.removing_timers.extend(self.timers.keys().copied());
            self.removing_timers.len() - before
        } else {
            self.timer_order.clear();
            self.timers.drain().count()
        };

        live + pending
    }

    // ==================== Subscribers ====================

    pub(crate) fn register_subscriber(
        &mut self,
        entry: SubscriberEntry,
    ) -> Result<Key, InsertError<SubscriberEntry>> {
        let subscribers = &self.subscribers;
        let pending = &self.pending_subscribers;
        let raw = self.subscriber_keys.next(|raw| {
            subscribers.contains_key(&raw) || pending.iter().any(|(p, _)| *p == raw)
        });

        let Some(raw) = raw else {
            tracing::warn!(queue = ?self.id, "subscriber key space exhausted");
            return Err(InsertError {
                queue: self.id,
                kind: KeyKind::Subscriber,
                capacity: self.subscriber_keys.capacity(),
                entry,
            });
        };

        tracing::debug!(
            queue = ?self.id,
            key = raw,
            priority = entry.priority,
            deferred = self.dispatching,
            "subscriber registered"
        );

        if self.dispatching {
            self.pending_subscribers.push((raw, entry));
        } else {
            self.insert_subscriber(raw, entry);
        }

        Ok(Key::new(self.id, KeyKind::Subscriber, raw))
    }

    fn insert_subscriber(&mut self, raw: u32, entry: SubscriberEntry) {
        let priority = entry.priority;
        // after every entry of equal or higher priority
        let pos = self.subscriber_order.partition_point(|(p, _)| *p >= priority);
        self.subscriber_order.insert(pos, (priority, raw));
        self.subscribers.insert(raw, Some(entry));
    }

    pub(crate) fn has_subscriber(&self, key: &Key) -> bool {
        if !key.matches(self.id, KeyKind::Subscriber) {
            return false;
        }
        let raw = key.raw();

        if self.subscribers.contains_key(&raw) {
            return !self.removing_subscribers.contains(&raw);
        }
        self.pending_subscribers.iter().any(|(p, _)| *p == raw)
    }

    pub(crate) fn remove_subscriber(&mut self, key: &Key) -> bool {
        if !self.has_subscriber(key) {
            return false;
        }
        let raw = key.raw();

        if let Some(pos) = self.pending_subscribers.iter().position(|(p, _)| *p == raw) {
            self.pending_subscribers.remove(pos);
        } else if self.dispatching {
            self.removing_subscribers.insert(raw);
        } else {
            self.subscribers.remove(&raw);
            self.subscriber_order.retain(|(_, k)| *k != raw);
        }

        tracing::debug!(queue = ?self.id, key = raw, deferred = self.dispatching, "subscriber removed");
        true
    }

    /// Remove every subscriber, pending ones included. Returns how many.
    pub(crate) fn remove_all_subscribers(&mut self) -> usize {
        let pending = self.pending_subscribers.len();
        self.pending_subscribers.clear();

        let live = if self.dispatching {
            let before = self.removing_subscribers.len();
            self.removing_subscribers
                .extend(self.subscribers.keys().copied());
            self.removing_subscribers.len() - before
        } else {
            self.subscriber_order.clear();
            self.subscribers.drain().count()
        };

        live + pending
    }

    /// Subscriber priorities in dispatch order.
    pub fn subscriber_priorities(&self) -> impl Iterator<Item = i32> + '_ {
        self.subscriber_order.iter().map(|(p, _)| *p)
    }

    // ==================== Dispatch ====================

    /// Advance time and snapshot the keys to dispatch. Returns `None` on
    /// the idle path, when nothing is registered.
    pub(crate) fn begin_tick(&mut self, now: f64) -> Option<TickPlan> {
        if self.dispatching {
            self.recover();
        }

        if self.tick_count == 0 {
            self.previous_time = now;
        }
        self.delta_time = now - self.previous_time;
        self.previous_time = now;
        self.local_time = now;
        self.tick_count += 1;

        if self.is_empty() {
            return None;
        }

        self.dispatching = true;

        Some(TickPlan {
            instant: Instant::new(self.id, self.local_time, self.delta_time, self.tick_count),
            subscribers: self.subscriber_order.iter().map(|(_, k)| *k).collect(),
            timers: self.timer_order.clone(),
        })
    }

    pub(crate) fn checkout_subscriber(&mut self, raw: u32) -> Option<SubscriberEntry> {
        if self.removing_subscribers.contains(&raw) {
            return None;
        }
        self.subscribers.get_mut(&raw)?.take()
    }

    pub(crate) fn checkin_subscriber(&mut self, raw: u32, entry: SubscriberEntry) {
        if let Some(slot) = self.subscribers.get_mut(&raw) {
            *slot = Some(entry);
        }
    }

    pub(crate) fn checkout_timer(&mut self, raw: u32) -> Option<Timer> {
        if self.removing_timers.contains(&raw) {
            return None;
        }
        self.timers.get_mut(&raw)?.take()
    }

    /// Return a stepped timer. A completed timer is dropped on the spot;
    /// the dispatch loop walks a snapshot of keys, not the map. Its key is
    /// free again right away, so `finish_tick` prunes the order before
    /// appending anything that reused it.
    pub(crate) fn checkin_timer(&mut self, raw: u32, timer: Timer, complete: bool) {
        if complete {
            self.timers.remove(&raw);
            self.removing_timers.remove(&raw);
            self.timer_order_dirty = true;
            return;
        }

        if let Some(slot) = self.timers.get_mut(&raw) {
            *slot = Some(timer);
        }
    }

    /// Apply the buffered removals, then the pending registrations. Runs
    /// after every tick, idle or not.
    pub(crate) fn finish_tick(&mut self) {
        self.dispatching = false;

        if !self.removing_timers.is_empty() {
            for raw in self.removing_timers.drain() {
                self.timers.remove(&raw);
            }
            self.timer_order_dirty = true;
        }

        // stale raws must go before a pending timer can reuse one
        if self.timer_order_dirty {
            let timers = &self.timers;
            self.timer_order.retain(|k| timers.contains_key(k));
            self.timer_order_dirty = false;
        }

        if !self.removing_subscribers.is_empty() {
            let subscribers = &mut self.subscribers;
            for raw in self.removing_subscribers.drain() {
                subscribers.remove(&raw);
            }
            self.subscriber_order
                .retain(|(_, k)| subscribers.contains_key(k));
        }

        if !self.pending_timers.is_empty() {
            for (raw, timer) in std::mem::take(&mut self.pending_timers) {
                self.timers.insert(raw, Some(timer));
                self.timer_order.push(raw);
            }
        }

        if !self.pending_subscribers.is_empty() {
            for (raw, entry) in std::mem::take(&mut self.pending_subscribers) {
                self.insert_subscriber(raw, entry);
            }
        }
    }

    /// A previous tick unwound out of a callback. Drop whatever was checked
    /// out at the time and settle the buffers.
    fn recover(&mut self) {
        let lost_timers = self.timers.values().filter(|t| t.is_none()).count();
        let lost_subscribers = self.subscribers.values().filter(|s| s.is_none()).count();

        tracing::warn!(
            queue = ?self.id,
            lost_timers,
            lost_subscribers,
            "previous tick did not finish, recovering"
        );

        self.timers.retain(|_, t| t.is_some());
        self.subscribers.retain(|_, s| s.is_some());
        self.timer_order_dirty = true;

        let subscribers = &self.subscribers;
        self.subscriber_order
            .retain(|(_, k)| subscribers.contains_key(k));

        self.finish_tick();
    }

    /// Drop every entry without running any callback.
    pub(crate) fn discard(&mut self) -> usize {
        let count = self.timers.len()
            + self.subscribers.len()
            + self.pending_timers.len()
            + self.pending_subscribers.len();

        self.timers.clear();
        self.timer_order.clear();
        self.subscribers.clear();
        self.subscriber_order.clear();
        self.pending_timers.clear();
        self.pending_subscribers.clear();
        self.removing_timers.clear();
        self.removing_subscribers.clear();

        count
    }
}

impl Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("id", &self.id)
            .field("timers", &self.timers.len())
            .field("subscribers", &self.subscribers.len())
            .field("local_time", &self.local_time)
            .field("tick_count", &self.tick_count)
            .field("dispatching", &self.dispatching)
            .finish()
    }
}
