use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::QueueId;

/// The kind of entry a [`Key`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    Timer,
    Subscriber,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Timer => f.write_str("timer"),
            KeyKind::Subscriber => f.write_str("subscriber"),
        }
    }
}

/// Handle for a registered timer or subscriber.
///
/// Keys are only issued by [`Clock`](crate::Clock) registration. Holding a
/// key never keeps an entry alive; once the entry completes or is stopped
/// the key goes stale and every query against it returns `false`.
///
/// Raw values are allocated upward and only reused after the allocator has
/// cycled through the whole key space, so a stale key rarely aliases a new
/// entry. It still can after a full wraparound.
#[derive(Debug, Clone, Copy)]
pub struct Key {
    queue: QueueId,
    kind: KeyKind,
    raw: u32,
}

impl Key {
    pub(crate) fn new(queue: QueueId, kind: KeyKind, raw: u32) -> Self {
        Self { queue, kind, raw }
    }

    #[inline]
    pub fn queue(&self) -> QueueId {
        self.queue
    }

    #[inline]
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    #[inline]
    pub fn raw(&self) -> u32 {
        self.raw
    }

    #[inline]
    pub(crate) fn matches(&self, queue: QueueId, kind: KeyKind) -> bool {
        self.queue == queue && self.kind == kind
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.queue == other.queue && self.kind == other.kind && self.raw == other.raw
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.queue.hash(state);
        self.kind.hash(state);
        self.raw.hash(state);
    }
}

// Ordering looks at the raw value only. It exists for deterministic
// iteration, not dispatch order.
impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw
            .cmp(&other.raw)
            .then_with(|| (self.queue as u8).cmp(&(other.queue as u8)))
            .then_with(|| (self.kind as u8).cmp(&(other.kind as u8)))
    }
}

/// Monotonic raw-value allocator for one (queue, kind) pair.
///
/// Scans upward from the last issued value, wrapping from `max` back to
/// zero, and skips values the caller reports as in use.
#[derive(Debug, Clone)]
pub struct KeyAllocator {
    cursor: u32,
    max: u32,
}

impl Default for KeyAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::with_max(u32::MAX)
    }

    /// Allocator over the raw values `0..=max`.
    pub fn with_max(max: u32) -> Self {
        Self { cursor: 0, max }
    }

    /// Number of distinct raw values this allocator can hand out.
    pub fn capacity(&self) -> u64 {
        self.max as u64 + 1
    }

    /// The most recently issued raw value.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Next free raw value, or `None` when a full cycle finds every value
    /// in use.
    pub fn next(&mut self, mut in_use: impl FnMut(u32) -> bool) -> Option<u32> {
        let mut candidate = self.cursor;

        for _ in 0..self.capacity() {
            candidate = if candidate >= self.max { 0 } else { candidate + 1 };

            if !in_use(candidate) {
                self.cursor = candidate;
                return Some(candidate);
            }
        }

        None
    }
}
