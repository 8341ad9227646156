use crate::{Clock, Instant};

use super::{Predicate, TickCallback};

/// Completes on the first tick the predicate accepts.
pub(crate) struct DelayUntil {
    predicate: Predicate,
}

impl DelayUntil {
    pub(crate) fn new(predicate: Predicate) -> Self {
        Self { predicate }
    }

    #[inline]
    pub(crate) fn step(&mut self, local: &Instant) -> bool {
        (self.predicate)(local)
    }
}

pub(crate) struct UpdateUntil {
    predicate: Predicate,
    on_update: TickCallback,
}

impl UpdateUntil {
    pub(crate) fn new(predicate: Predicate, on_update: TickCallback) -> Self {
        Self {
            predicate,
            on_update,
        }
    }

    pub(crate) fn step(&mut self, clock: &mut Clock, local: &Instant) -> bool {
        (self.on_update)(clock, local);
        (self.predicate)(local)
    }
}
