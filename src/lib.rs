//! Per-frame task scheduling for simulation and game loops.
//!
//! A [`Clock`] owns one [`UpdateQueue`] per [`QueueId`]. The host advances
//! each queue once per frame with the current time; the queue then runs its
//! subscribers by priority and steps its timers in registration order.
//!
//! ```
//! use clockqueue::{Clock, QueueId, Timer};
//!
//! let mut clock = Clock::new();
//! let key = clock
//!     .register_timer(QueueId::Update, Timer::delay(0.5, |_, _| println!("done")))
//!     .unwrap();
//!
//! // timers registered before the first tick start counting on it
//! clock.advance(QueueId::Update, 0.0);
//! clock.advance(QueueId::Update, 0.25);
//! assert!(clock.has_timer(key));
//! clock.advance(QueueId::Update, 0.5);
//! assert!(!clock.has_timer(key));
//! ```

use serde::{Deserialize, Serialize};

pub mod animation;
mod clock;
mod config;
mod instant;
mod key;
mod queue;
mod subscriber;
mod timer;

pub use clock::Clock;
pub use config::{ClockConfig, ConfigError};
pub use instant::Instant;
pub use key::{Key, KeyKind};
pub use queue::{InsertError, UpdateQueue};
pub use subscriber::Subscriber;
pub use timer::{
    CompletionCallback, Predicate, ProgressCallback, TickCallback, Timer, TimerFactory,
};

/// The update phases a host drives each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueueId {
    #[default]
    Update,
    FixedUpdate,
    LateUpdate,
}

impl QueueId {
    /// Queue used when the caller does not pick one.
    pub const DEFAULT: QueueId = QueueId::Update;

    pub const ALL: [QueueId; 3] = [QueueId::Update, QueueId::FixedUpdate, QueueId::LateUpdate];

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}
