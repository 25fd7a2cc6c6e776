//! Snapshot synchronization.
//!
//! `scheduler` holds the pure fetch state machine; `driver` (behind the
//! `runtime` feature) is the tokio task that carries out its actions and
//! merges in the live stream.

pub mod clock;
pub mod config;
#[cfg(feature = "runtime")]
pub mod driver;
pub mod scheduler;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SchedulePolicy, SyncConfig};
#[cfg(feature = "runtime")]
pub use driver::{spawn_sync, SyncHandle};
pub use scheduler::{
    CountdownDisplay, NextFetch, SchedulerAction, SchedulerEvent, SchedulerState, SyncScheduler,
};
pub use source::DiscountSource;
