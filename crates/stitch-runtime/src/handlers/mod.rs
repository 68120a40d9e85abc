//! # Handlers
//!
//! Long-lived consumers of a built container.
//!
//! - `observer` - async stream of distinct field changes
//! - `timers` - periodic lifecycle calls declared in descriptors

pub mod observer;
pub mod timers;

pub use observer::Observer;
pub use timers::TimerScheduler;
