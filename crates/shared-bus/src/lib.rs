//! # Shared Bus - Change Notification Channel
//!
//! In-process publish/subscribe channel carrying field changes from
//! instrumented services to whoever is watching them.
//!
//! ```text
//! ┌──────────────┐   set(v)    ┌──────────────┐   (id, key, v)   ┌──────────────┐
//! │  Service A   │ ──────────→ │  ChangeBus   │ ───────────────→ │  listeners   │
//! │ (observable) │             │  dispatch()  │   in order       │  streams     │
//! └──────────────┘             └──────────────┘                  └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - Dispatch is synchronous: every listener has returned before `dispatch`
//!   does.
//! - Listeners run in registration order over a snapshot of the list taken at
//!   dispatch start, so subscribing or detaching from inside a listener only
//!   affects later dispatches.
//! - Nothing is buffered or persisted. An event with no listeners is gone.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ChangeEvent, EventFilter};
pub use publisher::{ChangeBus, Listener, ListenerId};
pub use subscriber::{ChangeStream, Subscription};
