//! Offline cache controller.
//!
//! One state machine with three host-driven entry points:
//! - install: populate the current-generation store with the app shell
//! - activate: purge stores left over from older generations
//! - fetch: route each intercepted request through network-first
//!   (navigations) or cache-first (everything else)

mod controller;
mod traits;

pub use controller::CacheController;
pub use traits::{LifecycleHandler, ServeSource, Served};
