//! Per-process event logs.
//!
//! - **`log`**: [`Event`] (a local-state snapshot plus its vector clock) and
//!   the append-only, insertion-ordered [`EventLog`] of one process.
//! - **`store`**: [`EventStore`], the shared container producers append to
//!   concurrently while the monitor waits for termination.

pub mod log;
pub mod store;

pub use log::{Event, EventLog};
pub use store::EventStore;
