//! Progress observability primitives.
//!
//! The engine emits one event per lifecycle point of a run onto an optional
//! in-process [`ProgressBus`]. Consumers (the CLI in verbose mode, tests)
//! drain the receiving half.

pub mod bus;
pub mod event;
pub mod session;

pub use bus::ProgressBus;
pub use event::{NodeCompletedData, ProgressEvent, RunCompletedData, RunStartedData};
pub use session::{new_run_id, now_millis};
