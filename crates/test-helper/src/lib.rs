//! Shared helpers for the workspace's tests.
//!

mod logger;
pub mod mock;

pub use logger::{capture_logs, init_logger};
pub use mock::{Acquire, Event, MockDevice, MockOutputConfig};
