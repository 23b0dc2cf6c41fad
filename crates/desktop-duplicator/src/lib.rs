//! # Desktop Duplicator
//! Per monitor desktop duplication sessions for a Direct3D 11 renderer.
//!
//! A [`Duplicator`] owns a device and a registry of sessions keyed by monitor index. Consumers
//! share a session by creating it for the same monitor, poll it with
//! [`Duplicator::update_frame`], and read the latest frame's texture and color metadata between
//! updates. A session can mirror its frames into a preview window.
//!
//! Everything runs on the thread that owns the device.
//!

#[cfg(windows)]
pub mod d3d11;
pub mod duplicator;
pub mod error;
pub mod format;
pub mod frame_cache;
pub mod monitor;
pub mod platform;
pub mod preview;
pub mod registry;
pub mod session;

pub use duplicator::Duplicator;
pub use error::{Error, PlatformError, PlatformResult};
pub use format::{ColorFormat, ColorSpace, DxgiFormat};
pub use monitor::{MonitorColorInfo, MonitorInfo};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{DuplicationSession, SessionConfig, SessionState};
