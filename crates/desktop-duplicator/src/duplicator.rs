//! The entry point consumers drive duplication through.
//!

use tracing::{debug, error};

use crate::{
    error::Error,
    format::ColorSpace,
    monitor::{self, MonitorInfo},
    platform::{GraphicsDevice, MonitorHandle},
    registry::{SessionHandle, SessionRegistry},
    session::{DuplicationSession, SessionConfig},
};

/// Owns a device and the registry of sessions duplicating its outputs.
///
/// Sessions never outlive the device: dropping the duplicator destroys every remaining session
/// before the device is released.
pub struct Duplicator<D: GraphicsDevice> {
    // Field order is drop order.
    registry: SessionRegistry<D>,
    device: D,
}

impl<D: GraphicsDevice> Duplicator<D> {
    /// Creates a duplicator whose sessions open a preview window.
    pub fn new(device: D) -> Self {
        Self::with_config(device, SessionConfig::default())
    }

    /// Creates a duplicator whose sessions start with `config`.
    pub fn with_config(device: D, config: SessionConfig) -> Self {
        Self {
            registry: SessionRegistry::new(config),
            device,
        }
    }

    /// Gets the position, size and rotation of the monitor at `index`.
    pub fn monitor_info(&self, index: u32) -> Result<MonitorInfo, Error> {
        monitor::monitor_info(&self.device, index)
    }

    /// Gets the info of every monitor on the device's adapter.
    pub fn monitors(&self) -> Result<Vec<MonitorInfo>, Error> {
        Ok(monitor::monitors(&self.device)?)
    }

    /// Finds the index of the output connected to `monitor`, `-1` if none match.
    pub fn monitor_index(&self, monitor: MonitorHandle<D>) -> i32 {
        monitor::monitor_index(&self.device, monitor)
    }

    /// Opens a session on the monitor at `index`, sharing it if one already exists.
    ///
    /// Every handle returned must be passed to [`destroy_session`](Self::destroy_session) once.
    pub fn create_session(&mut self, index: u32) -> Option<SessionHandle> {
        match self.registry.acquire(&self.device, index) {
            Ok(handle) => Some(handle),
            Err(Error::NotFound(_)) => {
                debug!("No monitor at index {index}");
                None
            }
            Err(e) => {
                error!("Failed to create session for monitor {index}:\n{e}");
                None
            }
        }
    }

    /// Releases a handle from [`create_session`](Self::create_session).
    pub fn destroy_session(&mut self, handle: SessionHandle) {
        self.registry.release(handle);
    }

    /// Polls the session for a new frame.
    ///
    /// Returns `false` only if the session has lost duplication access or the handle is unknown.
    pub fn update_frame(&mut self, handle: SessionHandle) -> bool {
        match self.registry.get_mut(handle) {
            Some(session) => session.update(&self.device),
            None => false,
        }
    }

    /// The texture holding the session's latest frame.
    pub fn texture(&self, handle: SessionHandle) -> Option<&D::Texture> {
        self.registry.get(handle)?.texture()
    }

    /// How the values of the session's latest frame should be interpreted.
    pub fn color_space(&self, handle: SessionHandle) -> Option<ColorSpace> {
        self.registry.get(handle).map(DuplicationSession::color_space)
    }

    /// The SDR white level of the session's monitor in nits.
    pub fn sdr_white_level(&self, handle: SessionHandle) -> Option<f32> {
        self.registry
            .get(handle)
            .map(DuplicationSession::sdr_white_level)
    }

    /// Whether the session's monitor was in an HDR mode when the session started.
    pub fn is_hdr(&self, handle: SessionHandle) -> Option<bool> {
        self.registry.get(handle).map(DuplicationSession::is_hdr)
    }

    /// Whether the session captured a frame since the last
    /// [`reset_all_sessions`](Self::reset_all_sessions).
    pub fn frame_available(&self, handle: SessionHandle) -> Option<bool> {
        self.registry
            .get(handle)
            .map(DuplicationSession::frame_available)
    }

    /// Shows or hides the session's preview window.
    pub fn set_preview_visible(&self, handle: SessionHandle, visible: bool) {
        if let Some(session) = self.registry.get(handle) {
            session.set_preview_visible(visible);
        }
    }

    /// Clears the frame available flag of every session.
    pub fn reset_all_sessions(&mut self) {
        self.registry.reset_all();
    }

    /// The number of live sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// The session a handle refers to.
    pub fn session(&self, handle: SessionHandle) -> Option<&DuplicationSession<D>> {
        self.registry.get(handle)
    }

    /// The device frames are duplicated with.
    pub fn device(&self) -> &D {
        &self.device
    }
}
