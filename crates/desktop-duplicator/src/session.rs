//! A desktop duplication of a single monitor.
//!

use tracing::{debug, error, instrument, warn};

use crate::{
    error::Error,
    format::{ColorSpace, DUPLICATION_FORMATS},
    frame_cache::FrameCache,
    monitor::{self, MonitorColorInfo, MonitorInfo},
    platform::{Duplication, GraphicsDevice, Output},
    preview::{DEFAULT_PREVIEW_TITLE, PreviewPresenter},
};

/// Options applied to newly started sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Open a preview window alongside each session.
    pub preview: bool,

    /// The preview window's title.
    pub preview_title: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview: true,
            preview_title: DEFAULT_PREVIEW_TITLE.to_string(),
        }
    }
}

/// The lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Frames can be acquired.
    Active,

    /// The duplication lost access, the session must be recreated.
    Lost,
}

/// Owns the duplication of one monitor, the texture its frames are cached in, and an optional
/// preview.
pub struct DuplicationSession<D: GraphicsDevice> {
    // Field order is drop order: duplication, then the cached texture, then the preview.
    duplication: Option<D::Duplication>,
    frame_cache: FrameCache<D::Texture>,
    preview: Option<PreviewPresenter<D>>,

    monitor_index: u32,
    hdr: bool,
    sdr_white_nits: f32,
    frame_available: bool,
    pub(crate) refs: usize,
}

impl<D: GraphicsDevice> DuplicationSession<D> {
    /// Starts duplicating the monitor at `monitor_index`.
    ///
    /// The HDR capable duplication mode is preferred, outputs that don't support it fall back to
    /// the 8 bit mode. Preview failures are logged and leave the session without a preview.
    #[instrument("DuplicationSession::start", skip(device, config), err(level = "debug"))]
    pub fn start(device: &D, monitor_index: u32, config: &SessionConfig) -> Result<Self, Error> {
        let output = monitor::resolve_output(device, monitor_index)?;

        let mut color_info = MonitorColorInfo::default();

        let duplication =
            match device.duplicate_output_with_formats(&output, &DUPLICATION_FORMATS)? {
                Some(duplication) => {
                    match device.monitor_color_info(&output) {
                        Ok(info) => color_info = info,
                        Err(e) => warn!("Failed to get monitor color info:\n{e}"),
                    }

                    duplication
                }
                None => {
                    debug!("Output does not support format negotiation, using baseline mode");
                    device.duplicate_output(&output)?
                }
            };

        let preview = if config.preview {
            Self::create_preview(device, &output, &config.preview_title)
        } else {
            None
        };

        debug!(
            "Started duplication of monitor {monitor_index} {{ hdr: {}, sdr_white: {} }}",
            color_info.hdr, color_info.sdr_white_nits
        );

        Ok(Self {
            duplication: Some(duplication),
            frame_cache: FrameCache::new(),
            preview,
            monitor_index,
            hdr: color_info.hdr,
            sdr_white_nits: color_info.sdr_white_nits,
            frame_available: false,
            refs: 1,
        })
    }

    fn create_preview(device: &D, output: &D::Output, title: &str) -> Option<PreviewPresenter<D>> {
        let desc = match output.desc() {
            Ok(desc) => desc,
            Err(e) => {
                error!("Failed to get output descriptor for preview:\n{e}");
                return None;
            }
        };

        match PreviewPresenter::new(device, &MonitorInfo::from(&desc), title) {
            Ok(preview) => Some(preview),
            Err(e) => {
                error!("Failed to create preview:\n{e}");
                None
            }
        }
    }

    /// Polls the duplication for a new frame without waiting.
    ///
    /// Returns `false` only once the duplication has lost access. A timeout or any other failure
    /// leaves the previously cached frame in place and returns `true`.
    pub fn update(&mut self, device: &D) -> bool {
        let Some(duplication) = self.duplication.as_mut() else {
            return false;
        };

        let resource = match duplication.acquire_next_frame(0) {
            Ok(resource) => resource,
            Err(Error::AccessLost) => {
                warn!("Lost duplication access for monitor {}", self.monitor_index);
                self.duplication = None;
                return false;
            }
            Err(Error::Timeout) => {
                self.present(device);
                return true;
            }
            Err(e) => {
                error!("Failed to update frame:\n{e}");
                self.present(device);
                return true;
            }
        };

        let texture = match device.frame_texture(&resource) {
            Ok(texture) => texture,
            Err(e) => {
                error!("Failed to query frame texture:\n{e}");
                drop(resource);
                if let Err(e) = duplication.release_frame() {
                    warn!("Failed to release frame:\n{e}");
                }
                return true;
            }
        };

        self.frame_cache.ingest(device, &texture, self.hdr);

        drop(texture);
        drop(resource);
        if let Err(e) = duplication.release_frame() {
            warn!("Failed to release frame:\n{e}");
        }

        self.frame_available = true;
        self.present(device);

        true
    }

    fn present(&mut self, device: &D) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };

        if let Err(e) = preview.present(device, self.frame_cache.texture()) {
            error!("Failed to present preview:\n{e}");
        }
    }

    /// Shows or hides the preview window, if there is one.
    pub fn set_preview_visible(&self, visible: bool) {
        if let Some(preview) = &self.preview {
            preview.set_visible(visible);
        }
    }

    /// Clears the frame available flag.
    pub fn reset(&mut self) {
        self.frame_available = false;
    }

    /// The session's lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.duplication.is_some() {
            SessionState::Active
        } else {
            SessionState::Lost
        }
    }

    /// The index of the duplicated monitor.
    pub fn monitor_index(&self) -> u32 {
        self.monitor_index
    }

    /// The texture holding the latest frame.
    pub fn texture(&self) -> Option<&D::Texture> {
        self.frame_cache.texture()
    }

    /// The session's frame cache.
    pub fn frame_cache(&self) -> &FrameCache<D::Texture> {
        &self.frame_cache
    }

    /// How the cached frame's values should be interpreted.
    pub fn color_space(&self) -> ColorSpace {
        self.frame_cache.color_space()
    }

    /// Whether the monitor was in an HDR mode when the session started.
    pub fn is_hdr(&self) -> bool {
        self.hdr
    }

    /// The monitor's SDR white level in nits.
    pub fn sdr_white_level(&self) -> f32 {
        self.sdr_white_nits
    }

    /// Whether a frame was captured since the last reset.
    pub fn frame_available(&self) -> bool {
        self.frame_available
    }

    /// The session's preview, if it has one.
    pub fn preview(&self) -> Option<&PreviewPresenter<D>> {
        self.preview.as_ref()
    }

    /// The number of registry references to this session.
    pub fn refs(&self) -> usize {
        self.refs
    }
}
