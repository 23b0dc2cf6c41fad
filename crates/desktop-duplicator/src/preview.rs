//! Mirroring duplicated frames into a window.
//!
//! The preview owns a window and a swap chain bound to it. Presenting borrows the device's bound
//! presentation target: the caller's target is saved before the swap chain is bound and restored
//! on every exit path, so presenting never disturbs the caller's own rendering.
//!
//! Window resizes are not handled when they happen. The swap chain is resized to the window's
//! client area at the start of the next present instead.

use tracing::instrument;

use crate::{
    error::PlatformResult,
    monitor::MonitorInfo,
    platform::{CopyRegion, GraphicsDevice, PreviewWindow, SwapChain, Texture},
};

/// The title given to preview windows by default.
pub const DEFAULT_PREVIEW_TITLE: &str = "Screen Display";

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// A window showing the latest frame of a duplication session.
pub struct PreviewPresenter<D: GraphicsDevice> {
    // Field order is drop order, the swap chain must go before its window.
    swap_chain: D::SwapChain,
    window: D::Window,
}

impl<D: GraphicsDevice> PreviewPresenter<D> {
    /// Creates a window half the size of `monitor`, binds a swap chain to it and shows it.
    #[instrument("PreviewPresenter::new", skip_all, err)]
    pub fn new(device: &D, monitor: &MonitorInfo, title: &str) -> PlatformResult<Self> {
        let size = [monitor.width / 2, monitor.height / 2];

        let window = device.create_window(title, size)?;

        // On failure the window is dropped, and so destroyed, with the error.
        let swap_chain = device.create_swap_chain(&window, size)?;

        window.set_visible(true);

        Ok(Self { swap_chain, window })
    }

    /// Copies `texture` into the window and presents it.
    ///
    /// Returns `Ok(false)` without touching the device if the window is hidden, has no client
    /// area, or there is no texture.
    pub fn present(&mut self, device: &D, texture: Option<&D::Texture>) -> PlatformResult<bool> {
        let Some(texture) = texture else {
            return Ok(false);
        };

        if !self.window.is_visible() {
            return Ok(false);
        }

        let client_size = self.window.client_size();
        if client_size[0] == 0 || client_size[1] == 0 {
            return Ok(false);
        }

        if self.swap_chain.size() != client_size {
            self.swap_chain.resize(client_size)?;
        }

        let _restore = RestoreTarget {
            device,
            target: Some(device.bound_target()),
        };

        device.bind_swap_chain(&self.swap_chain)?;
        device.clear_swap_chain(&self.swap_chain, CLEAR_COLOR);

        let desc = texture.desc();
        let region = CopyRegion::from_size([desc.width, desc.height]);
        device.copy_to_swap_chain(&self.swap_chain, texture, region);

        let sync_interval = if self.swap_chain.has_frame_latency_waitable() {
            1
        } else {
            0
        };
        self.swap_chain.present(sync_interval)?;

        Ok(true)
    }

    /// Shows or hides the window.
    pub fn set_visible(&self, visible: bool) {
        self.window.set_visible(visible);
    }

    /// The preview's window.
    pub fn window(&self) -> &D::Window {
        &self.window
    }

    /// The preview's swap chain.
    pub fn swap_chain(&self) -> &D::SwapChain {
        &self.swap_chain
    }
}

/// Rebinds the saved presentation target when dropped.
struct RestoreTarget<'a, D: GraphicsDevice> {
    device: &'a D,
    target: Option<D::BoundTarget>,
}

impl<D: GraphicsDevice> Drop for RestoreTarget<'_, D> {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            self.device.restore_bound_target(target);
        }
    }
}
