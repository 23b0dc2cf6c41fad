//! The graphics and windowing collaborators a duplication session is driven through.
//!
//! A [`GraphicsDevice`] stands in for the renderer's device: it owns the adapter whose outputs are
//! duplicated, the immediate context frames are copied with, and the single "currently bound
//! presentation target" slot that the preview borrows while presenting. All calls are made from
//! the thread that owns the device.

use core::fmt::Debug;

use crate::{
    error::{Error, PlatformResult},
    format::{ColorFormat, DxgiFormat},
    monitor::{MonitorColorInfo, OutputDesc},
};

/// One of the adapter's outputs.
pub trait Output {
    /// The platform's monitor handle.
    type Monitor: Copy + PartialEq + Debug;

    /// Reads the output's descriptor.
    fn desc(&self) -> PlatformResult<OutputDesc<Self::Monitor>>;
}

/// An active desktop duplication of one output.
pub trait Duplication {
    /// The resource a frame is delivered in.
    type Resource;

    /// Acquires the next frame.
    ///
    /// Returns [`Error::Timeout`] when no frame arrived within `timeout_ms` and
    /// [`Error::AccessLost`] once the duplication has been invalidated.
    fn acquire_next_frame(&mut self, timeout_ms: u32) -> Result<Self::Resource, Error>;

    /// Hands the last acquired frame back to the platform.
    fn release_frame(&mut self) -> PlatformResult<()>;
}

/// Size and format of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Native pixel format.
    pub format: DxgiFormat,
}

/// A GPU resident 2D texture, released on drop.
pub trait Texture {
    /// Reads the texture's descriptor.
    fn desc(&self) -> TextureDesc;
}

/// A region of a texture, right and bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyRegion {
    #[allow(missing_docs)]
    pub left: u32,
    #[allow(missing_docs)]
    pub top: u32,
    #[allow(missing_docs)]
    pub right: u32,
    #[allow(missing_docs)]
    pub bottom: u32,
}

impl CopyRegion {
    /// A region covering `[0, 0]` to `size`.
    pub fn from_size(size: [u32; 2]) -> Self {
        Self {
            left: 0,
            top: 0,
            right: size[0],
            bottom: size[1],
        }
    }
}

/// A presentation surface bound to a window.
pub trait SwapChain {
    /// The current size of the back buffer.
    fn size(&self) -> [u32; 2];

    /// Resizes the back buffer.
    fn resize(&mut self, size: [u32; 2]) -> PlatformResult<()>;

    /// Whether the surface was created with a frame latency waitable object.
    fn has_frame_latency_waitable(&self) -> bool;

    /// Presents the back buffer.
    fn present(&self, sync_interval: u32) -> PlatformResult<()>;
}

/// A top level window owned by a preview, destroyed on drop.
pub trait PreviewWindow {
    /// Whether the window is currently shown.
    fn is_visible(&self) -> bool;

    /// The size of the window's client area.
    fn client_size(&self) -> [u32; 2];

    /// Shows or hides the window.
    fn set_visible(&self, visible: bool);
}

/// The renderer's device.
pub trait GraphicsDevice {
    /// An adapter output.
    type Output: Output;

    /// A desktop duplication created from an [`Output`].
    type Duplication: Duplication;

    /// A 2D texture.
    type Texture: Texture;

    /// A presentation surface.
    type SwapChain: SwapChain;

    /// A preview window.
    type Window: PreviewWindow;

    /// The saved presentation target binding, restored with
    /// [`restore_bound_target`](GraphicsDevice::restore_bound_target).
    type BoundTarget;

    /// Gets the output at `index`, `Ok(None)` once `index` passes the last output.
    fn enum_output(&self, index: u32) -> PlatformResult<Option<Self::Output>>;

    /// Duplicates an output offering `formats`, `Ok(None)` if the output does not support
    /// format negotiation.
    fn duplicate_output_with_formats(
        &self,
        output: &Self::Output,
        formats: &[DxgiFormat],
    ) -> PlatformResult<Option<Self::Duplication>>;

    /// Duplicates an output in the baseline 8 bit mode.
    fn duplicate_output(&self, output: &Self::Output) -> PlatformResult<Self::Duplication>;

    /// Reads the HDR state and SDR white level of the monitor connected to `output`.
    fn monitor_color_info(&self, output: &Self::Output) -> PlatformResult<MonitorColorInfo>;

    /// Gets the 2D texture of an acquired frame.
    fn frame_texture(
        &self,
        resource: &<Self::Duplication as Duplication>::Resource,
    ) -> PlatformResult<Self::Texture>;

    /// Allocates a texture that frames can be copied into.
    fn create_texture(
        &self,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> PlatformResult<Self::Texture>;

    /// Copies the whole of `source` into `destination`.
    fn copy_texture(&self, destination: &Self::Texture, source: &Self::Texture);

    /// Copies `region` of `source` into the swap chain's back buffer at the origin.
    fn copy_to_swap_chain(
        &self,
        swap_chain: &Self::SwapChain,
        source: &Self::Texture,
        region: CopyRegion,
    );

    /// Creates a window for previewing frames, initially hidden.
    fn create_window(&self, title: &str, size: [u32; 2]) -> PlatformResult<Self::Window>;

    /// Creates a presentation surface for `window`.
    fn create_swap_chain(
        &self,
        window: &Self::Window,
        size: [u32; 2],
    ) -> PlatformResult<Self::SwapChain>;

    /// Saves the currently bound presentation target.
    fn bound_target(&self) -> Self::BoundTarget;

    /// Binds the swap chain's back buffer as the active target and covers it with the viewport.
    fn bind_swap_chain(&self, swap_chain: &Self::SwapChain) -> PlatformResult<()>;

    /// Clears the swap chain's back buffer.
    fn clear_swap_chain(&self, swap_chain: &Self::SwapChain, color: [f32; 4]);

    /// Rebinds a target saved with [`bound_target`](GraphicsDevice::bound_target).
    fn restore_bound_target(&self, target: Self::BoundTarget);
}

/// The monitor handle type of a device's outputs.
pub type MonitorHandle<D> = <<D as GraphicsDevice>::Output as Output>::Monitor;
