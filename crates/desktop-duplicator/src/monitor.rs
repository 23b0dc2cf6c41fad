//! Resolving monitor indices to adapter outputs and describing them.
//!

use tracing::error;

use crate::{
    error::{Error, PlatformError},
    platform::{GraphicsDevice, MonitorHandle, Output},
};

/// SDR white level reported for monitors without HDR color information.
pub const DEFAULT_SDR_WHITE_NITS: f32 = 80.0;

/// A rect in desktop coordinates, relative to the top-left point of the primary monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Calculates the rect's width and height.
    pub fn size(&self) -> [u32; 2] {
        let width = self.left.abs_diff(self.right);
        let height = self.top.abs_diff(self.bottom);

        [width, height]
    }
}

/// The rotation of an output's scanout relative to its desktop image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum Rotation {
    #[default]
    Unspecified,
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// The rotation in clockwise degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Self::Unspecified | Self::Identity => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }
}

/// The descriptor of an adapter output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputDesc<M> {
    /// The monitor connected to the output.
    pub monitor: M,

    /// The output's bounds on the desktop.
    pub desktop_coordinates: Rect,

    /// The output's rotation.
    pub rotation: Rotation,
}

/// Position, size and rotation of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorInfo {
    /// Left edge in desktop coordinates.
    pub x: i32,

    /// Top edge in desktop coordinates.
    pub y: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// One of 0, 90, 180 or 270.
    pub rotation_degrees: u32,
}

impl<M> From<&OutputDesc<M>> for MonitorInfo {
    fn from(desc: &OutputDesc<M>) -> Self {
        let [width, height] = desc.desktop_coordinates.size();

        Self {
            x: desc.desktop_coordinates.left,
            y: desc.desktop_coordinates.top,
            width,
            height,
            rotation_degrees: desc.rotation.degrees(),
        }
    }
}

/// HDR state and SDR reference white of a monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorColorInfo {
    /// The monitor is currently in an HDR mode.
    pub hdr: bool,

    /// The brightness SDR white is mapped to, in nits.
    pub sdr_white_nits: f32,
}

impl Default for MonitorColorInfo {
    fn default() -> Self {
        Self {
            hdr: false,
            sdr_white_nits: DEFAULT_SDR_WHITE_NITS,
        }
    }
}

/// Gets the output for a monitor index, [`Error::NotFound`] if there is no such output.
pub fn resolve_output<D: GraphicsDevice>(device: &D, index: u32) -> Result<D::Output, Error> {
    device.enum_output(index)?.ok_or(Error::NotFound(index))
}

/// Gets the position, size and rotation of the monitor at `index`.
pub fn monitor_info<D: GraphicsDevice>(device: &D, index: u32) -> Result<MonitorInfo, Error> {
    let output = resolve_output(device, index)?;
    let desc = output.desc()?;

    Ok(MonitorInfo::from(&desc))
}

/// Gets the info of every output on the adapter in index order.
pub fn monitors<D: GraphicsDevice>(device: &D) -> Result<Vec<MonitorInfo>, PlatformError> {
    let mut monitors = Vec::new();
    let mut index = 0;

    while let Some(output) = device.enum_output(index)? {
        let desc = output.desc()?;
        monitors.push(MonitorInfo::from(&desc));

        index += 1;
    }

    Ok(monitors)
}

/// Finds the index of the output connected to `monitor`, `-1` if none match.
pub fn monitor_index<D: GraphicsDevice>(device: &D, monitor: MonitorHandle<D>) -> i32 {
    let mut index = 0;

    loop {
        let output = match device.enum_output(index) {
            Ok(Some(output)) => output,
            Ok(None) => return -1,
            Err(e) => {
                error!("Failed to get output {index}:\n{e}");
                return -1;
            }
        };

        match output.desc() {
            Ok(desc) if desc.monitor == monitor => return index as i32,
            Ok(_) => {}
            Err(e) => error!("Failed to get descriptor of output {index}:\n{e}"),
        }

        index += 1;
    }
}
