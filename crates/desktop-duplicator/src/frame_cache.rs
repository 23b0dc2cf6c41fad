//! Caching the latest frame of a duplication.
//!

use tracing::{debug, error};

use crate::{
    format::{ColorFormat, ColorSpace},
    platform::{GraphicsDevice, Texture},
};

/// The texture mirroring the latest duplicated frame.
///
/// The texture is only reallocated when the source's size or format changes, otherwise frames
/// are copied into the existing texture.
pub struct FrameCache<T> {
    texture: Option<T>,
    width: u32,
    height: u32,
    format: ColorFormat,
    color_space: ColorSpace,
}

impl<T: Texture> FrameCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            texture: None,
            width: 0,
            height: 0,
            format: ColorFormat::Unknown,
            color_space: ColorSpace::Srgb,
        }
    }

    /// Copies `source` into the cache, reallocating the cached texture if `source` no longer
    /// matches it.
    pub fn ingest<D>(&mut self, device: &D, source: &T, hdr: bool)
    where
        D: GraphicsDevice<Texture = T>,
    {
        let desc = source.desc();
        let format = ColorFormat::from_dxgi(desc.format).generalize();

        if !self.matches(desc.width, desc.height, format) {
            // Release the old texture before allocating its replacement.
            self.texture = None;

            debug!(
                "Allocating frame texture {}x{} {:?}",
                desc.width, desc.height, format
            );

            match device.create_texture(desc.width, desc.height, format) {
                Ok(texture) => {
                    self.texture = Some(texture);
                    self.width = desc.width;
                    self.height = desc.height;
                    self.format = format;
                    self.color_space = ColorSpace::for_frame(hdr, desc.format);
                }
                Err(e) => {
                    error!("Failed to create frame texture:\n{e}");
                    return;
                }
            }
        }

        if let Some(texture) = &self.texture {
            device.copy_texture(texture, source);
        }
    }

    /// The cached texture, if a frame has been ingested.
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    /// The size of the cached texture.
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// The generalized format of the cached texture.
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// How the cached texture's values should be interpreted.
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    fn matches(&self, width: u32, height: u32, format: ColorFormat) -> bool {
        self.texture.is_some()
            && self.width == width
            && self.height == height
            && self.format == format
    }
}

impl<T: Texture> Default for FrameCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
