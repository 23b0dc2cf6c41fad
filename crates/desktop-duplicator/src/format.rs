//! Pixel formats and color space tags for duplicated frames.
//!

/// A native `DXGI_FORMAT` value as reported by a texture descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct DxgiFormat(pub i32);

#[allow(missing_docs)]
impl DxgiFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R32G32B32A32_FLOAT: Self = Self(2);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R16G16B16A16_UNORM: Self = Self(11);
    pub const R32G32_FLOAT: Self = Self(16);
    pub const R10G10B10A2_UNORM: Self = Self(24);
    pub const R8G8B8A8_TYPELESS: Self = Self(27);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const R16G16_FLOAT: Self = Self(34);
    pub const R16G16_UNORM: Self = Self(35);
    pub const R32_FLOAT: Self = Self(41);
    pub const R8G8_UNORM: Self = Self(49);
    pub const R16_FLOAT: Self = Self(54);
    pub const R16_UNORM: Self = Self(56);
    pub const R8_UNORM: Self = Self(61);
    pub const A8_UNORM: Self = Self(65);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC2_UNORM: Self = Self(74);
    pub const BC3_UNORM: Self = Self(77);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const B8G8R8A8_TYPELESS: Self = Self(90);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
    pub const B8G8R8X8_TYPELESS: Self = Self(92);
    pub const B8G8R8X8_UNORM_SRGB: Self = Self(93);
}

/// The formats offered to the HDR capable duplication mode, in order of preference.
pub const DUPLICATION_FORMATS: [DxgiFormat; 2] =
    [DxgiFormat::R16G16B16A16_FLOAT, DxgiFormat::B8G8R8A8_UNORM];

/// Application side texture formats.
///
/// The `*Unorm` variants distinguish views that must not be reinterpreted as sRGB, a cached
/// frame is always stored in the [generalized](ColorFormat::generalize) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum ColorFormat {
    #[default]
    Unknown,
    A8,
    R8,
    Rgba,
    Bgrx,
    Bgra,
    R10G10B10A2,
    Rgba16,
    R16,
    Rgba16F,
    Rgba32F,
    Rg16F,
    Rg32F,
    R16F,
    R32F,
    Dxt1,
    Dxt3,
    Dxt5,
    R8G8,
    RgbaUnorm,
    BgrxUnorm,
    BgraUnorm,
    Rg16,
}

impl ColorFormat {
    /// Maps a native format onto the application format that can hold it.
    pub fn from_dxgi(format: DxgiFormat) -> Self {
        match format {
            DxgiFormat::R8G8_UNORM => Self::R8G8,
            DxgiFormat::A8_UNORM => Self::A8,
            DxgiFormat::R8_UNORM => Self::R8,
            DxgiFormat::R8G8B8A8_TYPELESS => Self::Rgba,
            DxgiFormat::B8G8R8X8_TYPELESS => Self::Bgrx,
            DxgiFormat::B8G8R8A8_TYPELESS => Self::Bgra,
            DxgiFormat::R10G10B10A2_UNORM => Self::R10G10B10A2,
            DxgiFormat::R16G16B16A16_UNORM => Self::Rgba16,
            DxgiFormat::R16_UNORM => Self::R16,
            DxgiFormat::R16G16B16A16_FLOAT => Self::Rgba16F,
            DxgiFormat::R32G32B32A32_FLOAT => Self::Rgba32F,
            DxgiFormat::R16G16_FLOAT => Self::Rg16F,
            DxgiFormat::R32G32_FLOAT => Self::Rg32F,
            DxgiFormat::R16_FLOAT => Self::R16F,
            DxgiFormat::R32_FLOAT => Self::R32F,
            DxgiFormat::BC1_UNORM => Self::Dxt1,
            DxgiFormat::BC2_UNORM => Self::Dxt3,
            DxgiFormat::BC3_UNORM => Self::Dxt5,
            DxgiFormat::R8G8B8A8_UNORM => Self::RgbaUnorm,
            DxgiFormat::B8G8R8X8_UNORM => Self::BgrxUnorm,
            DxgiFormat::B8G8R8A8_UNORM => Self::BgraUnorm,
            DxgiFormat::R16G16_UNORM => Self::Rg16,
            _ => Self::Unknown,
        }
    }

    /// Drops the unorm distinction so the texture may be viewed as either linear or sRGB.
    pub fn generalize(self) -> Self {
        match self {
            Self::RgbaUnorm => Self::Rgba,
            Self::BgrxUnorm => Self::Bgrx,
            Self::BgraUnorm => Self::Bgra,
            other => other,
        }
    }

    /// The native format a texture of this format is allocated with.
    ///
    /// 8 bit formats are allocated typeless so both linear and sRGB views can be created.
    pub fn resource_format(self) -> DxgiFormat {
        match self {
            Self::Unknown => DxgiFormat::UNKNOWN,
            Self::A8 => DxgiFormat::A8_UNORM,
            Self::R8 => DxgiFormat::R8_UNORM,
            Self::Rgba => DxgiFormat::R8G8B8A8_TYPELESS,
            Self::Bgrx => DxgiFormat::B8G8R8X8_TYPELESS,
            Self::Bgra => DxgiFormat::B8G8R8A8_TYPELESS,
            Self::R10G10B10A2 => DxgiFormat::R10G10B10A2_UNORM,
            Self::Rgba16 => DxgiFormat::R16G16B16A16_UNORM,
            Self::R16 => DxgiFormat::R16_UNORM,
            Self::Rgba16F => DxgiFormat::R16G16B16A16_FLOAT,
            Self::Rgba32F => DxgiFormat::R32G32B32A32_FLOAT,
            Self::Rg16F => DxgiFormat::R16G16_FLOAT,
            Self::Rg32F => DxgiFormat::R32G32_FLOAT,
            Self::R16F => DxgiFormat::R16_FLOAT,
            Self::R32F => DxgiFormat::R32_FLOAT,
            Self::Dxt1 => DxgiFormat::BC1_UNORM,
            Self::Dxt3 => DxgiFormat::BC2_UNORM,
            Self::Dxt5 => DxgiFormat::BC3_UNORM,
            Self::R8G8 => DxgiFormat::R8G8_UNORM,
            Self::RgbaUnorm => DxgiFormat::R8G8B8A8_UNORM,
            Self::BgrxUnorm => DxgiFormat::B8G8R8X8_UNORM,
            Self::BgraUnorm => DxgiFormat::B8G8R8A8_UNORM,
            Self::Rg16 => DxgiFormat::R16G16_UNORM,
        }
    }
}

/// Describes how the values of a cached frame should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// 8 bit sRGB.
    #[default]
    Srgb,

    /// sRGB primaries and transfer stored in half floats.
    Srgb16F,

    /// Rec. 709 primaries with values extended past `[0, 1]`.
    Rec709Extended,

    /// Linear Rec. 709 primaries scaled so `1.0` is 80 nits.
    Rec709ScRgb,
}

impl ColorSpace {
    /// The tag for a frame captured from a monitor with the given HDR state and native format.
    pub fn for_frame(hdr: bool, native_format: DxgiFormat) -> Self {
        if hdr {
            Self::Rec709ScRgb
        } else if native_format == DxgiFormat::R16G16B16A16_FLOAT {
            Self::Srgb16F
        } else {
            Self::Srgb
        }
    }
}
