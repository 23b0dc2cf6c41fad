use windows::Win32::{
    Foundation::E_POINTER,
    Graphics::{
        Direct3D11::{D3D11_TEXTURE2D_DESC, ID3D11Texture2D},
        Dxgi::{
            DXGI_ERROR_ACCESS_LOST, DXGI_ERROR_WAIT_TIMEOUT, DXGI_MODE_ROTATION,
            DXGI_MODE_ROTATION_IDENTITY, DXGI_MODE_ROTATION_ROTATE90,
            DXGI_MODE_ROTATION_ROTATE180, DXGI_MODE_ROTATION_ROTATE270, DXGI_OUTDUPL_FRAME_INFO,
            IDXGIOutput, IDXGIOutputDuplication, IDXGIResource,
        },
        Gdi::HMONITOR,
    },
};

use crate::{
    error::{Error, PlatformError, PlatformResult},
    format::DxgiFormat,
    monitor::{OutputDesc, Rect, Rotation},
    platform::{Duplication, Output, Texture, TextureDesc},
};

/// An output of the device's adapter.
#[derive(Debug, Clone)]
pub struct D3D11Output {
    pub(super) output: IDXGIOutput,
}

impl Output for D3D11Output {
    type Monitor = HMONITOR;

    fn desc(&self) -> PlatformResult<OutputDesc<HMONITOR>> {
        let desc = unsafe { self.output.GetDesc() }
            .map_err(|e| PlatformError::new(e, "IDXGIOutput::GetDesc"))?;

        let coordinates = desc.DesktopCoordinates;

        Ok(OutputDesc {
            monitor: desc.Monitor,
            desktop_coordinates: Rect {
                left: coordinates.left,
                top: coordinates.top,
                right: coordinates.right,
                bottom: coordinates.bottom,
            },
            rotation: rotation(desc.Rotation),
        })
    }
}

fn rotation(rotation: DXGI_MODE_ROTATION) -> Rotation {
    match rotation {
        DXGI_MODE_ROTATION_IDENTITY => Rotation::Identity,
        DXGI_MODE_ROTATION_ROTATE90 => Rotation::Rotate90,
        DXGI_MODE_ROTATION_ROTATE180 => Rotation::Rotate180,
        DXGI_MODE_ROTATION_ROTATE270 => Rotation::Rotate270,
        _ => Rotation::Unspecified,
    }
}

/// A DXGI output duplication.
pub struct D3D11Duplication {
    pub(super) duplication: IDXGIOutputDuplication,
}

impl Duplication for D3D11Duplication {
    type Resource = IDXGIResource;

    fn acquire_next_frame(&mut self, timeout_ms: u32) -> Result<IDXGIResource, Error> {
        let mut frame_info = DXGI_OUTDUPL_FRAME_INFO::default();
        let mut resource = None;

        let result = unsafe {
            self.duplication
                .AcquireNextFrame(timeout_ms, &mut frame_info, &mut resource)
        };

        if let Err(e) = result {
            let code = e.code();

            if code == DXGI_ERROR_ACCESS_LOST {
                return Err(Error::AccessLost);
            }

            if code == DXGI_ERROR_WAIT_TIMEOUT {
                return Err(Error::Timeout);
            }

            return Err(PlatformError::new(e, "IDXGIOutputDuplication::AcquireNextFrame").into());
        }

        match resource {
            Some(resource) => Ok(resource),
            None => {
                // The frame is held even though no resource came back with it.
                self.release_frame()?;

                Err(PlatformError::from_code(
                    E_POINTER.0,
                    "IDXGIOutputDuplication::AcquireNextFrame",
                )
                .into())
            }
        }
    }

    fn release_frame(&mut self) -> PlatformResult<()> {
        unsafe { self.duplication.ReleaseFrame() }
            .map_err(|e| PlatformError::new(e, "IDXGIOutputDuplication::ReleaseFrame"))
    }
}

/// A Direct3D 11 2D texture.
#[derive(Debug, Clone)]
pub struct D3D11Texture {
    pub(super) texture: ID3D11Texture2D,
}

impl D3D11Texture {
    /// The underlying texture, for binding into the renderer's own pipelines.
    pub fn as_raw(&self) -> &ID3D11Texture2D {
        &self.texture
    }
}

impl Texture for D3D11Texture {
    fn desc(&self) -> TextureDesc {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { self.texture.GetDesc(&mut desc) };

        TextureDesc {
            width: desc.Width,
            height: desc.Height,
            format: DxgiFormat(desc.Format.0),
        }
    }
}
