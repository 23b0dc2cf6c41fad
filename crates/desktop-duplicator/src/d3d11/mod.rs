//! The Direct3D 11 and DXGI implementation of the platform traits.
//!

mod color_info;
mod output;
mod swap_chain;
mod window;

pub use output::{D3D11Duplication, D3D11Output, D3D11Texture};
pub use swap_chain::D3D11SwapChain;
pub use window::Win32Window;

use tracing::{debug, instrument};
use windows::Win32::{
    Foundation::HMODULE,
    Graphics::{
        Direct3D::{D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_WARP},
        Direct3D11::{
            D3D11_BIND_SHADER_RESOURCE, D3D11_BOX, D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            D3D11_SDK_VERSION, D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT, D3D11_TEXTURE2D_DESC,
            D3D11_USAGE_DEFAULT, D3D11_VIEWPORT,
            D3D11_VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE, D3D11CreateDevice,
            ID3D11DepthStencilView, ID3D11Device, ID3D11DeviceContext, ID3D11RenderTargetView,
        },
        Dxgi::{
            Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC},
            DXGI_ERROR_INVALID_CALL, DXGI_ERROR_NOT_FOUND, DXGI_ERROR_UNSUPPORTED, IDXGIAdapter,
            IDXGIDevice, IDXGIFactory2, IDXGIOutput1, IDXGIOutput5, IDXGIResource,
        },
    },
};
use windows_core::Interface;

use crate::{
    error::{PlatformError, PlatformResult},
    format::{ColorFormat, DxgiFormat},
    monitor::MonitorColorInfo,
    platform::{CopyRegion, GraphicsDevice, SwapChain},
};

/// The most render targets that can be bound at once.
const MAX_RENDER_TARGETS: usize = D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT as usize;

/// The most viewports that can be bound at once.
const MAX_VIEWPORTS: usize = D3D11_VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE as usize;

/// A Direct3D 11 device and the adapter whose outputs it duplicates.
pub struct D3D11Device {
    /// Used to create textures, views and duplications.
    pub device: ID3D11Device,

    /// Used to copy frames and bind the preview's target.
    pub context: ID3D11DeviceContext,

    /// Used to enumerate outputs.
    pub adapter: IDXGIAdapter,

    /// Used to create swap chains.
    pub factory: IDXGIFactory2,
}

impl D3D11Device {
    /// Creates a hardware device, falling back to WARP where hardware is unsupported.
    #[instrument("D3D11Device::new", skip_all, err)]
    pub fn new() -> PlatformResult<Self> {
        let mut device = None;
        let mut result = create_device(D3D_DRIVER_TYPE_HARDWARE, &mut device);

        if let Err(error) = &result {
            if error.code() == DXGI_ERROR_UNSUPPORTED {
                debug!("Hardware device unsupported, falling back to WARP");
                result = create_device(D3D_DRIVER_TYPE_WARP, &mut device);
            }
        }
        result.map_err(|e| PlatformError::new(e, "D3D11CreateDevice"))?;

        let device = device.ok_or_else(|| {
            PlatformError::from_code(DXGI_ERROR_INVALID_CALL.0, "D3D11CreateDevice")
        })?;

        Self::from_device(device)
    }

    /// Wraps an existing device, such as the renderer's own.
    pub fn from_device(device: ID3D11Device) -> PlatformResult<Self> {
        let context = unsafe { device.GetImmediateContext() }
            .map_err(|e| PlatformError::new(e, "ID3D11Device::GetImmediateContext"))?;

        let dxgi_device: IDXGIDevice = device
            .cast()
            .map_err(|e| PlatformError::new(e, "ID3D11Device::cast"))?;

        let adapter = unsafe { dxgi_device.GetAdapter() }
            .map_err(|e| PlatformError::new(e, "IDXGIDevice::GetAdapter"))?;

        let factory: IDXGIFactory2 = unsafe { adapter.GetParent() }
            .map_err(|e| PlatformError::new(e, "IDXGIAdapter::GetParent"))?;

        Ok(Self {
            device,
            context,
            adapter,
            factory,
        })
    }
}

fn create_device(
    driver_type: D3D_DRIVER_TYPE,
    device: &mut Option<ID3D11Device>,
) -> windows_result::Result<()> {
    unsafe {
        D3D11CreateDevice(
            None,
            driver_type,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            None,
            D3D11_SDK_VERSION,
            Some(device),
            None,
            None,
        )
    }
}

/// The render target, depth stencil and viewports bound before the preview presented.
pub struct SavedTarget {
    render_targets: [Option<ID3D11RenderTargetView>; MAX_RENDER_TARGETS],
    depth_stencil: Option<ID3D11DepthStencilView>,
    viewports: Vec<D3D11_VIEWPORT>,
}

impl GraphicsDevice for D3D11Device {
    type Output = D3D11Output;
    type Duplication = D3D11Duplication;
    type Texture = D3D11Texture;
    type SwapChain = D3D11SwapChain;
    type Window = Win32Window;
    type BoundTarget = SavedTarget;

    fn enum_output(&self, index: u32) -> PlatformResult<Option<D3D11Output>> {
        match unsafe { self.adapter.EnumOutputs(index) } {
            Ok(output) => Ok(Some(D3D11Output { output })),
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => Ok(None),
            Err(e) => Err(PlatformError::new(e, "IDXGIAdapter::EnumOutputs")),
        }
    }

    fn duplicate_output_with_formats(
        &self,
        output: &D3D11Output,
        formats: &[DxgiFormat],
    ) -> PlatformResult<Option<D3D11Duplication>> {
        let Ok(output) = output.output.cast::<IDXGIOutput5>() else {
            return Ok(None);
        };

        let formats: Vec<DXGI_FORMAT> =
            formats.iter().map(|format| DXGI_FORMAT(format.0)).collect();

        let duplication = unsafe { output.DuplicateOutput1(&self.device, 0, &formats) }
            .map_err(|e| PlatformError::new(e, "IDXGIOutput5::DuplicateOutput1"))?;

        Ok(Some(D3D11Duplication { duplication }))
    }

    fn duplicate_output(&self, output: &D3D11Output) -> PlatformResult<D3D11Duplication> {
        let output: IDXGIOutput1 = output
            .output
            .cast()
            .map_err(|e| PlatformError::new(e, "IDXGIOutput::cast"))?;

        let duplication = unsafe { output.DuplicateOutput(&self.device) }
            .map_err(|e| PlatformError::new(e, "IDXGIOutput1::DuplicateOutput"))?;

        Ok(D3D11Duplication { duplication })
    }

    fn monitor_color_info(&self, output: &D3D11Output) -> PlatformResult<MonitorColorInfo> {
        color_info::monitor_color_info(&output.output)
    }

    fn frame_texture(&self, resource: &IDXGIResource) -> PlatformResult<D3D11Texture> {
        let texture = resource
            .cast()
            .map_err(|e| PlatformError::new(e, "IDXGIResource::cast"))?;

        Ok(D3D11Texture { texture })
    }

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> PlatformResult<D3D11Texture> {
        let desc = D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT(format.resource_format().0),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };

        let mut texture = None;
        unsafe { self.device.CreateTexture2D(&desc, None, Some(&mut texture)) }
            .map_err(|e| PlatformError::new(e, "ID3D11Device::CreateTexture2D"))?;

        let texture = texture.ok_or_else(|| {
            PlatformError::from_code(DXGI_ERROR_INVALID_CALL.0, "ID3D11Device::CreateTexture2D")
        })?;

        Ok(D3D11Texture { texture })
    }

    fn copy_texture(&self, destination: &D3D11Texture, source: &D3D11Texture) {
        unsafe { self.context.CopyResource(&destination.texture, &source.texture) };
    }

    fn copy_to_swap_chain(
        &self,
        swap_chain: &D3D11SwapChain,
        source: &D3D11Texture,
        region: CopyRegion,
    ) {
        let Some(back_buffer) = swap_chain.back_buffer() else {
            return;
        };

        let source_box = D3D11_BOX {
            left: region.left,
            top: region.top,
            front: 0,
            right: region.right,
            bottom: region.bottom,
            back: 1,
        };

        unsafe {
            self.context.CopySubresourceRegion(
                back_buffer,
                0,
                0,
                0,
                0,
                &source.texture,
                0,
                Some(&source_box),
            )
        };
    }

    fn create_window(&self, title: &str, size: [u32; 2]) -> PlatformResult<Win32Window> {
        Win32Window::new(title, size)
    }

    fn create_swap_chain(
        &self,
        window: &Win32Window,
        size: [u32; 2],
    ) -> PlatformResult<D3D11SwapChain> {
        D3D11SwapChain::new(&self.device, &self.factory, window.hwnd(), size)
    }

    fn bound_target(&self) -> SavedTarget {
        let mut render_targets: [Option<ID3D11RenderTargetView>; MAX_RENDER_TARGETS] =
            core::array::from_fn(|_| None);
        let mut depth_stencil = None;
        unsafe {
            self.context
                .OMGetRenderTargets(Some(&mut render_targets), Some(&mut depth_stencil))
        };

        let mut viewports = [D3D11_VIEWPORT::default(); MAX_VIEWPORTS];
        let mut viewport_count = MAX_VIEWPORTS as u32;
        unsafe {
            self.context
                .RSGetViewports(&mut viewport_count, Some(viewports.as_mut_ptr()))
        };

        SavedTarget {
            render_targets,
            depth_stencil,
            viewports: viewports[..viewport_count as usize].to_vec(),
        }
    }

    fn bind_swap_chain(&self, swap_chain: &D3D11SwapChain) -> PlatformResult<()> {
        let Some(render_target) = swap_chain.render_target() else {
            // The back buffer's view could not be recreated after a resize.
            return Err(PlatformError::from_code(
                DXGI_ERROR_INVALID_CALL.0,
                "ID3D11DeviceContext::OMSetRenderTargets",
            ));
        };

        let [width, height] = swap_chain.size();
        let viewport = D3D11_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as f32,
            Height: height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };

        unsafe {
            self.context
                .OMSetRenderTargets(Some(&[Some(render_target.clone())]), None);
            self.context.RSSetViewports(Some(&[viewport]));
        }

        Ok(())
    }

    fn clear_swap_chain(&self, swap_chain: &D3D11SwapChain, color: [f32; 4]) {
        if let Some(render_target) = swap_chain.render_target() {
            unsafe { self.context.ClearRenderTargetView(render_target, &color) };
        }
    }

    fn restore_bound_target(&self, target: SavedTarget) {
        unsafe {
            self.context.OMSetRenderTargets(
                Some(&target.render_targets),
                target.depth_stencil.as_ref(),
            );
            self.context.RSSetViewports(Some(&target.viewports));
        }
    }
}
