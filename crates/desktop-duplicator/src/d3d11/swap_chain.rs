use tracing::{debug, error, instrument};
use windows::Win32::{
    Foundation::{CloseHandle, HANDLE, HWND},
    Graphics::{
        Direct3D11::{ID3D11Device, ID3D11RenderTargetView, ID3D11Texture2D},
        Dxgi::{
            Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC},
            DXGI_PRESENT, DXGI_SWAP_CHAIN_DESC1, DXGI_SWAP_CHAIN_FLAG,
            DXGI_SWAP_CHAIN_FLAG_FRAME_LATENCY_WAITABLE_OBJECT, DXGI_SWAP_EFFECT_FLIP_DISCARD,
            DXGI_USAGE_RENDER_TARGET_OUTPUT, IDXGIFactory2, IDXGISwapChain1, IDXGISwapChain2,
        },
    },
};
use windows_core::Interface;

use crate::{
    error::{PlatformError, PlatformResult},
    platform::SwapChain,
};

const BUFFER_COUNT: u32 = 2;

/// A flip model swap chain presenting into a preview window.
pub struct D3D11SwapChain {
    // Views of the back buffer must be released before the buffers are resized or destroyed.
    render_target: Option<ID3D11RenderTargetView>,
    back_buffer: Option<ID3D11Texture2D>,
    swap_chain: IDXGISwapChain1,

    device: ID3D11Device,
    flags: DXGI_SWAP_CHAIN_FLAG,
    waitable: Option<HANDLE>,
    size: [u32; 2],
}

impl D3D11SwapChain {
    #[instrument("D3D11SwapChain::new", skip_all, err)]
    pub(super) fn new(
        device: &ID3D11Device,
        factory: &IDXGIFactory2,
        hwnd: HWND,
        size: [u32; 2],
    ) -> PlatformResult<Self> {
        let mut flags = DXGI_SWAP_CHAIN_FLAG_FRAME_LATENCY_WAITABLE_OBJECT;

        let mut desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: size[0],
            Height: size[1],
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: BUFFER_COUNT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            Flags: flags.0 as u32,
            ..Default::default()
        };

        let result = unsafe { factory.CreateSwapChainForHwnd(device, hwnd, &desc, None, None) };

        let swap_chain = match result {
            Ok(swap_chain) => swap_chain,
            Err(e) => {
                debug!("Frame latency waitable swap chain unavailable, retrying without:\n{e}");

                flags = DXGI_SWAP_CHAIN_FLAG(0);
                desc.Flags = 0;

                unsafe { factory.CreateSwapChainForHwnd(device, hwnd, &desc, None, None) }
                    .map_err(|e| PlatformError::new(e, "IDXGIFactory2::CreateSwapChainForHwnd"))?
            }
        };

        let waitable = if flags == DXGI_SWAP_CHAIN_FLAG_FRAME_LATENCY_WAITABLE_OBJECT {
            frame_latency_waitable(&swap_chain)
        } else {
            None
        };

        let mut swap_chain = Self {
            render_target: None,
            back_buffer: None,
            swap_chain,
            device: device.clone(),
            flags,
            waitable,
            size,
        };
        swap_chain.create_render_target()?;

        Ok(swap_chain)
    }

    fn create_render_target(&mut self) -> PlatformResult<()> {
        let back_buffer: ID3D11Texture2D = unsafe { self.swap_chain.GetBuffer(0) }
            .map_err(|e| PlatformError::new(e, "IDXGISwapChain::GetBuffer"))?;

        let mut render_target = None;
        unsafe {
            self.device
                .CreateRenderTargetView(&back_buffer, None, Some(&mut render_target))
        }
        .map_err(|e| PlatformError::new(e, "ID3D11Device::CreateRenderTargetView"))?;

        self.back_buffer = Some(back_buffer);
        self.render_target = render_target;

        Ok(())
    }

    /// The render target view of the back buffer, `None` if it could not be recreated after a
    /// resize.
    pub fn render_target(&self) -> Option<&ID3D11RenderTargetView> {
        self.render_target.as_ref()
    }

    /// The back buffer.
    pub fn back_buffer(&self) -> Option<&ID3D11Texture2D> {
        self.back_buffer.as_ref()
    }
}

impl SwapChain for D3D11SwapChain {
    fn size(&self) -> [u32; 2] {
        self.size
    }

    fn resize(&mut self, size: [u32; 2]) -> PlatformResult<()> {
        self.render_target = None;
        self.back_buffer = None;

        unsafe {
            self.swap_chain
                .ResizeBuffers(0, size[0], size[1], DXGI_FORMAT_UNKNOWN, self.flags)
        }
        .map_err(|e| PlatformError::new(e, "IDXGISwapChain::ResizeBuffers"))?;

        // Until the view exists the old size is kept, so the next present retries the resize.
        self.create_render_target()?;
        self.size = size;

        Ok(())
    }

    fn has_frame_latency_waitable(&self) -> bool {
        self.waitable.is_some()
    }

    fn present(&self, sync_interval: u32) -> PlatformResult<()> {
        unsafe { self.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) }
            .ok()
            .map_err(|e| PlatformError::new(e, "IDXGISwapChain::Present"))
    }
}

impl Drop for D3D11SwapChain {
    fn drop(&mut self) {
        if let Some(waitable) = self.waitable.take() {
            if let Err(e) = unsafe { CloseHandle(waitable) } {
                error!("Failed to close frame latency waitable:\n{e}");
            }
        }
    }
}

fn frame_latency_waitable(swap_chain: &IDXGISwapChain1) -> Option<HANDLE> {
    let swap_chain: IDXGISwapChain2 = match swap_chain.cast() {
        Ok(swap_chain) => swap_chain,
        Err(e) => {
            debug!("Swap chain has no frame latency waitable:\n{e}");
            return None;
        }
    };

    let handle = unsafe { swap_chain.GetFrameLatencyWaitableObject() };

    if handle.is_invalid() { None } else { Some(handle) }
}
