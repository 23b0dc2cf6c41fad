//! An in-memory [`GraphicsDevice`] with scripted outputs and frames.
//!
//! Every object the device hands out shares the device's state, so tests can inspect what
//! happened after the objects have been moved into a session, and drops are recorded as
//! [`Event`]s in the order they happen.

use core::cell::{Cell, RefCell};
use std::{
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use desktop_duplicator::{
    ColorFormat, DxgiFormat, Error, MonitorColorInfo, PlatformError, PlatformResult,
    monitor::{OutputDesc, Rect, Rotation},
    platform::{
        CopyRegion, Duplication, GraphicsDevice, Output, PreviewWindow, SwapChain, Texture,
        TextureDesc,
    },
};

/// The target bound by the "caller" before any preview presents.
pub const CALLER_TARGET: u64 = 1;

/// An output the mock adapter exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct MockOutputConfig {
    /// The monitor handle reported in the output's descriptor.
    pub monitor: u32,

    /// The output's desktop coordinates.
    pub rect: Rect,

    /// The output's rotation.
    pub rotation: Rotation,

    /// Whether the monitor is in an HDR mode.
    pub hdr: bool,

    /// The monitor's SDR white level.
    pub sdr_white_nits: f32,

    /// Whether the output supports duplication with format negotiation.
    pub format_negotiation: bool,

    /// Reading the descriptor fails.
    pub desc_fails: bool,
}

impl MockOutputConfig {
    /// An SDR output at `rect` supporting format negotiation.
    pub fn new(monitor: u32, rect: Rect) -> Self {
        Self {
            monitor,
            rect,
            rotation: Rotation::Identity,
            hdr: false,
            sdr_white_nits: 80.0,
            format_negotiation: true,
            desc_fails: false,
        }
    }

    /// An SDR output of `size` with its top-left corner at `origin`.
    pub fn sized(monitor: u32, origin: [i32; 2], size: [u32; 2]) -> Self {
        Self::new(
            monitor,
            Rect {
                left: origin[0],
                top: origin[1],
                right: origin[0] + size[0] as i32,
                bottom: origin[1] + size[1] as i32,
            },
        )
    }

    /// Puts the monitor in an HDR mode with the given SDR white level.
    pub fn hdr(mut self, sdr_white_nits: f32) -> Self {
        self.hdr = true;
        self.sdr_white_nits = sdr_white_nits;
        self
    }

    /// Only supports the baseline duplication mode.
    pub fn baseline_only(mut self) -> Self {
        self.format_negotiation = false;
        self
    }

    /// Sets the output's rotation.
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// The outcome of one `acquire_next_frame` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A frame of the given size and format arrives.
    Frame {
        #[allow(missing_docs)]
        width: u32,
        #[allow(missing_docs)]
        height: u32,
        #[allow(missing_docs)]
        format: DxgiFormat,
    },

    /// No frame within the timeout.
    Timeout,

    /// The duplication is invalidated.
    AccessLost,

    /// Some other platform failure.
    Failure,

    /// A frame arrives but its resource is not a 2D texture.
    BadResource,
}

impl Acquire {
    /// An 8 bit BGRA frame.
    pub fn bgra(width: u32, height: u32) -> Self {
        Self::Frame {
            width,
            height,
            format: DxgiFormat::B8G8R8A8_UNORM,
        }
    }

    /// A half float RGBA frame.
    pub fn float16(width: u32, height: u32) -> Self {
        Self::Frame {
            width,
            height,
            format: DxgiFormat::R16G16B16A16_FLOAT,
        }
    }
}

/// A recorded side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The duplication of the output at this index was released.
    DuplicationReleased(u32),

    /// An allocated texture was released.
    TextureReleased(u64),

    /// A swap chain was released.
    SwapChainReleased(u64),

    /// A window was destroyed.
    WindowDestroyed(u64),
}

/// Calls that should fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Failures {
    #[allow(missing_docs)]
    pub duplication: bool,
    #[allow(missing_docs)]
    pub color_info: bool,
    #[allow(missing_docs)]
    pub create_texture: bool,
    #[allow(missing_docs)]
    pub create_window: bool,
    #[allow(missing_docs)]
    pub create_swap_chain: bool,
    #[allow(missing_docs)]
    pub resize: bool,
    #[allow(missing_docs)]
    pub bind: bool,
    #[allow(missing_docs)]
    pub present: bool,
}

/// A present of a swap chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Present {
    /// The swap chain presented.
    pub swap_chain: u64,

    /// The sync interval passed.
    pub sync_interval: u32,

    /// The target bound at the time of presenting.
    pub bound_target: u64,
}

/// The state shared by the device and everything it creates.
#[derive(Debug, Default)]
pub struct MockState {
    /// The adapter's outputs in index order.
    pub outputs: Vec<MockOutputConfig>,

    /// Enumerating the output at this index fails.
    pub enumeration_fails_at: Option<u32>,

    /// Scripted acquire outcomes per output index, [`Acquire::Timeout`] once exhausted.
    pub frames: HashMap<u32, VecDeque<Acquire>>,

    /// Calls that should fail.
    pub failures: Failures,

    /// Whether new swap chains get a frame latency waitable.
    pub no_frame_latency_waitable: bool,

    /// Drops in the order they happened.
    pub events: Vec<Event>,

    /// The formats offered to the last format negotiating duplication.
    pub offered_formats: Vec<DxgiFormat>,

    /// The number of baseline duplications created.
    pub baseline_duplications: usize,

    /// The number of acquire calls.
    pub acquires: usize,

    /// Frames acquired and not yet released.
    pub held_frames: usize,

    /// The number of textures allocated.
    pub textures_created: usize,

    /// The number of allocated textures not yet released.
    pub live_textures: usize,

    /// `(destination, source)` of each texture copy.
    pub copies: Vec<(u64, u64)>,

    /// `(swap chain, source, region)` of each copy into a swap chain.
    pub swap_chain_copies: Vec<(u64, u64, CopyRegion)>,

    /// The currently bound target.
    pub bound_target: u64,

    /// The number of times a saved target was restored.
    pub restores: usize,

    /// The number of swap chain clears.
    pub clears: usize,

    /// Every present.
    pub presents: Vec<Present>,

    /// The titles of every window created.
    pub window_titles: Vec<String>,

    next_id: u64,
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn mock_error(call: &'static str) -> PlatformError {
    PlatformError::from_code(0x887A_0001_u32 as i32, call)
}

/// A mock device over a set of outputs.
///
/// Clones share state, keep one to inspect the device after moving another into a duplicator.
#[derive(Debug, Clone)]
pub struct MockDevice {
    state: Rc<RefCell<MockState>>,
}

impl MockDevice {
    /// Creates a device whose adapter exposes `outputs`.
    pub fn new(outputs: Vec<MockOutputConfig>) -> Self {
        let state = MockState {
            outputs,
            bound_target: CALLER_TARGET,
            next_id: CALLER_TARGET,
            ..Default::default()
        };

        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Queues acquire outcomes for the output at `index`.
    pub fn push_frames(&self, index: u32, frames: impl IntoIterator<Item = Acquire>) {
        self.state
            .borrow_mut()
            .frames
            .entry(index)
            .or_default()
            .extend(frames);
    }

    /// Modifies the shared state.
    pub fn configure(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.state.borrow_mut());
    }

    /// Reads the shared state.
    pub fn inspect<T>(&self, f: impl FnOnce(&MockState) -> T) -> T {
        f(&self.state.borrow())
    }

    /// The drops recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// The currently bound target.
    pub fn bound_target(&self) -> u64 {
        self.state.borrow().bound_target
    }
}

/// An output of the mock adapter.
#[derive(Debug, Clone)]
pub struct MockOutput {
    index: u32,
    config: MockOutputConfig,
}

impl MockOutput {
    /// The output's index.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Output for MockOutput {
    type Monitor = u32;

    fn desc(&self) -> PlatformResult<OutputDesc<u32>> {
        if self.config.desc_fails {
            return Err(mock_error("MockOutput::GetDesc"));
        }

        Ok(OutputDesc {
            monitor: self.config.monitor,
            desktop_coordinates: self.config.rect,
            rotation: self.config.rotation,
        })
    }
}

/// A frame resource.
#[derive(Debug)]
pub struct MockResource {
    desc: TextureDesc,
    is_texture: bool,
}

/// A scripted duplication.
#[derive(Debug)]
pub struct MockDuplication {
    index: u32,
    state: Rc<RefCell<MockState>>,
}

impl Duplication for MockDuplication {
    type Resource = MockResource;

    fn acquire_next_frame(&mut self, _timeout_ms: u32) -> Result<MockResource, Error> {
        let mut state = self.state.borrow_mut();
        state.acquires += 1;

        let outcome = state
            .frames
            .get_mut(&self.index)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Acquire::Timeout);

        let (desc, is_texture) = match outcome {
            Acquire::Frame {
                width,
                height,
                format,
            } => (
                TextureDesc {
                    width,
                    height,
                    format,
                },
                true,
            ),
            Acquire::BadResource => (
                TextureDesc {
                    width: 0,
                    height: 0,
                    format: DxgiFormat::UNKNOWN,
                },
                false,
            ),
            Acquire::Timeout => return Err(Error::Timeout),
            Acquire::AccessLost => return Err(Error::AccessLost),
            Acquire::Failure => {
                return Err(mock_error("MockDuplication::AcquireNextFrame").into());
            }
        };

        state.held_frames += 1;

        Ok(MockResource { desc, is_texture })
    }

    fn release_frame(&mut self) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.held_frames = state.held_frames.saturating_sub(1);
        Ok(())
    }
}

impl Drop for MockDuplication {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .events
            .push(Event::DuplicationReleased(self.index));
    }
}

/// A texture, either a frame's or an allocated one.
#[derive(Debug)]
pub struct MockTexture {
    id: u64,
    desc: TextureDesc,
    allocated: bool,
    state: Rc<RefCell<MockState>>,
}

impl MockTexture {
    /// The texture's id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Texture for MockTexture {
    fn desc(&self) -> TextureDesc {
        self.desc
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        if !self.allocated {
            return;
        }

        let mut state = self.state.borrow_mut();
        state.live_textures -= 1;
        state.events.push(Event::TextureReleased(self.id));
    }
}

/// A preview window.
#[derive(Debug)]
pub struct MockWindow {
    id: u64,
    visible: Cell<bool>,
    client_size: Cell<[u32; 2]>,
    state: Rc<RefCell<MockState>>,
}

impl MockWindow {
    /// The window's id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Simulates the user resizing the window.
    pub fn resize_client(&self, size: [u32; 2]) {
        self.client_size.set(size);
    }

    /// Simulates the user closing the window, which only hides it.
    pub fn close(&self) {
        self.visible.set(false);
    }
}

impl PreviewWindow for MockWindow {
    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn client_size(&self) -> [u32; 2] {
        self.client_size.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }
}

impl Drop for MockWindow {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .events
            .push(Event::WindowDestroyed(self.id));
    }
}

/// A swap chain.
#[derive(Debug)]
pub struct MockSwapChain {
    id: u64,
    size: [u32; 2],
    waitable: bool,
    resizes: Vec<[u32; 2]>,
    state: Rc<RefCell<MockState>>,
}

impl MockSwapChain {
    /// The swap chain's id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Every size the swap chain was resized to.
    pub fn resizes(&self) -> &[[u32; 2]] {
        &self.resizes
    }
}

impl SwapChain for MockSwapChain {
    fn size(&self) -> [u32; 2] {
        self.size
    }

    fn resize(&mut self, size: [u32; 2]) -> PlatformResult<()> {
        if self.state.borrow().failures.resize {
            return Err(mock_error("MockSwapChain::ResizeBuffers"));
        }

        self.size = size;
        self.resizes.push(size);

        Ok(())
    }

    fn has_frame_latency_waitable(&self) -> bool {
        self.waitable
    }

    fn present(&self, sync_interval: u32) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();

        if state.failures.present {
            return Err(mock_error("MockSwapChain::Present"));
        }

        let bound_target = state.bound_target;
        state.presents.push(Present {
            swap_chain: self.id,
            sync_interval,
            bound_target,
        });

        Ok(())
    }
}

impl Drop for MockSwapChain {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .events
            .push(Event::SwapChainReleased(self.id));
    }
}

impl GraphicsDevice for MockDevice {
    type Output = MockOutput;
    type Duplication = MockDuplication;
    type Texture = MockTexture;
    type SwapChain = MockSwapChain;
    type Window = MockWindow;
    type BoundTarget = u64;

    fn enum_output(&self, index: u32) -> PlatformResult<Option<MockOutput>> {
        let state = self.state.borrow();

        if state.enumeration_fails_at == Some(index) {
            return Err(mock_error("MockAdapter::EnumOutputs"));
        }

        Ok(state
            .outputs
            .get(index as usize)
            .cloned()
            .map(|config| MockOutput { index, config }))
    }

    fn duplicate_output_with_formats(
        &self,
        output: &MockOutput,
        formats: &[DxgiFormat],
    ) -> PlatformResult<Option<MockDuplication>> {
        if !output.config.format_negotiation {
            return Ok(None);
        }

        let mut state = self.state.borrow_mut();
        if state.failures.duplication {
            return Err(mock_error("MockOutput::DuplicateOutput1"));
        }
        state.offered_formats = formats.to_vec();

        Ok(Some(MockDuplication {
            index: output.index,
            state: Rc::clone(&self.state),
        }))
    }

    fn duplicate_output(&self, output: &MockOutput) -> PlatformResult<MockDuplication> {
        let mut state = self.state.borrow_mut();
        if state.failures.duplication {
            return Err(mock_error("MockOutput::DuplicateOutput"));
        }
        state.baseline_duplications += 1;

        Ok(MockDuplication {
            index: output.index,
            state: Rc::clone(&self.state),
        })
    }

    fn monitor_color_info(&self, output: &MockOutput) -> PlatformResult<MonitorColorInfo> {
        if self.state.borrow().failures.color_info {
            return Err(mock_error("MockOutput::GetDesc1"));
        }

        Ok(MonitorColorInfo {
            hdr: output.config.hdr,
            sdr_white_nits: output.config.sdr_white_nits,
        })
    }

    fn frame_texture(&self, resource: &MockResource) -> PlatformResult<MockTexture> {
        if !resource.is_texture {
            return Err(mock_error("MockResource::cast"));
        }

        let id = self.state.borrow_mut().next_id();

        Ok(MockTexture {
            id,
            desc: resource.desc,
            allocated: false,
            state: Rc::clone(&self.state),
        })
    }

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> PlatformResult<MockTexture> {
        let mut state = self.state.borrow_mut();
        if state.failures.create_texture {
            return Err(mock_error("MockDevice::CreateTexture2D"));
        }

        state.textures_created += 1;
        state.live_textures += 1;

        Ok(MockTexture {
            id: state.next_id(),
            desc: TextureDesc {
                width,
                height,
                format: format.resource_format(),
            },
            allocated: true,
            state: Rc::clone(&self.state),
        })
    }

    fn copy_texture(&self, destination: &MockTexture, source: &MockTexture) {
        self.state
            .borrow_mut()
            .copies
            .push((destination.id, source.id));
    }

    fn copy_to_swap_chain(
        &self,
        swap_chain: &MockSwapChain,
        source: &MockTexture,
        region: CopyRegion,
    ) {
        self.state
            .borrow_mut()
            .swap_chain_copies
            .push((swap_chain.id, source.id, region));
    }

    fn create_window(&self, title: &str, size: [u32; 2]) -> PlatformResult<MockWindow> {
        let mut state = self.state.borrow_mut();
        if state.failures.create_window {
            return Err(mock_error("MockDevice::CreateWindowExW"));
        }
        state.window_titles.push(title.to_string());

        Ok(MockWindow {
            id: state.next_id(),
            visible: Cell::new(false),
            client_size: Cell::new(size),
            state: Rc::clone(&self.state),
        })
    }

    fn create_swap_chain(
        &self,
        _window: &MockWindow,
        size: [u32; 2],
    ) -> PlatformResult<MockSwapChain> {
        let mut state = self.state.borrow_mut();
        if state.failures.create_swap_chain {
            return Err(mock_error("MockDevice::CreateSwapChainForHwnd"));
        }

        Ok(MockSwapChain {
            id: state.next_id(),
            size,
            waitable: !state.no_frame_latency_waitable,
            resizes: Vec::new(),
            state: Rc::clone(&self.state),
        })
    }

    fn bound_target(&self) -> u64 {
        self.state.borrow().bound_target
    }

    fn bind_swap_chain(&self, swap_chain: &MockSwapChain) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        if state.failures.bind {
            return Err(mock_error("MockContext::OMSetRenderTargets"));
        }
        state.bound_target = swap_chain.id;

        Ok(())
    }

    fn clear_swap_chain(&self, _swap_chain: &MockSwapChain, _color: [f32; 4]) {
        self.state.borrow_mut().clears += 1;
    }

    fn restore_bound_target(&self, target: u64) {
        let mut state = self.state.borrow_mut();
        state.bound_target = target;
        state.restores += 1;
    }
}
