//! Tests for caching duplicated frames
//!

use desktop_duplicator::{
    ColorFormat, ColorSpace, Duplicator, DxgiFormat, SessionConfig, platform::Texture,
};
use test_helper::{Acquire, Event, MockDevice, MockOutputConfig, init_logger};

fn setup(output: MockOutputConfig, frames: &[Acquire]) -> (MockDevice, Duplicator<MockDevice>) {
    let device = MockDevice::new(vec![output]);
    device.push_frames(0, frames.iter().copied());

    let config = SessionConfig {
        preview: false,
        ..Default::default()
    };

    (device.clone(), Duplicator::with_config(device, config))
}

fn sdr() -> MockOutputConfig {
    MockOutputConfig::sized(10, [0, 0], [1920, 1080])
}

#[test]
fn unchanged_frames_reuse_texture() {
    init_logger();

    let frames = [Acquire::bgra(1920, 1080); 5];
    let (device, mut duplicator) = setup(sdr(), &frames);
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    let id = duplicator.texture(handle).unwrap().id();

    for _ in 1..frames.len() {
        assert!(duplicator.update_frame(handle));
    }

    assert_eq!(duplicator.texture(handle).unwrap().id(), id);
    assert_eq!(device.inspect(|state| state.textures_created), 1);
    assert_eq!(device.inspect(|state| state.copies.len()), frames.len());
}

#[test]
fn size_change_reallocates() {
    init_logger();

    let (device, mut duplicator) = setup(
        sdr(),
        &[Acquire::bgra(1920, 1080), Acquire::bgra(1280, 720)],
    );
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    let old = duplicator.texture(handle).unwrap().id();

    assert!(duplicator.update_frame(handle));
    let cache = duplicator.session(handle).unwrap().frame_cache();

    assert_ne!(cache.texture().unwrap().id(), old);
    assert_eq!(cache.size(), [1280, 720]);
    assert_eq!(device.events(), vec![Event::TextureReleased(old)]);
    assert_eq!(device.inspect(|state| state.live_textures), 1);
}

#[test]
fn format_change_reallocates() {
    init_logger();

    let (device, mut duplicator) = setup(
        sdr(),
        &[Acquire::bgra(1920, 1080), Acquire::float16(1920, 1080)],
    );
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert_eq!(
        duplicator.session(handle).unwrap().frame_cache().format(),
        ColorFormat::Bgra
    );

    assert!(duplicator.update_frame(handle));
    let cache = duplicator.session(handle).unwrap().frame_cache();

    assert_eq!(cache.format(), ColorFormat::Rgba16F);
    assert_eq!(
        cache.texture().unwrap().desc().format,
        DxgiFormat::R16G16B16A16_FLOAT
    );
    assert_eq!(device.inspect(|state| state.textures_created), 2);
}

#[test]
fn unorm_frames_are_stored_typeless() {
    init_logger();

    let (_device, mut duplicator) = setup(sdr(), &[Acquire::bgra(1920, 1080)]);
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));

    assert_eq!(
        duplicator.texture(handle).unwrap().desc().format,
        DxgiFormat::B8G8R8A8_TYPELESS
    );
}

#[test]
fn color_space_tags() {
    init_logger();

    let (_device, mut duplicator) = setup(sdr(), &[Acquire::float16(1920, 1080)]);
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));
    assert_eq!(duplicator.color_space(handle), Some(ColorSpace::Srgb16F));

    let (_device, mut duplicator) = setup(sdr().hdr(200.0), &[Acquire::bgra(1920, 1080)]);
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));
    assert_eq!(duplicator.color_space(handle), Some(ColorSpace::Rec709ScRgb));

    let (_device, mut duplicator) = setup(sdr().hdr(200.0), &[Acquire::float16(1920, 1080)]);
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));
    assert_eq!(duplicator.color_space(handle), Some(ColorSpace::Rec709ScRgb));
}

#[test]
fn failed_allocation_leaves_cache_empty() {
    init_logger();

    let (device, mut duplicator) = setup(
        sdr(),
        &[Acquire::bgra(1920, 1080), Acquire::bgra(1280, 720)],
    );
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    let old = duplicator.texture(handle).unwrap().id();

    device.configure(|state| state.failures.create_texture = true);
    assert!(duplicator.update_frame(handle));

    assert!(duplicator.texture(handle).is_none());
    assert_eq!(device.events(), vec![Event::TextureReleased(old)]);
    assert_eq!(device.inspect(|state| state.copies.len()), 1);
    assert_eq!(device.inspect(|state| state.held_frames), 0);
}
