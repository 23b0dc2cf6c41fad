//! Tests for starting sessions and polling frames
//!

use desktop_duplicator::{
    ColorSpace, Duplicator, SessionConfig, SessionState, format::DUPLICATION_FORMATS,
    monitor::DEFAULT_SDR_WHITE_NITS,
};
use test_helper::{Acquire, Event, MockDevice, MockOutputConfig, init_logger};

fn config() -> SessionConfig {
    SessionConfig {
        preview: false,
        ..Default::default()
    }
}

#[test]
fn start_negotiates_formats_and_reads_color_info() {
    init_logger();

    let device = MockDevice::new(vec![
        MockOutputConfig::sized(10, [0, 0], [3840, 2160]).hdr(240.0),
    ]);
    let mut duplicator = Duplicator::with_config(device.clone(), config());

    let handle = duplicator.create_session(0).unwrap();

    assert_eq!(
        device.inspect(|state| state.offered_formats.clone()),
        DUPLICATION_FORMATS.to_vec()
    );
    assert_eq!(device.inspect(|state| state.baseline_duplications), 0);
    assert_eq!(duplicator.is_hdr(handle), Some(true));
    assert_eq!(duplicator.sdr_white_level(handle), Some(240.0));
}

#[test]
fn start_falls_back_to_baseline_mode() {
    init_logger();

    let device = MockDevice::new(vec![
        MockOutputConfig::sized(10, [0, 0], [1920, 1080])
            .hdr(240.0)
            .baseline_only(),
    ]);
    let mut duplicator = Duplicator::with_config(device.clone(), config());

    let handle = duplicator.create_session(0).unwrap();

    assert_eq!(device.inspect(|state| state.baseline_duplications), 1);
    assert_eq!(duplicator.is_hdr(handle), Some(false));
    assert_eq!(duplicator.sdr_white_level(handle), Some(DEFAULT_SDR_WHITE_NITS));
}

#[test]
fn start_survives_missing_color_info() {
    init_logger();

    let device = MockDevice::new(vec![
        MockOutputConfig::sized(10, [0, 0], [1920, 1080]).hdr(200.0),
    ]);
    device.configure(|state| state.failures.color_info = true);
    let mut duplicator = Duplicator::with_config(device, config());

    let handle = duplicator.create_session(0).unwrap();

    assert_eq!(duplicator.is_hdr(handle), Some(false));
    assert_eq!(duplicator.sdr_white_level(handle), Some(DEFAULT_SDR_WHITE_NITS));
}

#[test]
fn update_without_frame() {
    init_logger();

    let device = MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])]);
    let mut duplicator = Duplicator::with_config(device.clone(), config());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert!(duplicator.texture(handle).is_none());
    assert_eq!(duplicator.frame_available(handle), Some(false));
    assert_eq!(device.inspect(|state| state.held_frames), 0);
}

#[test]
fn update_with_frame() {
    init_logger();

    let device = MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])]);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::with_config(device.clone(), config());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));

    let texture = duplicator.texture(handle).unwrap();
    assert_eq!(
        duplicator.session(handle).unwrap().frame_cache().size(),
        [1920, 1080]
    );
    assert_eq!(duplicator.frame_available(handle), Some(true));
    assert_eq!(duplicator.color_space(handle), Some(ColorSpace::Srgb));
    assert_eq!(device.inspect(|state| state.held_frames), 0);
    assert_eq!(device.inspect(|state| state.copies.len()), 1);
    assert_eq!(device.inspect(|state| state.copies[0].0), texture.id());
}

#[test]
fn timeout_keeps_cached_frame() {
    init_logger();

    let device = MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])]);
    device.push_frames(0, [Acquire::bgra(1920, 1080), Acquire::Timeout]);

    let mut duplicator = Duplicator::with_config(device.clone(), config());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    let id = duplicator.texture(handle).unwrap().id();

    assert!(duplicator.update_frame(handle));
    assert_eq!(duplicator.texture(handle).unwrap().id(), id);
    assert_eq!(device.inspect(|state| state.copies.len()), 1);
}

#[test]
fn access_lost_is_permanent() {
    init_logger();

    let device = MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])]);
    device.push_frames(
        0,
        [
            Acquire::bgra(1920, 1080),
            Acquire::AccessLost,
            Acquire::bgra(1920, 1080),
        ],
    );

    let mut duplicator = Duplicator::with_config(device.clone(), config());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert!(!duplicator.update_frame(handle));

    let session = duplicator.session(handle).unwrap();
    assert_eq!(session.state(), SessionState::Lost);
    assert!(session.texture().is_some());
    assert_eq!(device.events(), vec![Event::DuplicationReleased(0)]);

    // The lost duplication is never polled again.
    assert!(!duplicator.update_frame(handle));
    assert_eq!(device.inspect(|state| state.acquires), 2);
}

#[test]
fn transient_failures_report_success() {
    init_logger();

    let device = MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])]);
    device.push_frames(0, [Acquire::Failure, Acquire::BadResource]);

    let mut duplicator = Duplicator::with_config(device.clone(), config());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert!(duplicator.update_frame(handle));

    assert!(duplicator.texture(handle).is_none());
    assert_eq!(duplicator.frame_available(handle), Some(false));
    assert_eq!(
        duplicator.session(handle).unwrap().state(),
        SessionState::Active
    );

    // The frame without a texture was still handed back.
    assert_eq!(device.inspect(|state| state.held_frames), 0);
}

#[test]
fn destroy_releases_in_order() {
    init_logger();

    let device = MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])]);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));

    let session = duplicator.session(handle).unwrap();
    let texture = session.texture().unwrap().id();
    let preview = session.preview().unwrap();
    let swap_chain = preview.swap_chain().id();
    let window = preview.window().id();

    duplicator.destroy_session(handle);

    assert_eq!(
        device.events(),
        vec![
            Event::DuplicationReleased(0),
            Event::TextureReleased(texture),
            Event::SwapChainReleased(swap_chain),
            Event::WindowDestroyed(window),
        ]
    );
    assert_eq!(device.inspect(|state| state.live_textures), 0);
}
