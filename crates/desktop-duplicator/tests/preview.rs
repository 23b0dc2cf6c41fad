//! Tests for mirroring frames into a preview window
//!

use desktop_duplicator::{
    Duplicator, SessionConfig,
    platform::{CopyRegion, PreviewWindow, SwapChain},
    preview::DEFAULT_PREVIEW_TITLE,
};
use test_helper::{
    Acquire, Event, MockDevice, MockOutputConfig, init_logger,
    mock::{CALLER_TARGET, Present},
};

fn device() -> MockDevice {
    MockDevice::new(vec![MockOutputConfig::sized(10, [0, 0], [1920, 1080])])
}

#[test]
fn preview_is_half_the_monitor() {
    init_logger();

    let device = device();
    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    let preview = duplicator.session(handle).unwrap().preview().unwrap();

    assert!(preview.window().is_visible());
    assert_eq!(preview.window().client_size(), [960, 540]);
    assert_eq!(preview.swap_chain().size(), [960, 540]);
    assert_eq!(
        device.inspect(|state| state.window_titles.clone()),
        vec![DEFAULT_PREVIEW_TITLE.to_string()]
    );
}

#[test]
fn preview_title_from_config() {
    init_logger();

    let device = device();
    let config = SessionConfig {
        preview: true,
        preview_title: "Monitor 0".to_string(),
    };
    let mut duplicator = Duplicator::with_config(device.clone(), config);
    duplicator.create_session(0).unwrap();

    assert_eq!(
        device.inspect(|state| state.window_titles.clone()),
        vec!["Monitor 0".to_string()]
    );
}

#[test]
fn preview_disabled() {
    init_logger();

    let device = device();
    let config = SessionConfig {
        preview: false,
        ..Default::default()
    };
    let mut duplicator = Duplicator::with_config(device.clone(), config);
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.session(handle).unwrap().preview().is_none());
    assert!(device.inspect(|state| state.window_titles.is_empty()));
}

#[test]
fn window_failure_keeps_session() {
    init_logger();

    let device = device();
    device.configure(|state| state.failures.create_window = true);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.session(handle).unwrap().preview().is_none());
    assert!(duplicator.update_frame(handle));
    assert!(duplicator.texture(handle).is_some());
}

#[test]
fn swap_chain_failure_destroys_window() {
    init_logger();

    let device = device();
    device.configure(|state| state.failures.create_swap_chain = true);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.session(handle).unwrap().preview().is_none());

    let events = device.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::WindowDestroyed(_)));
}

#[test]
fn present_restores_caller_target() {
    init_logger();

    let device = device();
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));

    let swap_chain = duplicator
        .session(handle)
        .unwrap()
        .preview()
        .unwrap()
        .swap_chain()
        .id();

    assert_eq!(
        device.inspect(|state| state.presents.clone()),
        vec![Present {
            swap_chain,
            sync_interval: 1,
            bound_target: swap_chain,
        }]
    );
    assert_eq!(device.bound_target(), CALLER_TARGET);
    assert_eq!(device.inspect(|state| state.restores), 1);
    assert_eq!(device.inspect(|state| state.clears), 1);
}

#[test]
fn copy_is_bounded_by_frame() {
    init_logger();

    let device = device();
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));

    let texture = duplicator.texture(handle).unwrap().id();
    let copies = device.inspect(|state| state.swap_chain_copies.clone());

    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].1, texture);
    assert_eq!(copies[0].2, CopyRegion::from_size([1920, 1080]));
}

#[test]
fn hidden_window_is_not_presented() {
    init_logger();

    let device = device();
    device.push_frames(0, [Acquire::bgra(1920, 1080), Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    duplicator
        .session(handle)
        .unwrap()
        .preview()
        .unwrap()
        .window()
        .close();

    assert!(duplicator.update_frame(handle));
    assert!(device.inspect(|state| state.presents.is_empty()));
    assert_eq!(device.inspect(|state| state.restores), 0);

    duplicator.set_preview_visible(handle, true);
    assert!(duplicator.update_frame(handle));
    assert_eq!(device.inspect(|state| state.presents.len()), 1);
}

#[test]
fn zero_client_area_is_not_presented() {
    init_logger();

    let device = device();
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    duplicator
        .session(handle)
        .unwrap()
        .preview()
        .unwrap()
        .window()
        .resize_client([0, 540]);

    assert!(duplicator.update_frame(handle));
    assert!(device.inspect(|state| state.presents.is_empty()));
}

#[test]
fn swap_chain_follows_client_area() {
    init_logger();

    let device = device();
    device.push_frames(0, [Acquire::bgra(1920, 1080), Acquire::Timeout]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));

    let preview = duplicator.session(handle).unwrap().preview().unwrap();
    assert!(preview.swap_chain().resizes().is_empty());
    preview.window().resize_client([1280, 720]);

    // A timeout re-presents the cached frame at the new size.
    assert!(duplicator.update_frame(handle));

    let preview = duplicator.session(handle).unwrap().preview().unwrap();
    assert_eq!(preview.swap_chain().resizes(), &[[1280, 720]]);
    assert_eq!(preview.swap_chain().size(), [1280, 720]);
    assert_eq!(device.inspect(|state| state.presents.len()), 2);
}

#[test]
fn resize_failure_skips_present() {
    init_logger();

    let device = device();
    device.configure(|state| state.failures.resize = true);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    duplicator
        .session(handle)
        .unwrap()
        .preview()
        .unwrap()
        .window()
        .resize_client([1280, 720]);

    assert!(duplicator.update_frame(handle));
    assert!(device.inspect(|state| state.presents.is_empty()));
    assert_eq!(device.bound_target(), CALLER_TARGET);
}

#[test]
fn failed_resize_is_retried() {
    init_logger();

    let device = device();
    device.configure(|state| state.failures.resize = true);
    device.push_frames(0, [Acquire::bgra(1920, 1080), Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    let preview = duplicator.session(handle).unwrap().preview().unwrap();
    preview.window().resize_client([1280, 720]);

    assert!(duplicator.update_frame(handle));
    let preview = duplicator.session(handle).unwrap().preview().unwrap();
    assert_eq!(preview.swap_chain().size(), [960, 540]);

    device.configure(|state| state.failures.resize = false);

    assert!(duplicator.update_frame(handle));
    let preview = duplicator.session(handle).unwrap().preview().unwrap();
    assert_eq!(preview.swap_chain().resizes(), &[[1280, 720]]);
    assert_eq!(device.inspect(|state| state.presents.len()), 1);
}

#[test]
fn bind_failure_restores_caller_target() {
    init_logger();

    let device = device();
    device.configure(|state| state.failures.bind = true);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert!(device.inspect(|state| state.presents.is_empty()));
    assert_eq!(device.inspect(|state| state.restores), 1);
    assert_eq!(device.bound_target(), CALLER_TARGET);
}

#[test]
fn present_failure_restores_caller_target() {
    init_logger();

    let device = device();
    device.configure(|state| state.failures.present = true);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert_eq!(device.inspect(|state| state.restores), 1);
    assert_eq!(device.bound_target(), CALLER_TARGET);
}

#[test]
fn present_interval_without_waitable() {
    init_logger();

    let device = device();
    device.configure(|state| state.no_frame_latency_waitable = true);
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);

    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();
    assert!(duplicator.update_frame(handle));

    assert_eq!(device.inspect(|state| state.presents[0].sync_interval), 0);
}

#[test]
fn nothing_presented_before_first_frame() {
    init_logger();

    let device = device();
    let mut duplicator = Duplicator::new(device.clone());
    let handle = duplicator.create_session(0).unwrap();

    assert!(duplicator.update_frame(handle));
    assert!(device.inspect(|state| state.presents.is_empty()));
    assert_eq!(device.inspect(|state| state.restores), 0);
}
