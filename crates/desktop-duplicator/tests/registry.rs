//! Tests for session sharing and lifetimes
//!

use desktop_duplicator::{Duplicator, SessionConfig};
use test_helper::{Acquire, Event, MockDevice, MockOutputConfig, capture_logs, init_logger};
use tracing::Level;

fn device() -> MockDevice {
    MockDevice::new(vec![
        MockOutputConfig::sized(10, [0, 0], [1920, 1080]),
        MockOutputConfig::sized(20, [1920, 0], [2560, 1440]),
    ])
}

fn config() -> SessionConfig {
    SessionConfig {
        preview: false,
        ..Default::default()
    }
}

#[test]
fn sessions_are_shared_per_monitor() {
    init_logger();

    let device = device();
    let mut duplicator = Duplicator::with_config(device.clone(), config());

    let first = duplicator.create_session(0).unwrap();
    let second = duplicator.create_session(0).unwrap();

    assert_eq!(first, second);
    assert_eq!(duplicator.session_count(), 1);
    assert_eq!(duplicator.session(first).unwrap().refs(), 2);
    assert_eq!(device.inspect(|state| state.offered_formats.len()), 2);

    duplicator.destroy_session(first);
    assert_eq!(duplicator.session_count(), 1);
    assert!(device.events().is_empty());

    duplicator.destroy_session(second);
    assert_eq!(duplicator.session_count(), 0);
    assert_eq!(device.events(), vec![Event::DuplicationReleased(0)]);
}

#[test]
fn sessions_for_different_monitors() {
    init_logger();

    let mut duplicator = Duplicator::with_config(device(), config());

    let first = duplicator.create_session(0).unwrap();
    let second = duplicator.create_session(1).unwrap();

    assert_ne!(first, second);
    assert_eq!(first.monitor_index(), 0);
    assert_eq!(second.monitor_index(), 1);
    assert_eq!(duplicator.session_count(), 2);
}

#[test]
fn failed_creation_registers_nothing() {
    init_logger();

    let device = device();
    let mut duplicator = Duplicator::with_config(device.clone(), config());

    assert!(duplicator.create_session(2).is_none());
    assert_eq!(duplicator.session_count(), 0);

    device.configure(|state| state.failures.duplication = true);
    assert!(duplicator.create_session(0).is_none());
    assert_eq!(duplicator.session_count(), 0);

    // Creation is retried from scratch once the platform recovers.
    device.configure(|state| state.failures.duplication = false);
    let handle = duplicator.create_session(0).unwrap();
    assert_eq!(duplicator.session(handle).unwrap().refs(), 1);
}

#[test]
fn missing_monitor_is_not_logged_as_failure() {
    init_logger();

    let device = device();
    let mut duplicator = Duplicator::with_config(device.clone(), config());

    let (handle, logs) = capture_logs(Level::WARN, || duplicator.create_session(2));
    assert!(handle.is_none());
    assert!(logs.is_empty(), "unexpected logs:\n{logs}");

    device.configure(|state| state.failures.duplication = true);

    let (handle, logs) = capture_logs(Level::WARN, || duplicator.create_session(0));
    assert!(handle.is_none());
    assert!(logs.contains("Failed to create session for monitor 0"), "{logs}");
}

#[test]
fn releasing_unknown_handle_is_ignored() {
    init_logger();

    let mut duplicator = Duplicator::with_config(device(), config());

    let handle = duplicator.create_session(0).unwrap();
    duplicator.destroy_session(handle);
    duplicator.destroy_session(handle);

    assert_eq!(duplicator.session_count(), 0);
    assert!(!duplicator.update_frame(handle));
    assert!(duplicator.texture(handle).is_none());
    assert!(duplicator.color_space(handle).is_none());
    assert!(duplicator.sdr_white_level(handle).is_none());
}

#[test]
fn reset_clears_flags_without_destroying() {
    init_logger();

    let device = device();
    device.push_frames(0, [Acquire::bgra(1920, 1080)]);
    device.push_frames(1, [Acquire::bgra(2560, 1440)]);

    let mut duplicator = Duplicator::with_config(device.clone(), config());
    let first = duplicator.create_session(0).unwrap();
    let second = duplicator.create_session(1).unwrap();

    assert!(duplicator.update_frame(first));
    assert!(duplicator.update_frame(second));
    assert_eq!(duplicator.frame_available(first), Some(true));
    assert_eq!(duplicator.frame_available(second), Some(true));

    duplicator.reset_all_sessions();

    assert_eq!(duplicator.frame_available(first), Some(false));
    assert_eq!(duplicator.frame_available(second), Some(false));
    assert_eq!(duplicator.session_count(), 2);
    assert!(duplicator.texture(first).is_some());
    assert!(device.events().is_empty());

    // A timeout does not mark a frame available.
    assert!(duplicator.update_frame(first));
    assert_eq!(duplicator.frame_available(first), Some(false));
}

#[test]
fn dropping_duplicator_destroys_sessions() {
    init_logger();

    let device = device();
    let mut duplicator = Duplicator::with_config(device.clone(), config());

    duplicator.create_session(0).unwrap();
    duplicator.create_session(1).unwrap();
    duplicator.create_session(1).unwrap();

    drop(duplicator);

    let mut events = device.events();
    events.sort_by_key(|event| match event {
        Event::DuplicationReleased(index) => *index,
        _ => u32::MAX,
    });

    assert_eq!(
        events,
        vec![Event::DuplicationReleased(0), Event::DuplicationReleased(1)]
    );
}
