//! # Duplicator Preview
//! Duplicates a monitor and mirrors its frames into a preview window.
//!

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use config::Config;
use logger::setup_logger;
use tracing::{error, info, info_span};

mod config;
mod logger;

/// The Cargo package version.
#[cfg(not(debug_assertions))]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Cargo package version or '0.0.0' if a non-release build.
#[cfg(debug_assertions)]
pub const VERSION: &str = "0.0.0";

/// If this instance should have debug enabled.
pub fn should_debug() -> bool {
    std::env::args().any(|arg| arg.eq("--debug"))
}

fn main() {
    let config = Config::load_or_create();
    let debug = should_debug() || config.as_ref().is_ok_and(|config| config.debug);

    // Set up logger
    let _logger_guards = match setup_logger(debug) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Could not set up the logger:\n{e}");
            return;
        }
    };

    // Log application start
    let _span = info_span!("[Main Thread]").entered();
    info!("Duplicator Preview v{}", VERSION);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Exiting: Invalid config at {}:\n{e}", Config::file_path().display());
            return;
        }
    };

    run(&config);
}

#[cfg(windows)]
fn run(config: &Config) {
    use core::time::Duration;
    use std::thread;

    use desktop_duplicator::{
        Duplicator, SessionConfig, SessionHandle, d3d11::D3D11Device, platform::PreviewWindow,
    };
    use tracing::{debug, warn};

    let device = match D3D11Device::new() {
        Ok(device) => device,
        Err(e) => {
            error!("Exiting: Could not create the Direct3D 11 device:\n{e}");
            return;
        }
    };

    let session_config = SessionConfig {
        preview: config.show_preview,
        ..Default::default()
    };
    let mut duplicator = Duplicator::with_config(device, session_config);

    match duplicator.monitors() {
        Ok(monitors) => {
            for (index, monitor) in monitors.iter().enumerate() {
                info!(
                    "Monitor {index}: {}x{} at ({}, {}), rotated {} degrees",
                    monitor.width, monitor.height, monitor.x, monitor.y, monitor.rotation_degrees
                );
            }
        }
        Err(e) => warn!("Could not list monitors:\n{e}"),
    }

    let Some(handle) = duplicator.create_session(config.monitor) else {
        error!("Exiting: Could not duplicate monitor {}", config.monitor);
        return;
    };

    info!(
        "Duplicating monitor {}, HDR: {:?}, SDR white: {:?} nits",
        config.monitor,
        duplicator.is_hdr(handle),
        duplicator.sdr_white_level(handle)
    );

    // The preview window hides itself when closed, treat that as a request to stop.
    let preview_open = |duplicator: &Duplicator<D3D11Device>, handle: SessionHandle| {
        duplicator
            .session(handle)
            .and_then(|session| session.preview())
            .is_none_or(|preview| preview.window().is_visible())
    };

    let interval = Duration::from_millis(config.frame_interval_ms);
    let mut frames: u64 = 0;

    loop {
        if !pump_messages() {
            info!("Exiting: Quit requested");
            break;
        }

        if !duplicator.update_frame(handle) {
            warn!("Exiting: Lost access to monitor {}", config.monitor);
            break;
        }

        if duplicator.frame_available(handle) == Some(true) {
            frames += 1;
            debug!(
                "Frame {frames}, color space: {:?}",
                duplicator.color_space(handle)
            );
        }
        duplicator.reset_all_sessions();

        if !preview_open(&duplicator, handle) {
            info!("Exiting: Preview closed");
            break;
        }

        if config.max_frames.is_some_and(|max_frames| frames >= max_frames) {
            info!("Exiting: Received {frames} frames");
            break;
        }

        thread::sleep(interval);
    }

    duplicator.destroy_session(handle);
}

/// Dispatches every queued window message, returns `false` once the thread is asked to quit.
#[cfg(windows)]
fn pump_messages() -> bool {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage, WM_QUIT,
    };

    let mut message = MSG::default();

    while unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.as_bool() {
        if message.message == WM_QUIT {
            return false;
        }

        unsafe {
            let _ = TranslateMessage(&message);
            DispatchMessageW(&message);
        }
    }

    true
}

#[cfg(not(windows))]
fn run(_config: &Config) {
    error!("Exiting: Desktop duplication is only available on Windows");
}
