use tracing::debug;
use windows::Win32::{
    Devices::Display::{
        DISPLAYCONFIG_DEVICE_INFO_GET_SDR_WHITE_LEVEL, DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME,
        DISPLAYCONFIG_MODE_INFO, DISPLAYCONFIG_PATH_INFO, DISPLAYCONFIG_SDR_WHITE_LEVEL,
        DISPLAYCONFIG_SOURCE_DEVICE_NAME, DisplayConfigGetDeviceInfo, GetDisplayConfigBufferSizes,
        QDC_ONLY_ACTIVE_PATHS, QueryDisplayConfig,
    },
    Graphics::Dxgi::{
        Common::DXGI_COLOR_SPACE_RGB_FULL_G2084_NONE_P2020, DXGI_OUTPUT_DESC1, IDXGIOutput,
        IDXGIOutput6,
    },
};
use windows_core::{HRESULT, Interface};

use crate::{
    error::{PlatformError, PlatformResult},
    monitor::{DEFAULT_SDR_WHITE_NITS, MonitorColorInfo},
};

/// Reads whether the output is in an HDR mode and the brightness SDR white is mapped to.
pub(super) fn monitor_color_info(output: &IDXGIOutput) -> PlatformResult<MonitorColorInfo> {
    let output: IDXGIOutput6 = match output.cast() {
        Ok(output) => output,
        Err(_) => {
            debug!("Output has no color descriptor, assuming SDR");
            return Ok(MonitorColorInfo::default());
        }
    };

    let descriptor = unsafe { output.GetDesc1() }
        .map_err(|e| PlatformError::new(e, "IDXGIOutput6::GetDesc1"))?;

    let hdr = descriptor.ColorSpace == DXGI_COLOR_SPACE_RGB_FULL_G2084_NONE_P2020;

    // The white level is a multiplier of 80 nits, scaled by 1000.
    let sdr_white_nits = match sdr_white_level(&descriptor)? {
        Some(level) => level * DEFAULT_SDR_WHITE_NITS,
        None => DEFAULT_SDR_WHITE_NITS,
    };

    Ok(MonitorColorInfo {
        hdr,
        sdr_white_nits,
    })
}

/// Finds the display path driving the output and reads its SDR white level, `None` if the output
/// has no active path.
fn sdr_white_level(descriptor: &DXGI_OUTPUT_DESC1) -> PlatformResult<Option<f32>> {
    let mut path_elements = 0;
    let mut mode_info_elements = 0;
    unsafe {
        let result = GetDisplayConfigBufferSizes(
            QDC_ONLY_ACTIVE_PATHS,
            &mut path_elements,
            &mut mode_info_elements,
        );

        if result.is_err() {
            return Err(PlatformError::from_code(
                result.to_hresult().0,
                "GetDisplayConfigBufferSizes",
            ));
        }
    }

    let mut paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_elements as usize];
    let mut mode_infos = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_info_elements as usize];
    unsafe {
        let result = QueryDisplayConfig(
            QDC_ONLY_ACTIVE_PATHS,
            &mut path_elements,
            paths.as_mut_ptr(),
            &mut mode_info_elements,
            mode_infos.as_mut_ptr(),
            None,
        );

        if result.is_err() {
            return Err(PlatformError::from_code(result.to_hresult().0, "QueryDisplayConfig"));
        }
    }
    paths.truncate(path_elements as usize);

    for path in &paths {
        let name = unsafe { source_device_name(path)? };

        if name == descriptor.DeviceName {
            let level = unsafe { target_sdr_white_level(path)? };
            return Ok(Some(level));
        }
    }

    Ok(None)
}

/// Gets the GDI device name of the path's source, matches `DXGI_OUTPUT_DESC1::DeviceName`.
unsafe fn source_device_name(path_info: &DISPLAYCONFIG_PATH_INFO) -> PlatformResult<[u16; 32]> {
    let mut config = DISPLAYCONFIG_SOURCE_DEVICE_NAME::default();
    config.header.adapterId = path_info.sourceInfo.adapterId;
    config.header.id = path_info.sourceInfo.id;
    config.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME;
    config.header.size = size_of::<DISPLAYCONFIG_SOURCE_DEVICE_NAME>() as u32;

    let result = unsafe { DisplayConfigGetDeviceInfo(&mut config.header) };
    let hresult = HRESULT::from_nt(result);
    if hresult.is_err() {
        return Err(PlatformError::from_code(hresult.0, "DisplayConfigGetDeviceInfo"));
    }

    Ok(config.viewGdiDeviceName)
}

unsafe fn target_sdr_white_level(path_info: &DISPLAYCONFIG_PATH_INFO) -> PlatformResult<f32> {
    let mut config = DISPLAYCONFIG_SDR_WHITE_LEVEL::default();
    config.header.adapterId = path_info.targetInfo.adapterId;
    config.header.id = path_info.targetInfo.id;
    config.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_SDR_WHITE_LEVEL;
    config.header.size = size_of::<DISPLAYCONFIG_SDR_WHITE_LEVEL>() as u32;

    let result = unsafe { DisplayConfigGetDeviceInfo(&mut config.header) };
    let hresult = HRESULT::from_nt(result);
    if hresult.is_err() {
        return Err(PlatformError::from_code(hresult.0, "DisplayConfigGetDeviceInfo"));
    }

    Ok(config.SDRWhiteLevel as f32 / 1000.0)
}
