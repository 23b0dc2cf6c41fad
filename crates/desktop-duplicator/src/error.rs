use core::fmt::Display;

use thiserror::Error;

/// A failed platform call, labelled with the call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub struct PlatformError {
    call: &'static str,
    code: i32,
}

impl PlatformError {
    /// Create a new PlatformError from a raw `HRESULT` code and a label.
    pub fn from_code(code: i32, call: &'static str) -> Self {
        Self { call, code }
    }

    /// Create a PlatformError from a `windows_result::Error` and a label.
    #[cfg(windows)]
    pub fn new(source: windows_result::Error, call: &'static str) -> Self {
        Self {
            call,
            code: source.code().0,
        }
    }

    /// The label of the call that failed.
    pub fn call(&self) -> &'static str {
        self.call
    }

    /// The raw `HRESULT` the call failed with.
    pub fn code(&self) -> i32 {
        self.code
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Windows {} call failed:\nHRESULT: 0x{:08X}",
            self.call, self.code as u32
        )
    }
}

/// A shortcut for `Result<T, PlatformError>`.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors surfaced by monitor queries, session construction and frame acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The monitor index is past the adapter's last output.
    #[error("Monitor {0} does not exist")]
    NotFound(u32),

    /// A platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The duplication was invalidated and must be recreated.
    #[error("Desktop duplication access was lost")]
    AccessLost,

    /// No new frame was ready.
    #[error("No new frame was available")]
    Timeout,
}
