//! Core primitives shared by the Mupen64Plus video extension crates.
//!
//! This crate mirrors the small subset of the Mupen64Plus plugin ABI that a
//! video extension touches, plus the pieces every other crate leans on:
//!
//! - **M64Error**: the `m64p_error` status codes returned across the ABI
//! - **Size2D**: the `m64p_2d_size` resolution pair (layout-compatible)
//! - **GlAttr / GlFormat**: typed OpenGL attribute kinds and the format
//!   descriptor they configure (see [`gl`])
//! - **VidExtError**: the Rust-side error type, convertible to `m64p_error`
//! - **logging**: centralized, category based logging (see [`logging`])

pub mod gl;
pub mod logging;

use serde::{Deserialize, Serialize};
use std::os::raw::c_int;
use thiserror::Error;

pub use gl::{GlAttr, GlFormat};

/// Raw `m64p_error` as it travels across the C ABI.
#[allow(non_camel_case_types)]
pub type m64p_error = c_int;

/// Raw `m64p_GLattr` as it travels across the C ABI.
#[allow(non_camel_case_types)]
pub type m64p_GLattr = c_int;

/// Status codes defined by `m64p_types.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum M64Error {
    Success = 0,
    NotInit = 1,
    AlreadyInit = 2,
    Incompatible = 3,
    InputAssert = 4,
    InputInvalid = 5,
    InputNotFound = 6,
    NoMemory = 7,
    Files = 8,
    Internal = 9,
    InvalidState = 10,
    PluginFail = 11,
    SystemFail = 12,
    Unsupported = 13,
    WrongType = 14,
}

impl M64Error {
    /// Decode a status code returned by the core.
    pub fn from_raw(raw: m64p_error) -> Option<Self> {
        let code = match raw {
            0 => M64Error::Success,
            1 => M64Error::NotInit,
            2 => M64Error::AlreadyInit,
            3 => M64Error::Incompatible,
            4 => M64Error::InputAssert,
            5 => M64Error::InputInvalid,
            6 => M64Error::InputNotFound,
            7 => M64Error::NoMemory,
            8 => M64Error::Files,
            9 => M64Error::Internal,
            10 => M64Error::InvalidState,
            11 => M64Error::PluginFail,
            12 => M64Error::SystemFail,
            13 => M64Error::Unsupported,
            14 => M64Error::WrongType,
            _ => return None,
        };
        Some(code)
    }

    pub fn as_raw(self) -> m64p_error {
        self as m64p_error
    }

    pub fn is_success(self) -> bool {
        self == M64Error::Success
    }
}

/// A (width, height) resolution pair, layout-compatible with `m64p_2d_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct Size2D {
    pub width: u32,
    pub height: u32,
}

/// `m64p_2d_size` as named in the C headers.
#[allow(non_camel_case_types)]
pub type m64p_2d_size = Size2D;

impl Size2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Size2D {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors raised by the video extension.
///
/// Every variant maps onto exactly one `m64p_error` code via
/// [`VidExtError::to_m64p`], which is what the C callbacks return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VidExtError {
    #[error("Video extension is not bound to a window")]
    NotBound,
    #[error("Rendering context has not been created")]
    NotInitialized,
    #[error("Unknown GL attribute: {0}")]
    UnknownAttribute(i32),
    #[error("GL attribute {attr:?} is {actual}, expected {expected}")]
    AttributeMismatch {
        attr: GlAttr,
        expected: i32,
        actual: i32,
    },
    #[error("System failure: {0}")]
    SystemFailure(String),
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
    #[error("Null pointer passed for {0}")]
    NullPointer(&'static str),
    #[error("Library error: {0}")]
    Library(String),
    #[error("Core returned {0:?}")]
    Core(M64Error),
}

impl VidExtError {
    /// Status code reported to the core for this error.
    pub fn to_m64p(&self) -> M64Error {
        match self {
            VidExtError::NotBound | VidExtError::NotInitialized => M64Error::NotInit,
            VidExtError::UnknownAttribute(_) => M64Error::InputInvalid,
            VidExtError::AttributeMismatch { .. } | VidExtError::SystemFailure(_) => {
                M64Error::SystemFail
            }
            VidExtError::InvalidState(_) => M64Error::InvalidState,
            VidExtError::NullPointer(_) => M64Error::InputAssert,
            VidExtError::Library(_) => M64Error::Files,
            VidExtError::Core(code) => *code,
        }
    }
}

pub type VidExtResult<T> = Result<T, VidExtError>;

/// Collapse an operation result into the code returned across the ABI.
pub fn status_of<T>(result: &VidExtResult<T>) -> M64Error {
    match result {
        Ok(_) => M64Error::Success,
        Err(e) => e.to_m64p(),
    }
}
