//! Mupen64Plus core library loading and table registration
//!
//! The core is a shared library (`libmupen64plus.so.2`, `mupen64plus.dll`).
//! Registering the video extension is a single call:
//! `CoreOverrideVidExt(&VIDEO_EXTENSION_FUNCTIONS)`. The table is static,
//! so it stays valid for as long as the core keeps it.

use crate::ffi::{m64p_video_extension_functions, VIDEO_EXTENSION_FUNCTIONS};
use libloading::{Library, Symbol};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::ptr;
use vidext_core::logging::{log, LogCategory, LogLevel};
use vidext_core::{m64p_error, M64Error, VidExtError, VidExtResult};

type CoreOverrideVidExtFn =
    unsafe extern "C" fn(functions: *mut m64p_video_extension_functions) -> m64p_error;

type PluginGetVersionFn = unsafe extern "C" fn(
    plugin_type: *mut c_int,
    plugin_version: *mut c_int,
    api_version: *mut c_int,
    plugin_name: *mut *const c_char,
    capabilities: *mut c_int,
) -> m64p_error;

/// `M64PLUGIN_CORE` from `m64p_types.h`
pub const PLUGIN_TYPE_CORE: c_int = 1;

/// What `PluginGetVersion` reports about the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreVersion {
    pub plugin_type: c_int,
    pub plugin_version: c_int,
    pub api_version: c_int,
    pub name: String,
    pub capabilities: c_int,
}

impl CoreVersion {
    /// `0x020509` → `"2.5.9"`
    pub fn version_string(version: c_int) -> String {
        format!(
            "{}.{}.{}",
            (version >> 16) & 0xffff,
            (version >> 8) & 0xff,
            version & 0xff
        )
    }
}

impl std::fmt::Display for CoreVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (API {})",
            self.name,
            Self::version_string(self.plugin_version),
            Self::version_string(self.api_version)
        )
    }
}

/// A loaded core library. The library stays mapped while this is alive.
pub struct CoreLibrary {
    library: Library,
    path: PathBuf,
}

impl CoreLibrary {
    pub fn load(path: impl AsRef<Path>) -> VidExtResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VidExtError::Library(format!(
                "Core library not found: {}",
                path.display()
            )));
        }
        // SAFETY: loading runs the library's initializers; the caller points
        // us at a Mupen64Plus core.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            VidExtError::Library(format!("Failed to load '{}': {}", path.display(), e))
        })?;
        log(LogCategory::Core, LogLevel::Info, || {
            format!("Loaded core library {}", path.display())
        });
        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> VidExtResult<CoreVersion> {
        let get_version: Symbol<PluginGetVersionFn> = self.symbol(b"PluginGetVersion\0")?;

        let mut plugin_type: c_int = 0;
        let mut plugin_version: c_int = 0;
        let mut api_version: c_int = 0;
        let mut name_ptr: *const c_char = ptr::null();
        let mut capabilities: c_int = 0;
        // SAFETY: every out-pointer refers to a live local.
        let code = unsafe {
            get_version(
                &mut plugin_type,
                &mut plugin_version,
                &mut api_version,
                &mut name_ptr,
                &mut capabilities,
            )
        };
        check(code)?;

        let name = if name_ptr.is_null() {
            String::new()
        } else {
            // SAFETY: the core returns a pointer to a static NUL-terminated string.
            unsafe { CStr::from_ptr(name_ptr) }
                .to_string_lossy()
                .into_owned()
        };
        if plugin_type != PLUGIN_TYPE_CORE {
            return Err(VidExtError::Library(format!(
                "'{}' is not a core library (plugin type {})",
                self.path.display(),
                plugin_type
            )));
        }

        Ok(CoreVersion {
            plugin_type,
            plugin_version,
            api_version,
            name,
            capabilities,
        })
    }

    /// Hand the static callback table to the core.
    pub fn register_video_extension(&self) -> VidExtResult<()> {
        let override_vidext: Symbol<CoreOverrideVidExtFn> =
            self.symbol(b"CoreOverrideVidExt\0")?;
        let table = &VIDEO_EXTENSION_FUNCTIONS as *const m64p_video_extension_functions
            as *mut m64p_video_extension_functions;
        // SAFETY: the table is a static with the layout the core expects;
        // the core copies from it and never writes through the pointer.
        let code = unsafe { override_vidext(table) };
        check(code)?;
        log(LogCategory::Core, LogLevel::Info, || {
            "Registered video extension with core".to_string()
        });
        Ok(())
    }

    fn symbol<T>(&self, name: &[u8]) -> VidExtResult<Symbol<'_, T>> {
        // SAFETY: callers pair each symbol name with its C signature.
        unsafe { self.library.get::<T>(name) }.map_err(|e| {
            let printable = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
            VidExtError::Library(format!(
                "{} not found in '{}': {}",
                printable,
                self.path.display(),
                e
            ))
        })
    }
}

/// Turn a core return code into a result.
pub fn check(code: m64p_error) -> VidExtResult<()> {
    match M64Error::from_raw(code) {
        Some(status) if status.is_success() => Ok(()),
        Some(other) => Err(VidExtError::Core(other)),
        None => Err(VidExtError::Core(M64Error::Internal)),
    }
}
