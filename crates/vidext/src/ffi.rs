//! C ABI surface: `m64p_video_extension_functions`
//!
//! The core calls the ten slots of [`VIDEO_EXTENSION_FUNCTIONS`] by fixed
//! offset and signature. The callbacks carry no user pointer, so each slot
//! is a trampoline that borrows the handler installed on the calling thread
//! with [`install`].
//!
//! # Threading
//!
//! The core invokes the table sequentially from the thread that runs it.
//! The handler lives in a thread-local slot on that thread; a callback
//! arriving while another is still running (re-entry) or on a thread with
//! no handler gets an error code back instead of a panic.

use crate::adapter::VideoExtension;
use crate::surface::ParentWindow;
use std::cell::RefCell;
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int, c_uint};
use std::{ptr, slice};
use vidext_core::logging::{log, LogCategory, LogLevel};
use vidext_core::{
    m64p_2d_size, m64p_GLattr, m64p_error, status_of, Size2D, VidExtError, VidExtResult,
};

/// Number of slots in [`m64p_video_extension_functions`]
pub const VIDEO_EXTENSION_FUNCTION_COUNT: c_uint = 10;

#[repr(C)]
#[allow(non_snake_case, non_camel_case_types)]
pub struct m64p_video_extension_functions {
    pub Functions: c_uint,
    pub VidExtFuncInit: Option<unsafe extern "C" fn() -> m64p_error>,
    pub VidExtFuncQuit: Option<unsafe extern "C" fn() -> m64p_error>,
    pub VidExtFuncListModes:
        Option<unsafe extern "C" fn(size_array: *mut m64p_2d_size, num_sizes: *mut c_int) -> m64p_error>,
    pub VidExtFuncSetMode: Option<
        unsafe extern "C" fn(width: c_int, height: c_int, bits: c_int, mode: c_int) -> m64p_error,
    >,
    pub VidExtFuncGLGetProc: Option<unsafe extern "C" fn(proc_name: *const c_char) -> *mut c_void>,
    pub VidExtFuncGLSetAttr:
        Option<unsafe extern "C" fn(attr: m64p_GLattr, value: c_int) -> m64p_error>,
    pub VidExtFuncGLGetAttr:
        Option<unsafe extern "C" fn(attr: m64p_GLattr, value: *mut c_int) -> m64p_error>,
    pub VidExtFuncGLSwapBuf: Option<unsafe extern "C" fn() -> m64p_error>,
    pub VidExtFuncSetCaption: Option<unsafe extern "C" fn(title: *const c_char) -> m64p_error>,
    pub VidExtFuncToggleFS: Option<unsafe extern "C" fn() -> m64p_error>,
}

/// The table handed to `CoreOverrideVidExt`. Static, so it outlives the core.
pub static VIDEO_EXTENSION_FUNCTIONS: m64p_video_extension_functions =
    m64p_video_extension_functions {
        Functions: VIDEO_EXTENSION_FUNCTION_COUNT,
        VidExtFuncInit: Some(vidext_init),
        VidExtFuncQuit: Some(vidext_quit),
        VidExtFuncListModes: Some(vidext_list_modes),
        VidExtFuncSetMode: Some(vidext_set_mode),
        VidExtFuncGLGetProc: Some(vidext_gl_get_proc),
        VidExtFuncGLSetAttr: Some(vidext_gl_set_attr),
        VidExtFuncGLGetAttr: Some(vidext_gl_get_attr),
        VidExtFuncGLSwapBuf: Some(vidext_gl_swap_buf),
        VidExtFuncSetCaption: Some(vidext_set_caption),
        VidExtFuncToggleFS: Some(vidext_toggle_fs),
    };

/// Object-safe view of the adapter used by the trampolines
pub trait VideoExtensionHandler {
    fn init(&mut self) -> VidExtResult<()>;
    fn quit(&mut self) -> VidExtResult<()>;
    fn list_fullscreen_modes(&self, out: &mut [Size2D]) -> usize;
    fn set_video_mode(
        &mut self,
        width: i32,
        height: i32,
        bits_per_pixel: i32,
        mode_flags: i32,
    ) -> VidExtResult<()>;
    fn gl_get_proc(&self, name: &str) -> Option<*const c_void>;
    fn gl_set_attr(&mut self, attr: m64p_GLattr, value: i32) -> VidExtResult<()>;
    fn gl_get_attr(&self, attr: m64p_GLattr, expected: i32) -> VidExtResult<()>;
    fn swap_buffers(&mut self) -> VidExtResult<()>;
    fn set_caption(&mut self, title: &str) -> VidExtResult<()>;
    fn toggle_fullscreen(&mut self) -> VidExtResult<()>;
}

impl<P: ParentWindow> VideoExtensionHandler for VideoExtension<P> {
    fn init(&mut self) -> VidExtResult<()> {
        VideoExtension::init(self)
    }

    fn quit(&mut self) -> VidExtResult<()> {
        VideoExtension::quit(self)
    }

    fn list_fullscreen_modes(&self, out: &mut [Size2D]) -> usize {
        VideoExtension::list_fullscreen_modes(self, out)
    }

    fn set_video_mode(
        &mut self,
        width: i32,
        height: i32,
        bits_per_pixel: i32,
        mode_flags: i32,
    ) -> VidExtResult<()> {
        VideoExtension::set_video_mode(self, width, height, bits_per_pixel, mode_flags)
    }

    fn gl_get_proc(&self, name: &str) -> Option<*const c_void> {
        VideoExtension::gl_get_proc(self, name)
    }

    fn gl_set_attr(&mut self, attr: m64p_GLattr, value: i32) -> VidExtResult<()> {
        VideoExtension::gl_set_attr(self, attr, value)
    }

    fn gl_get_attr(&self, attr: m64p_GLattr, expected: i32) -> VidExtResult<()> {
        VideoExtension::gl_get_attr(self, attr, expected)
    }

    fn swap_buffers(&mut self) -> VidExtResult<()> {
        VideoExtension::swap_buffers(self)
    }

    fn set_caption(&mut self, title: &str) -> VidExtResult<()> {
        VideoExtension::set_caption(self, title)
    }

    fn toggle_fullscreen(&mut self) -> VidExtResult<()> {
        VideoExtension::toggle_fullscreen(self)
    }
}

type HandlerSlot = RefCell<Option<Box<dyn VideoExtensionHandler>>>;

thread_local! {
    static ACTIVE: HandlerSlot = const { RefCell::new(None) };
}

/// Install `handler` for callbacks arriving on this thread, returning the
/// one it replaces.
pub fn install<H>(handler: H) -> VidExtResult<Option<Box<dyn VideoExtensionHandler>>>
where
    H: VideoExtensionHandler + 'static,
{
    ACTIVE.with(|slot| {
        let mut slot = slot
            .try_borrow_mut()
            .map_err(|_| VidExtError::InvalidState("cannot install during a callback"))?;
        Ok(slot.replace(Box::new(handler)))
    })
}

/// Remove this thread's handler.
pub fn uninstall() -> VidExtResult<Option<Box<dyn VideoExtensionHandler>>> {
    ACTIVE.with(|slot| {
        let mut slot = slot
            .try_borrow_mut()
            .map_err(|_| VidExtError::InvalidState("cannot uninstall during a callback"))?;
        Ok(slot.take())
    })
}

pub fn is_installed() -> bool {
    ACTIVE.with(|slot| slot.try_borrow().map(|s| s.is_some()).unwrap_or(true))
}

fn with_handler<R>(
    f: impl FnOnce(&mut dyn VideoExtensionHandler) -> VidExtResult<R>,
) -> VidExtResult<R> {
    ACTIVE.with(|slot| {
        let mut guard = slot
            .try_borrow_mut()
            .map_err(|_| VidExtError::InvalidState("video extension callback re-entered"))?;
        match guard.as_deref_mut() {
            Some(handler) => f(handler),
            None => Err(VidExtError::NotBound),
        }
    })
}

fn dispatch(
    callback: &'static str,
    f: impl FnOnce(&mut dyn VideoExtensionHandler) -> VidExtResult<()>,
) -> m64p_error {
    let result = with_handler(f);
    if let Err(e) = &result {
        log(LogCategory::Ffi, LogLevel::Warn, || {
            format!("{}: {}", callback, e)
        });
    }
    status_of(&result).as_raw()
}

unsafe extern "C" fn vidext_init() -> m64p_error {
    dispatch("VidExtFuncInit", |h| h.init())
}

unsafe extern "C" fn vidext_quit() -> m64p_error {
    dispatch("VidExtFuncQuit", |h| h.quit())
}

/// `*num_sizes` on entry is the capacity of `size_array`; on return it is
/// whatever [`VideoExtension::list_fullscreen_modes`] reports for a buffer
/// of that capacity. A capacity of zero or less copies nothing and reports
/// the list length; `size_array` may then be null.
unsafe extern "C" fn vidext_list_modes(
    size_array: *mut m64p_2d_size,
    num_sizes: *mut c_int,
) -> m64p_error {
    dispatch("VidExtFuncListModes", |h| {
        if num_sizes.is_null() {
            return Err(VidExtError::NullPointer("NumSizes"));
        }
        // SAFETY: checked non-null above.
        let capacity = unsafe { *num_sizes }.max(0) as usize;
        if capacity > 0 && size_array.is_null() {
            return Err(VidExtError::NullPointer("SizeArray"));
        }
        let out: &mut [Size2D] = if capacity == 0 {
            &mut []
        } else {
            // SAFETY: non-null, and the caller owns `capacity` entries there.
            unsafe { slice::from_raw_parts_mut(size_array, capacity) }
        };
        let count = h.list_fullscreen_modes(out);
        // SAFETY: checked non-null above.
        unsafe { *num_sizes = count as c_int };
        Ok(())
    })
}

unsafe extern "C" fn vidext_set_mode(
    width: c_int,
    height: c_int,
    bits: c_int,
    mode: c_int,
) -> m64p_error {
    dispatch("VidExtFuncSetMode", |h| {
        h.set_video_mode(width, height, bits, mode)
    })
}

unsafe extern "C" fn vidext_gl_get_proc(proc_name: *const c_char) -> *mut c_void {
    if proc_name.is_null() {
        log(LogCategory::Ffi, LogLevel::Warn, || {
            "VidExtFuncGLGetProc: null name".to_string()
        });
        return ptr::null_mut();
    }
    // SAFETY: non-null, and the core passes a NUL-terminated name.
    let name = unsafe { CStr::from_ptr(proc_name) };
    let Ok(name) = name.to_str() else {
        log(LogCategory::Ffi, LogLevel::Warn, || {
            format!("VidExtFuncGLGetProc: non UTF-8 name {:?}", name)
        });
        return ptr::null_mut();
    };
    match with_handler(|h| Ok(h.gl_get_proc(name))) {
        Ok(Some(address)) => address as *mut c_void,
        Ok(None) => ptr::null_mut(),
        Err(e) => {
            log(LogCategory::Ffi, LogLevel::Warn, || {
                format!("VidExtFuncGLGetProc: {}", e)
            });
            ptr::null_mut()
        }
    }
}

unsafe extern "C" fn vidext_gl_set_attr(attr: m64p_GLattr, value: c_int) -> m64p_error {
    dispatch("VidExtFuncGLSetAttr", |h| h.gl_set_attr(attr, value))
}

/// Verify form: succeeds when the current value equals `*value`.
unsafe extern "C" fn vidext_gl_get_attr(attr: m64p_GLattr, value: *mut c_int) -> m64p_error {
    dispatch("VidExtFuncGLGetAttr", |h| {
        if value.is_null() {
            return Err(VidExtError::NullPointer("pValue"));
        }
        // SAFETY: checked non-null above.
        let expected = unsafe { *value };
        h.gl_get_attr(attr, expected)
    })
}

unsafe extern "C" fn vidext_gl_swap_buf() -> m64p_error {
    dispatch("VidExtFuncGLSwapBuf", |h| h.swap_buffers())
}

unsafe extern "C" fn vidext_set_caption(title: *const c_char) -> m64p_error {
    dispatch("VidExtFuncSetCaption", |h| {
        if title.is_null() {
            return Err(VidExtError::NullPointer("Title"));
        }
        // SAFETY: non-null, and the core passes a NUL-terminated title.
        let title = unsafe { CStr::from_ptr(title) }.to_string_lossy();
        h.set_caption(&title)
    })
}

unsafe extern "C" fn vidext_toggle_fs() -> m64p_error {
    dispatch("VidExtFuncToggleFS", |h| h.toggle_fullscreen())
}
