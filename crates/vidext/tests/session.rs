//! Drives a whole emulation session through the C table, the way the core
//! would: init, attribute negotiation, mode set, frames, caption, fullscreen
//! toggle, quit.

use m64p_vidext::{
    ffi, m64p_video_extension_functions, GlAttr, HeadlessWindow, M64Error, Size2D,
    VideoExtension, FALLBACK_MODES, VIDEO_EXTENSION_FUNCTIONS,
};
use std::ffi::{c_void, CString};
use std::os::raw::{c_int, c_uint};

fn table() -> &'static m64p_video_extension_functions {
    &VIDEO_EXTENSION_FUNCTIONS
}

fn bound_window() -> HeadlessWindow {
    let window = HeadlessWindow::new(640, 480);
    let mut video = VideoExtension::with_modes(&FALLBACK_MODES);
    video.bind(window.clone());
    ffi::install(video).unwrap();
    window
}

#[test]
fn table_layout_matches_c_header() {
    let ptr_size = std::mem::size_of::<usize>();
    let header = std::mem::size_of::<c_uint>().max(ptr_size);
    assert_eq!(
        std::mem::size_of::<m64p_video_extension_functions>(),
        header + 10 * ptr_size
    );
    assert_eq!(table().Functions, 10);
}

extern "C" fn fake_gl_get_string(_name: u32) -> *const u8 {
    std::ptr::null()
}

#[test]
fn full_session_through_table() {
    let window = bound_window();
    window.register_proc("glGetString", fake_gl_get_string as *const c_void);
    let t = table();

    unsafe {
        // Attributes are requested before the context exists
        let set_attr = t.VidExtFuncGLSetAttr.unwrap();
        assert_eq!(set_attr(GlAttr::DoubleBuffer.as_raw(), 1), 0);
        assert_eq!(set_attr(GlAttr::BufferSize.as_raw(), 32), 0);
        assert_eq!(set_attr(GlAttr::DepthSize.as_raw(), 16), 0);
        assert_eq!(set_attr(GlAttr::SwapControl.as_raw(), 0), 0);

        assert_eq!((t.VidExtFuncInit.unwrap())(), 0);

        let mut sizes = [Size2D::default(); 16];
        let mut count: c_int = 16;
        assert_eq!(
            (t.VidExtFuncListModes.unwrap())(sizes.as_mut_ptr(), &mut count),
            0
        );
        assert_eq!(count, 9);
        assert_eq!(sizes[0], Size2D::new(1920, 1440));
        assert_eq!(sizes[8], Size2D::new(320, 240));

        assert_eq!((t.VidExtFuncSetMode.unwrap())(640, 480, 32, 1), 0);

        let get_attr = t.VidExtFuncGLGetAttr.unwrap();
        let mut depth: c_int = 16;
        assert_eq!(get_attr(GlAttr::DepthSize.as_raw(), &mut depth), 0);
        let mut wrong: c_int = 24;
        assert_eq!(
            get_attr(GlAttr::DepthSize.as_raw(), &mut wrong),
            M64Error::SystemFail.as_raw()
        );

        let name = CString::new("glGetString").unwrap();
        assert_eq!(
            (t.VidExtFuncGLGetProc.unwrap())(name.as_ptr()) as *const c_void,
            fake_gl_get_string as *const c_void
        );

        let title = CString::new("SUPER MARIO 64").unwrap();
        assert_eq!((t.VidExtFuncSetCaption.unwrap())(title.as_ptr()), 0);

        for _ in 0..3 {
            assert_eq!((t.VidExtFuncGLSwapBuf.unwrap())(), 0);
        }
        assert_eq!((t.VidExtFuncToggleFS.unwrap())(), 0);
        assert_eq!((t.VidExtFuncQuit.unwrap())(), 0);
    }

    let stats = window.stats();
    assert_eq!(stats.contexts_created, 1);
    assert_eq!(stats.swaps, 3);
    assert_eq!(stats.done_current_calls, 1);
    let format = stats.last_format.expect("context was created");
    assert_eq!(format.depth_size, 16);
    assert_eq!(format.swap_interval, 0);

    assert_eq!(window.pump_events(), 2);
    assert_eq!(window.title(), "Mupen64Plus :: SUPER MARIO 64");
    assert!(window.is_fullscreen());
}

#[test]
fn session_after_window_closed() {
    let window = HeadlessWindow::new(320, 240);
    let mut video = VideoExtension::with_modes(&FALLBACK_MODES);
    video.bind(window.clone().detached());
    ffi::install(video).unwrap();
    drop(window);

    let t = table();
    unsafe {
        assert_eq!((t.VidExtFuncInit.unwrap())(), M64Error::NotInit.as_raw());
        assert_eq!((t.VidExtFuncGLSwapBuf.unwrap())(), M64Error::NotInit.as_raw());
        assert_eq!((t.VidExtFuncToggleFS.unwrap())(), M64Error::NotInit.as_raw());
    }
}

#[test]
fn uninstalled_thread_gets_not_init() {
    let t = table();
    unsafe {
        assert_eq!((t.VidExtFuncInit.unwrap())(), M64Error::NotInit.as_raw());
        assert_eq!((t.VidExtFuncQuit.unwrap())(), M64Error::NotInit.as_raw());
    }
}
