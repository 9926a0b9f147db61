//! The video extension adapter
//!
//! [`VideoExtension`] holds everything one core session needs: the bound
//! parent window, a weak handle to its rendering surface, the lazily
//! created GL context and the requested [`GlFormat`]. Each method is one
//! callback of `m64p_video_extension_functions`, expressed with Rust types.
//!
//! Lifecycle: constructed empty → [`bind`](VideoExtension::bind) →
//! [`init`](VideoExtension::init) creates the context →
//! [`quit`](VideoExtension::quit) releases it.

use crate::display_modes;
use crate::settings::Settings;
use crate::surface::{GlContext, ParentWindow, RenderSurface, WindowEvent};
use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::{Rc, Weak};
use vidext_core::logging::{log, LogCategory, LogLevel};
use vidext_core::{m64p_GLattr, GlAttr, GlFormat, Size2D, VidExtError, VidExtResult};

pub const DEFAULT_CAPTION_PREFIX: &str = "Mupen64Plus";

type ContextOf<P> = <<P as ParentWindow>::Surface as RenderSurface>::Context;

pub struct VideoExtension<P: ParentWindow> {
    parent: Option<P>,
    surface: Weak<RefCell<P::Surface>>,
    context: Option<ContextOf<P>>,
    format: GlFormat,
    modes: &'static [Size2D],
    caption_prefix: String,
}

impl<P: ParentWindow> Default for VideoExtension<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParentWindow> VideoExtension<P> {
    /// Unbound adapter using the process-wide fullscreen mode list
    pub fn new() -> Self {
        Self::with_modes(display_modes::fullscreen_modes())
    }

    pub fn with_modes(modes: &'static [Size2D]) -> Self {
        Self {
            parent: None,
            surface: Weak::new(),
            context: None,
            format: GlFormat::default(),
            modes,
            caption_prefix: DEFAULT_CAPTION_PREFIX.to_string(),
        }
    }

    /// Unbound adapter configured from `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        let mut adapter = Self::new();
        adapter.format = settings.gl;
        adapter.caption_prefix = settings.caption_prefix.clone();
        adapter
    }

    /// Attach the parent window and its rendering surface.
    ///
    /// A context created for a previously bound surface is dropped.
    pub fn bind(&mut self, parent: P) {
        if self.context.take().is_some() {
            log(LogCategory::Video, LogLevel::Info, || {
                "Rebinding video extension, dropping existing context".to_string()
            });
        }
        self.surface = parent.surface();
        self.parent = Some(parent);
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn format(&self) -> &GlFormat {
        &self.format
    }

    pub fn caption_prefix(&self) -> &str {
        &self.caption_prefix
    }

    pub fn set_caption_prefix(&mut self, prefix: impl Into<String>) {
        self.caption_prefix = prefix.into();
    }

    /// Create the GL context on first call; later calls are no-ops.
    pub fn init(&mut self) -> VidExtResult<()> {
        if self.context.is_some() {
            return Ok(());
        }
        let format = self.format;
        let context = self.with_surface(|surface| surface.create_context(&format))?;
        self.context = Some(context);
        log(LogCategory::Video, LogLevel::Info, || {
            format!("Created GL context ({:?})", format)
        });
        Ok(())
    }

    /// Release the context as current. No-op without a context.
    pub fn quit(&mut self) -> VidExtResult<()> {
        if let Some(context) = self.context.as_mut() {
            context.done_current();
            log(LogCategory::Video, LogLevel::Info, || {
                "Released GL context".to_string()
            });
        }
        Ok(())
    }

    /// Copy the fullscreen modes into `out` and return how many were copied.
    ///
    /// Modes past `out.len()` are skipped. An empty `out` is a size query:
    /// nothing is copied and the full list length is returned.
    pub fn list_fullscreen_modes(&self, out: &mut [Size2D]) -> usize {
        if out.is_empty() {
            return self.modes.len();
        }
        let count = self.modes.len().min(out.len());
        out[..count].copy_from_slice(&self.modes[..count]);
        count
    }

    /// Make the context current and report whether it is usable.
    ///
    /// The requested geometry is not applied; the window keeps its size.
    pub fn set_video_mode(
        &mut self,
        width: i32,
        height: i32,
        bits_per_pixel: i32,
        mode_flags: i32,
    ) -> VidExtResult<()> {
        log(LogCategory::Video, LogLevel::Debug, || {
            format!(
                "Video mode requested: {}x{} {}bpp flags=0x{:X}",
                width, height, bits_per_pixel, mode_flags
            )
        });
        let context = self.context.as_mut().ok_or(VidExtError::NotInitialized)?;
        if let Err(e) = context.make_current() {
            log(LogCategory::Video, LogLevel::Warn, || {
                format!("make_current failed: {}", e)
            });
        }
        if context.is_valid() {
            Ok(())
        } else {
            Err(VidExtError::SystemFailure(
                "GL context is not valid".to_string(),
            ))
        }
    }

    /// Post `"<prefix> :: <title>"` to the parent window.
    pub fn set_caption(&mut self, title: &str) -> VidExtResult<()> {
        let parent = self.parent.as_ref().ok_or(VidExtError::NotBound)?;
        let caption = format!("{} :: {}", self.caption_prefix, title);
        log(LogCategory::Video, LogLevel::Debug, || {
            format!("Caption: {}", caption)
        });
        parent.post_event(WindowEvent::SetCaption(caption));
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self) -> VidExtResult<()> {
        self.with_surface(|surface| {
            surface.post_event(WindowEvent::ToggleFullscreen);
            Ok(())
        })
    }

    /// Look up an OpenGL function through the active context.
    pub fn gl_get_proc(&self, name: &str) -> Option<*const c_void> {
        let address = self
            .context
            .as_ref()
            .and_then(|context| context.proc_address(name))
            .filter(|address| !address.is_null());
        if address.is_none() {
            log(LogCategory::Gl, LogLevel::Warn, || {
                format!("VidExtFuncGLGetProc: '{}'", name)
            });
        }
        address
    }

    /// Store `value` for the raw attribute kind `attr`.
    pub fn gl_set_attr(&mut self, attr: m64p_GLattr, value: i32) -> VidExtResult<()> {
        let attr = GlAttr::from_raw(attr).map_err(|e| {
            log(LogCategory::Gl, LogLevel::Warn, || e.to_string());
            e
        })?;
        self.format.set(attr, value);
        log(LogCategory::Gl, LogLevel::Debug, || {
            format!("{} = {}", attr.name(), value)
        });
        Ok(())
    }

    /// Succeeds when the stored value for `attr` equals `expected`.
    pub fn gl_get_attr(&self, attr: m64p_GLattr, expected: i32) -> VidExtResult<()> {
        let attr = GlAttr::from_raw(attr)?;
        self.format.verify(attr, expected)
    }

    pub fn gl_attr_value(&self, attr: GlAttr) -> i32 {
        self.format.get(attr)
    }

    pub fn swap_buffers(&mut self) -> VidExtResult<()> {
        self.with_surface(|surface| {
            surface.swap_buffers();
            Ok(())
        })
    }

    fn with_surface<R>(
        &self,
        f: impl FnOnce(&mut P::Surface) -> VidExtResult<R>,
    ) -> VidExtResult<R> {
        let cell: Rc<RefCell<P::Surface>> = self.surface.upgrade().ok_or(VidExtError::NotBound)?;
        let mut guard = cell
            .try_borrow_mut()
            .map_err(|_| VidExtError::InvalidState("rendering surface is already borrowed"))?;
        f(&mut *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_modes::FALLBACK_MODES;
    use crate::headless::HeadlessWindow;

    fn bound() -> (VideoExtension<HeadlessWindow>, HeadlessWindow) {
        let window = HeadlessWindow::new(640, 480);
        let mut video = VideoExtension::with_modes(&FALLBACK_MODES);
        video.bind(window.clone());
        (video, window)
    }

    #[test]
    fn init_without_bind_fails() {
        let mut video: VideoExtension<HeadlessWindow> = VideoExtension::with_modes(&FALLBACK_MODES);
        assert_eq!(video.init(), Err(VidExtError::NotBound));
        assert!(!video.has_context());
    }

    #[test]
    fn init_after_surface_dropped_fails() {
        let mut video = VideoExtension::with_modes(&FALLBACK_MODES);
        video.bind(HeadlessWindow::new(320, 240).detached());
        assert_eq!(video.init(), Err(VidExtError::NotBound));
    }

    #[test]
    fn init_is_idempotent() {
        let (mut video, window) = bound();
        assert!(video.init().is_ok());
        assert!(video.init().is_ok());
        assert_eq!(window.stats().contexts_created, 1);
        assert!(video.has_context());
    }

    #[test]
    fn init_uses_current_format() {
        let (mut video, window) = bound();
        video.gl_set_attr(GlAttr::DepthSize.as_raw(), 16).unwrap();
        video.init().unwrap();
        assert_eq!(window.stats().last_format.map(|f| f.depth_size), Some(16));
    }

    #[test]
    fn quit_before_init_is_noop() {
        let (mut video, window) = bound();
        assert!(video.quit().is_ok());
        assert_eq!(window.stats().done_current_calls, 0);

        let mut unbound: VideoExtension<HeadlessWindow> = VideoExtension::with_modes(&FALLBACK_MODES);
        assert!(unbound.quit().is_ok());
    }

    #[test]
    fn quit_releases_context() {
        let (mut video, window) = bound();
        video.init().unwrap();
        video.set_video_mode(640, 480, 32, 0).unwrap();
        assert!(window.stats().context_current);
        video.quit().unwrap();
        assert!(!window.stats().context_current);
        assert_eq!(window.stats().done_current_calls, 1);
    }

    #[test]
    fn set_video_mode_requires_context() {
        let (mut video, _window) = bound();
        assert_eq!(
            video.set_video_mode(640, 480, 32, 0),
            Err(VidExtError::NotInitialized)
        );
    }

    #[test]
    fn set_video_mode_fails_exactly_when_context_invalid() {
        let (mut video, window) = bound();
        video.init().unwrap();
        assert!(video.set_video_mode(640, 480, 32, 0).is_ok());

        window.set_context_valid(false);
        let err = video.set_video_mode(640, 480, 32, 0).unwrap_err();
        assert!(matches!(err, VidExtError::SystemFailure(_)));
        assert_eq!(err.to_m64p(), vidext_core::M64Error::SystemFail);

        window.set_context_valid(true);
        assert!(video.set_video_mode(1024, 768, 16, 1).is_ok());
    }

    #[test]
    fn set_video_mode_ignores_requested_geometry() {
        let (mut video, window) = bound();
        video.init().unwrap();
        video.set_video_mode(1920, 1440, 32, 0).unwrap();
        assert_eq!(window.size(), (640, 480));
    }

    #[test]
    fn every_attribute_verifies_after_set() {
        let (mut video, _window) = bound();
        for (i, attr) in GlAttr::ALL.iter().enumerate() {
            let value = i as i32 * 3 + 1;
            assert!(video.gl_set_attr(attr.as_raw(), value).is_ok());
            assert!(video.gl_get_attr(attr.as_raw(), value).is_ok(), "{}", attr.name());
            assert_eq!(video.gl_attr_value(*attr), value);
        }
    }

    #[test]
    fn wrong_expected_value_is_a_mismatch() {
        let (mut video, _window) = bound();
        for attr in GlAttr::ALL {
            video.gl_set_attr(attr.as_raw(), 8).unwrap();
            let err = video.gl_get_attr(attr.as_raw(), 9).unwrap_err();
            assert_eq!(
                err,
                VidExtError::AttributeMismatch {
                    attr,
                    expected: 9,
                    actual: 8
                }
            );
        }
    }

    #[test]
    fn unknown_attribute_is_invalid_argument() {
        let (mut video, _window) = bound();
        let before = *video.format();
        for raw in [0, 11, 13, 99, -4] {
            let err = video.gl_set_attr(raw, 1).unwrap_err();
            assert_eq!(err, VidExtError::UnknownAttribute(raw));
            assert_eq!(err.to_m64p(), vidext_core::M64Error::InputInvalid);
            assert_eq!(
                video.gl_get_attr(raw, 1),
                Err(VidExtError::UnknownAttribute(raw))
            );
        }
        assert_eq!(*video.format(), before);
    }

    #[test]
    fn mode_listing_is_stable() {
        let (video, _window) = bound();
        let mut first = [Size2D::default(); 16];
        let mut second = [Size2D::default(); 16];
        let n1 = video.list_fullscreen_modes(&mut first);
        let n2 = video.list_fullscreen_modes(&mut second);
        assert_eq!(n1, 9);
        assert_eq!(n1, n2);
        assert_eq!(first[..n1], second[..n2]);
        assert_eq!(&first[..n1], &FALLBACK_MODES[..]);
    }

    #[test]
    fn mode_listing_stops_at_short_buffer() {
        let (video, _window) = bound();
        let mut out = [Size2D::default(); 4];
        assert_eq!(video.list_fullscreen_modes(&mut out), 4);
        assert_eq!(out, FALLBACK_MODES[..4]);
    }

    #[test]
    fn empty_buffer_queries_list_length() {
        let (video, _window) = bound();
        assert_eq!(video.list_fullscreen_modes(&mut []), 9);
    }

    #[test]
    fn caption_is_posted_to_parent() {
        let (mut video, window) = bound();
        video.set_caption("SUPER MARIO 64").unwrap();
        assert_eq!(
            window.take_events(),
            vec![WindowEvent::SetCaption(
                "Mupen64Plus :: SUPER MARIO 64".to_string()
            )]
        );
        // Applying the caption is the owner's business.
        assert_eq!(window.title(), "");
    }

    #[test]
    fn caption_prefix_is_configurable() {
        let (mut video, window) = bound();
        video.set_caption_prefix("N64");
        video.set_caption("ZELDA").unwrap();
        assert_eq!(
            window.take_events(),
            vec![WindowEvent::SetCaption("N64 :: ZELDA".to_string())]
        );
    }

    #[test]
    fn settings_prefix_reaches_caption() {
        let settings = Settings {
            caption_prefix: "M64Py".to_string(),
            ..Default::default()
        };
        let window = HeadlessWindow::new(640, 480);
        let mut video = VideoExtension::from_settings(&settings);
        video.bind(window.clone());
        video.set_caption("F-ZERO X").unwrap();
        assert_eq!(
            window.take_events(),
            vec![WindowEvent::SetCaption("M64Py :: F-ZERO X".to_string())]
        );
    }

    #[test]
    fn toggle_fullscreen_is_posted_to_surface() {
        let (mut video, window) = bound();
        video.toggle_fullscreen().unwrap();
        assert_eq!(
            window.take_surface_events(),
            vec![WindowEvent::ToggleFullscreen]
        );
        assert!(window.take_events().is_empty());
    }

    #[test]
    fn swap_buffers_reaches_surface() {
        let (mut video, window) = bound();
        video.init().unwrap();
        for _ in 0..3 {
            video.swap_buffers().unwrap();
        }
        assert_eq!(window.stats().swaps, 3);
    }

    extern "C" fn fake_gl_clear(_mask: u32) {}

    #[test]
    fn gl_get_proc_needs_context() {
        let (mut video, window) = bound();
        window.register_proc("glClear", fake_gl_clear as *const c_void);
        assert!(video.gl_get_proc("glClear").is_none());
        video.init().unwrap();
        assert_eq!(
            video.gl_get_proc("glClear"),
            Some(fake_gl_clear as *const c_void)
        );
        assert!(video.gl_get_proc("glNotARealFunction").is_none());
    }

    #[test]
    fn rebinding_drops_context() {
        let (mut video, _window) = bound();
        video.init().unwrap();
        let other = HeadlessWindow::new(800, 600);
        video.bind(other.clone());
        assert!(!video.has_context());
        video.init().unwrap();
        assert_eq!(other.stats().contexts_created, 1);
    }

    #[test]
    fn settings_configure_adapter() {
        let mut settings = Settings::default();
        settings.caption_prefix = "Test".to_string();
        settings.gl.swap_interval = 0;
        let video: VideoExtension<HeadlessWindow> = VideoExtension::from_settings(&settings);
        assert_eq!(video.caption_prefix(), "Test");
        assert_eq!(video.gl_attr_value(GlAttr::SwapControl), 0);
    }
}
