//! SDL2 window backend
//!
//! - `Sdl2Window`: parent window, owns the event channel the adapter posts to
//! - `Sdl2Surface`: the SDL window; applies `GlFormat` as SDL GL attributes,
//!   then builds the window and its context
//! - `Sdl2Context`: an SDL `GLContext` bound to that window
//! - `SdlDisplayQuery`: fullscreen modes of display 0
//!
//! Caption and fullscreen requests travel over an `mpsc` channel and are
//! applied by [`Sdl2Window::pump_events`] on the owner's schedule.

use crate::surface::{DisplayQuery, GlContext, ParentWindow, RenderSurface, WindowEvent};
use sdl2::video::{FullscreenType, GLContext as SdlGlContext, SwapInterval, Window};
use sdl2::VideoSubsystem;
use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{channel, Receiver, Sender};
use vidext_core::logging::{log, LogCategory, LogLevel};
use vidext_core::{GlFormat, Size2D, VidExtError, VidExtResult};

fn sdl_err(e: impl std::fmt::Display) -> VidExtError {
    VidExtError::SystemFailure(e.to_string())
}

fn attr_u8(value: i32) -> u8 {
    value.clamp(0, u8::MAX as i32) as u8
}

fn swap_interval(value: i32) -> SwapInterval {
    match value {
        v if v < 0 => SwapInterval::LateSwapTearing,
        0 => SwapInterval::Immediate,
        _ => SwapInterval::VSync,
    }
}

pub struct Sdl2Context {
    window: Window,
    video: VideoSubsystem,
    context: SdlGlContext,
    valid: bool,
}

impl GlContext for Sdl2Context {
    fn make_current(&mut self) -> VidExtResult<()> {
        let result = self.window.gl_make_current(&self.context).map_err(sdl_err);
        self.valid = result.is_ok();
        result
    }

    fn done_current(&mut self) {
        if let Err(e) = self.video.gl_release_current_context() {
            log(LogCategory::Video, LogLevel::Warn, || {
                format!("SDL_GL_MakeCurrent(NULL) failed: {}", e)
            });
        }
    }

    fn is_valid(&self) -> bool {
        self.valid && self.context.is_current()
    }

    fn proc_address(&self, name: &str) -> Option<*const c_void> {
        let address = self.video.gl_get_proc_address(name) as *const c_void;
        (!address.is_null()).then_some(address)
    }
}

/// The SDL window backing the surface.
///
/// SDL fixes the pixel format (double buffering, depth, color and
/// multisample sizes) when an OpenGL window is built, so the window only
/// comes into existence in [`create_context`](RenderSurface::create_context),
/// after the requested `GlFormat` has been applied. Caption and fullscreen
/// changes arriving earlier are kept and applied to the window at build time.
pub struct Sdl2Surface {
    video: VideoSubsystem,
    title: String,
    width: u32,
    height: u32,
    fullscreen: bool,
    window: Option<Window>,
    events: Sender<WindowEvent>,
}

impl Sdl2Surface {
    fn apply_format(&self, format: &GlFormat) {
        let gl_attr = self.video.gl_attr();
        gl_attr.set_double_buffer(format.is_double_buffered());
        gl_attr.set_buffer_size(attr_u8(format.buffer_size));
        gl_attr.set_depth_size(attr_u8(format.depth_size));
        gl_attr.set_red_size(attr_u8(format.red_size));
        gl_attr.set_green_size(attr_u8(format.green_size));
        gl_attr.set_blue_size(attr_u8(format.blue_size));
        gl_attr.set_alpha_size(attr_u8(format.alpha_size));
        gl_attr.set_multisample_buffers(attr_u8(format.multisample_buffers));
        gl_attr.set_multisample_samples(attr_u8(format.multisample_samples));
    }

    fn build_window(&self) -> VidExtResult<Window> {
        let mut window = self
            .video
            .window(&self.title, self.width, self.height)
            .opengl()
            .resizable()
            .build()
            .map_err(sdl_err)?;
        if self.fullscreen {
            window
                .set_fullscreen(FullscreenType::Desktop)
                .map_err(sdl_err)?;
        }
        Ok(window)
    }

    fn apply_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::SetCaption(caption) => {
                if let Some(window) = self.window.as_mut() {
                    if let Err(e) = window.set_title(&caption) {
                        log(LogCategory::Video, LogLevel::Warn, || {
                            format!("Cannot set caption: {}", e)
                        });
                    }
                }
                self.title = caption;
            }
            WindowEvent::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                let next = if self.fullscreen {
                    FullscreenType::Desktop
                } else {
                    FullscreenType::Off
                };
                if let Some(window) = self.window.as_mut() {
                    if let Err(e) = window.set_fullscreen(next) {
                        log(LogCategory::Video, LogLevel::Warn, || {
                            format!("Cannot toggle fullscreen: {}", e)
                        });
                    }
                }
            }
        }
    }
}

impl RenderSurface for Sdl2Surface {
    type Context = Sdl2Context;

    fn create_context(&mut self, format: &GlFormat) -> VidExtResult<Sdl2Context> {
        self.apply_format(format);
        // A window built for an earlier format keeps that pixel format
        if self.window.take().is_some() {
            log(LogCategory::Video, LogLevel::Info, || {
                "Rebuilding SDL window for new GL format".to_string()
            });
        }
        let window = self.build_window()?;
        let context = window.gl_create_context().map_err(sdl_err)?;
        // Swap interval needs a current context
        if let Err(e) = self
            .video
            .gl_set_swap_interval(swap_interval(format.swap_interval))
        {
            log(LogCategory::Gl, LogLevel::Warn, || {
                format!("SDL_GL_SetSwapInterval failed: {}", e)
            });
        }
        self.window = Some(window.clone());
        Ok(Sdl2Context {
            window,
            video: self.video.clone(),
            context,
            valid: true,
        })
    }

    fn swap_buffers(&mut self) {
        if let Some(window) = self.window.as_ref() {
            window.gl_swap_window();
        }
    }

    fn post_event(&mut self, event: WindowEvent) {
        let _ = self.events.send(event);
    }
}

pub struct Sdl2Window {
    surface: Rc<RefCell<Sdl2Surface>>,
    sender: Sender<WindowEvent>,
    receiver: Receiver<WindowEvent>,
}

impl Sdl2Window {
    /// The SDL window itself is built when the core initializes the video
    /// extension.
    pub fn new(video: &VideoSubsystem, title: &str, width: u32, height: u32) -> Self {
        let (sender, receiver) = channel();
        let surface = Sdl2Surface {
            video: video.clone(),
            title: title.to_string(),
            width,
            height,
            fullscreen: false,
            window: None,
            events: sender.clone(),
        };
        Self {
            surface: Rc::new(RefCell::new(surface)),
            sender,
            receiver,
        }
    }

    /// Apply queued caption / fullscreen requests to the SDL window.
    pub fn pump_events(&self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.surface.borrow_mut().apply_event(event);
            applied += 1;
        }
        applied
    }
}

impl ParentWindow for Sdl2Window {
    type Surface = Sdl2Surface;

    fn surface(&self) -> Weak<RefCell<Sdl2Surface>> {
        Rc::downgrade(&self.surface)
    }

    fn post_event(&self, event: WindowEvent) {
        let _ = self.sender.send(event);
    }
}

/// Fullscreen modes of the primary display
pub struct SdlDisplayQuery {
    video: VideoSubsystem,
}

impl SdlDisplayQuery {
    /// Bring up SDL video just long enough to build a query.
    pub fn open() -> VidExtResult<Self> {
        let sdl = sdl2::init().map_err(sdl_err)?;
        let video = sdl.video().map_err(sdl_err)?;
        Ok(Self { video })
    }
}

impl DisplayQuery for SdlDisplayQuery {
    fn list_modes(&self) -> VidExtResult<Vec<Size2D>> {
        let count = self.video.num_display_modes(0).map_err(sdl_err)?;
        let mut modes = Vec::with_capacity(count.max(0) as usize);
        for index in 0..count {
            let mode = self.video.display_mode(0, index).map_err(sdl_err)?;
            if mode.w > 0 && mode.h > 0 {
                modes.push(Size2D::new(mode.w as u32, mode.h as u32));
            }
        }
        Ok(modes)
    }
}
