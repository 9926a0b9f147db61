//! Window, surface and context abstraction
//!
//! The adapter never talks to a toolkit directly. A window owner implements
//! these traits for whatever it renders with (SDL2 ships behind the `sdl2`
//! feature, [`crate::headless`] is always available):
//!
//! ```text
//! ParentWindow ──owns──> RenderSurface ──creates──> GlContext
//!      ▲                      ▲
//!      └── SetCaption         └── ToggleFullscreen   (WindowEvent)
//! ```
//!
//! Caption and fullscreen requests are posted as [`WindowEvent`]s; the
//! owner decides when and how to apply them to the OS window.

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Weak;
use vidext_core::{GlFormat, Size2D, VidExtResult};

/// Requests the adapter posts to the window owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    /// New title for the OS window chrome (already formatted)
    SetCaption(String),
    /// Switch between windowed and fullscreen presentation
    ToggleFullscreen,
}

/// An OpenGL context created by a [`RenderSurface`]
pub trait GlContext {
    /// Make this context current on the calling thread
    fn make_current(&mut self) -> VidExtResult<()>;

    /// Release this context from the calling thread
    fn done_current(&mut self);

    /// Whether the context is usable
    fn is_valid(&self) -> bool;

    /// Resolve an OpenGL function by name
    fn proc_address(&self, name: &str) -> Option<*const c_void>;
}

/// The on-screen area hosting the GL context
pub trait RenderSurface {
    type Context: GlContext;

    /// Create and realize a context with the requested format
    fn create_context(&mut self, format: &GlFormat) -> VidExtResult<Self::Context>;

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Hand a request to the surface owner
    fn post_event(&mut self, event: WindowEvent);
}

/// The top-level window embedding a [`RenderSurface`]
pub trait ParentWindow {
    type Surface: RenderSurface;

    /// Weak handle to the embedded surface; the window keeps ownership
    fn surface(&self) -> Weak<RefCell<Self::Surface>>;

    /// Hand a request to the window owner
    fn post_event(&self, event: WindowEvent);
}

/// Source of the fullscreen resolutions supported by the display
pub trait DisplayQuery {
    fn list_modes(&self) -> VidExtResult<Vec<Size2D>>;
}
