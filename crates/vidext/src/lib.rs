//! Mupen64Plus video extension backed by a host window.
//!
//! The core never opens a window itself when a video extension is
//! registered; every window and GL request goes through the ten callbacks
//! of `m64p_video_extension_functions`. This crate provides:
//!
//! - [`VideoExtension`]: the adapter, one method per callback
//! - [`ffi`]: the static C table and its trampolines
//! - [`surface`]: the traits a host window implements
//! - [`headless`]: an in-memory window for tests and dry runs
//! - [`core_lib`]: loading the core and registering the table
//! - `sdl2_backend` (feature `sdl2`): a real window and GL context
//!
//! Typical use:
//!
//! ```no_run
//! use m64p_vidext::{ffi, CoreLibrary, HeadlessWindow, VideoExtension};
//!
//! let window = HeadlessWindow::new(640, 480);
//! let mut video = VideoExtension::new();
//! video.bind(window.clone());
//! ffi::install(video).unwrap();
//!
//! let core = CoreLibrary::load("libmupen64plus.so.2").unwrap();
//! core.register_video_extension().unwrap();
//! // ... run the core on this thread, pumping `window` between frames
//! ```

pub mod adapter;
pub mod core_lib;
pub mod display_modes;
pub mod ffi;
pub mod headless;
#[cfg(feature = "sdl2")]
pub mod sdl2_backend;
pub mod settings;
pub mod surface;

pub use adapter::{VideoExtension, DEFAULT_CAPTION_PREFIX};
pub use core_lib::{CoreLibrary, CoreVersion};
pub use display_modes::{fullscreen_modes, init_fullscreen_modes, FALLBACK_MODES};
pub use ffi::{m64p_video_extension_functions, VideoExtensionHandler, VIDEO_EXTENSION_FUNCTIONS};
pub use headless::HeadlessWindow;
pub use settings::Settings;
pub use surface::{DisplayQuery, GlContext, ParentWindow, RenderSurface, WindowEvent};
pub use vidext_core::{GlAttr, GlFormat, M64Error, Size2D, VidExtError, VidExtResult};
