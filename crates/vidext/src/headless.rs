//! Headless window backend
//!
//! Implements the surface traits without touching a display: contexts are
//! bookkeeping only, swaps are counted and window events are applied to an
//! in-memory title / fullscreen flag when the owner pumps them. Used by the
//! CLI self-test and by tests that drive the callback table.

use crate::surface::{GlContext, ParentWindow, RenderSurface, WindowEvent};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::{Rc, Weak};
use vidext_core::{GlFormat, VidExtError, VidExtResult};

/// Counters observed through the headless backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessStats {
    pub contexts_created: usize,
    pub last_format: Option<GlFormat>,
    pub context_current: bool,
    pub done_current_calls: usize,
    pub swaps: usize,
}

struct Shared {
    stats: RefCell<HeadlessStats>,
    context_valid: Cell<bool>,
    procs: RefCell<HashMap<String, usize>>,
}

pub struct HeadlessSurface {
    width: u32,
    height: u32,
    fullscreen: bool,
    events: Vec<WindowEvent>,
    shared: Rc<Shared>,
}

impl RenderSurface for HeadlessSurface {
    type Context = HeadlessContext;

    fn create_context(&mut self, format: &GlFormat) -> VidExtResult<HeadlessContext> {
        let mut stats = self.shared.stats.borrow_mut();
        stats.contexts_created += 1;
        stats.last_format = Some(*format);
        Ok(HeadlessContext {
            shared: Rc::clone(&self.shared),
        })
    }

    fn swap_buffers(&mut self) {
        self.shared.stats.borrow_mut().swaps += 1;
    }

    fn post_event(&mut self, event: WindowEvent) {
        self.events.push(event);
    }
}

pub struct HeadlessContext {
    shared: Rc<Shared>,
}

impl GlContext for HeadlessContext {
    fn make_current(&mut self) -> VidExtResult<()> {
        if !self.shared.context_valid.get() {
            return Err(VidExtError::SystemFailure("context lost".to_string()));
        }
        self.shared.stats.borrow_mut().context_current = true;
        Ok(())
    }

    fn done_current(&mut self) {
        let mut stats = self.shared.stats.borrow_mut();
        stats.context_current = false;
        stats.done_current_calls += 1;
    }

    fn is_valid(&self) -> bool {
        self.shared.context_valid.get()
    }

    fn proc_address(&self, name: &str) -> Option<*const c_void> {
        self.shared
            .procs
            .borrow()
            .get(name)
            .map(|&address| address as *const c_void)
    }
}

/// Parent window of a [`HeadlessSurface`]. Clones share state.
#[derive(Clone)]
pub struct HeadlessWindow {
    surface: Option<Rc<RefCell<HeadlessSurface>>>,
    events: Rc<RefCell<Vec<WindowEvent>>>,
    title: Rc<RefCell<String>>,
    shared: Rc<Shared>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        let shared = Rc::new(Shared {
            stats: RefCell::new(HeadlessStats::default()),
            context_valid: Cell::new(true),
            procs: RefCell::new(HashMap::new()),
        });
        let surface = HeadlessSurface {
            width,
            height,
            fullscreen: false,
            events: Vec::new(),
            shared: Rc::clone(&shared),
        };
        Self {
            surface: Some(Rc::new(RefCell::new(surface))),
            events: Rc::new(RefCell::new(Vec::new())),
            title: Rc::new(RefCell::new(String::new())),
            shared,
        }
    }

    /// This handle without its surface, as after the surface was destroyed
    pub fn detached(mut self) -> Self {
        self.surface = None;
        self
    }

    /// Make `name` resolvable through contexts of this window
    pub fn register_proc(&self, name: &str, address: *const c_void) {
        self.shared
            .procs
            .borrow_mut()
            .insert(name.to_string(), address as usize);
    }

    /// Simulate a lost (or restored) GL context
    pub fn set_context_valid(&self, valid: bool) {
        self.shared.context_valid.set(valid);
    }

    pub fn stats(&self) -> HeadlessStats {
        self.shared.stats.borrow().clone()
    }

    pub fn size(&self) -> (u32, u32) {
        self.surface
            .as_ref()
            .map(|s| {
                let s = s.borrow();
                (s.width, s.height)
            })
            .unwrap_or((0, 0))
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.surface
            .as_ref()
            .map(|s| s.borrow().fullscreen)
            .unwrap_or(false)
    }

    /// Events posted to the window, oldest first
    pub fn take_events(&self) -> Vec<WindowEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Events posted to the surface, oldest first
    pub fn take_surface_events(&self) -> Vec<WindowEvent> {
        self.surface
            .as_ref()
            .map(|s| std::mem::take(&mut s.borrow_mut().events))
            .unwrap_or_default()
    }

    /// Apply every pending event the way a real window owner would.
    /// Returns how many events were applied.
    pub fn pump_events(&self) -> usize {
        let mut pending = self.take_events();
        pending.extend(self.take_surface_events());
        for event in &pending {
            match event {
                WindowEvent::SetCaption(caption) => {
                    *self.title.borrow_mut() = caption.clone();
                }
                WindowEvent::ToggleFullscreen => {
                    if let Some(surface) = self.surface.as_ref() {
                        let mut surface = surface.borrow_mut();
                        surface.fullscreen = !surface.fullscreen;
                    }
                }
            }
        }
        pending.len()
    }
}

impl ParentWindow for HeadlessWindow {
    type Surface = HeadlessSurface;

    fn surface(&self) -> Weak<RefCell<HeadlessSurface>> {
        self.surface.as_ref().map(Rc::downgrade).unwrap_or_default()
    }

    fn post_event(&self, event: WindowEvent) {
        self.events.borrow_mut().push(event);
    }
}
