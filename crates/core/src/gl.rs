//! OpenGL attribute kinds and the format descriptor they configure.
//!
//! The core asks for GL attributes by `m64p_GLattr` value. Only the ten
//! kinds below are understood; anything else is rejected with
//! [`VidExtError::UnknownAttribute`] rather than being looked up blindly.

use crate::{m64p_GLattr, VidExtError, VidExtResult};
use serde::{Deserialize, Serialize};

/// GL attribute kinds, numbered as in `m64p_types.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum GlAttr {
    DoubleBuffer = 1,
    BufferSize = 2,
    DepthSize = 3,
    RedSize = 4,
    GreenSize = 5,
    BlueSize = 6,
    AlphaSize = 7,
    SwapControl = 8,
    MultisampleBuffers = 9,
    MultisampleSamples = 10,
}

impl GlAttr {
    pub const ALL: [GlAttr; 10] = [
        GlAttr::DoubleBuffer,
        GlAttr::BufferSize,
        GlAttr::DepthSize,
        GlAttr::RedSize,
        GlAttr::GreenSize,
        GlAttr::BlueSize,
        GlAttr::AlphaSize,
        GlAttr::SwapControl,
        GlAttr::MultisampleBuffers,
        GlAttr::MultisampleSamples,
    ];

    pub fn from_raw(raw: m64p_GLattr) -> VidExtResult<Self> {
        match raw {
            1 => Ok(GlAttr::DoubleBuffer),
            2 => Ok(GlAttr::BufferSize),
            3 => Ok(GlAttr::DepthSize),
            4 => Ok(GlAttr::RedSize),
            5 => Ok(GlAttr::GreenSize),
            6 => Ok(GlAttr::BlueSize),
            7 => Ok(GlAttr::AlphaSize),
            8 => Ok(GlAttr::SwapControl),
            9 => Ok(GlAttr::MultisampleBuffers),
            10 => Ok(GlAttr::MultisampleSamples),
            other => Err(VidExtError::UnknownAttribute(other)),
        }
    }

    pub fn as_raw(self) -> m64p_GLattr {
        self as m64p_GLattr
    }

    /// Name as spelled in the C headers, for log output.
    pub fn name(self) -> &'static str {
        match self {
            GlAttr::DoubleBuffer => "M64P_GL_DOUBLEBUFFER",
            GlAttr::BufferSize => "M64P_GL_BUFFER_SIZE",
            GlAttr::DepthSize => "M64P_GL_DEPTH_SIZE",
            GlAttr::RedSize => "M64P_GL_RED_SIZE",
            GlAttr::GreenSize => "M64P_GL_GREEN_SIZE",
            GlAttr::BlueSize => "M64P_GL_BLUE_SIZE",
            GlAttr::AlphaSize => "M64P_GL_ALPHA_SIZE",
            GlAttr::SwapControl => "M64P_GL_SWAP_CONTROL",
            GlAttr::MultisampleBuffers => "M64P_GL_MULTISAMPLEBUFFERS",
            GlAttr::MultisampleSamples => "M64P_GL_MULTISAMPLESAMPLES",
        }
    }
}

impl TryFrom<m64p_GLattr> for GlAttr {
    type Error = VidExtError;

    fn try_from(raw: m64p_GLattr) -> Result<Self, Self::Error> {
        GlAttr::from_raw(raw)
    }
}

/// Requested OpenGL surface format.
///
/// Values are stored exactly as the core hands them over so that a value
/// written with [`GlFormat::set`] reads back unchanged from [`GlFormat::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlFormat {
    pub double_buffer: i32,
    pub buffer_size: i32,
    pub depth_size: i32,
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub swap_interval: i32,
    pub multisample_buffers: i32,
    pub multisample_samples: i32,
}

impl Default for GlFormat {
    fn default() -> Self {
        Self {
            double_buffer: 1,
            buffer_size: 32,
            depth_size: 24,
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 0,
            swap_interval: 1,
            multisample_buffers: 0,
            multisample_samples: 0,
        }
    }
}

impl GlFormat {
    pub fn set(&mut self, attr: GlAttr, value: i32) {
        *self.slot_mut(attr) = value;
    }

    pub fn get(&self, attr: GlAttr) -> i32 {
        match attr {
            GlAttr::DoubleBuffer => self.double_buffer,
            GlAttr::BufferSize => self.buffer_size,
            GlAttr::DepthSize => self.depth_size,
            GlAttr::RedSize => self.red_size,
            GlAttr::GreenSize => self.green_size,
            GlAttr::BlueSize => self.blue_size,
            GlAttr::AlphaSize => self.alpha_size,
            GlAttr::SwapControl => self.swap_interval,
            GlAttr::MultisampleBuffers => self.multisample_buffers,
            GlAttr::MultisampleSamples => self.multisample_samples,
        }
    }

    /// Compare the stored value against what the caller expects.
    pub fn verify(&self, attr: GlAttr, expected: i32) -> VidExtResult<()> {
        let actual = self.get(attr);
        if actual == expected {
            Ok(())
        } else {
            Err(VidExtError::AttributeMismatch {
                attr,
                expected,
                actual,
            })
        }
    }

    pub fn is_double_buffered(&self) -> bool {
        self.double_buffer != 0
    }

    /// All attributes with their current values, in header order.
    pub fn entries(&self) -> impl Iterator<Item = (GlAttr, i32)> + '_ {
        GlAttr::ALL.iter().map(move |&attr| (attr, self.get(attr)))
    }

    fn slot_mut(&mut self, attr: GlAttr) -> &mut i32 {
        match attr {
            GlAttr::DoubleBuffer => &mut self.double_buffer,
            GlAttr::BufferSize => &mut self.buffer_size,
            GlAttr::DepthSize => &mut self.depth_size,
            GlAttr::RedSize => &mut self.red_size,
            GlAttr::GreenSize => &mut self.green_size,
            GlAttr::BlueSize => &mut self.blue_size,
            GlAttr::AlphaSize => &mut self.alpha_size,
            GlAttr::SwapControl => &mut self.swap_interval,
            GlAttr::MultisampleBuffers => &mut self.multisample_buffers,
            GlAttr::MultisampleSamples => &mut self.multisample_samples,
        }
    }
}
