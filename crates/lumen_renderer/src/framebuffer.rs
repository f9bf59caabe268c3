//! Pixel storage.
//!
//! [`FrameCells`] is the shared grid written by render tasks: each cell is
//! set exactly once by the task that owns its coordinate, so writes need no
//! lock. Once the completion barrier releases, the cells are copied into
//! an owned [`Framebuffer`].

use std::sync::OnceLock;

use lumen_math::Color;

/// Gamma 2.0 encode.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Gamma-encoded 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let channel = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

/// Write-once cell grid shared between render tasks.
#[derive(Debug)]
pub struct FrameCells {
    width: u32,
    height: u32,
    cells: Vec<OnceLock<Color>>,
}

impl FrameCells {
    pub fn new(width: u32, height: u32) -> Self {
        let cells = (0..width as usize * height as usize)
            .map(|_| OnceLock::new())
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Stores `color` at `(x, y)`. Returns `false` if the coordinate is out
    /// of range or the cell was already written.
    pub fn write(&self, x: u32, y: u32, color: Color) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.cells[index].set(color).is_ok()
    }

    /// Number of cells not yet written.
    pub fn missing(&self) -> usize {
        self.cells.iter().filter(|c| c.get().is_none()).count()
    }

    /// Copies the grid into a framebuffer, or `None` if any cell is still
    /// unwritten.
    pub fn to_framebuffer(&self) -> Option<Framebuffer> {
        let pixels = self
            .cells
            .iter()
            .map(|cell| cell.get().copied())
            .collect::<Option<Vec<_>>>()?;
        Some(Framebuffer {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}

/// Completed frame of linear radiance values, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`, `None` outside the frame.
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Gamma-encoded RGBA bytes for display or saving.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&c| color_to_rgba(c)).collect()
    }

    /// Mean radiance over the frame.
    pub fn average(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        self.pixels.iter().copied().sum::<Color>() / self.pixels.len() as f32
    }
}
