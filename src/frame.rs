// frame.rs — Runtime-sized video frame, generic over a color policy.
//
// A `Frame<C>` is a dense, row-major grid of color values. Unlike a general
// image container there is no stride: the denoiser pads frames itself (see
// border.rs) and every other consumer wants tightly packed rows.
//
//   data index:  0  1  2  3  4  5  6  7  8  9 10 11
//   pixel:       ■  ■  ■  ■  ■  ■  ■  ■  ■  ■  ■  ■
//   row:         |-- row 0 --|  |-- row 1 --|  |-- row 2 --|     (width = 4)
//
// The color type is a policy: the core only needs to read three float
// channels and write them back, so it is generic over `ComputableColor`.
// `Rgb` is the one realization shipped today.

use std::fmt;

// ---------------------------------------------------------------------------
// ComputableColor
// ---------------------------------------------------------------------------

/// A color value the denoiser can compute with.
///
/// Channel values are `f32` in `[0.0, 1.0]`. The kernel works on three
/// channels, so every implementation maps to and from `[f32; 3]`.
pub trait ComputableColor: Copy + Default + Send + Sync + PartialEq + 'static {
    /// Channels in kernel order.
    fn channels(self) -> [f32; 3];

    /// Build a color from channels in kernel order.
    fn from_channels(c: [f32; 3]) -> Self;
}

/// Linear RGB color, one `f32` per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb { r, g, b }
    }

    /// Same value on all three channels.
    #[inline]
    pub const fn gray(v: f32) -> Self {
        Rgb { r: v, g: v, b: v }
    }
}

impl ComputableColor for Rgb {
    #[inline]
    fn channels(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    fn from_channels(c: [f32; 3]) -> Self {
        Rgb {
            r: c[0],
            g: c[1],
            b: c[2],
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSize
// ---------------------------------------------------------------------------

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub size_x: usize,
    pub size_y: usize,
}

impl FrameSize {
    #[inline]
    pub const fn new(size_x: usize, size_y: usize) -> Self {
        FrameSize { size_x, size_y }
    }

    /// Number of pixels (`size_x * size_y`).
    #[inline]
    pub const fn pixel_count(&self) -> usize {
        self.size_x * self.size_y
    }

    /// Dimensions after extending every side by `radius`.
    #[inline]
    pub const fn padded(&self, radius: usize) -> FrameSize {
        FrameSize {
            size_x: self.size_x + 2 * radius,
            size_y: self.size_y + 2 * radius,
        }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.size_x, self.size_y)
    }
}

// ---------------------------------------------------------------------------
// Frame<C>
// ---------------------------------------------------------------------------

/// One video frame: `size_x * size_y` colors in row-major order.
#[derive(Clone, PartialEq)]
pub struct Frame<C: ComputableColor> {
    data: Vec<C>,
    size: FrameSize,
}

impl<C: ComputableColor> Frame<C> {
    /// Frame filled with `C::default()` (black for `Rgb`).
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self::filled(size_x, size_y, C::default())
    }

    /// Frame with every pixel set to `value`.
    pub fn filled(size_x: usize, size_y: usize, value: C) -> Self {
        Frame {
            data: vec![value; size_x * size_y],
            size: FrameSize::new(size_x, size_y),
        }
    }

    /// Wrap an existing row-major pixel vector.
    ///
    /// # Panics
    /// Panics if `data.len() != size_x * size_y`.
    pub fn from_vec(size_x: usize, size_y: usize, data: Vec<C>) -> Self {
        assert_eq!(
            data.len(),
            size_x * size_y,
            "data length ({}) must equal size_x * size_y ({})",
            data.len(),
            size_x * size_y,
        );
        Frame {
            data,
            size: FrameSize::new(size_x, size_y),
        }
    }

    // --- Accessors ---

    #[inline]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size.size_y
    }

    /// Pixel at column `x`, row `y`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> C {
        self.bounds_check(x, y);
        self.data[y * self.size.size_x + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut C {
        self.bounds_check(x, y);
        let idx = y * self.size.size_x + x;
        &mut self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: C) {
        *self.get_mut(x, y) = value;
    }

    /// Borrow row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[C] {
        assert!(y < self.size.size_y, "row {y} out of bounds (size_y {})", self.size.size_y);
        let start = y * self.size.size_x;
        &self.data[start..start + self.size.size_x]
    }

    /// Iterate over all pixels as `(x, y, value)`, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, C)> + '_ {
        let w = self.size.size_x;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &c)| (i % w, i / w, c))
    }

    #[inline]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }

    #[inline]
    fn bounds_check(&self, x: usize, y: usize) {
        assert!(
            x < self.size.size_x && y < self.size.size_y,
            "pixel ({x},{y}) out of bounds for frame {}",
            self.size,
        );
    }
}

// --- 8-bit interop (Rgb only) ---

impl Frame<Rgb> {
    /// Build a frame from interleaved 8-bit RGB, normalizing to `[0, 1]`.
    ///
    /// # Panics
    /// Panics if `bytes.len() != size_x * size_y * 3`.
    pub fn from_rgb8(size_x: usize, size_y: usize, bytes: &[u8]) -> Self {
        assert_eq!(
            bytes.len(),
            size_x * size_y * 3,
            "rgb8 buffer length ({}) must equal size_x * size_y * 3 ({})",
            bytes.len(),
            size_x * size_y * 3,
        );
        let data = bytes
            .chunks_exact(3)
            .map(|p| Rgb::new(p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0))
            .collect();
        Frame {
            data,
            size: FrameSize::new(size_x, size_y),
        }
    }

    /// Interleaved 8-bit RGB, clamped to `[0, 255]` and rounded.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 3);
        for px in &self.data {
            for c in px.channels() {
                out.push((c * 255.0).clamp(0.0, 255.0).round() as u8);
            }
        }
        out
    }
}

impl<C: ComputableColor + fmt::Debug> fmt::Debug for Frame<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frame<{}> {{ {} }}", std::any::type_name::<C>(), self.size)?;
        for y in 0..self.size.size_y.min(4) {
            write!(f, "  row {y}: [")?;
            for x in 0..self.size.size_x.min(4) {
                if x > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self.get(x, y))?;
            }
            if self.size.size_x > 4 {
                write!(f, ", ...")?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
