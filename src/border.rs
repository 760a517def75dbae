// border.rs — Mirror padding so the kernel never checks borders.
//
// The kernel compares patches of radius r around every pixel, including
// pixels on the frame edge. Instead of clamping inside the kernel we extend
// each frame by r on every side once on the host:
//
//   padded x:   0 .. r-1 | r .. size+r-1 | size+r .. size+2r-1
//   source x:   r .. 1   | 0 .. size-1   | size-2 .. size-r-1
//
// The low side mirrors around source index 0 and the high side around
// size-1, neither repeating the edge pixel. Both axes use the same mapping.
//
// Requires 0 < r < size on both axes; the validation layer guarantees it and
// nothing here re-checks in release builds.

use crate::convert::GpuColor;
use crate::frame::{ComputableColor, Frame, FrameSize};

/// One frame extended by `patch_radius` pixels on every side, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedBuffer {
    data: Vec<GpuColor>,
    size: FrameSize,
    radius: usize,
}

impl PaddedBuffer {
    /// Padded dimensions: `(size_x + 2r) × (size_y + 2r)`.
    #[inline]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Texel at padded coordinates.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> GpuColor {
        self.data[y * self.size.size_x + x]
    }

    #[inline]
    pub fn as_slice(&self) -> &[GpuColor] {
        &self.data
    }

    /// Raw bytes for `create_buffer_init`.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Per-axis constants of the mirror mapping.
#[derive(Debug, Clone, Copy)]
struct AxisMirror {
    radius: usize,
    /// First padded index past the high border: `size + r`.
    frame_end: usize,
    /// High-side reflection constant: `2·size + r - 2`.
    fac: usize,
}

impl AxisMirror {
    #[inline]
    fn new(size: usize, radius: usize) -> Self {
        debug_assert!(
            radius > 0 && radius < size,
            "mirror padding needs 0 < radius < size (radius {radius}, size {size})"
        );
        AxisMirror {
            radius,
            frame_end: size + radius,
            fac: 2 * size + radius - 2,
        }
    }

    /// Source index for padded index `i`.
    #[inline]
    fn map(&self, i: usize) -> usize {
        if i < self.radius {
            self.radius - i
        } else if i >= self.frame_end {
            self.fac - i
        } else {
            i - self.radius
        }
    }
}

/// Source coordinate for padded coordinate `i` on an axis of length `size`.
///
/// Exposed for tests and benchmarks; [`extend_frame`] is the real consumer.
#[inline]
pub fn mirror_index(i: usize, size: usize, radius: usize) -> usize {
    AxisMirror::new(size, radius).map(i)
}

/// Extend `frame` by `patch_radius` on every side using mirror padding.
///
/// The result is dense row-major with stride `size_x + 2r`.
pub fn extend_frame<C: ComputableColor>(frame: &Frame<C>, patch_radius: usize) -> PaddedBuffer {
    let src_size = frame.size();
    let size = src_size.padded(patch_radius);
    let mx = AxisMirror::new(src_size.size_x, patch_radius);
    let my = AxisMirror::new(src_size.size_y, patch_radius);

    // Column mapping is identical for every row; compute it once.
    let cols: Vec<usize> = (0..size.size_x).map(|i| mx.map(i)).collect();

    let src = frame.as_slice();
    let mut data = Vec::with_capacity(size.pixel_count());
    for j in 0..size.size_y {
        let row = &src[my.map(j) * src_size.size_x..][..src_size.size_x];
        data.extend(cols.iter().map(|&ii| GpuColor::from_color(row[ii])));
    }
    debug_assert_eq!(data.len(), size.pixel_count());

    PaddedBuffer {
        data,
        size,
        radius: patch_radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgb;

    /// Frame whose red channel encodes x and green encodes y.
    fn coord_frame(w: usize, h: usize) -> Frame<Rgb> {
        let mut f = Frame::new(w, h);
        for y in 0..h {
            for x in 0..w {
                f.set(x, y, Rgb::new(x as f32, y as f32, 0.0));
            }
        }
        f
    }

    #[test]
    fn test_mirror_index_low_border() {
        // size 5, r 2: padded 0,1 -> source 2,1.
        assert_eq!(mirror_index(0, 5, 2), 2);
        assert_eq!(mirror_index(1, 5, 2), 1);
        assert_eq!(mirror_index(2, 5, 2), 0);
    }

    #[test]
    fn test_mirror_index_high_border() {
        // size 5, r 2: padded 7,8 -> source 3,2 (mirror around 4).
        assert_eq!(mirror_index(6, 5, 2), 4);
        assert_eq!(mirror_index(7, 5, 2), 3);
        assert_eq!(mirror_index(8, 5, 2), 2);
    }

    #[test]
    fn test_extend_frame_size() {
        let f: Frame<Rgb> = Frame::new(7, 4);
        let p = extend_frame(&f, 3);
        assert_eq!(p.size(), FrameSize::new(13, 10));
        assert_eq!(p.len(), 13 * 10);
        assert_eq!(p.as_bytes().len(), 13 * 10 * 16);
    }

    #[test]
    fn test_extend_frame_interior_is_identity() {
        let f = coord_frame(6, 5);
        let p = extend_frame(&f, 2);
        for y in 0..5 {
            for x in 0..6 {
                assert_eq!(p.get(x + 2, y + 2).rgb, [x as f32, y as f32, 0.0]);
            }
        }
    }

    #[test]
    fn test_extend_frame_corners() {
        let f = coord_frame(6, 5);
        let p = extend_frame(&f, 2);
        // (0,0) padded -> source (2,2).
        assert_eq!(p.get(0, 0).rgb, [2.0, 2.0, 0.0]);
        // Bottom-right padded (9,8) -> source x = 2·6+2-2-9 = 3, y = 2·5+2-2-8 = 2.
        assert_eq!(p.get(9, 8).rgb, [3.0, 2.0, 0.0]);
    }
}
