// sequence.rs — An ordered window of frames around the frame being denoised.

use crate::frame::{ComputableColor, Frame, FrameSize};
use crate::params::InputError;

/// Frames sharing one size, with a designated center frame.
///
/// The center frame is the one being denoised; every frame (center included)
/// contributes statistics.
#[derive(Debug, Clone)]
pub struct FrameSequence<C: ComputableColor> {
    frames: Vec<Frame<C>>,
    center: usize,
}

impl<C: ComputableColor> FrameSequence<C> {
    /// Wrap frames without checking them. Call [`verify`](Self::verify)
    /// (the denoiser does) before using the sequence.
    pub fn new(frames: Vec<Frame<C>>, center: usize) -> Self {
        FrameSequence { frames, center }
    }

    /// Sequence holding just one frame, which is also the center.
    pub fn single(frame: Frame<C>) -> Self {
        FrameSequence {
            frames: vec![frame],
            center: 0,
        }
    }

    /// Take `clip[center - radius ..= center + radius]`, clamped to the clip,
    /// and point the new sequence's center at `clip[center]`.
    ///
    /// # Panics
    /// Panics if `center >= clip.len()`.
    pub fn from_window(clip: &[Frame<C>], center: usize, temporal_radius: usize) -> Self {
        assert!(
            center < clip.len(),
            "center {center} out of range for clip of {} frames",
            clip.len()
        );
        let first = center.saturating_sub(temporal_radius);
        let last = (center + temporal_radius).min(clip.len() - 1);
        FrameSequence {
            frames: clip[first..=last].to_vec(),
            center: center - first,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn center_index(&self) -> usize {
        self.center
    }

    #[inline]
    pub fn center_frame(&self) -> &Frame<C> {
        &self.frames[self.center]
    }

    #[inline]
    pub fn frame(&self, index: usize) -> &Frame<C> {
        &self.frames[index]
    }

    #[inline]
    pub fn frames(&self) -> &[Frame<C>] {
        &self.frames
    }

    /// Size of the frames. Meaningful only for a verified sequence.
    ///
    /// # Panics
    /// Panics if the sequence is empty.
    #[inline]
    pub fn frame_size(&self) -> FrameSize {
        self.frames[0].size()
    }

    /// Non-empty, center in range, no zero-area frames, all sizes equal.
    pub fn verify(&self) -> Result<(), InputError> {
        let first = self.frames.first().ok_or(InputError::EmptySequence)?;
        if self.center >= self.frames.len() {
            return Err(InputError::CenterOutOfRange {
                center: self.center,
                len: self.frames.len(),
            });
        }

        let expected = first.size();
        if expected.pixel_count() == 0 {
            return Err(InputError::ZeroFrameSize(expected));
        }
        for (index, f) in self.frames.iter().enumerate().skip(1) {
            if f.size() != expected {
                return Err(InputError::FrameSizeMismatch {
                    index,
                    expected,
                    found: f.size(),
                });
            }
        }
        Ok(())
    }
}
