// params.rs — Denoise parameters and the input validation layer.
//
// Everything here runs before any device work. The core (border extender,
// dispatch loop, normalizer) assumes these checks passed: it relies on
// `radius < size` for its mirror arithmetic and on `h > 0` for the weight
// formula in the kernel.

use thiserror::Error;

use crate::frame::FrameSize;

/// Parameters of one temporal NLM run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlmParams {
    /// Half-width of the compared patch. Frames are padded by this much.
    pub patch_radius: u32,
    /// Half-width of the search window in every frame of the sequence.
    pub search_window_radius: u32,
    /// Noise standard deviation in color units (`[0, 1]` scale).
    pub standard_deviation_of_noise: f32,
    /// Filtering parameter `h`. Larger values smooth more.
    pub filtering_parameter: f32,
}

impl NlmParams {
    pub fn new(
        patch_radius: u32,
        search_window_radius: u32,
        standard_deviation_of_noise: f32,
        filtering_parameter: f32,
    ) -> Self {
        NlmParams {
            patch_radius,
            search_window_radius,
            standard_deviation_of_noise,
            filtering_parameter,
        }
    }

    /// Check the parameters against the frame size they will be used with.
    pub fn verify(&self, frame_size: FrameSize) -> Result<(), InputError> {
        verify_radius(self.patch_radius, frame_size)
            .map_err(|radius| InputError::PatchRadius {
                radius,
                size: frame_size,
            })?;
        verify_radius(self.search_window_radius, frame_size)
            .map_err(|radius| InputError::SearchWindowRadius {
                radius,
                size: frame_size,
            })?;

        // `!(x >= 0)` also rejects NaN.
        if !(self.standard_deviation_of_noise >= 0.0) {
            return Err(InputError::NegativeNoise(self.standard_deviation_of_noise));
        }
        let h = self.filtering_parameter;
        if !(h > 0.0) {
            return Err(InputError::NonPositiveFilter(h));
        }
        // The kernel divides by h² in f32. Zero (or a subnormal flushed to
        // zero) turns the center's own weight into NaN; infinity zeroes
        // every exponent.
        if !(h * h).is_normal() {
            return Err(InputError::FilterOutOfRange(h));
        }
        Ok(())
    }
}

impl Default for NlmParams {
    /// 7×7 patches, 15×15 search window, moderate smoothing.
    fn default() -> Self {
        NlmParams {
            patch_radius: 3,
            search_window_radius: 7,
            standard_deviation_of_noise: 0.0,
            filtering_parameter: 0.25,
        }
    }
}

/// A radius is usable when `0 < radius < size` on both axes.
fn verify_radius(radius: u32, size: FrameSize) -> Result<(), u32> {
    let r = radius as usize;
    if r == 0 || r >= size.size_x || r >= size.size_y {
        return Err(radius);
    }
    Ok(())
}

/// Rejected denoise input. Returned before any GPU resource is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("frame sequence is empty")]
    EmptySequence,

    #[error("center frame index {center} out of range for a sequence of {len} frames")]
    CenterOutOfRange { center: usize, len: usize },

    #[error("frame {index} has size {found}, expected {expected}")]
    FrameSizeMismatch {
        index: usize,
        expected: FrameSize,
        found: FrameSize,
    },

    #[error("frames have zero area ({0})")]
    ZeroFrameSize(FrameSize),

    #[error("patch radius {radius} must be in 1..min(size_x, size_y) for frame {size}")]
    PatchRadius { radius: u32, size: FrameSize },

    #[error("search window radius {radius} must be in 1..min(size_x, size_y) for frame {size}")]
    SearchWindowRadius { radius: u32, size: FrameSize },

    #[error("standard deviation of noise must be >= 0 (got {0})")]
    NegativeNoise(f32),

    #[error("filtering parameter must be > 0 (got {0})")]
    NonPositiveFilter(f32),

    #[error("filtering parameter {0} is out of range: its square must be a normal f32")]
    FilterOutOfRange(f32),

    #[error("destination frame is {found}, sequence frames are {expected}")]
    DestinationSize {
        expected: FrameSize,
        found: FrameSize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: FrameSize = FrameSize::new(16, 8);

    #[test]
    fn test_default_params_valid_for_reasonable_frame() {
        assert_eq!(NlmParams::default().verify(FrameSize::new(64, 64)), Ok(()));
    }

    #[test]
    fn test_zero_patch_radius_rejected() {
        let p = NlmParams::new(0, 2, 0.0, 0.1);
        assert!(matches!(p.verify(SIZE), Err(InputError::PatchRadius { radius: 0, .. })));
    }

    #[test]
    fn test_radius_checked_against_smaller_axis() {
        // 8 < 16 but not < 8.
        let p = NlmParams::new(8, 2, 0.0, 0.1);
        assert!(matches!(p.verify(SIZE), Err(InputError::PatchRadius { radius: 8, .. })));
        let p = NlmParams::new(7, 2, 0.0, 0.1);
        assert_eq!(p.verify(SIZE), Ok(()));
    }

    #[test]
    fn test_search_radius_rejected() {
        let p = NlmParams::new(1, 16, 0.0, 0.1);
        assert!(matches!(p.verify(SIZE), Err(InputError::SearchWindowRadius { radius: 16, .. })));
    }

    #[test]
    fn test_noise_and_filter_bounds() {
        assert_eq!(
            NlmParams::new(1, 1, -0.1, 0.1).verify(SIZE),
            Err(InputError::NegativeNoise(-0.1))
        );
        assert_eq!(
            NlmParams::new(1, 1, 0.0, 0.0).verify(SIZE),
            Err(InputError::NonPositiveFilter(0.0))
        );
        assert!(NlmParams::new(1, 1, f32::NAN, 0.1).verify(SIZE).is_err());
        assert!(NlmParams::new(1, 1, 0.0, f32::NAN).verify(SIZE).is_err());
    }

    #[test]
    fn test_filter_whose_square_underflows_rejected() {
        // 1e-23² is 0 in f32; the center weight would be exp(-0/0).
        assert_eq!(
            NlmParams::new(1, 1, 0.0, 1e-23).verify(SIZE),
            Err(InputError::FilterOutOfRange(1e-23))
        );
        // Square lands in the subnormal range: flushed to zero on many GPUs.
        assert_eq!(
            NlmParams::new(1, 1, 0.0, 1e-20).verify(SIZE),
            Err(InputError::FilterOutOfRange(1e-20))
        );
        assert_eq!(
            NlmParams::new(1, 1, 0.0, f32::INFINITY).verify(SIZE),
            Err(InputError::FilterOutOfRange(f32::INFINITY))
        );
        assert_eq!(
            NlmParams::new(1, 1, 0.0, 1e20).verify(SIZE),
            Err(InputError::FilterOutOfRange(1e20))
        );
    }

    #[test]
    fn test_small_filter_with_normal_square_accepted() {
        assert_eq!(NlmParams::new(1, 1, 0.0, 1e-15).verify(SIZE), Ok(()));
        assert_eq!(NlmParams::new(1, 1, 0.0, 1e15).verify(SIZE), Ok(()));
    }
}
