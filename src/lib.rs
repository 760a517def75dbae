// vnlm: temporal Non-Local Means video denoising on the GPU.
//
// A target frame is denoised with patch statistics gathered from a window of
// neighboring frames, not just from the frame itself. The host pads frames
// for branch-free kernel access and drives one kernel launch per frame into a
// shared accumulator; the kernel does the per-pixel work.
//
//   frame, sequence, params   input containers and validation
//   border, transform         mirror padding, per frame and per sequence
//   gpu                       device session, kernel, dispatch loop
//   normalize                 accumulator → final colors
//   denoiser                  the entry point tying it together

pub mod border;
pub mod config;
pub mod convert;
pub mod denoiser;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod normalize;
pub mod params;
pub mod sequence;
pub mod transform;

pub use config::{DenoiseConfig, KernelSource};
pub use denoiser::NlmDenoiser;
pub use error::DenoiseError;
pub use frame::{ComputableColor, Frame, FrameSize, Rgb};
pub use params::{InputError, NlmParams};
pub use sequence::FrameSequence;
