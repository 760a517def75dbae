//! Top-level error returned by the denoiser.

use thiserror::Error;

use crate::gpu::device::GpuError;
use crate::params::InputError;

/// Why a denoise call failed. The destination frame is untouched in every case.
#[derive(Error, Debug)]
pub enum DenoiseError {
    /// Rejected before any device interaction.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Device acquisition, kernel compilation or kernel execution failed.
    #[error("GPU failure: {0}")]
    Gpu(#[from] GpuError),
}
