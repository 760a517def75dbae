// gpu/session.rs — Device, queue and compiled kernel for one denoise call.
//
// A session is opened at the start of a denoise invocation and dropped at
// its end, on success and on every error path. Nothing outlives the call and
// nothing is shared between calls: opening a session always acquires a fresh
// device and recompiles the kernel.

use tracing::debug;

use crate::config::DenoiseConfig;
use crate::gpu::device::{GpuDevice, GpuError};
use crate::gpu::kernel::{resolve_source, specialize, NlmKernel};

/// A ready-to-launch kernel on an in-order queue.
///
/// Field order is drop order: the kernel's pipeline and layout are released
/// before the device that created them.
pub struct NlmSession {
    kernel: NlmKernel,
    gpu: GpuDevice,
}

impl NlmSession {
    /// Read the kernel source, acquire a device and compile the kernel.
    ///
    /// # Errors
    /// Environment errors (no platform/device), kernel source I/O errors and
    /// compilation errors, each as the matching [`GpuError`] variant.
    pub fn open(config: &DenoiseConfig) -> Result<Self, GpuError> {
        // Source I/O fails before any device is created.
        let template = resolve_source(&config.kernel)?;
        let gpu = GpuDevice::acquire(config.backends, config.profile)?;
        let source = specialize(&template, gpu.workgroup_size);
        let kernel = NlmKernel::build(&gpu, &source, &config.entry_point)?;
        debug!(entry_point = kernel.entry_point(), "session open on {}", gpu);
        Ok(NlmSession { kernel, gpu })
    }

    #[inline]
    pub fn gpu(&self) -> &GpuDevice {
        &self.gpu
    }

    #[inline]
    pub fn kernel(&self) -> &NlmKernel {
        &self.kernel
    }
}
