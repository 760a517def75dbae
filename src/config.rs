// config.rs — Denoiser configuration.

use std::path::PathBuf;

use crate::gpu::device::DeviceProfile;

/// Where the compute kernel's source comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KernelSource {
    /// The WGSL kernel compiled into the crate.
    #[default]
    Embedded,
    /// A WGSL file read at session start.
    File(PathBuf),
}

/// Denoiser configuration.
#[derive(Debug, Clone)]
pub struct DenoiseConfig {
    /// Kernel source to compile for every session.
    pub kernel: KernelSource,
    /// Name of the kernel entry point.
    pub entry_point: String,
    /// Backends searched for a device.
    pub backends: wgpu::Backends,
    /// Device limits and default workgroup size.
    pub profile: DeviceProfile,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        DenoiseConfig {
            kernel: KernelSource::Embedded,
            entry_point: crate::gpu::kernel::DEFAULT_ENTRY_POINT.to_string(),
            backends: wgpu::Backends::PRIMARY,
            profile: DeviceProfile::Native,
        }
    }
}
