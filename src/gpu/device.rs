// gpu/device.rs — Device acquisition and per-profile limits.
//
// Responsibilities:
//   - Enumerate adapters on the configured backends and pick the first one
//     that is GPU-class and can run compute shaders.
//   - Expose a `DeviceProfile` for simulating tighter hardware limits on a
//     development machine.
//   - Provide `WorkgroupSize`, baked into the kernel source at compile time.
//
// ADAPTER SELECTION:
// "No adapters at all" and "adapters, but none usable" are reported as two
// different errors. Software rasterizers (DeviceType::Cpu) are never picked:
// the denoiser has no CPU fallback and llvmpipe would only hide a broken
// driver setup. DeviceType::Other is accepted because translation layers
// such as dzn on WSL2 report themselves that way.
//
// Acquisition is stateless. Every call builds a fresh instance, adapter,
// device and queue; nothing is cached between denoise invocations.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

/// Hardware profile controlling device limits and default workgroup sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceProfile {
    /// Use the adapter's default limits.
    #[default]
    Native,
    /// Request reduced limits: 64 invocations per workgroup and 32 MiB
    /// storage bindings. wgpu validates every dispatch against the
    /// *requested* limits and the dispatch loop checks buffer sizes against
    /// them, so a frame too large for a small embedded GPU fails here too.
    Constrained,
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceProfile::Native => write!(f, "Native"),
            DeviceProfile::Constrained => write!(f, "Constrained (simulated limits)"),
        }
    }
}

/// Workgroup configuration for the 2D kernel launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }

    /// Default for a profile.
    ///
    /// - `Native`: 16×8 = 128, four 32-wide warps or two 64-wide wavefronts.
    /// - `Constrained`: 8×8 = 64.
    pub fn for_profile(profile: DeviceProfile) -> Self {
        match profile {
            DeviceProfile::Native => WorkgroupSize { x: 16, y: 8 },
            DeviceProfile::Constrained => WorkgroupSize { x: 8, y: 8 },
        }
    }

    /// Workgroups needed to cover `width × height` work-items.
    ///
    /// Ceiling division: the kernel must discard invocations past the frame.
    pub fn dispatch_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width.div_ceil(self.x), height.div_ceil(self.y))
    }
}

impl fmt::Display for WorkgroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} ({} invocations)", self.x, self.y, self.total())
    }
}

/// Name and kind of an adapter, for logging and device listings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSummary {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl AdapterSummary {
    fn of(adapter: &wgpu::Adapter) -> Self {
        let info = adapter.get_info();
        AdapterSummary {
            name: info.name,
            device_type: info.device_type,
            backend: info.backend,
        }
    }
}

impl fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// Adapter, device and queue for one denoise invocation.
///
/// # Field drop order
/// Fields drop top to bottom. `_instance` is last so the instance outlives
/// `device` and `queue`; some Vulkan layers crash if the instance goes away
/// while device objects still reference it.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub profile: DeviceProfile,
    pub adapter_info: AdapterSummary,
    pub workgroup_size: WorkgroupSize,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Acquire the first suitable device on `backends`.
    ///
    /// # Errors
    /// - [`GpuError::NoPlatform`] when no adapter exists at all.
    /// - [`GpuError::NoSuitableDevice`] when none is GPU-class and compute-capable.
    /// - [`GpuError::DeviceRequest`] when the driver refuses the device.
    pub fn acquire(backends: wgpu::Backends, profile: DeviceProfile) -> Result<Self, GpuError> {
        pollster::block_on(Self::acquire_async(backends, profile))
    }

    async fn acquire_async(
        backends: wgpu::Backends,
        profile: DeviceProfile,
    ) -> Result<Self, GpuError> {
        let instance = create_instance(backends);

        let adapters = instance.enumerate_adapters(backends);
        if adapters.is_empty() {
            return Err(GpuError::NoPlatform);
        }

        let mut suitable: Vec<wgpu::Adapter> = adapters.into_iter().filter(is_suitable).collect();
        if suitable.is_empty() {
            return Err(GpuError::NoSuitableDevice);
        }

        info!(
            "devices found: {}",
            suitable
                .iter()
                .map(|a| AdapterSummary::of(a).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let adapter = suitable.swap_remove(0);
        let adapter_info = AdapterSummary::of(&adapter);

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("vnlm"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits_for_profile(profile),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(GpuError::DeviceRequest)?;

        let workgroup_size = WorkgroupSize::for_profile(profile);
        debug!(adapter = %adapter_info, %profile, workgroup = %workgroup_size, "device acquired");

        Ok(GpuDevice {
            device,
            queue,
            profile,
            adapter_info,
            workgroup_size,
            _instance: instance,
        })
    }

    /// Workgroups needed to cover a frame of `frame_w × frame_h`.
    pub fn dispatch_size(&self, frame_w: u32, frame_h: u32) -> (u32, u32) {
        self.workgroup_size.dispatch_size(frame_w, frame_h)
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ adapter: {}, profile: {}, workgroup: {} }}",
            self.adapter_info, self.profile, self.workgroup_size
        )
    }
}

/// Every suitable device on `backends`, in selection order.
///
/// Does not create a device; useful for listing hardware to a user.
pub fn available_devices(backends: wgpu::Backends) -> Vec<AdapterSummary> {
    let instance = create_instance(backends);
    instance
        .enumerate_adapters(backends)
        .into_iter()
        .filter(is_suitable)
        .map(|a| AdapterSummary::of(&a))
        .collect()
}

fn create_instance(backends: wgpu::Backends) -> wgpu::Instance {
    // Validation layer in debug builds for kernel error feedback.
    // Non-compliant adapters are enumerated so translation layers show up.
    let flags = if cfg!(debug_assertions) {
        wgpu::InstanceFlags::VALIDATION | wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
    } else {
        wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
    };
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        flags,
        ..Default::default()
    })
}

/// GPU-class and able to run compute shaders.
fn is_suitable(adapter: &wgpu::Adapter) -> bool {
    let summary = AdapterSummary::of(adapter);
    let gpu_class = is_gpu_class(summary.device_type);
    let compute = adapter
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);
    debug!(adapter = %summary, gpu_class, compute, "candidate adapter");
    gpu_class && compute
}

fn is_gpu_class(device_type: wgpu::DeviceType) -> bool {
    matches!(
        device_type,
        wgpu::DeviceType::DiscreteGpu
            | wgpu::DeviceType::IntegratedGpu
            | wgpu::DeviceType::VirtualGpu
            | wgpu::DeviceType::Other
    )
}

// ============================================================
// Limits helpers
// ============================================================

/// Limits requested from the driver for `profile`.
///
/// `Constrained` stays below `wgpu::Limits::default()` on every field it
/// touches, so any adapter that supports the defaults can grant it.
pub fn limits_for_profile(profile: DeviceProfile) -> wgpu::Limits {
    match profile {
        DeviceProfile::Native => wgpu::Limits::default(),
        DeviceProfile::Constrained => wgpu::Limits {
            max_compute_invocations_per_workgroup: 64,
            max_compute_workgroup_size_x: 64,
            max_compute_workgroup_size_y: 64,
            max_compute_workgroup_size_z: 1,
            max_storage_buffer_binding_size: 32 << 20,
            ..wgpu::Limits::default()
        },
    }
}

// ============================================================
// Error type
// ============================================================

/// Errors from device acquisition, kernel compilation and kernel execution.
#[derive(Error, Debug)]
pub enum GpuError {
    /// No adapter on any enabled backend.
    #[error("no compute platform found (no adapters on the enabled backends)")]
    NoPlatform,

    /// Adapters exist but none is a compute-capable GPU.
    #[error("no compute device of the required type found (only CPU/software adapters visible)")]
    NoSuitableDevice,

    #[error("device request failed: {0}")]
    DeviceRequest(#[source] wgpu::RequestDeviceError),

    #[error("failed to read kernel source {path}: {source}")]
    KernelSource {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The kernel did not compile or the entry point could not be bound.
    #[error("kernel compilation failed:\n{log}")]
    Compilation { log: String },

    /// Any device-side failure while allocating, binding or launching.
    #[error("device error: {0}")]
    Runtime(#[source] wgpu::Error),

    #[error("accumulator read-back failed: {0}")]
    Readback(#[source] wgpu::BufferAsyncError),

    #[error("accumulator read-back never completed")]
    ReadbackIncomplete,

    #[error("buffer of {size} bytes exceeds the device limit of {max} bytes")]
    BufferTooLarge { size: u64, max: u64 },
}

// ============================================================
// Tests
// ============================================================
