// gpu/kernel.rs — Kernel source loading and program compilation.
//
// The kernel is WGSL. Workgroup dimensions are not known until a device is
// acquired (they depend on the profile), and naga does not accept `override`
// expressions inside @workgroup_size(), so the source carries {{WG_X}} and
// {{WG_Y}} placeholders that are substituted before compilation.
//
// Compilation errors are collected from `ShaderModule::get_compilation_info`
// into a build log. Shader creation and pipeline creation both run inside a
// validation error scope, so a bad source or a missing entry point becomes
// `GpuError::Compilation` instead of wgpu's default panic handler.
//
// BINDINGS (kernel argument order):
//   0  center frame    array<vec4<f32>>  storage, read
//   1  neighbor frame  array<vec4<f32>>  storage, read
//   2  accumulator     array<vec4<f32>>  storage, read_write
//   3  scalar args     NlmArgs           uniform

use std::fmt::Write as _;
use std::io::BufRead;
use std::path::Path;

use tracing::{error, warn};

use crate::config::KernelSource;
use crate::gpu::device::{GpuDevice, GpuError, WorkgroupSize};

/// Kernel compiled into the crate.
pub const EMBEDDED_KERNEL: &str = include_str!("../shaders/nlm_video.wgsl");

/// Entry point of [`EMBEDDED_KERNEL`].
pub const DEFAULT_ENTRY_POINT: &str = "compute_search_window";

/// Read a kernel source file in full, one newline-terminated line at a time.
pub fn load_kernel_source(path: &Path) -> Result<String, GpuError> {
    let io_err = |source| GpuError::KernelSource {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(io_err)?;

    let mut source_code = String::new();
    for line in std::io::BufReader::new(file).lines() {
        source_code.push_str(&line.map_err(io_err)?);
        source_code.push('\n');
    }
    Ok(source_code)
}

/// Resolve a configured source to WGSL text.
pub fn resolve_source(source: &KernelSource) -> Result<String, GpuError> {
    match source {
        KernelSource::Embedded => Ok(EMBEDDED_KERNEL.to_string()),
        KernelSource::File(path) => load_kernel_source(path),
    }
}

/// Substitute the workgroup placeholders.
pub fn specialize(source: &str, workgroup: WorkgroupSize) -> String {
    source
        .replace("{{WG_X}}", &workgroup.x.to_string())
        .replace("{{WG_Y}}", &workgroup.y.to_string())
}

/// A compiled kernel ready to be bound and launched.
pub struct NlmKernel {
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) bgl: wgpu::BindGroupLayout,
    entry_point: String,
}

impl NlmKernel {
    /// Compile `source` (already specialized) and extract `entry_point`.
    pub fn build(gpu: &GpuDevice, source: &str, entry_point: &str) -> Result<Self, GpuError> {
        let module = compile_module(gpu, source)?;

        let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("NlmKernel BGL"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("NlmKernel pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        // A missing or mismatched entry point surfaces here, not in the
        // module compile above.
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(entry_point),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            let log = format!("entry point `{entry_point}`: {err}");
            error!("Compilation Failed!\n{log}");
            return Err(GpuError::Compilation { log });
        }

        Ok(NlmKernel {
            pipeline,
            bgl,
            entry_point: entry_point.to_string(),
        })
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Compile WGSL into a shader module, returning the build log on failure.
fn compile_module(gpu: &GpuDevice, source: &str) -> Result<wgpu::ShaderModule, GpuError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nlm_video.wgsl"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let info = pollster::block_on(module.get_compilation_info());
    let scope_err = pollster::block_on(gpu.device.pop_error_scope());

    let (mut log, has_errors) = build_log(&info.messages);
    if has_errors || scope_err.is_some() {
        if let Some(err) = scope_err {
            if !log.is_empty() {
                log.push('\n');
            }
            let _ = write!(log, "{err}");
        }
        error!("Compilation Failed!\n{log}");
        return Err(GpuError::Compilation { log });
    }
    if !log.is_empty() {
        warn!("kernel compiled with diagnostics:\n{log}");
    }
    Ok(module)
}

/// Format compiler messages as `line:col: severity: message`.
///
/// Returns the log and whether any message was an error.
fn build_log(messages: &[wgpu::CompilationMessage]) -> (String, bool) {
    let mut log = String::new();
    let mut has_errors = false;
    for msg in messages {
        let severity = match msg.message_type {
            wgpu::CompilationMessageType::Error => {
                has_errors = true;
                "error"
            }
            wgpu::CompilationMessageType::Warning => "warning",
            wgpu::CompilationMessageType::Info => "info",
        };
        if !log.is_empty() {
            log.push('\n');
        }
        let _ = match &msg.location {
            Some(loc) => write!(
                log,
                "{}:{}: {severity}: {}",
                loc.line_number, loc.line_position, msg.message
            ),
            None => write!(log, "{severity}: {}", msg.message),
        };
    }
    (log, has_errors)
}
