// gpu/dispatch.rs — Per-frame kernel launches into one shared accumulator.
//
// PROTOCOL
// ────────
//   1. Upload the padded center frame and allocate the accumulator
//      (unpadded size, 16 bytes per pixel), cleared to zero.
//   2. For every frame of the sequence, center included:
//        upload its padded buffer → bind (center, neighbor, accumulator,
//        args) → launch one work-item per output pixel → submit.
//      The neighbor buffer is dropped right after submission; wgpu keeps it
//      alive until the launch that reads it has finished.
//   3. Copy the accumulator into a mappable buffer and block until it is
//      readable on the host.
//
// ORDERING
// ────────
// Everything goes through one queue, and wgpu executes submissions in order,
// so launch k+1 sees the accumulator as launch k left it and the read-back
// sees all of them. Each work-item only writes its own slot, so the sum per
// pixel is always taken in frame order: repeated runs are bit-identical.
//
// ERRORS
// ──────
// wgpu reports device errors asynchronously through error scopes rather than
// return values. The whole upload/launch sequence runs inside an
// out-of-memory scope and a validation scope; both are popped before the
// read-back is mapped, and any captured error aborts the invocation.

use tracing::{error, trace};
use wgpu::util::DeviceExt;

use crate::border::PaddedBuffer;
use crate::convert::{AccumTexel, GpuColor};
use crate::frame::FrameSize;
use crate::gpu::device::GpuError;
use crate::gpu::session::NlmSession;
use crate::params::NlmParams;

// ---------------------------------------------------------------------------
// Uniform args (must match WGSL struct NlmArgs exactly)
// ---------------------------------------------------------------------------

/// Scalar kernel arguments.
///
/// Layout must match `NlmArgs` in `nlm_video.wgsl`:
///   offset  0: search_window_radius (i32)
///   offset  4: patch_radius         (i32)
///   offset  8: frame_size           (vec2<i32>)
///   offset 16: sigma                (f32)
///   offset 20: h                    (f32)
///   offset 24: _pad                 (2 × f32, uniform blocks are 16-byte multiples)
///   total:  32 bytes
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct NlmArgs {
    search_window_radius: i32,
    patch_radius: i32,
    frame_size: [i32; 2],
    sigma: f32,
    h: f32,
    _pad: [f32; 2],
}

impl NlmArgs {
    fn new(params: &NlmParams, frame_size: FrameSize) -> Self {
        NlmArgs {
            search_window_radius: params.search_window_radius as i32,
            patch_radius: params.patch_radius as i32,
            frame_size: [frame_size.size_x as i32, frame_size.size_y as i32],
            sigma: params.standard_deviation_of_noise,
            h: params.filtering_parameter,
            _pad: [0.0; 2],
        }
    }
}

// ---------------------------------------------------------------------------
// Resource limits
// ---------------------------------------------------------------------------

fn accumulator_bytes(frame_size: FrameSize) -> u64 {
    (frame_size.pixel_count() * std::mem::size_of::<AccumTexel>()) as u64
}

/// Fail before allocating if a padded frame or the accumulator would not fit
/// in one storage binding under `limits`.
pub fn check_buffer_sizes(
    padded_size: FrameSize,
    frame_size: FrameSize,
    limits: &wgpu::Limits,
) -> Result<(), GpuError> {
    let padded_bytes = (padded_size.pixel_count() * std::mem::size_of::<GpuColor>()) as u64;
    let max = limits.max_storage_buffer_binding_size as u64;
    for size in [padded_bytes, accumulator_bytes(frame_size)] {
        if size > max {
            return Err(GpuError::BufferTooLarge { size, max });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dispatch loop
// ---------------------------------------------------------------------------

/// Launch the kernel once per frame in `frames` and return the accumulator.
///
/// `center` is the padded center frame; `frames` is the padded sequence in
/// order (it contains the center frame too). `frame_size` is the *unpadded*
/// size, which is also the launch size and the accumulator size.
///
/// Blocks until the accumulator is readable on the host.
pub fn accumulate(
    session: &NlmSession,
    center: &PaddedBuffer,
    frames: &[PaddedBuffer],
    frame_size: FrameSize,
    params: &NlmParams,
) -> Result<Vec<AccumTexel>, GpuError> {
    debug_assert_eq!(center.size(), frame_size.padded(params.patch_radius as usize));
    debug_assert!(frames.iter().all(|f| f.size() == center.size()));

    let gpu = session.gpu();
    let kernel = session.kernel();

    let accum_bytes = accumulator_bytes(frame_size);
    check_buffer_sizes(center.size(), frame_size, &gpu.device.limits())?;

    gpu.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

    let center_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("nlm center frame"),
        contents: center.as_bytes(),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let accum_buf = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nlm accumulator"),
        size: accum_bytes,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let args = NlmArgs::new(params, frame_size);
    let args_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("nlm args"),
        contents: bytemuck::bytes_of(&args),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    // The accumulator must start at zero before the first launch.
    let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nlm accumulator clear"),
    });
    encoder.clear_buffer(&accum_buf, 0, None);
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let (wg_x, wg_y) = gpu.dispatch_size(frame_size.size_x as u32, frame_size.size_y as u32);

    for (frame_ix, frame) in frames.iter().enumerate() {
        let neighbor_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nlm neighbor frame"),
            contents: frame.as_bytes(),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nlm frame bind group"),
            layout: &kernel.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: center_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: neighbor_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: accum_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: args_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("nlm frame launch"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel.entry_point()),
                timestamp_writes: None,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        trace!(frame_ix, texels = frame.len(), "frame launched");
    }

    let readback_buf = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nlm accumulator readback"),
        size: accum_bytes,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nlm accumulator readback"),
    });
    encoder.copy_buffer_to_buffer(&accum_buf, 0, &readback_buf, 0, accum_bytes);
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let validation = pollster::block_on(gpu.device.pop_error_scope());
    let oom = pollster::block_on(gpu.device.pop_error_scope());
    if let Some(err) = validation.or(oom) {
        error!("device error during dispatch: {err}");
        return Err(GpuError::Runtime(err));
    }

    read_accumulator(session, &readback_buf)
}

/// Map `readback_buf` and copy it out, blocking until the GPU is done.
fn read_accumulator(
    session: &NlmSession,
    readback_buf: &wgpu::Buffer,
) -> Result<Vec<AccumTexel>, GpuError> {
    let gpu = session.gpu();
    let slice = readback_buf.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        // The receiver only disappears if this function already returned.
        let _ = tx.send(r);
    });
    gpu.device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("accumulator read-back failed: {e}");
            return Err(GpuError::Readback(e));
        }
        Err(_) => return Err(GpuError::ReadbackIncomplete),
    }

    let mapped = slice.get_mapped_range();
    let accum = bytemuck::cast_slice::<u8, AccumTexel>(&mapped).to_vec();
    drop(mapped);
    readback_buf.unmap();
    Ok(accum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DenoiseConfig;
    use crate::frame::{Frame, Rgb};
    use crate::gpu::device::{limits_for_profile, DeviceProfile};
    use crate::gpu::run_gpu_test_in_subprocess;
    use crate::sequence::FrameSequence;
    use crate::transform::transform_sequence;

    #[test]
    fn test_args_layout() {
        assert_eq!(std::mem::size_of::<NlmArgs>(), 32);
        let args = NlmArgs::new(&NlmParams::new(2, 5, 0.1, 0.3), FrameSize::new(64, 48));
        let words: &[i32] = bytemuck::cast_slice(std::slice::from_ref(&args));
        assert_eq!(&words[..4], &[5, 2, 64, 48]);
        assert_eq!(args.sigma, 0.1);
        assert_eq!(args.h, 0.3);
    }

    #[test]
    fn test_buffer_sizes_within_native_limits() {
        // 2560×1440: 59 MB accumulator, under the 128 MiB default.
        let frame = FrameSize::new(2560, 1440);
        let limits = limits_for_profile(DeviceProfile::Native);
        assert!(check_buffer_sizes(frame.padded(3), frame, &limits).is_ok());
    }

    #[test]
    fn test_constrained_profile_rejects_large_frames() {
        let frame = FrameSize::new(2560, 1440);
        let limits = limits_for_profile(DeviceProfile::Constrained);
        let err = check_buffer_sizes(frame.padded(3), frame, &limits).unwrap_err();
        match err {
            GpuError::BufferTooLarge { size, max } => {
                assert_eq!(max, 32 << 20);
                assert!(size > max);
            }
            other => panic!("expected BufferTooLarge, got {other}"),
        }
        // 640×480 fits either way.
        let small = FrameSize::new(640, 480);
        assert!(check_buffer_sizes(small.padded(3), small, &limits).is_ok());
    }

    fn run(seq: &FrameSequence<Rgb>, params: &NlmParams) -> Vec<AccumTexel> {
        let session = NlmSession::open(&DenoiseConfig::default()).expect("need GPU");
        let padded = transform_sequence(seq, params.patch_radius as usize);
        accumulate(&session, &padded[seq.center_index()], &padded, seq.frame_size(), params)
            .expect("dispatch should succeed")
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_weights_positive_and_bounded() {
        let frames: Vec<Frame<Rgb>> = (0..3)
            .map(|i| {
                let mut f = Frame::new(19, 13);
                for y in 0..13 {
                    for x in 0..19 {
                        f.set(x, y, Rgb::gray(((x * 3 + y * 5 + i) % 11) as f32 / 10.0));
                    }
                }
                f
            })
            .collect();
        let seq = FrameSequence::new(frames, 1);
        let params = NlmParams::new(1, 2, 0.0, 0.3);
        let accum = run(&seq, &params);

        assert_eq!(accum.len(), 19 * 13);
        // (2s+1)² candidates per frame, each weight in (0, 1].
        let max_weight = 3.0 * 25.0;
        for t in &accum {
            assert!(t.weight > 0.0 && t.weight <= max_weight + 1e-3, "weight {}", t.weight);
        }
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_repeated_dispatch_is_bit_identical() {
        let mut rng = 12345u32;
        let pixels: Vec<Rgb> = (0..32 * 24)
            .map(|_| {
                rng = rng.wrapping_mul(1664525).wrapping_add(1013904223);
                Rgb::gray((rng >> 8) as f32 / (1u32 << 24) as f32)
            })
            .collect();
        let f = Frame::from_vec(32, 24, pixels);
        let seq = FrameSequence::new(vec![f.clone(), f.clone(), f], 1);
        let params = NlmParams::new(2, 3, 0.05, 0.2);
        assert_eq!(run(&seq, &params), run(&seq, &params));
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "requires a real GPU"]
    fn test_weights_positive_and_bounded() {
        let out =
            run_gpu_test_in_subprocess("gpu::dispatch::tests::inner_weights_positive_and_bounded");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a real GPU"]
    fn test_repeated_dispatch_is_bit_identical() {
        let out = run_gpu_test_in_subprocess(
            "gpu::dispatch::tests::inner_repeated_dispatch_is_bit_identical",
        );
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }
}
