// gpu/mod.rs — GPU dispatch layer.
//
// The host prepares data (mirror-padded frames, see border.rs), the device
// does all per-pixel work. Everything device-side lives for exactly one
// denoise call:
//
//   NlmSession::open       acquire device → load + compile kernel
//   dispatch::accumulate   upload center → per frame: upload, bind, launch
//                          → blocking read-back of the accumulator
//   (drop NlmSession)      buffers, pipeline, queue, device, instance
//
// The kernel source lives in src/shaders/nlm_video.wgsl.

pub mod device;
pub mod dispatch;
pub mod kernel;
pub mod session;

/// Run one `#[ignore]`d GPU test in a child `cargo test` and return its output.
///
/// Some Vulkan layers (dzn on WSL2 in particular) crash during process exit
/// once a device has been created. The child prints "GPU_TEST_OK" when its
/// assertions pass; callers check for that token, not the exit status.
#[cfg(test)]
pub(crate) fn run_gpu_test_in_subprocess(test_name: &str) -> String {
    let output = std::process::Command::new("cargo")
        .args(["test", "--lib", "--", test_name, "--exact", "--ignored", "--nocapture"])
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn subprocess for {test_name}: {e}"));
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    print!("{stdout}");
    eprint!("{stderr}");
    stdout + &stderr
}
