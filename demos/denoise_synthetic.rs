// demos/denoise_synthetic.rs — Denoise one frame of a synthetic noisy clip.
//
//   RUST_LOG=vnlm=debug cargo run --release --example denoise_synthetic
//
// Builds a short clip of a drifting checkerboard, adds deterministic noise,
// denoises the middle frame using its temporal neighbors and prints the PSNR
// before and after against the clean frame.

use tracing_subscriber::EnvFilter;

use vnlm::{Frame, FrameSequence, NlmDenoiser, NlmParams, Rgb};

const WIDTH: usize = 256;
const HEIGHT: usize = 192;
const CLIP_LEN: usize = 7;
const NOISE_SIGMA: f32 = 0.08;

/// xorshift32; enough for reproducible noise without pulling in a crate.
struct Noise(u32);

impl Noise {
    fn next_unit(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0 as f32 / u32::MAX as f32
    }

    /// Approximately normal: sum of four uniforms, rescaled to unit variance.
    fn next_gaussian(&mut self) -> f32 {
        let s: f32 = (0..4).map(|_| self.next_unit()).sum();
        (s - 2.0) * 3.0f32.sqrt()
    }
}

fn clean_frame(t: usize) -> Frame<Rgb> {
    let mut f = Frame::new(WIDTH, HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let on = ((x + t) / 24 + y / 24) % 2 == 0;
            let c = if on { Rgb::new(0.8, 0.7, 0.3) } else { Rgb::new(0.2, 0.3, 0.6) };
            f.set(x, y, c);
        }
    }
    f
}

fn add_noise(frame: &Frame<Rgb>, noise: &mut Noise) -> Frame<Rgb> {
    let mut out = frame.clone();
    for c in out.as_mut_slice() {
        c.r += NOISE_SIGMA * noise.next_gaussian();
        c.g += NOISE_SIGMA * noise.next_gaussian();
        c.b += NOISE_SIGMA * noise.next_gaussian();
    }
    out
}

fn psnr(a: &Frame<Rgb>, b: &Frame<Rgb>) -> f64 {
    let mse: f64 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(p, q)| {
            let d = [p.r - q.r, p.g - q.g, p.b - q.b];
            d.iter().map(|v| (*v as f64).powi(2)).sum::<f64>()
        })
        .sum::<f64>()
        / (a.as_slice().len() * 3) as f64;
    10.0 * (1.0 / mse).log10()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    for adapter in vnlm::gpu::device::available_devices(wgpu::Backends::PRIMARY) {
        println!("adapter: {adapter}");
    }

    let mut noise = Noise(0x9E37_79B9);
    let clean: Vec<Frame<Rgb>> = (0..CLIP_LEN).map(clean_frame).collect();
    let noisy: Vec<Frame<Rgb>> = clean.iter().map(|f| add_noise(f, &mut noise)).collect();

    let center = CLIP_LEN / 2;
    let sequence = FrameSequence::from_window(&noisy, center, 2);
    let params = NlmParams::new(2, 5, NOISE_SIGMA, 0.35);

    let denoiser = NlmDenoiser::default();
    let mut result = Frame::new(WIDTH, HEIGHT);
    denoiser.denoise(&sequence, &mut result, &params)?;

    println!("frames in window: {}", sequence.len());
    println!("PSNR noisy:    {:.2} dB", psnr(&noisy[center], &clean[center]));
    println!("PSNR denoised: {:.2} dB", psnr(&result, &clean[center]));
    Ok(())
}
