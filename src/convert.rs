// convert.rs — Host <-> device texel conversions.
//
// The kernel reads frames as `array<vec4<f32>>` and accumulates into
// `array<vec4<f32>>`. A WGSL `vec3<f32>` inside a storage array is padded to
// 16 bytes anyway, so a three-channel color travels as four floats with the
// last one unused. The accumulator uses all four: weighted RGB sum + weight.
//
//   GpuColor    [ r | g | b | 0 ]         16 bytes
//   AccumTexel  [ Σw·r | Σw·g | Σw·b | Σw ]  16 bytes

use crate::frame::ComputableColor;

/// One padded-buffer texel as the kernel sees it.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuColor {
    pub rgb: [f32; 3],
    pub _pad: f32,
}

impl GpuColor {
    #[inline]
    pub fn from_color<C: ComputableColor>(c: C) -> Self {
        GpuColor {
            rgb: c.channels(),
            _pad: 0.0,
        }
    }
}

/// One accumulator slot: weighted color sum and total weight.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AccumTexel {
    pub weighted_sum: [f32; 3],
    pub weight: f32,
}

impl AccumTexel {
    /// `weighted_sum / weight` as a color.
    ///
    /// The weight must be positive; the center frame always contributes its
    /// own self-similarity, so a zero here means the kernel misbehaved.
    #[inline]
    pub fn normalized<C: ComputableColor>(&self) -> C {
        debug_assert!(
            self.weight > 0.0,
            "accumulated weight must be positive (got {})",
            self.weight
        );
        let inv = 1.0 / self.weight;
        C::from_channels([
            self.weighted_sum[0] * inv,
            self.weighted_sum[1] * inv,
            self.weighted_sum[2] * inv,
        ])
    }
}
