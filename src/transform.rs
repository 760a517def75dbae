// transform.rs — Pad every frame of a sequence for upload.

use crate::border::{extend_frame, PaddedBuffer};
use crate::frame::ComputableColor;
use crate::sequence::FrameSequence;

/// One padded buffer per frame, in sequence order.
///
/// Index `i` of the result is frame `i` of `sequence`, so the sequence's
/// center index addresses the padded center frame as well.
pub fn transform_sequence<C: ComputableColor>(
    sequence: &FrameSequence<C>,
    patch_radius: usize,
) -> Vec<PaddedBuffer> {
    sequence
        .frames()
        .iter()
        .map(|frame| extend_frame(frame, patch_radius))
        .collect()
}
