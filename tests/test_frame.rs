// tests/test_frame.rs — Frame and FrameSequence public API.

use vnlm::{ComputableColor, Frame, FrameSequence, FrameSize, InputError, Rgb};

#[test]
fn frame_filled_and_size() {
    let f = Frame::filled(5, 4, Rgb::gray(0.25));
    assert_eq!(f.size(), FrameSize::new(5, 4));
    assert_eq!(f.size().pixel_count(), 20);
    assert!(f.pixels().all(|(_, _, c)| c == Rgb::gray(0.25)));
}

#[test]
fn frame_rows_are_row_major() {
    let f = Frame::from_vec(3, 2, (0..6).map(|i| Rgb::gray(i as f32)).collect());
    assert_eq!(f.row(0).iter().map(|c| c.r).collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
    assert_eq!(f.row(1).iter().map(|c| c.r).collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
}

#[test]
#[should_panic(expected = "data length")]
fn frame_from_vec_wrong_length_panics() {
    let _ = Frame::from_vec(3, 3, vec![Rgb::default(); 8]);
}

#[test]
fn rgb_channel_round_trip() {
    let c = Rgb::new(0.1, 0.5, 0.9);
    assert_eq!(Rgb::from_channels(c.channels()), c);
}

#[test]
fn rgb8_normalizes_to_unit_range() {
    let f = Frame::from_rgb8(2, 1, &[0, 0, 0, 255, 255, 255]);
    assert_eq!(f.get(0, 0), Rgb::gray(0.0));
    assert_eq!(f.get(1, 0), Rgb::gray(1.0));
}

#[test]
fn to_rgb8_clamps_out_of_range() {
    let f = Frame::from_vec(2, 1, vec![Rgb::gray(-0.5), Rgb::gray(1.5)]);
    assert_eq!(f.to_rgb8(), vec![0, 0, 0, 255, 255, 255]);
}

#[test]
fn sequence_single_frame() {
    let seq = FrameSequence::single(Frame::filled(4, 4, Rgb::gray(0.3)));
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.center_index(), 0);
    assert_eq!(seq.verify(), Ok(()));
}

#[test]
fn sequence_rejects_zero_area_frames() {
    let seq: FrameSequence<Rgb> = FrameSequence::new(vec![Frame::new(0, 4)], 0);
    assert!(matches!(seq.verify(), Err(InputError::ZeroFrameSize(_))));
}

#[test]
fn window_larger_than_clip_takes_whole_clip() {
    let clip: Vec<Frame<Rgb>> = (0..3).map(|i| Frame::filled(2, 2, Rgb::gray(i as f32))).collect();
    let seq = FrameSequence::from_window(&clip, 1, 10);
    assert_eq!(seq.len(), 3);
    assert_eq!(seq.center_index(), 1);
    assert_eq!(seq.frames(), &clip[..]);
}
