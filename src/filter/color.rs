//! Luminance conversion.

use crate::image::Frame;
use crate::util::math::{luma, round_u8};

/// Rec.601 luminance of an 8-bit RGB triple.
pub fn luminance(px: [u8; 3]) -> u8 {
    round_u8(luma(px[0] as f32, px[1] as f32, px[2] as f32))
}

/// Converts a frame to luminance replicated across all three channels.
pub fn grayscale_frame(frame: &Frame) -> Frame {
    Frame::from_fn(frame.width(), frame.height(), |x, y| {
        let l = luminance(frame.pixel(x, y));
        [l, l, l]
    })
}

#[cfg(test)]
mod tests {
    use super::{grayscale_frame, luminance};
    use crate::image::Frame;

    #[test]
    fn luminance_weights_green_most() {
        assert_eq!(luminance([0, 0, 0]), 0);
        assert_eq!(luminance([255, 255, 255]), 255);
        assert!(luminance([0, 255, 0]) > luminance([255, 0, 0]));
        assert!(luminance([255, 0, 0]) > luminance([0, 0, 255]));
    }

    #[test]
    fn grayscale_replicates_channels() {
        let frame = Frame::from_fn(3, 2, |x, y| [(x * 80) as u8, (y * 100) as u8, 50]);
        let gray = grayscale_frame(&frame);
        for y in 0..2 {
            for x in 0..3 {
                let [r, g, b] = gray.pixel(x, y);
                assert_eq!(r, g);
                assert_eq!(g, b);
                assert_eq!(r, luminance(frame.pixel(x, y)));
            }
        }
    }
}
