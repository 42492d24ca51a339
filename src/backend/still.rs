use image::RgbaImage;

use super::render_take::encode_jpeg;

pub const STILL_JPEG_QUALITY: u8 = 95;

/// Landscape when the stream is wider than it is tall.
pub fn is_landscape(width: u32, height: u32) -> bool {
    height > 0 && width as f32 / height as f32 > 1.0
}

/// Turns a full-resolution camera frame into a stored photo.
///
/// The preview is shown mirrored, so the still is flipped the same way to
/// match what the subject saw.
pub fn encode_still(mut frame: RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    image::imageops::flip_horizontal_in_place(&mut frame);
    encode_jpeg(&frame, STILL_JPEG_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_from_stream_size() {
        assert!(is_landscape(1920, 1080));
        assert!(!is_landscape(1080, 1920));
        assert!(!is_landscape(720, 720));
        assert!(!is_landscape(0, 0));
    }

    #[test]
    fn stills_are_mirrored() {
        let mut frame = RgbaImage::from_pixel(64, 32, image::Rgba([0, 0, 255, 255]));
        for y in 0..32 {
            for x in 0..16 {
                frame.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
            }
        }

        let encoded = encode_still(frame).unwrap();
        let decoded = image::load_from_memory(&encoded).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 32));
        // red started on the left, so it must now be on the right
        let right = decoded.get_pixel(60, 16).0;
        let left = decoded.get_pixel(3, 16).0;
        assert!(right[0] > 200 && right[2] < 60, "{right:?}");
        assert!(left[2] > 200 && left[0] < 60, "{left:?}");
    }
}
