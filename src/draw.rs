//! Minimal raster helpers for diagnostic and placeholder frames.
//!
//! Text is drawn with a built-in 5x7 bitmap font at a 6 pixel advance,
//! uppercased; characters without a glyph advance silently.

use image::{Rgb, RgbImage};

/// Glyph cell width including inter-character spacing.
pub(crate) const CHAR_ADVANCE: u32 = 6;

/// Glyph height in pixels.
pub(crate) const CHAR_HEIGHT: u32 = 7;

/// Fill the whole image with one color.
pub(crate) fn fill(image: &mut RgbImage, color: Rgb<u8>) {
    for pixel in image.pixels_mut() {
        *pixel = color;
    }
}

/// Pixel width of a rendered string.
pub(crate) fn text_width(text: &str) -> u32 {
    let count = text.chars().flat_map(char::to_uppercase).count();
    u32::try_from(count).unwrap_or(u32::MAX).saturating_mul(CHAR_ADVANCE)
}

/// Draw `text` with its top-left corner at (x, y). Clips at image edges.
pub(crate) fn draw_text(image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let width = i64::from(image.width());
    let height = i64::from(image.height());
    let mut cursor = i64::from(x);

    for ch in text.chars().flat_map(char::to_uppercase) {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                let py = i64::from(y) + row as i64;
                if py < 0 || py >= height {
                    continue;
                }
                for col in 0..5u8 {
                    if (pattern >> (4 - col)) & 1 == 1 {
                        let px = cursor + i64::from(col);
                        if px >= 0 && px < width {
                            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
        cursor += i64::from(CHAR_ADVANCE);
    }
}

/// Draw `text` horizontally centered at vertical position `y`.
pub(crate) fn draw_text_centered(image: &mut RgbImage, y: i32, text: &str, color: Rgb<u8>) {
    let x = (i64::from(image.width()) - i64::from(text_width(text))) / 2;
    #[allow(clippy::cast_possible_truncation)]
    draw_text(image, x as i32, y, text, color);
}

#[allow(clippy::too_many_lines)]
const fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    match ch {
        'A' => Some([0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'B' => Some([0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        'C' => Some([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'D' => Some([0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
        'E' => Some([0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111]),
        'F' => Some([0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000]),
        'G' => Some([0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
        'H' => Some([0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'I' => Some([0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        'J' => Some([0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
        'K' => Some([0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'L' => Some([0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => Some([0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        'N' => Some([0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001]),
        'O' => Some([0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'P' => Some([0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        'Q' => Some([0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
        'R' => Some([0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => Some([0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110]),
        'T' => Some([0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => Some([0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'V' => Some([0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
        'W' => Some([0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001]),
        'X' => Some([0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b01010, 0b10001]),
        'Y' => Some([0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        'Z' => Some([0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
        '0' => Some([0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => Some([0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => Some([0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => Some([0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110]),
        '4' => Some([0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => Some([0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => Some([0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => Some([0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => Some([0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => Some([0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        ':' => Some([0b00000, 0b00110, 0b00110, 0b00000, 0b00110, 0b00110, 0b00000]),
        '-' => Some([0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
        '.' => Some([0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110]),
        ',' => Some([0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00100, 0b01000]),
        '(' => Some([0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010]),
        ')' => Some([0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000]),
        '/' => Some([0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000]),
        '%' => Some([0b10001, 0b10010, 0b00100, 0b01000, 0b10010, 0b10001, 0b00000]),
        '\'' => Some([0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000]),
        '_' => Some([0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111]),
        ' ' => Some([0, 0, 0, 0, 0, 0, 0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("OFF"), 18);
    }

    #[test]
    fn test_draw_text_marks_pixels() {
        let mut image = RgbImage::new(64, 16);
        draw_text(&mut image, 2, 2, "OFF", Rgb([255, 255, 255]));
        let lit = image.pixels().filter(|p| p.0 == [255, 255, 255]).count();
        assert!(lit > 0, "some pixels should be lit");
    }

    #[test]
    fn test_draw_text_clips_at_edges() {
        let mut image = RgbImage::new(8, 8);
        // Must not panic even though the text overruns the image
        draw_text(&mut image, -3, -2, "CAMERA 1 (A) IS OFF", Rgb([255, 0, 0]));
        draw_text(&mut image, 6, 6, "OVERRUN", Rgb([255, 0, 0]));
    }

    #[test]
    fn test_glyph_coverage_for_status_messages() {
        let message = "CAMERA 1 (FLOOR_2) IS OFF AT 2024-01-02 03:04:05";
        for ch in message.chars() {
            assert!(glyph_bits(ch).is_some(), "missing glyph for {ch:?}");
        }
    }

    #[test]
    fn test_centered_text_fits_symmetrically() {
        let mut image = RgbImage::new(100, 10);
        draw_text_centered(&mut image, 1, "ON", Rgb([255, 255, 255]));
        // Leftmost lit pixel should be in the middle region
        let min_x = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [255, 255, 255])
            .map(|(x, _, _)| x)
            .min()
            .expect("text should light pixels");
        assert!(min_x > 30 && min_x < 60);
    }
}
