//! Test-pattern rasterization and BMP encoding
//!
//! Frames are drawn into a top-down RGB8 buffer and encoded as an
//! uncompressed 24-bit BMP. BMP stores rows bottom-up in BGR order with
//! each row padded to a 4-byte boundary.

use bytes::{BufMut, Bytes, BytesMut};

/// Background fill (light blue, matching the classic test card)
const BACKGROUND: [u8; 3] = [173, 216, 230];
/// Rectangle outline color
const RECT_COLOR: [u8; 3] = [255, 0, 0];
/// Ellipse outline color
const ELLIPSE_COLOR: [u8; 3] = [0, 128, 0];
/// Sweep bar color
const BAR_COLOR: [u8; 3] = [25, 25, 112];

/// Rectangle outline thickness in pixels
const RECT_OUTLINE: u32 = 3;
/// Sweep bar width in pixels
const BAR_WIDTH: u32 = 8;

/// BMP file header (14) + BITMAPINFOHEADER (40)
pub(crate) const BMP_HEADER_SIZE: u32 = 54;

/// Render the test pattern for one frame into a top-down RGB8 buffer
///
/// The sweep bar position is derived from `seq`, so successive frames
/// are visually distinct.
pub(crate) fn render_test_pattern(width: u32, height: u32, seq: u64) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut pixels = Vec::with_capacity(w * h * 3);
    for _ in 0..(w * h) {
        pixels.extend_from_slice(&BACKGROUND);
    }

    let mut set_px = |x: u32, y: u32, rgb: [u8; 3]| {
        if x < width && y < height {
            let i = (y as usize * w + x as usize) * 3;
            pixels[i..i + 3].copy_from_slice(&rgb);
        }
    };

    // Sweep bar: advances one bar-width per frame, wraps at the right edge
    let bar_x = ((seq as u32).wrapping_mul(BAR_WIDTH)) % width.max(1);
    for dx in 0..BAR_WIDTH {
        for y in 0..height {
            set_px(bar_x + dx, y, BAR_COLOR);
        }
    }

    // Rectangle outline in the lower half
    let (rx0, ry0) = (width / 8, height / 2);
    let (rx1, ry1) = (width * 7 / 8, height * 2 / 3);
    for t in 0..RECT_OUTLINE {
        for x in rx0..=rx1 {
            set_px(x, ry0 + t, RECT_COLOR);
            set_px(x, ry1.saturating_sub(t), RECT_COLOR);
        }
        for y in ry0..=ry1 {
            set_px(rx0 + t, y, RECT_COLOR);
            set_px(rx1.saturating_sub(t), y, RECT_COLOR);
        }
    }

    // Ellipse outline overlapping the rectangle's lower edge
    let (cx, cy) = (width as f64 / 2.0, height as f64 * 2.0 / 3.0);
    let (erx, ery) = ((width as f64 / 8.0).max(1.0), (height as f64 / 12.0).max(1.0));
    for y in 0..height {
        for x in 0..width {
            let dx = (x as f64 - cx) / erx;
            let dy = (y as f64 - cy) / ery;
            let f = dx * dx + dy * dy;
            if (0.82..=1.18).contains(&f) {
                set_px(x, y, ELLIPSE_COLOR);
            }
        }
    }

    pixels
}

/// Row stride in bytes: 3 bytes per pixel, padded to a 4-byte boundary
pub(crate) fn row_stride(width: u32) -> u32 {
    (width * 3 + 3) & !3
}

/// Encode a top-down RGB8 buffer as an uncompressed 24-bit BMP
///
/// The caller guarantees `rgb.len() == width * height * 3` and non-zero
/// dimensions small enough that the size arithmetic cannot overflow.
pub(crate) fn encode_bmp(width: u32, height: u32, rgb: &[u8]) -> Bytes {
    debug_assert_eq!(rgb.len(), (width * height * 3) as usize);

    let stride = row_stride(width);
    let image_size = stride * height;
    let file_size = BMP_HEADER_SIZE + image_size;

    let mut buf = BytesMut::with_capacity(file_size as usize);

    // File header
    buf.put_slice(b"BM");
    buf.put_u32_le(file_size);
    buf.put_u16_le(0);
    buf.put_u16_le(0);
    buf.put_u32_le(BMP_HEADER_SIZE);

    // BITMAPINFOHEADER; positive height selects bottom-up row order
    buf.put_u32_le(40);
    buf.put_i32_le(width as i32);
    buf.put_i32_le(height as i32);
    buf.put_u16_le(1);
    buf.put_u16_le(24);
    buf.put_u32_le(0);
    buf.put_u32_le(image_size);
    buf.put_i32_le(2835);
    buf.put_i32_le(2835);
    buf.put_u32_le(0);
    buf.put_u32_le(0);

    let padding = (stride - width * 3) as usize;
    for y in (0..height).rev() {
        let row = (y * width * 3) as usize;
        for x in 0..width as usize {
            let i = row + x * 3;
            // RGB in memory, BGR on disk
            buf.put_u8(rgb[i + 2]);
            buf.put_u8(rgb[i + 1]);
            buf.put_u8(rgb[i]);
        }
        buf.put_bytes(0, padding);
    }

    buf.freeze()
}
