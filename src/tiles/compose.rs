//! Mosaic compositing and presentation.
//!
//! Fetched tiles are blitted into one RGBA mosaic at 256-pixel pitch,
//! optionally smooth-scaled to the panel's content area, and given rounded
//! corners. When a whole load fails the panel gets a generated placeholder
//! instead: fill color, grid lines at tile pitch and a caption, so the
//! failure is clearly labeled rather than a black hole in the UI.

use image::{Rgba, RgbaImage, imageops};

use super::projection::TILE_SIZE;

/// Corner radius applied to every published composite.
const CORNER_RADIUS: u32 = 20;

/// Placeholder palette (retro terminal green).
const FALLBACK_BG: [u8; 4] = [0, 10, 0, 255];
const FALLBACK_ACCENT: [u8; 4] = [0, 200, 70, 255];
const FALLBACK_TEXT: [u8; 4] = [210, 255, 210, 255];

const FALLBACK_CAPTION: &str = "MAP DATA UNAVAILABLE";

/// Empty mosaic for a tile grid, filled with the miss color.
pub fn blank_mosaic(tiles_wide: u32, tiles_high: u32, fill: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(tiles_wide * TILE_SIZE, tiles_high * TILE_SIZE, Rgba(fill))
}

/// Blit one tile at its grid position.
pub fn place_tile(mosaic: &mut RgbaImage, tile: &RgbaImage, grid_x: u32, grid_y: u32) {
    imageops::overlay(
        mosaic,
        tile,
        i64::from(grid_x * TILE_SIZE),
        i64::from(grid_y * TILE_SIZE),
    );
}

/// Scale to the content area (when one is set) and round the corners.
pub fn finish(mosaic: RgbaImage, content_area: Option<(u32, u32)>) -> RgbaImage {
    let mut out = match content_area {
        Some((w, h)) if w > 0 && h > 0 => {
            imageops::resize(&mosaic, w, h, imageops::FilterType::CatmullRom)
        }
        _ => mosaic,
    };
    round_corners(&mut out, CORNER_RADIUS);
    out
}

/// Placeholder published when a map load fails outright.
pub fn fallback_placeholder(
    content_area: Option<(u32, u32)>,
    tiles_wide: u32,
    tiles_high: u32,
) -> RgbaImage {
    let (width, height) = match content_area {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => (tiles_wide * TILE_SIZE, tiles_high * TILE_SIZE),
    };

    let mut img = RgbaImage::from_pixel(width, height, Rgba(FALLBACK_BG));

    // Grid lines at tile pitch hint at the missing mosaic.
    let pitch_x = width / tiles_wide.max(1);
    for i in 1..tiles_wide {
        draw_vline(&mut img, i * pitch_x, FALLBACK_ACCENT);
    }
    let pitch_y = height / tiles_high.max(1);
    for i in 1..tiles_high {
        draw_hline(&mut img, i * pitch_y, FALLBACK_ACCENT);
    }

    draw_caption_centered(&mut img, FALLBACK_CAPTION, FALLBACK_TEXT);
    round_corners(&mut img, CORNER_RADIUS);
    img
}

fn draw_vline(img: &mut RgbaImage, x: u32, color: [u8; 4]) {
    if x >= img.width() {
        return;
    }
    for y in 0..img.height() {
        img.put_pixel(x, y, Rgba(color));
    }
}

fn draw_hline(img: &mut RgbaImage, y: u32, color: [u8; 4]) {
    if y >= img.height() {
        return;
    }
    for x in 0..img.width() {
        img.put_pixel(x, y, Rgba(color));
    }
}

/// Zero out the alpha of pixels outside a rounded rectangle.
pub fn round_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let radius = radius.min(w / 2).min(h / 2);
    let r = radius as i64;

    // Corner circle centers, inset by the radius.
    let centers = [
        (r, r),
        (w as i64 - 1 - r, r),
        (r, h as i64 - 1 - r),
        (w as i64 - 1 - r, h as i64 - 1 - r),
    ];

    for y in 0..h {
        for x in 0..w {
            let xi = x as i64;
            let yi = y as i64;
            let in_corner_band = (xi < r || xi > w as i64 - 1 - r) && (yi < r || yi > h as i64 - 1 - r);
            if !in_corner_band {
                continue;
            }
            let inside = centers.iter().any(|&(cx, cy)| {
                let dx = xi - cx;
                let dy = yi - cy;
                dx * dx + dy * dy <= r * r
            });
            if !inside {
                img.get_pixel_mut(x, y).0[3] = 0;
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Caption rendering
// ----------------------------------------------------------------------------
// 5x7 bitmap glyphs, just enough coverage for the fallback caption. Each row
// is 5 bits, leftmost pixel in bit 4.

fn glyph(ch: char) -> [u8; 7] {
    match ch {
        'M' => [0b10001, 0b11011, 0b10101, 0b10001, 0b10001, 0b10001, 0b10001],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        _ => [0; 7],
    }
}

/// Draw the caption centered, scaled to the panel (6px advance per glyph).
fn draw_caption_centered(img: &mut RgbaImage, text: &str, color: [u8; 4]) {
    let (w, h) = img.dimensions();
    let cols = text.chars().count() as u32 * 6;
    let scale = (w / (cols + 8)).clamp(1, 4);

    let text_w = cols * scale;
    let text_h = 7 * scale;
    if text_w > w || text_h > h {
        return;
    }
    let origin_x = (w - text_w) / 2;
    let origin_y = (h - text_h) / 2;

    for (index, ch) in text.chars().enumerate() {
        let rows = glyph(ch);
        let base_x = origin_x + index as u32 * 6 * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (1 << (4 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = base_x + col * scale + dx;
                        let py = origin_y + row as u32 * scale + dy;
                        if px < w && py < h {
                            img.put_pixel(px, py, Rgba(color));
                        }
                    }
                }
            }
        }
    }
}
