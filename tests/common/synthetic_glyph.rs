use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Draws a rough capital "A" (two slanted strokes and a crossbar) on a white
/// square canvas with a generous white margin.
pub fn letter_a(size: u32) -> RgbImage {
    assert!(size >= 40, "canvas too small for the glyph");
    let mut img = RgbImage::from_pixel(size, size, WHITE);
    let top = size / 10;
    let bottom = size - size / 10;
    let mid = size / 2;
    let stroke = (size / 20).max(2);

    for y in top..bottom {
        let spread = (y - top) / 2;
        for dx in 0..stroke {
            img.put_pixel(mid - spread + dx, y, BLACK);
            img.put_pixel(mid + spread - dx, y, BLACK);
        }
    }

    let bar_y = top + (bottom - top) * 2 / 3;
    let spread = (bar_y - top) / 2;
    for y in bar_y..bar_y + stroke {
        for x in mid - spread..=mid + spread {
            img.put_pixel(x, y, BLACK);
        }
    }
    img
}

/// Solid black rectangle `[x0, x1) × [y0, y1)` on a white canvas.
pub fn block(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, BLACK);
        }
    }
    img
}

pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Save `img` as `dir/name` (format from the extension) and return the path.
pub fn write(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("failed to write synthetic glyph");
    path
}

/// Save `img` as `dir/name` in an explicit format, whatever the name says.
pub fn write_as(dir: &Path, name: &str, img: &RgbImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, format)
        .expect("failed to write synthetic glyph");
    path
}
