//! Tile extraction and highlight-overlay rendering (§4.3).

use std::io::Cursor;

use image::{imageops::FilterType, Rgba, RgbaImage};

use crate::error::{Result, VisionError};
use crate::geometry::{NormalizedBox, ScreenGeometry, TILE_SIDE_PX};

#[derive(Debug, Clone, Copy)]
pub struct RgbaColor(pub u8, pub u8, pub u8, pub u8);

impl RgbaColor {
    pub const RED: RgbaColor = RgbaColor(255, 0, 0, 255);

    fn to_pixel(self) -> Rgba<u8> {
        Rgba([self.0, self.1, self.2, self.3])
    }
}

/// Specifies one rectangle to highlight within a decoded screenshot: the tile
/// it was detected in and its de-normalized box.
#[derive(Debug, Clone, Copy)]
pub struct HighlightTarget {
    pub tile_index: usize,
    pub bbox: NormalizedBox,
}

/// Extracts `768x768` tiles from a decoded screenshot and renders highlight
/// overlays on it, bound to the `ScreenGeometry` that produced the tiling.
pub struct Tiler<'g> {
    geometry: &'g ScreenGeometry,
}

impl<'g> Tiler<'g> {
    pub fn new(geometry: &'g ScreenGeometry) -> Self {
        Self { geometry }
    }

    /// Decodes `png_bytes`, checks its resolution against the geometry, and
    /// returns one re-sampled `768x768` PNG per tile, in geometry order.
    pub fn tile(&self, png_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
        let image = decode_png(png_bytes)?;
        self.check_resolution(&image)?;

        self.geometry
            .starting_points
            .iter()
            .map(|&(x0, y0)| {
                let cropped = image::imageops::crop_imm(
                    &image,
                    x0 as u32,
                    y0 as u32,
                    self.geometry.tile_side,
                    self.geometry.tile_side,
                )
                .to_image();
                let resized =
                    image::imageops::resize(&cropped, TILE_SIDE_PX, TILE_SIDE_PX, FilterType::Lanczos3);
                encode_png(&resized)
            })
            .collect()
    }

    /// Renders a vignette (black at 50% opacity) outside the de-normalized
    /// rectangle for `tile_index`/`bbox`, plus a stroked border around it.
    pub fn highlight_box(
        &self,
        png_bytes: &[u8],
        tile_index: usize,
        bbox: NormalizedBox,
        color: RgbaColor,
        width: u32,
    ) -> Result<Vec<u8>> {
        let mut image = decode_png(png_bytes)?;
        self.check_resolution(&image)?;
        let rect = self
            .geometry
            .to_screen_rect(tile_index, bbox)
            .ok_or(VisionError::TileIndexOutOfRange {
                index: tile_index,
                count: self.geometry.tile_count(),
            })?;

        apply_vignette(&mut image, &[rect]);
        draw_rect_border(&mut image, rect, color, width);
        encode_png(&image)
    }

    /// Renders a vignette exposing both the start and end rectangles, plus an
    /// arrow from the start rectangle's center to the end rectangle's center.
    pub fn highlight_arrow(
        &self,
        png_bytes: &[u8],
        start: HighlightTarget,
        end: HighlightTarget,
        colors: (RgbaColor, RgbaColor),
        widths: (u32, u32),
    ) -> Result<Vec<u8>> {
        let mut image = decode_png(png_bytes)?;
        self.check_resolution(&image)?;

        let start_rect = self
            .geometry
            .to_screen_rect(start.tile_index, start.bbox)
            .ok_or(VisionError::TileIndexOutOfRange {
                index: start.tile_index,
                count: self.geometry.tile_count(),
            })?;
        let end_rect = self
            .geometry
            .to_screen_rect(end.tile_index, end.bbox)
            .ok_or(VisionError::TileIndexOutOfRange {
                index: end.tile_index,
                count: self.geometry.tile_count(),
            })?;

        apply_vignette(&mut image, &[start_rect, end_rect]);
        draw_rect_border(&mut image, start_rect, colors.0, widths.0);
        draw_rect_border(&mut image, end_rect, colors.1, widths.1);

        let start_center = rect_center(start_rect);
        let end_center = rect_center(end_rect);
        draw_arrow(&mut image, start_center, end_center, colors.1, widths.1);

        encode_png(&image)
    }

    fn check_resolution(&self, image: &RgbaImage) -> Result<()> {
        if image.width() != self.geometry.width || image.height() != self.geometry.height {
            return Err(VisionError::ResolutionMismatch {
                expected_w: self.geometry.width,
                expected_h: self.geometry.height,
                actual_w: image.width(),
                actual_h: image.height(),
            });
        }
        Ok(())
    }
}

/// Reads a PNG's native resolution without fully decoding it into an
/// `RgbaImage`, used by the Agent Loop's observe step to build the
/// `ScreenGeometry` for a freshly captured screenshot (§3 "Screen geometry").
pub fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::with_format(Cursor::new(bytes), image::ImageFormat::Png);
    reader.into_dimensions().map_err(|e| VisionError::Decode(e.to_string()))
}

fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|e| VisionError::Decode(e.to_string()))
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| VisionError::Encode(e.to_string()))?;
    Ok(buf)
}

fn rect_center((x0, y0, x1, y1): (i64, i64, i64, i64)) -> (i64, i64) {
    ((x0 + x1) / 2, (y0 + y1) / 2)
}

/// Darkens every pixel outside the union of `rects` to 50% opacity black.
fn apply_vignette(image: &mut RgbaImage, rects: &[(i64, i64, i64, i64)]) {
    let (w, h) = image.dimensions();
    for y in 0..h {
        for x in 0..w {
            let inside = rects.iter().any(|&(x0, y0, x1, y1)| {
                let (px, py) = (x as i64, y as i64);
                px >= x0 && px < x1 && py >= y0 && py < y1
            });
            if inside {
                continue;
            }
            let pixel = image.get_pixel_mut(x, y);
            for channel in pixel.0.iter_mut().take(3) {
                *channel = (*channel as u16 * 50 / 100) as u8;
            }
        }
    }
}

fn draw_rect_border(image: &mut RgbaImage, (x0, y0, x1, y1): (i64, i64, i64, i64), color: RgbaColor, width: u32) {
    let pixel = color.to_pixel();
    let width = width.max(1) as i64;
    let (iw, ih) = (image.width() as i64, image.height() as i64);
    for dy in 0..width {
        stroke_horizontal(image, x0, x1, y0 + dy, pixel, iw, ih);
        stroke_horizontal(image, x0, x1, y1 - 1 - dy, pixel, iw, ih);
    }
    for dx in 0..width {
        stroke_vertical(image, y0, y1, x0 + dx, pixel, iw, ih);
        stroke_vertical(image, y0, y1, x1 - 1 - dx, pixel, iw, ih);
    }
}

fn stroke_horizontal(image: &mut RgbaImage, x0: i64, x1: i64, y: i64, pixel: Rgba<u8>, iw: i64, ih: i64) {
    if y < 0 || y >= ih {
        return;
    }
    for x in x0.max(0)..x1.min(iw) {
        image.put_pixel(x as u32, y as u32, pixel);
    }
}

fn stroke_vertical(image: &mut RgbaImage, y0: i64, y1: i64, x: i64, pixel: Rgba<u8>, iw: i64, ih: i64) {
    if x < 0 || x >= iw {
        return;
    }
    for y in y0.max(0)..y1.min(ih) {
        image.put_pixel(x as u32, y as u32, pixel);
    }
}

/// Draws a line from `start` to `end` with an arrowhead at `end` (Bresenham).
fn draw_arrow(image: &mut RgbaImage, start: (i64, i64), end: (i64, i64), color: RgbaColor, width: u32) {
    draw_line(image, start, end, color, width);

    let (dx, dy) = ((end.0 - start.0) as f64, (end.1 - start.1) as f64);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return;
    }
    let (ux, uy) = (dx / len, dy / len);
    let head_len = 16.0;
    let head_spread = std::f64::consts::FRAC_PI_6;

    for sign in [-1.0, 1.0] {
        let angle = sign * head_spread;
        let (cos, sin) = (angle.cos(), angle.sin());
        let rx = ux * cos - uy * sin;
        let ry = ux * sin + uy * cos;
        let tip = (
            end.0 - (rx * head_len).round() as i64,
            end.1 - (ry * head_len).round() as i64,
        );
        draw_line(image, end, tip, color, width);
    }
}

fn draw_line(image: &mut RgbaImage, start: (i64, i64), end: (i64, i64), color: RgbaColor, width: u32) {
    let pixel = color.to_pixel();
    let (iw, ih) = (image.width() as i64, image.height() as i64);
    let (mut x0, mut y0) = start;
    let (x1, y1) = end;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let half = (width.max(1) as i64) / 2;

    loop {
        for ox in -half..=half {
            for oy in -half..=half {
                let (px, py) = (x0 + ox, y0 + oy);
                if px >= 0 && px < iw && py >= 0 && py < ih {
                    image.put_pixel(px as u32, py as u32, pixel);
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn solid_png(w: u32, h: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        encode_png(&image).unwrap()
    }

    #[test]
    fn tile_produces_one_768_tile_per_starting_point() {
        let geometry = ScreenGeometry::new(1920, 1080);
        let png = solid_png(1920, 1080);
        let tiler = Tiler::new(&geometry);
        let tiles = tiler.tile(&png).unwrap();
        assert_eq!(tiles.len(), geometry.tile_count());
        for tile in &tiles {
            let decoded = decode_png(tile).unwrap();
            assert_eq!(decoded.width(), TILE_SIDE_PX);
            assert_eq!(decoded.height(), TILE_SIDE_PX);
        }
    }

    #[test]
    fn tile_rejects_resolution_mismatch() {
        let geometry = ScreenGeometry::new(1920, 1080);
        let png = solid_png(800, 600);
        let tiler = Tiler::new(&geometry);
        let err = tiler.tile(&png).unwrap_err();
        assert!(matches!(err, VisionError::ResolutionMismatch { .. }));
    }

    #[test]
    fn highlight_box_darkens_outside_region() {
        let geometry = ScreenGeometry::new(1000, 1000);
        let png = RgbaImage::from_pixel(1000, 1000, Rgba([200, 200, 200, 255]));
        let bytes = encode_png(&png).unwrap();
        let tiler = Tiler::new(&geometry);
        let bbox = NormalizedBox { ymin: 400, xmin: 400, ymax: 600, xmax: 600 };
        let highlighted = tiler
            .highlight_box(&bytes, 0, bbox, RgbaColor::RED, 3)
            .unwrap();
        let decoded = decode_png(&highlighted).unwrap();

        let corner = decoded.get_pixel(5, 5);
        assert!(corner.0[0] < 200, "corner outside the box should be darkened");

        let inside = decoded.get_pixel(500, 500);
        assert_eq!(inside.0[0], 200, "pixel inside the box should be untouched");
    }

    #[test]
    fn png_dimensions_reads_header_only() {
        let png = solid_png(1920, 1080);
        let (w, h) = png_dimensions(&png).unwrap();
        assert_eq!((w, h), (1920, 1080));
    }

    #[test]
    fn highlight_box_rejects_out_of_range_tile() {
        let geometry = ScreenGeometry::new(1000, 1000);
        let png = solid_png(1000, 1000);
        let tiler = Tiler::new(&geometry);
        let bbox = NormalizedBox { ymin: 0, xmin: 0, ymax: 100, xmax: 100 };
        let err = tiler.highlight_box(&png, 9, bbox, RgbaColor::RED, 2).unwrap_err();
        assert!(matches!(err, VisionError::TileIndexOutOfRange { .. }));
    }
}
