//! Headless rendering of the calibration surface onto an RGBA raster.
//!
//! Mirrors what the GUI canvas draws so the CLI can emit an annotated PNG.

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::path::Path;
use thiserror::Error;

use super::overlay::{
    Overlay, FIRST_POINT_COLOR, LABEL_OFFSET, LINE_COLOR, LINE_DASH, POINT_RADIUS,
    SECOND_POINT_COLOR,
};
use super::surface::CalibrationSurface;
use super::transform::{DisplayTransform, NativePoint};

/// Rendering errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No image loaded")]
    NoImage,
    #[error("Failed to load label font: {0}")]
    Font(String),
    #[error("Failed to write image: {0}")]
    Write(#[from] image::ImageError),
}

/// Draws the image and the point overlay at the surface's display size.
pub struct OverlayRenderer {
    font: Option<FontVec>,
    label_size: f32,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    /// Renderer without a font; distance labels are skipped.
    pub fn new() -> Self {
        Self {
            font: None,
            label_size: 18.0,
        }
    }

    /// Use a TrueType/OpenType font file for distance labels.
    pub fn with_font_file(self, path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let data = std::fs::read(path.as_ref()).map_err(|e| RenderError::Font(e.to_string()))?;
        self.with_font_bytes(data)
    }

    pub fn with_font_bytes(mut self, data: Vec<u8>) -> Result<Self, RenderError> {
        let font = FontVec::try_from_vec(data).map_err(|e| RenderError::Font(e.to_string()))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn with_label_size(mut self, size: f32) -> Self {
        self.label_size = size;
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render the current image and overlay.
    pub fn render(&self, surface: &CalibrationSurface) -> Result<RgbaImage, RenderError> {
        let raster = surface.raster().ok_or(RenderError::NoImage)?;
        let transform = surface
            .display_transform()
            .unwrap_or_else(|| DisplayTransform::identity(raster.width(), raster.height()));

        let width = (transform.width.round() as u32).max(1);
        let height = (transform.height.round() as u32).max(1);
        let mut canvas = if width == raster.width() && height == raster.height() {
            raster.pixels().clone()
        } else {
            imageops::resize(raster.pixels(), width, height, FilterType::Triangle)
        };

        self.draw_overlay(&mut canvas, &surface.overlay(), &transform);
        Ok(canvas)
    }

    /// Render and save as PNG.
    pub fn render_to_file(
        &self,
        surface: &CalibrationSurface,
        path: impl AsRef<Path>,
    ) -> Result<(), RenderError> {
        let canvas = self.render(surface)?;
        canvas.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    fn draw_overlay(&self, canvas: &mut RgbaImage, overlay: &Overlay, transform: &DisplayTransform) {
        let to_px = |p: NativePoint| {
            let (x, y) = transform.to_display(p);
            (x as f32, y as f32)
        };

        if let Some((a, b)) = overlay.segment() {
            draw_dashed_line(canvas, to_px(a), to_px(b), rgba(LINE_COLOR));
        }

        if let Some(first) = overlay.first {
            draw_marker(canvas, to_px(first), rgba(FIRST_POINT_COLOR));
        }
        if let Some(second) = overlay.second {
            draw_marker(canvas, to_px(second), rgba(SECOND_POINT_COLOR));
        }

        if let (Some(label), Some(font)) = (&overlay.label, &self.font) {
            let scale = PxScale::from(self.label_size);
            let (text_w, text_h) = text_size(scale, font, &label.text);
            let (mid_x, mid_y) = to_px(label.anchor);

            let x = (mid_x - text_w as f32 / 2.0) as i32;
            let y = (mid_y - LABEL_OFFSET - text_h as f32) as i32;

            // White plate behind the text
            draw_filled_rect_mut(
                canvas,
                Rect::at(x - 4, y - 3).of_size(text_w + 8, text_h + 6),
                Rgba([255, 255, 255, 220]),
            );
            draw_text_mut(canvas, Rgba([0, 0, 0, 255]), x, y, scale, font, &label.text);
        }
    }
}

fn rgba(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

fn draw_marker(canvas: &mut RgbaImage, center: (f32, f32), color: Rgba<u8>) {
    let c = (center.0.round() as i32, center.1.round() as i32);
    let radius = POINT_RADIUS as i32;
    draw_filled_circle_mut(canvas, c, radius, color);
    draw_hollow_circle_mut(canvas, c, radius + 1, Rgba([255, 255, 255, 255]));
}

fn draw_dashed_line(canvas: &mut RgbaImage, start: (f32, f32), end: (f32, f32), color: Rgba<u8>) {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = (dx * dx + dy * dy).sqrt();
    if length < f32::EPSILON {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let [dash, gap] = LINE_DASH;

    let mut travelled = 0.0;
    while travelled < length {
        let stop = (travelled + dash).min(length);
        let from = (start.0 + ux * travelled, start.1 + uy * travelled);
        let to = (start.0 + ux * stop, start.1 + uy * stop);
        // Two passes, one pixel apart, for a 2px stroke
        draw_line_segment_mut(canvas, from, to, color);
        draw_line_segment_mut(canvas, (from.0 - uy, from.1 + ux), (to.0 - uy, to.1 + ux), color);
        travelled += dash + gap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Raster;

    fn surface_with_points(width: u32, height: u32) -> CalibrationSurface {
        let mut surface = CalibrationSurface::new();
        surface.install(Raster::from_image(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        )));
        surface
    }

    #[test]
    fn test_render_requires_image() {
        let renderer = OverlayRenderer::new();
        let result = renderer.render(&CalibrationSurface::new());
        assert!(matches!(result, Err(RenderError::NoImage)));
    }

    #[test]
    fn test_render_uses_display_size() {
        let mut surface = surface_with_points(800, 600);
        surface.on_viewport_resize(400.0, 400.0);
        let canvas = OverlayRenderer::new().render(&surface).unwrap();
        assert_eq!(canvas.dimensions(), (400, 300));
    }

    #[test]
    fn test_render_marks_points() {
        let mut surface = surface_with_points(200, 200);
        surface.click_native(NativePoint::new(50.0, 50.0));
        surface.click_native(NativePoint::new(150.0, 50.0));

        let canvas = OverlayRenderer::new().render(&surface).unwrap();
        assert_eq!(*canvas.get_pixel(50, 50), rgba(FIRST_POINT_COLOR));
        assert_eq!(*canvas.get_pixel(150, 50), rgba(SECOND_POINT_COLOR));
        // Second dash spans x = 64..72, clear of the first marker
        assert_eq!(*canvas.get_pixel(66, 50), rgba(LINE_COLOR));
    }

    #[test]
    fn test_invalid_font_is_rejected() {
        let result = OverlayRenderer::new().with_font_bytes(vec![0, 1, 2, 3]);
        assert!(matches!(result, Err(RenderError::Font(_))));
    }
}
