//! Calibration surface: the loaded image plus the two-click point selection.

use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

use super::overlay::{DistanceLabel, Overlay};
use super::transform::{screen_to_native, DisplayTransform, NativePoint, ScreenRect};

/// Calibration surface errors.
#[derive(Error, Debug, Clone)]
pub enum SurfaceError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// A decoded image, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Raster {
    pixels: Arc<RgbaImage>,
}

impl Raster {
    /// Decode PNG/JPEG (or any format the `image` crate knows) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, SurfaceError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| SurfaceError::Decode(e.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(SurfaceError::Decode("Image has no pixels".to_string()));
        }
        Ok(Self::from_image(decoded.to_rgba8()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Ordered selection of at most two native points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PointSequence {
    #[default]
    Empty,
    One(NativePoint),
    Two(NativePoint, NativePoint),
}

impl PointSequence {
    pub fn len(&self) -> usize {
        match self {
            PointSequence::Empty => 0,
            PointSequence::One(_) => 1,
            PointSequence::Two(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PointSequence::Empty)
    }

    pub fn points(&self) -> Vec<NativePoint> {
        match *self {
            PointSequence::Empty => Vec::new(),
            PointSequence::One(a) => vec![a],
            PointSequence::Two(a, b) => vec![a, b],
        }
    }

    /// Pixel distance between the two points, once both are set.
    pub fn distance(&self) -> Option<f64> {
        match self {
            PointSequence::Two(a, b) => Some(a.distance_to(b)),
            _ => None,
        }
    }

    /// Add a click. Returns the distance when this click completes a pair.
    ///
    /// A click on a full sequence starts over with the new point alone.
    fn push(&mut self, point: NativePoint) -> Option<f64> {
        match *self {
            PointSequence::Empty | PointSequence::Two(_, _) => {
                *self = PointSequence::One(point);
                None
            }
            PointSequence::One(first) => {
                *self = PointSequence::Two(first, point);
                self.distance()
            }
        }
    }
}

/// Displays the current image and records the reference points.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSurface {
    raster: Option<Raster>,
    viewport: Option<(f64, f64)>,
    transform: Option<DisplayTransform>,
    points: PointSequence,
    revision: u64,
}

impl CalibrationSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and make them the current image.
    ///
    /// On failure the current image and points are left untouched.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        let raster = Raster::decode(bytes)?;
        self.install(raster);
        Ok(())
    }

    /// Replace the current image with an already decoded raster.
    pub fn install(&mut self, raster: Raster) {
        tracing::info!("Image installed: {}x{}", raster.width(), raster.height());
        self.raster = Some(raster);
        self.points = PointSequence::Empty;
        self.refit();
    }

    /// Available area for the surface changed.
    pub fn on_viewport_resize(&mut self, width: f64, height: f64) {
        self.viewport = Some((width, height));
        self.refit();
    }

    /// Record a click given in screen coordinates.
    ///
    /// Returns the measured pixel distance when this click completes a pair.
    /// Clicks are ignored while no image is loaded.
    pub fn handle_click(&mut self, screen_x: f64, screen_y: f64, surface: &ScreenRect) -> Option<f64> {
        let (width, height) = self.native_size()?;
        let point = screen_to_native(screen_x, screen_y, surface, width, height);
        self.click_native(point)
    }

    /// Record a click already expressed in native pixels.
    pub fn click_native(&mut self, point: NativePoint) -> Option<f64> {
        self.raster.as_ref()?;
        let measured = self.points.push(point);
        self.bump();
        if let Some(distance) = measured {
            tracing::info!("Measured {:.2} px", distance);
        }
        measured
    }

    /// Clear the selected points. No measurement is emitted.
    pub fn reset(&mut self) {
        self.points = PointSequence::Empty;
        self.bump();
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.raster.is_some()
    }

    pub fn native_size(&self) -> Option<(u32, u32)> {
        self.raster.as_ref().map(|r| (r.width(), r.height()))
    }

    /// Current fit of the image into the viewport.
    pub fn display_transform(&self) -> Option<DisplayTransform> {
        self.transform
    }

    pub fn points(&self) -> &PointSequence {
        &self.points
    }

    pub fn distance(&self) -> Option<f64> {
        self.points.distance()
    }

    /// Counter bumped on every change that needs a redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Describe the overlay for the current selection.
    pub fn overlay(&self) -> Overlay {
        match self.points {
            PointSequence::Empty => Overlay::default(),
            PointSequence::One(a) => Overlay {
                first: Some(a),
                ..Overlay::default()
            },
            PointSequence::Two(a, b) => Overlay {
                first: Some(a),
                second: Some(b),
                label: Some(DistanceLabel::between(a, b)),
            },
        }
    }

    fn refit(&mut self) {
        self.transform = match (&self.raster, self.viewport) {
            (Some(raster), Some((w, h))) => DisplayTransform::fit(raster.width(), raster.height(), w, h),
            (Some(raster), None) => Some(DisplayTransform::identity(raster.width(), raster.height())),
            (None, _) => None,
        };
        self.bump();
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn loaded(width: u32, height: u32) -> CalibrationSurface {
        let mut surface = CalibrationSurface::new();
        surface.install(Raster::from_image(RgbaImage::new(width, height)));
        surface
    }

    #[test]
    fn test_load_image_sets_native_size_and_clears_points() {
        let mut surface = loaded(10, 10);
        surface.click_native(NativePoint::new(1.0, 1.0));
        assert_eq!(surface.points().len(), 1);

        surface.load_image(&png_bytes(64, 32)).unwrap();
        assert_eq!(surface.native_size(), Some((64, 32)));
        assert!(surface.points().is_empty());
    }

    #[test]
    fn test_decode_failure_keeps_current_image() {
        let mut surface = loaded(20, 10);
        surface.click_native(NativePoint::new(2.0, 2.0));

        let err = surface.load_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, SurfaceError::Decode(_)));
        assert_eq!(surface.native_size(), Some((20, 10)));
        assert_eq!(surface.points().len(), 1);
    }

    #[test]
    fn test_click_sequencing() {
        let mut surface = loaded(100, 100);

        assert_eq!(surface.click_native(NativePoint::new(0.0, 0.0)), None);
        assert_eq!(surface.points().len(), 1);

        assert_eq!(surface.click_native(NativePoint::new(3.0, 4.0)), Some(5.0));
        assert_eq!(surface.points().len(), 2);

        assert_eq!(surface.click_native(NativePoint::new(9.0, 9.0)), None);
        assert_eq!(
            *surface.points(),
            PointSequence::One(NativePoint::new(9.0, 9.0))
        );
    }

    #[test]
    fn test_reset_clears_points_only() {
        let mut surface = loaded(100, 50);
        surface.click_native(NativePoint::new(1.0, 1.0));
        surface.click_native(NativePoint::new(2.0, 2.0));
        let revision = surface.revision();

        surface.reset();
        assert!(surface.points().is_empty());
        assert_eq!(surface.native_size(), Some((100, 50)));
        assert!(surface.revision() > revision);
    }

    #[test]
    fn test_clicks_ignored_without_image() {
        let mut surface = CalibrationSurface::new();
        let rect = ScreenRect::at_origin(100.0, 100.0);
        assert_eq!(surface.handle_click(10.0, 10.0, &rect), None);
        assert!(surface.points().is_empty());
    }

    #[test]
    fn test_viewport_fit_and_screen_clicks() {
        let mut surface = loaded(800, 600);
        surface.on_viewport_resize(400.0, 400.0);
        let transform = surface.display_transform().unwrap();
        assert_eq!((transform.width, transform.height), (400.0, 300.0));

        let rect = ScreenRect::new(100.0, 50.0, transform.width, transform.height);
        assert_eq!(surface.handle_click(150.0, 100.0, &rect), None);
        let distance = surface.handle_click(150.0, 250.0, &rect).unwrap();
        assert!((distance - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlay_follows_selection() {
        let mut surface = loaded(100, 100);
        assert!(surface.overlay().is_empty());

        surface.click_native(NativePoint::new(10.0, 10.0));
        let overlay = surface.overlay();
        assert!(overlay.first.is_some());
        assert!(overlay.segment().is_none());
        assert!(overlay.label.is_none());

        surface.click_native(NativePoint::new(10.0, 40.0));
        let overlay = surface.overlay();
        assert!(overlay.segment().is_some());
        assert_eq!(overlay.label.unwrap().text, "30 px");
    }
}
