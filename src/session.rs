//! Calibration session: one image, its two-point measurement, the derived
//! scale and the detection results computed against it.

use crate::calibration::{CalibrationSurface, NativePoint, Raster, ScreenRect, SurfaceError};
use crate::detection::{
    DetectionError, DetectionKind, DetectionRequest, DetectionResponse, RequestTicket,
    ResultSlots, SourceImage,
};
use crate::scale::{LengthUnit, ScaleController};

/// Owns the surface, the scale controller and the result slots.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    surface: CalibrationSurface,
    scale: ScaleController,
    results: ResultSlots,
    source: Option<SourceImage>,
    load_generation: u64,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with a pre-filled wall length.
    pub fn with_wall_length(raw_text: impl Into<String>, unit: LengthUnit) -> Self {
        Self {
            scale: ScaleController::with_input(raw_text, unit),
            ..Self::default()
        }
    }

    /// Reserve a generation number for an image about to be decoded.
    pub fn begin_image_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.load_generation
    }

    /// Install a decoded image if no newer load has started since.
    pub fn finish_image_load(&mut self, generation: u64, source: SourceImage, raster: Raster) -> bool {
        if generation != self.load_generation {
            tracing::debug!(
                "Discarding decode of {} (generation {}, latest {})",
                source.file_name,
                generation,
                self.load_generation
            );
            return false;
        }

        tracing::info!("Loaded {}", source.file_name);
        self.surface.install(raster);
        self.scale.on_image_replaced();
        self.results.invalidate_all();
        self.source = Some(source);
        true
    }

    /// Decode and install an image synchronously.
    pub fn load_image(&mut self, source: SourceImage) -> Result<(), SurfaceError> {
        let generation = self.begin_image_load();
        let raster = Raster::decode(&source.bytes)?;
        self.finish_image_load(generation, source, raster);
        Ok(())
    }

    /// Forward a screen click; a completed pair updates the scale.
    pub fn click(&mut self, screen_x: f64, screen_y: f64, rect: &ScreenRect) -> Option<f64> {
        let distance = self.surface.handle_click(screen_x, screen_y, rect)?;
        self.scale.on_pixel_distance_measured(distance);
        Some(distance)
    }

    /// Same as [`click`](Self::click) with the point in native pixels.
    pub fn click_native(&mut self, point: NativePoint) -> Option<f64> {
        let distance = self.surface.click_native(point)?;
        self.scale.on_pixel_distance_measured(distance);
        Some(distance)
    }

    pub fn reset_points(&mut self) {
        self.surface.reset();
    }

    pub fn set_wall_length(&mut self, raw_text: impl Into<String>, unit: LengthUnit) {
        self.scale.set_wall_length(raw_text, unit);
    }

    pub fn set_unit(&mut self, unit: LengthUnit) {
        self.scale.set_unit(unit);
    }

    pub fn on_viewport_resize(&mut self, width: f64, height: f64) {
        self.surface.on_viewport_resize(width, height);
    }

    /// Check the requirements for `kind` and issue a ticket for it.
    pub fn prepare_detection(&mut self, kind: DetectionKind) -> Result<DetectionRequest, DetectionError> {
        let image = self.source.clone().ok_or(DetectionError::NoImage)?;
        let scale_m_per_px = self.scale.scale_m_per_px().filter(|s| *s > 0.0);
        if kind.requires_scale() && scale_m_per_px.is_none() {
            return Err(DetectionError::ScaleRequired(kind));
        }

        let ticket = self.results.issue(kind);
        Ok(DetectionRequest {
            ticket,
            image,
            scale_m_per_px,
        })
    }

    /// Prepare every kind whose requirements are currently met.
    pub fn prepare_compare_all(&mut self) -> Vec<DetectionRequest> {
        DetectionKind::ALL
            .into_iter()
            .filter_map(|kind| match self.prepare_detection(kind) {
                Ok(request) => Some(request),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", kind.as_str(), e);
                    None
                }
            })
            .collect()
    }

    /// Apply a finished detection. Returns `false` if it was superseded.
    pub fn complete_detection(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<DetectionResponse, String>,
    ) -> bool {
        self.results.complete(ticket, outcome)
    }

    pub fn surface(&self) -> &CalibrationSurface {
        &self.surface
    }

    pub fn scale(&self) -> &ScaleController {
        &self.scale
    }

    pub fn results(&self) -> &ResultSlots {
        &self.results
    }

    /// The uploaded image as it will be sent to the backends.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::YoloResponse;
    use crate::detection::SlotState;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_source(width: u32, height: u32) -> SourceImage {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        SourceImage::new(buffer.into_inner(), "plan.png")
    }

    fn yolo() -> DetectionResponse {
        DetectionResponse::Yolo(YoloResponse {
            predictions: Vec::new(),
            overlay_png_data_url: String::new(),
            total_detections: 0,
        })
    }

    fn calibrated() -> CalibrationSession {
        let mut session = CalibrationSession::new();
        session.load_image(png_source(800, 600)).unwrap();
        session.click_native(NativePoint::new(100.0, 100.0));
        session.click_native(NativePoint::new(100.0, 400.0));
        session.set_wall_length("3", LengthUnit::Meter);
        session
    }

    #[test]
    fn test_end_to_end_scale() {
        let session = calibrated();
        assert_eq!(session.scale().pixel_distance(), Some(300.0));
        let scale = session.scale().scale_m_per_px().unwrap();
        assert!((scale - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_screen_clicks_through_viewport() {
        let mut session = CalibrationSession::new();
        session.load_image(png_source(800, 600)).unwrap();
        session.on_viewport_resize(400.0, 400.0);
        let rect = ScreenRect::new(100.0, 50.0, 400.0, 300.0);

        assert_eq!(session.click(150.0, 100.0, &rect), None);
        assert_eq!(session.click(150.0, 250.0, &rect), Some(300.0));
        assert_eq!(session.scale().pixel_distance(), Some(300.0));
    }

    #[test]
    fn test_new_image_keeps_wall_length() {
        let mut session = calibrated();
        session.load_image(png_source(400, 300)).unwrap();

        assert_eq!(session.scale().pixel_distance(), None);
        assert_eq!(session.scale().scale_m_per_px(), None);
        assert_eq!(session.scale().wall_length_m(), Some(3.0));
        assert_eq!(session.scale().unit(), LengthUnit::Meter);
        assert!(session.surface().points().is_empty());
    }

    #[test]
    fn test_reset_keeps_scale_and_image() {
        let mut session = calibrated();
        session.reset_points();

        assert!(session.surface().points().is_empty());
        assert!(session.surface().has_image());
        assert!(session.scale().has_scale());
        assert_eq!(session.scale().wall_length_m(), Some(3.0));
    }

    #[test]
    fn test_decode_failure_leaves_state() {
        let mut session = calibrated();
        let bad = SourceImage::new(b"not an image".to_vec(), "bad.png");
        assert!(session.load_image(bad).is_err());

        assert_eq!(session.surface().native_size(), Some((800, 600)));
        assert_eq!(session.source().map(|s| s.file_name.as_str()), Some("plan.png"));
        assert!(session.scale().has_scale());
    }

    #[test]
    fn test_late_decode_is_discarded() {
        let mut session = CalibrationSession::new();
        let older = session.begin_image_load();
        let newer = session.begin_image_load();

        let big = png_source(800, 600);
        let small = png_source(40, 30);
        let small_raster = Raster::decode(&small.bytes).unwrap();
        let big_raster = Raster::decode(&big.bytes).unwrap();

        assert!(session.finish_image_load(newer, small, small_raster));
        assert!(!session.finish_image_load(older, big, big_raster));
        assert_eq!(session.surface().native_size(), Some((40, 30)));
    }

    #[test]
    fn test_detection_gating() {
        let mut session = CalibrationSession::new();
        assert!(matches!(
            session.prepare_detection(DetectionKind::Yolo),
            Err(DetectionError::NoImage)
        ));

        session.load_image(png_source(80, 60)).unwrap();
        assert!(matches!(
            session.prepare_detection(DetectionKind::Hybrid),
            Err(DetectionError::ScaleRequired(DetectionKind::Hybrid))
        ));
        let request = session.prepare_detection(DetectionKind::Roboflow).unwrap();
        assert_eq!(request.kind(), DetectionKind::Roboflow);
        assert_eq!(request.scale_m_per_px, None);

        let kinds: Vec<_> = session.prepare_compare_all().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec![DetectionKind::Roboflow, DetectionKind::Yolo]);
    }

    #[test]
    fn test_compare_all_with_scale() {
        let mut session = calibrated();
        let requests = session.prepare_compare_all();
        assert_eq!(requests.len(), DetectionKind::ALL.len());
        assert!(requests
            .iter()
            .all(|r| r.scale_m_per_px.is_some_and(|s| (s - 0.01).abs() < 1e-12)));
        assert!(session.results().any_pending());
    }

    #[test]
    fn test_new_image_drops_in_flight_results() {
        let mut session = calibrated();
        let request = session.prepare_detection(DetectionKind::Yolo).unwrap();
        session.load_image(png_source(80, 60)).unwrap();

        assert!(!session.complete_detection(request.ticket, Ok(yolo())));
        assert_eq!(session.results().state(DetectionKind::Yolo), &SlotState::Empty);
    }
}
