//! Scale controller combining the reference wall length with a pixel distance.

use super::unit::{to_meters, LengthUnit};

/// Owns the wall-length input and derives the meters-per-pixel scale.
///
/// A previously computed scale is kept when the wall-length input becomes
/// invalid; it is only replaced by the next recompute (a valid wall length or
/// a new pixel distance) or cleared by [`ScaleController::on_image_replaced`].
#[derive(Debug, Clone, Default)]
pub struct ScaleController {
    raw_input: String,
    unit: LengthUnit,
    wall_length_m: Option<f64>,
    pixel_distance: Option<f64>,
    scale_m_per_px: Option<f64>,
}

impl ScaleController {
    /// Create a controller with an empty input in meters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller pre-filled with a wall length and unit.
    pub fn with_input(raw_text: impl Into<String>, unit: LengthUnit) -> Self {
        let mut controller = Self::default();
        controller.set_wall_length(raw_text, unit);
        controller
    }

    /// Update the typed wall length and its unit.
    pub fn set_wall_length(&mut self, raw_text: impl Into<String>, unit: LengthUnit) {
        self.raw_input = raw_text.into();
        self.unit = unit;
        self.reinterpret_input();
    }

    /// Change the unit, re-reading the typed digits under the new unit.
    pub fn set_unit(&mut self, unit: LengthUnit) {
        self.unit = unit;
        self.reinterpret_input();
    }

    /// Record the pixel distance reported by the calibration surface.
    pub fn on_pixel_distance_measured(&mut self, distance: f64) {
        self.pixel_distance = Some(distance);
        self.recompute();
    }

    /// Drop the image-specific measurement; the wall length is kept.
    pub fn on_image_replaced(&mut self) {
        self.pixel_distance = None;
        self.scale_m_per_px = None;
    }

    /// Raw text as typed by the user.
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// Wall length in meters, if the current input is valid.
    pub fn wall_length_m(&self) -> Option<f64> {
        self.wall_length_m
    }

    pub fn pixel_distance(&self) -> Option<f64> {
        self.pixel_distance
    }

    /// Current scale in meters per pixel.
    pub fn scale_m_per_px(&self) -> Option<f64> {
        self.scale_m_per_px
    }

    /// Whether actions gated on a calibrated image may proceed.
    pub fn has_scale(&self) -> bool {
        self.scale_m_per_px.is_some_and(|s| s > 0.0)
    }

    fn reinterpret_input(&mut self) {
        match parse_positive(&self.raw_input) {
            Some(value) => {
                self.wall_length_m = Some(to_meters(value, self.unit));
                self.recompute();
            }
            None => {
                // Invalid input leaves the last scale in place.
                self.wall_length_m = None;
            }
        }
    }

    fn recompute(&mut self) {
        self.scale_m_per_px = match (self.wall_length_m, self.pixel_distance) {
            (Some(meters), Some(pixels)) if meters > 0.0 && pixels > 0.0 => Some(meters / pixels),
            _ => None,
        };
        if let Some(scale) = self.scale_m_per_px {
            tracing::debug!("Scale recomputed: {:.6} m/px", scale);
        }
    }
}

fn parse_positive(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scale_defined_when_both_positive() {
        let mut controller = ScaleController::with_input("2", LengthUnit::Meter);
        assert_eq!(controller.scale_m_per_px(), None);

        controller.on_pixel_distance_measured(100.0);
        assert!(approx(controller.scale_m_per_px().unwrap(), 0.02));
        assert!(controller.has_scale());
    }

    #[test]
    fn test_zero_pixel_distance_leaves_scale_undefined() {
        let mut controller = ScaleController::with_input("2", LengthUnit::Meter);
        controller.on_pixel_distance_measured(0.0);
        assert_eq!(controller.scale_m_per_px(), None);
    }

    #[test]
    fn test_unit_change_reinterprets_raw_text() {
        let mut controller = ScaleController::with_input("300", LengthUnit::Meter);
        controller.on_pixel_distance_measured(300.0);
        assert!(approx(controller.scale_m_per_px().unwrap(), 1.0));

        controller.set_unit(LengthUnit::Centimeter);
        assert!(approx(controller.wall_length_m().unwrap(), 3.0));
        assert!(approx(controller.scale_m_per_px().unwrap(), 0.01));
        assert_eq!(controller.raw_input(), "300");
    }

    #[test]
    fn test_invalid_input_keeps_last_scale() {
        let mut controller = ScaleController::with_input("3", LengthUnit::Meter);
        controller.on_pixel_distance_measured(300.0);
        let before = controller.scale_m_per_px();

        controller.set_wall_length("", LengthUnit::Meter);
        assert_eq!(controller.wall_length_m(), None);
        assert_eq!(controller.scale_m_per_px(), before);

        controller.set_wall_length("-4", LengthUnit::Meter);
        assert_eq!(controller.scale_m_per_px(), before);

        // The next recompute trigger supersedes it.
        controller.on_pixel_distance_measured(150.0);
        assert_eq!(controller.scale_m_per_px(), None);
    }

    #[test]
    fn test_non_numeric_and_non_finite_inputs() {
        let controller = ScaleController::with_input("abc", LengthUnit::Meter);
        assert_eq!(controller.wall_length_m(), None);
        let controller = ScaleController::with_input("inf", LengthUnit::Meter);
        assert_eq!(controller.wall_length_m(), None);
        let controller = ScaleController::with_input(" 2.5 ", LengthUnit::Foot);
        assert!(approx(controller.wall_length_m().unwrap(), 0.762));
    }

    #[test]
    fn test_image_replaced_keeps_wall_length() {
        let mut controller = ScaleController::with_input("12", LengthUnit::Foot);
        controller.on_pixel_distance_measured(240.0);
        assert!(controller.has_scale());

        controller.on_image_replaced();
        assert_eq!(controller.pixel_distance(), None);
        assert_eq!(controller.scale_m_per_px(), None);
        assert_eq!(controller.raw_input(), "12");
        assert_eq!(controller.unit(), LengthUnit::Foot);
        assert!(controller.wall_length_m().is_some());
    }
}
