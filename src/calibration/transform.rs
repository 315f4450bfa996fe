//! Coordinate spaces of the calibration surface.
//!
//! Points are always stored in the image's native pixel grid. The display
//! transform fits that grid into the available viewport with one uniform
//! factor, and [`screen_to_native`] maps a click on the rendered surface back
//! to native pixels using the surface's actual on-screen size, so zoom or a
//! responsive layout never changes which native pixel a click resolves to.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `x,y`, `(x, y)` or `[x, y]` with non-negative decimal components.
static POINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[\(\[]?\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*[\)\]]?\s*$")
        .expect("point pattern is valid")
});

/// A point in the image's native pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

impl NativePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in native pixels.
    pub fn distance_to(&self, other: &NativePoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &NativePoint) -> NativePoint {
        NativePoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl FromStr for NativePoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = POINT_PATTERN
            .captures(s)
            .ok_or_else(|| format!("Invalid point '{}': expected x,y", s))?;
        let coord = |i: usize| {
            caps[i]
                .parse::<f64>()
                .map_err(|e| format!("Invalid point '{}': {}", s, e))
        };
        Ok(NativePoint::new(coord(1)?, coord(2)?))
    }
}

/// Uniform scale fitting the native image into the available viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    /// Display pixels per native pixel.
    pub scale: f64,
    /// Rendered surface width in display pixels.
    pub width: f64,
    /// Rendered surface height in display pixels.
    pub height: f64,
}

impl DisplayTransform {
    /// Fit `native_width` x `native_height` into the available area.
    ///
    /// Returns `None` when either size is degenerate.
    pub fn fit(
        native_width: u32,
        native_height: u32,
        available_width: f64,
        available_height: f64,
    ) -> Option<Self> {
        if native_width == 0 || native_height == 0 {
            return None;
        }
        if !(available_width.is_finite() && available_height.is_finite())
            || available_width <= 0.0
            || available_height <= 0.0
        {
            return None;
        }

        let scale = (available_width / native_width as f64)
            .min(available_height / native_height as f64);

        Some(Self {
            scale,
            width: native_width as f64 * scale,
            height: native_height as f64 * scale,
        })
    }

    /// Identity transform for an image shown at its native size.
    pub fn identity(native_width: u32, native_height: u32) -> Self {
        Self {
            scale: 1.0,
            width: native_width as f64,
            height: native_height as f64,
        }
    }

    /// Native point to surface-local display coordinates.
    pub fn to_display(&self, point: NativePoint) -> (f64, f64) {
        (point.x * self.scale, point.y * self.scale)
    }
}

/// Placement of the rendered surface on screen, as reported by the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A surface anchored at the origin with the given displayed size.
    pub fn at_origin(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Map a screen-space click onto the native pixel grid.
///
/// A zero or non-finite displayed size makes the corresponding factor fall
/// back to 1.
pub fn screen_to_native(
    screen_x: f64,
    screen_y: f64,
    surface: &ScreenRect,
    native_width: u32,
    native_height: u32,
) -> NativePoint {
    let factor_x = mapping_factor(native_width, surface.width);
    let factor_y = mapping_factor(native_height, surface.height);

    NativePoint::new(
        (screen_x - surface.left) * factor_x,
        (screen_y - surface.top) * factor_y,
    )
}

fn mapping_factor(native: u32, displayed: f64) -> f64 {
    if displayed <= 0.0 || !displayed.is_finite() {
        return 1.0;
    }
    let factor = native as f64 / displayed;
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_three_four_five() {
        let a = NativePoint::new(0.0, 0.0);
        let b = NativePoint::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let transform = DisplayTransform::fit(800, 600, 400.0, 400.0).unwrap();
        assert_eq!(transform.scale, 0.5);
        assert_eq!(transform.width, 400.0);
        assert_eq!(transform.height, 300.0);

        let tall = DisplayTransform::fit(1000, 2000, 800.0, 500.0).unwrap();
        assert_eq!(tall.scale, 0.25);
        assert_eq!(tall.width, 250.0);
        assert_eq!(tall.height, 500.0);
    }

    #[test]
    fn test_fit_rejects_degenerate_sizes() {
        assert!(DisplayTransform::fit(0, 600, 400.0, 400.0).is_none());
        assert!(DisplayTransform::fit(800, 600, 0.0, 400.0).is_none());
        assert!(DisplayTransform::fit(800, 600, f64::NAN, 400.0).is_none());
    }

    #[test]
    fn test_center_click_is_scale_invariant() {
        for (w, h) in [(400.0, 300.0), (800.0, 600.0), (1234.5, 77.0), (3.0, 9000.0)] {
            let rect = ScreenRect::new(25.0, 40.0, w, h);
            let p = screen_to_native(25.0 + w * 0.5, 40.0 + h * 0.5, &rect, 800, 600);
            assert!((p.x - 400.0).abs() < 1e-9, "x for {}x{}", w, h);
            assert!((p.y - 300.0).abs() < 1e-9, "y for {}x{}", w, h);
        }
    }

    #[test]
    fn test_parse_point_forms() {
        let expected = NativePoint::new(100.0, 400.5);
        assert_eq!("100,400.5".parse::<NativePoint>(), Ok(expected));
        assert_eq!("(100, 400.5)".parse::<NativePoint>(), Ok(expected));
        assert_eq!(" [100 ,400.5] ".parse::<NativePoint>(), Ok(expected));
        assert!("100".parse::<NativePoint>().is_err());
        assert!("-1,5".parse::<NativePoint>().is_err());
        assert!("a,b".parse::<NativePoint>().is_err());
    }

    #[test]
    fn test_zero_display_size_defaults_factor_to_one() {
        let rect = ScreenRect::new(10.0, 20.0, 0.0, 0.0);
        let p = screen_to_native(15.0, 27.0, &rect, 800, 600);
        assert_eq!(p, NativePoint::new(5.0, 7.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
