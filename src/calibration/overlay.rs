//! Renderer-neutral description of the calibration overlay.

use super::transform::NativePoint;

/// RGB color of the first marked point.
pub const FIRST_POINT_COLOR: [u8; 3] = [230, 57, 70];
/// RGB color of the second marked point.
pub const SECOND_POINT_COLOR: [u8; 3] = [29, 120, 216];
/// RGB color of the dashed connecting line.
pub const LINE_COLOR: [u8; 3] = [255, 183, 3];
/// Point marker radius in display pixels.
pub const POINT_RADIUS: f32 = 6.0;
/// Dash and gap lengths of the connecting line in display pixels.
pub const LINE_DASH: [f32; 2] = [8.0, 6.0];
/// Distance of the label above the segment midpoint, in display pixels.
pub const LABEL_OFFSET: f32 = 12.0;

/// Text label showing the measured pixel distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceLabel {
    pub text: String,
    /// Segment midpoint in native pixels; renderers shift it up by [`LABEL_OFFSET`].
    pub anchor: NativePoint,
    pub distance: f64,
}

impl DistanceLabel {
    pub fn between(first: NativePoint, second: NativePoint) -> Self {
        let distance = first.distance_to(&second);
        Self {
            text: format!("{:.0} px", distance.round()),
            anchor: first.midpoint(&second),
            distance,
        }
    }
}

/// What to draw on top of the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub first: Option<NativePoint>,
    pub second: Option<NativePoint>,
    pub label: Option<DistanceLabel>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// The connecting segment, present once both points are marked.
    pub fn segment(&self) -> Option<(NativePoint, NativePoint)> {
        self.first.zip(self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_rounds_distance() {
        let label = DistanceLabel::between(NativePoint::new(0.0, 0.0), NativePoint::new(10.0, 10.0));
        assert_eq!(label.text, "14 px");
        assert_eq!(label.anchor, NativePoint::new(5.0, 5.0));
    }
}
