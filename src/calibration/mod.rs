//! Two-point calibration on a floor-plan image.
//!
//! The [`CalibrationSurface`] owns the decoded image and the point selection,
//! the [`transform`] module maps between screen and native pixel space, and
//! [`OverlayRenderer`] draws the result headlessly.

mod overlay;
mod render;
mod surface;
pub mod transform;

pub use overlay::{
    DistanceLabel, Overlay, FIRST_POINT_COLOR, LABEL_OFFSET, LINE_COLOR, LINE_DASH,
    POINT_RADIUS, SECOND_POINT_COLOR,
};
pub use render::{OverlayRenderer, RenderError};
pub use surface::{CalibrationSurface, PointSequence, Raster, SurfaceError};
pub use transform::{screen_to_native, DisplayTransform, NativePoint, ScreenRect};
