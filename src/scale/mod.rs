//! Wall-length input, unit conversion and the meters-per-pixel scale factor.

mod controller;
mod unit;

pub use controller::ScaleController;
pub use unit::{to_meters, LengthUnit, ParseUnitError};
