// Copyright 2025 floorplan-scale contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Floorplan Scale
//!
//! Two-point scale calibration for floor-plan images.
//!
//! The user marks two points along a wall of known length. The crate
//! measures their distance in the image's native pixels, converts the typed
//! wall length to meters, and derives a meters-per-pixel scale. That scale
//! is what the external room/wall/door/window detection backends need to
//! report real-world dimensions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use floorplan_scale::calibration::NativePoint;
//! use floorplan_scale::detection::{DetectionClient, DetectionKind, SourceImage};
//! use floorplan_scale::scale::LengthUnit;
//! use floorplan_scale::CalibrationSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("plan.png")?;
//!
//!     let mut session = CalibrationSession::with_wall_length("3", LengthUnit::Meter);
//!     session.load_image(SourceImage::new(bytes, "plan.png"))?;
//!     session.click_native(NativePoint::new(100.0, 100.0));
//!     session.click_native(NativePoint::new(100.0, 400.0));
//!     println!("Scale: {:?} m/px", session.scale().scale_m_per_px());
//!
//!     let client = DetectionClient::with_defaults()?;
//!     let request = session.prepare_detection(DetectionKind::Rooms)?;
//!     let response = client.detect(&request).await;
//!     session.complete_detection(request.ticket, response.map_err(|e| e.to_string()));
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod detection;
pub mod export;
pub mod gui;
pub mod scale;
pub mod session;
pub mod settings;

pub use calibration::{CalibrationSurface, NativePoint, OverlayRenderer, ScreenRect};
pub use detection::{
    DetectionClient, DetectionConfig, DetectionError, DetectionKind, DetectionResponse,
};
pub use export::{ExportDocument, ExportError};
pub use scale::{LengthUnit, ScaleController};
pub use session::CalibrationSession;
pub use settings::AppSettings;
