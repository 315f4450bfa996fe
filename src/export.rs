//! JSON export of a calibration and its detection results.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calibration::NativePoint;
use crate::detection::{decode_png_data_url, DetectionError, DetectionKind, DetectionResponse};
use crate::scale::LengthUnit;
use crate::session::CalibrationSession;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to decode {kind} overlay: {source}")]
    Overlay {
        kind: DetectionKind,
        source: DetectionError,
    },
}

/// Calibration state at export time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub pixel_distance: Option<f64>,
    pub wall_length_m: Option<f64>,
    pub wall_length_input: String,
    pub unit: LengthUnit,
    pub scale_m_per_px: Option<f64>,
    pub points: Vec<NativePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
}

/// Everything written to an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Local>,
    pub calibration: CalibrationRecord,
    /// Completed results keyed by backend identifier.
    pub results: BTreeMap<String, DetectionResponse>,
}

impl ExportDocument {
    /// Snapshot the session.
    pub fn from_session(session: &CalibrationSession) -> Self {
        let scale = session.scale();
        let calibration = CalibrationRecord {
            pixel_distance: scale.pixel_distance(),
            wall_length_m: scale.wall_length_m(),
            wall_length_input: scale.raw_input().to_string(),
            unit: scale.unit(),
            scale_m_per_px: scale.scale_m_per_px(),
            points: session.surface().points().points(),
            image_file: session.source().map(|s| s.file_name.clone()),
        };

        let results = session
            .results()
            .ready()
            .map(|(kind, response)| (kind.as_str().to_string(), response.clone()))
            .collect();

        Self {
            exported_at: Local::now(),
            calibration,
            results,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `document` as pretty-printed JSON.
pub fn write_json(path: impl AsRef<Path>, document: &ExportDocument) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, document.to_json()?)?;
    tracing::info!("Exported results to {}", path.display());
    Ok(())
}

/// Default export file name for a given moment.
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("floorplan_results_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Write each result's annotated image as `<kind>_overlay.png` under `dir`.
pub fn save_overlays<'a, I>(dir: impl AsRef<Path>, results: I) -> Result<Vec<PathBuf>, ExportError>
where
    I: IntoIterator<Item = (DetectionKind, &'a DetectionResponse)>,
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (kind, response) in results {
        let Some(url) = response.overlay_data_url() else {
            continue;
        };
        let bytes =
            decode_png_data_url(url).map_err(|source| ExportError::Overlay { kind, source })?;
        let path = dir.join(format!("{}_overlay.png", kind.as_str()));
        fs::write(&path, bytes)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::data_url::encode_png_data_url;
    use crate::detection::types::{ImageDimensions, UnifiedResponse, YoloResponse};
    use crate::detection::SourceImage;
    use chrono::TimeZone;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("floorplan-scale-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_default_file_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(default_file_name(now), "floorplan_results_20240309_140507.json");
    }

    #[test]
    fn test_document_from_session() {
        let mut session = CalibrationSession::with_wall_length("300", LengthUnit::Centimeter);
        session
            .load_image(SourceImage::new(png_bytes(800, 600), "plan.png"))
            .unwrap();
        session.click_native(NativePoint::new(100.0, 100.0));
        session.click_native(NativePoint::new(100.0, 400.0));

        let request = session.prepare_detection(DetectionKind::Yolo).unwrap();
        session.complete_detection(
            request.ticket,
            Ok(DetectionResponse::Yolo(YoloResponse {
                predictions: Vec::new(),
                overlay_png_data_url: String::new(),
                total_detections: 0,
            })),
        );
        let failed = session.prepare_detection(DetectionKind::Roboflow).unwrap();
        session.complete_detection(failed.ticket, Err("offline".to_string()));

        let document = ExportDocument::from_session(&session);
        assert_eq!(document.calibration.pixel_distance, Some(300.0));
        assert_eq!(document.calibration.wall_length_input, "300");
        assert_eq!(document.calibration.image_file.as_deref(), Some("plan.png"));
        assert_eq!(document.calibration.points.len(), 2);
        assert_eq!(document.results.keys().collect::<Vec<_>>(), vec!["yolo"]);

        let json: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
        assert_eq!(json["calibration"]["unit"], "centimeter");
        assert_eq!(json["results"]["yolo"]["kind"], "yolo");
    }

    #[test]
    fn test_write_json_creates_parent() {
        let dir = temp_dir("export");
        let path = dir.join("nested").join("out.json");
        let document = ExportDocument::from_session(&CalibrationSession::new());

        write_json(&path, &document).unwrap();
        let back: ExportDocument = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.calibration, document.calibration);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_overlays() {
        let dir = temp_dir("overlays");
        let png = png_bytes(4, 4);
        let yolo = DetectionResponse::Yolo(YoloResponse {
            predictions: Vec::new(),
            overlay_png_data_url: encode_png_data_url(&png),
            total_detections: 0,
        });
        let unified = DetectionResponse::Unified(UnifiedResponse {
            scale_m_per_px: 0.01,
            image_dimensions: ImageDimensions {
                width_px: 4,
                height_px: 4,
            },
            rooms: Vec::new(),
            walls: Vec::new(),
        });

        let written = save_overlays(
            &dir,
            [(DetectionKind::Yolo, &yolo), (DetectionKind::Unified, &unified)],
        )
        .unwrap();
        assert_eq!(written, vec![dir.join("yolo_overlay.png")]);
        assert_eq!(fs::read(&written[0]).unwrap(), png);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_overlays_rejects_bad_payload() {
        let dir = temp_dir("bad-overlay");
        let yolo = DetectionResponse::Yolo(YoloResponse {
            predictions: Vec::new(),
            overlay_png_data_url: "data:image/png;base64,aGVsbG8=".to_string(),
            total_detections: 0,
        });
        let err = save_overlays(&dir, [(DetectionKind::Yolo, &yolo)]).unwrap_err();
        assert!(matches!(err, ExportError::Overlay { kind: DetectionKind::Yolo, .. }));
        let _ = fs::remove_dir_all(&dir);
    }
}
