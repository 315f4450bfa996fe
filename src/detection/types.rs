//! Response shapes returned by the detection endpoints.

use serde::{Deserialize, Serialize};

use super::kind::DetectionKind;

/// Integer-ish pixel coordinate as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// `[x, y]` pair, in pixels or meters depending on the field.
pub type Pair = [f64; 2];

// ---- /detect-rooms ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomsResponse {
    pub rooms: Vec<DetectedRoom>,
    pub overlay_png_data_url: String,
    pub image_width_px: u32,
    pub image_height_px: u32,
    #[serde(default)]
    pub total_rooms: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_masks: Option<DebugMasks>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRoom {
    pub id: u32,
    pub polygon_px: Vec<PixelPoint>,
    #[serde(default)]
    pub edge_lengths_m: Vec<f64>,
    pub perimeter_m: f64,
    pub area_m2: f64,
    #[serde(default)]
    pub area_px: f64,
    #[serde(default)]
    pub num_corners: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugMasks {
    pub walls: String,
    pub rooms: String,
}

// ---- /detect-roboflow ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoboflowResponse {
    pub predictions: Vec<ObbPrediction>,
    pub overlay_png_data_url: String,
    #[serde(default)]
    pub total_detections: usize,
}

/// Oriented bounding box given by its corner points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObbPrediction {
    #[serde(default)]
    pub id: u32,
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
    pub points: Vec<PixelPoint>,
}

// ---- /detect-yolo ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoloResponse {
    pub predictions: Vec<BoxPrediction>,
    pub overlay_png_data_url: String,
    #[serde(default)]
    pub total_detections: usize,
}

/// Axis-aligned box as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPrediction {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

// ---- /detect-unified ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResponse {
    pub scale_m_per_px: f64,
    pub image_dimensions: ImageDimensions,
    pub rooms: Vec<UnifiedRoom>,
    #[serde(default)]
    pub walls: Vec<UnifiedWall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRoom {
    pub id: String,
    /// Corners in meters.
    pub corners: Vec<Pair>,
    pub area_m2: f64,
    #[serde(default)]
    pub windows: Vec<UnifiedElement>,
    #[serde(default)]
    pub doors: Vec<UnifiedElement>,
}

/// Door or window attached to a room, in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedElement {
    pub position: Pair,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedWall {
    pub start: Pair,
    pub end: Pair,
    pub confidence: f64,
}

// ---- /detect-hybrid ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridResponse {
    pub metadata: HybridMetadata,
    pub rooms: Vec<HybridRoom>,
    pub walls: Vec<HybridWall>,
    #[serde(default)]
    pub doors: Vec<HybridOpening>,
    #[serde(default)]
    pub windows: Vec<HybridOpening>,
    pub annotated_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridMetadata {
    pub scale_m_per_px: f64,
    pub total_rooms: usize,
    pub total_walls: usize,
    pub total_doors: usize,
    pub total_windows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridRoom {
    pub id: u32,
    /// Polygon in meters.
    pub polygon: Vec<Pair>,
    pub area_m2: f64,
    pub num_corners: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridWall {
    pub start: Pair,
    pub end: Pair,
    pub thickness_m: f64,
    pub length_m: f64,
    /// Degrees in `[0, 180)`.
    pub angle: f64,
}

/// A door or window with its wall/room association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridOpening {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Pair,
    pub width_m: f64,
    pub height_m: f64,
    pub orientation: String,
    pub confidence: f64,
    /// Rooms a door connects (doors only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connects_rooms: Option<Vec<u32>>,
    /// Rooms a window belongs to (windows only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_wall_id: Option<u32>,
}

/// A decoded result from any backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "lowercase")]
pub enum DetectionResponse {
    Rooms(RoomsResponse),
    Roboflow(RoboflowResponse),
    Yolo(YoloResponse),
    Unified(UnifiedResponse),
    Hybrid(HybridResponse),
}

impl DetectionResponse {
    pub fn kind(&self) -> DetectionKind {
        match self {
            DetectionResponse::Rooms(_) => DetectionKind::Rooms,
            DetectionResponse::Roboflow(_) => DetectionKind::Roboflow,
            DetectionResponse::Yolo(_) => DetectionKind::Yolo,
            DetectionResponse::Unified(_) => DetectionKind::Unified,
            DetectionResponse::Hybrid(_) => DetectionKind::Hybrid,
        }
    }

    /// Annotated image as a `data:image/png;base64,...` URL, when the backend sends one.
    pub fn overlay_data_url(&self) -> Option<&str> {
        match self {
            DetectionResponse::Rooms(r) => Some(&r.overlay_png_data_url),
            DetectionResponse::Roboflow(r) => Some(&r.overlay_png_data_url),
            DetectionResponse::Yolo(r) => Some(&r.overlay_png_data_url),
            DetectionResponse::Unified(_) => None,
            DetectionResponse::Hybrid(r) => Some(&r.annotated_image),
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self {
            DetectionResponse::Rooms(r) => {
                let area: f64 = r.rooms.iter().map(|room| room.area_m2).sum();
                format!(
                    "{} rooms, {:.1} m² total ({}x{} px)",
                    r.rooms.len(),
                    area,
                    r.image_width_px,
                    r.image_height_px
                )
            }
            DetectionResponse::Roboflow(r) => format!("{} OBB detections", r.total_detections),
            DetectionResponse::Yolo(r) => format!("{} detections", r.total_detections),
            DetectionResponse::Unified(r) => {
                let doors: usize = r.rooms.iter().map(|room| room.doors.len()).sum();
                let windows: usize = r.rooms.iter().map(|room| room.windows.len()).sum();
                format!(
                    "{} rooms, {} walls, {} doors, {} windows",
                    r.rooms.len(),
                    r.walls.len(),
                    doors,
                    windows
                )
            }
            DetectionResponse::Hybrid(r) => format!(
                "{} rooms, {} walls, {} doors, {} windows",
                r.metadata.total_rooms,
                r.metadata.total_walls,
                r.metadata.total_doors,
                r.metadata.total_windows
            ),
        }
    }
}
