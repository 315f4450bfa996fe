//! The detection backends and what each one requires.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One backend integration behind the detection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    /// Classical contour-based room detection.
    Rooms,
    /// Hosted oriented-bounding-box model.
    Roboflow,
    /// Local YOLO object detection.
    Yolo,
    /// Rooms combined with YOLO doors/windows.
    Unified,
    /// Full CV + DL pipeline with wall/room association.
    Hybrid,
}

impl DetectionKind {
    pub const ALL: [DetectionKind; 5] = [
        DetectionKind::Rooms,
        DetectionKind::Roboflow,
        DetectionKind::Yolo,
        DetectionKind::Unified,
        DetectionKind::Hybrid,
    ];

    /// Path of the endpoint relative to the service base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            DetectionKind::Rooms => "/detect-rooms",
            DetectionKind::Roboflow => "/detect-roboflow",
            DetectionKind::Yolo => "/detect-yolo",
            DetectionKind::Unified => "/detect-unified",
            DetectionKind::Hybrid => "/detect-hybrid",
        }
    }

    /// Whether the form must carry `scale_m_per_px`.
    pub fn requires_scale(self) -> bool {
        matches!(
            self,
            DetectionKind::Rooms | DetectionKind::Unified | DetectionKind::Hybrid
        )
    }

    /// Lowercase identifier used in CLI flags and export keys.
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionKind::Rooms => "rooms",
            DetectionKind::Roboflow => "roboflow",
            DetectionKind::Yolo => "yolo",
            DetectionKind::Unified => "unified",
            DetectionKind::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionKind::Rooms => write!(f, "Rooms (OpenCV)"),
            DetectionKind::Roboflow => write!(f, "Roboflow OBB"),
            DetectionKind::Yolo => write!(f, "YOLOv8"),
            DetectionKind::Unified => write!(f, "Unified"),
            DetectionKind::Hybrid => write!(f, "Hybrid CV + DL"),
        }
    }
}

impl FromStr for DetectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown detection kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_requirements() {
        assert!(DetectionKind::Rooms.requires_scale());
        assert!(DetectionKind::Unified.requires_scale());
        assert!(DetectionKind::Hybrid.requires_scale());
        assert!(!DetectionKind::Roboflow.requires_scale());
        assert!(!DetectionKind::Yolo.requires_scale());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("YOLO".parse::<DetectionKind>(), Ok(DetectionKind::Yolo));
        assert_eq!(" hybrid".parse::<DetectionKind>(), Ok(DetectionKind::Hybrid));
        assert!("walls".parse::<DetectionKind>().is_err());
    }
}
