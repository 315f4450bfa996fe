//! Per-backend result slots guarded by monotonic request tickets.
//!
//! Requests cannot be cancelled, so each dispatch is tagged with a sequence
//! number per kind. A completion is applied only when its ticket is still the
//! latest issued for that kind; anything older is dropped.

use std::collections::BTreeMap;

use super::kind::DetectionKind;
use super::types::DetectionResponse;

/// Identifies one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub kind: DetectionKind,
    pub sequence: u64,
}

/// State of one backend's result.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SlotState {
    #[default]
    Empty,
    Pending,
    Ready(DetectionResponse),
    Failed(String),
}

impl SlotState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SlotState::Pending)
    }

    pub fn response(&self) -> Option<&DetectionResponse> {
        match self {
            SlotState::Ready(response) => Some(response),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    latest: u64,
    state: SlotState,
}

/// One isolated result slot per detection kind.
#[derive(Debug, Clone, Default)]
pub struct ResultSlots {
    slots: BTreeMap<DetectionKind, Slot>,
}

impl ResultSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request for `kind`, clearing its previous result.
    pub fn issue(&mut self, kind: DetectionKind) -> RequestTicket {
        let slot = self.slots.entry(kind).or_default();
        slot.latest += 1;
        slot.state = SlotState::Pending;
        RequestTicket {
            kind,
            sequence: slot.latest,
        }
    }

    /// Apply a finished request. Returns `false` if the ticket was superseded.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<DetectionResponse, String>,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(&ticket.kind) else {
            tracing::debug!("Dropping result for unknown slot {:?}", ticket);
            return false;
        };
        if slot.latest != ticket.sequence {
            tracing::debug!(
                "Dropping stale {} result (#{}, latest #{})",
                ticket.kind.as_str(),
                ticket.sequence,
                slot.latest
            );
            return false;
        }

        slot.state = match outcome {
            Ok(response) => SlotState::Ready(response),
            Err(message) => {
                tracing::warn!("{} detection failed: {}", ticket.kind.as_str(), message);
                SlotState::Failed(message)
            }
        };
        true
    }

    /// Supersede every in-flight request and clear all results.
    pub fn invalidate_all(&mut self) {
        for kind in DetectionKind::ALL {
            let slot = self.slots.entry(kind).or_default();
            slot.latest += 1;
            slot.state = SlotState::Empty;
        }
    }

    pub fn state(&self, kind: DetectionKind) -> &SlotState {
        const EMPTY: &SlotState = &SlotState::Empty;
        self.slots.get(&kind).map(|slot| &slot.state).unwrap_or(EMPTY)
    }

    pub fn any_pending(&self) -> bool {
        self.slots.values().any(|slot| slot.state.is_pending())
    }

    /// Completed responses, ordered by kind.
    pub fn ready(&self) -> impl Iterator<Item = (DetectionKind, &DetectionResponse)> {
        self.slots
            .iter()
            .filter_map(|(kind, slot)| slot.state.response().map(|r| (*kind, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::YoloResponse;

    fn yolo(total: usize) -> DetectionResponse {
        DetectionResponse::Yolo(YoloResponse {
            predictions: Vec::new(),
            overlay_png_data_url: String::new(),
            total_detections: total,
        })
    }

    #[test]
    fn test_issue_marks_pending_and_completes() {
        let mut slots = ResultSlots::new();
        let ticket = slots.issue(DetectionKind::Yolo);
        assert!(slots.state(DetectionKind::Yolo).is_pending());
        assert!(slots.any_pending());

        assert!(slots.complete(ticket, Ok(yolo(3))));
        assert_eq!(slots.state(DetectionKind::Yolo), &SlotState::Ready(yolo(3)));
        assert!(!slots.any_pending());
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut slots = ResultSlots::new();
        let first = slots.issue(DetectionKind::Yolo);
        let second = slots.issue(DetectionKind::Yolo);
        assert!(second.sequence > first.sequence);

        assert!(slots.complete(second, Ok(yolo(2))));
        assert!(!slots.complete(first, Ok(yolo(1))));
        assert_eq!(slots.state(DetectionKind::Yolo), &SlotState::Ready(yolo(2)));
    }

    #[test]
    fn test_failure_is_isolated_per_kind() {
        let mut slots = ResultSlots::new();
        let yolo_ticket = slots.issue(DetectionKind::Yolo);
        let rooms_ticket = slots.issue(DetectionKind::Rooms);

        assert!(slots.complete(yolo_ticket, Ok(yolo(1))));
        assert!(slots.complete(rooms_ticket, Err("backend down".to_string())));

        assert_eq!(
            slots.state(DetectionKind::Rooms),
            &SlotState::Failed("backend down".to_string())
        );
        assert_eq!(slots.ready().count(), 1);
    }

    #[test]
    fn test_invalidate_all_drops_in_flight() {
        let mut slots = ResultSlots::new();
        let ticket = slots.issue(DetectionKind::Roboflow);
        slots.invalidate_all();

        assert!(!slots.complete(ticket, Err("late".to_string())));
        assert_eq!(slots.state(DetectionKind::Roboflow), &SlotState::Empty);
        assert_eq!(slots.state(DetectionKind::Hybrid), &SlotState::Empty);
    }
}
