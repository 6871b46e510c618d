//! Payload shapes exchanged with the engine.
//!
//! Field names serialize in camelCase to match the engine's JSON. Anchor
//! payloads stay opaque (`serde_json::Value`) because the engine owns that
//! memory and its shape varies per anchor kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{
    AnchorType, AnchorUpdateKind, EventKind, HitTestResultType, TrackingState,
    TrackingStateReason,
};

/// Column-major 4x4 transform, the engine's native matrix layout.
pub type Transform = [f32; 16];

/// A point in normalized screen space (0..1 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A capture format the engine can run a configuration under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFormat {
    pub image_width: u32,
    pub image_height: u32,
    pub frames_per_second: u32,
    /// Engine-reported format type identifier.
    #[serde(rename = "type")]
    pub format_type: String,
}

/// An engine-tracked spatial reference, relayed by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnchorType,
    pub transform: Transform,
    /// Kind-specific data (plane extents, face blend shapes, image name).
    /// Owned by the engine; treat as read-only.
    #[serde(default)]
    pub payload: Value,
}

/// One entry of an `anchorsDidUpdate` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorChange {
    #[serde(flatten)]
    pub anchor: Anchor,
    pub event_type: AnchorUpdateKind,
}

/// Payload of a `frameDidUpdate` event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameUpdate {
    pub frame_id: u64,
    pub timestamp: f64,
}

/// Payload of a `didFailWithError` event, and of rejected engine calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineFault {
    pub code: i32,
    pub message: String,
}

/// Payload of a `cameraDidChangeTrackingState` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStatus {
    pub state: TrackingState,
    pub reason: TrackingStateReason,
}

/// Scene light estimate, present when light estimation is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightEstimate {
    pub ambient_intensity: f32,
    pub ambient_color_temperature: f32,
}

/// A raw feature point detected in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePoint {
    pub id: u64,
    pub position: [f32; 3],
}

/// Captured depth buffer metadata. The pixel data itself never crosses the
/// boundary; the handle is only valid for the frame that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthData {
    pub buffer_handle: u64,
    pub width: u32,
    pub height: u32,
}

/// Pull-produced frame snapshot. Every field is optional; only the
/// attributes the caller requested are populated. Must not be retained
/// past the next `frameDidUpdate` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchors: Option<Vec<Anchor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_feature_points: Option<Vec<FeaturePoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_estimation: Option<LightEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_depth_data: Option<DepthData>,
}

impl FrameSnapshot {
    /// True when no sub-field is populated.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_none()
            && self.raw_feature_points.is_none()
            && self.light_estimation.is_none()
            && self.captured_depth_data.is_none()
    }
}

/// One intersection from a hit-test query. Results arrive ordered
/// nearest-to-farthest from the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitTestResult {
    #[serde(rename = "type")]
    pub result_type: HitTestResultType,
    pub transform: Transform,
    /// Distance from the camera to the intersection, in meters.
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
}

/// View and projection matrices for the given clip planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArMatrices {
    pub view_matrix: Transform,
    pub projection_matrix: Transform,
}

/// A reference image to register for image-anchor detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionImage {
    pub name: String,
    pub uri: String,
    /// Physical width of the printed image, in meters.
    pub physical_width: f32,
}

/// Opaque handle to the engine's camera texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);

/// A life-cycle event emitted by the engine on one of the six channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum SessionEvent {
    #[serde(rename = "frameDidUpdate")]
    FrameDidUpdate(FrameUpdate),
    #[serde(rename = "didFailWithError")]
    DidFailWithError(EngineFault),
    #[serde(rename = "anchorsDidUpdate")]
    AnchorsDidUpdate(Vec<AnchorChange>),
    #[serde(rename = "cameraDidChangeTrackingState")]
    CameraDidChangeTrackingState(TrackingStatus),
    #[serde(rename = "sessionWasInterrupted")]
    SessionWasInterrupted,
    #[serde(rename = "sessionInterruptionEnded")]
    SessionInterruptionEnded,
}

impl SessionEvent {
    /// The channel this event belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::FrameDidUpdate(_) => EventKind::FrameDidUpdate,
            SessionEvent::DidFailWithError(_) => EventKind::DidFailWithError,
            SessionEvent::AnchorsDidUpdate(_) => EventKind::AnchorsDidUpdate,
            SessionEvent::CameraDidChangeTrackingState(_) => {
                EventKind::CameraDidChangeTrackingState
            }
            SessionEvent::SessionWasInterrupted => EventKind::SessionWasInterrupted,
            SessionEvent::SessionInterruptionEnded => EventKind::SessionInterruptionEnded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AnchorType, AnchorUpdateKind};

    const IDENTITY: Transform = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn default_snapshot_is_empty() {
        let snapshot = FrameSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.anchors.is_none());
        assert!(snapshot.captured_depth_data.is_none());
    }

    #[test]
    fn empty_snapshot_serializes_without_fields() {
        let json = serde_json::to_value(FrameSnapshot::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn anchor_change_flattens_the_anchor() {
        let change = AnchorChange {
            anchor: Anchor {
                id: "plane-1".into(),
                kind: AnchorType::Plane,
                transform: IDENTITY,
                payload: serde_json::json!({"extent": [1.0, 0.0, 2.0]}),
            },
            event_type: AnchorUpdateKind::Add,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["id"], "plane-1");
        assert_eq!(json["type"], "ARPlaneAnchor");
        assert_eq!(json["eventType"], "add");
    }

    #[test]
    fn session_event_kind_matches_channel() {
        let event = SessionEvent::CameraDidChangeTrackingState(TrackingStatus {
            state: TrackingState::Limited,
            reason: TrackingStateReason::ExcessiveMotion,
        });
        assert_eq!(event.kind(), EventKind::CameraDidChangeTrackingState);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "cameraDidChangeTrackingState");
        assert_eq!(json["payload"]["state"], "ARTrackingStateLimited");
    }

    #[test]
    fn interruption_events_carry_no_payload() {
        let json = serde_json::to_value(SessionEvent::SessionWasInterrupted).unwrap();
        assert_eq!(json["event"], "sessionWasInterrupted");
        assert_eq!(
            SessionEvent::SessionWasInterrupted.kind(),
            EventKind::SessionWasInterrupted
        );
    }
}
