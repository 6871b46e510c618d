//! Pull-based accessors against the active session.
//!
//! These are stateless queries over the session state and the engine:
//! snapshots are produced on demand, owned by the engine, and must not be
//! retained past the next `frameDidUpdate` event.

use std::sync::atomic::Ordering;

use arbridge_protocol::{
    ArMatrices, DetectionImage, FrameAttribute, FrameSnapshot, HitTestResult, HitTestResultType,
    Point, TextureHandle,
};

use crate::error::Result;
use crate::session::Session;

/// Handle to the engine's camera texture, stamped with the epoch it was
/// produced under. Pause, resume, and stop each begin a new epoch, so a
/// handle taken before is no longer [valid](Session::texture_valid).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraTexture {
    pub handle: TextureHandle,
    epoch: u64,
}

impl Session {
    /// Snapshot of the current frame, restricted to `attributes`.
    ///
    /// Returns an empty snapshot (every field absent) when the session is
    /// not Running or when no attributes are requested; never an error
    /// for either reason.
    pub fn current_frame(&self, attributes: &[FrameAttribute]) -> FrameSnapshot {
        if !self.is_running() || attributes.is_empty() {
            return FrameSnapshot::default();
        }
        self.inner.engine.current_frame(attributes)
    }

    /// Intersect a normalized screen-space point against geometry classes
    /// in `types`.
    ///
    /// Synchronous; results are ordered nearest-to-farthest. An empty list
    /// means no intersection — not an error — and is also what a session
    /// that is not Running produces.
    pub fn hit_test(&self, point: Point, types: &[HitTestResultType]) -> Vec<HitTestResult> {
        if !self.is_running() {
            return Vec::new();
        }
        self.inner.engine.hit_test(point, types)
    }

    /// Opaque handle to the camera texture. Running only.
    ///
    /// The handle is stamped with the current texture epoch; check
    /// [`texture_valid`](Self::texture_valid) after any pause/resume.
    pub fn camera_texture(&self) -> Result<CameraTexture> {
        if !self.is_running() {
            return Err(self.invalid_transition("camera_texture"));
        }
        Ok(CameraTexture {
            handle: self.inner.engine.camera_texture(),
            epoch: self.inner.texture_epoch.load(Ordering::SeqCst),
        })
    }

    /// Whether `texture` was produced under the current epoch of a
    /// Running session.
    pub fn texture_valid(&self, texture: &CameraTexture) -> bool {
        self.is_running() && texture.epoch == self.inner.texture_epoch.load(Ordering::SeqCst)
    }

    /// View and projection matrices for the given clip planes. Running
    /// only.
    pub fn ar_matrices(&self, near: f32, far: f32) -> Result<ArMatrices> {
        if !self.is_running() {
            return Err(self.invalid_transition("ar_matrices"));
        }
        Ok(self.inner.engine.ar_matrices(near, far))
    }

    /// Register reference images for image-anchor detection.
    ///
    /// Request/response: resolves on engine acknowledgement, and the
    /// images take effect starting the next frame after acceptance. Issued
    /// in any state; the engine applies them once frames are produced.
    pub async fn set_detection_images(&self, images: Vec<DetectionImage>) -> Result<()> {
        self.ensure_available()?;
        let _guard = self.claim_pending("set_detection_images")?;
        tracing::debug!(target: "arbridge.frame", count = images.len(), "registering detection images");
        self.inner.engine.set_detection_images(images).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::DeviceProfile;
    use crate::engine::SurfaceHandle;
    use crate::error::Error;
    use crate::fake::FakeEngine;
    use arbridge_protocol::{
        Anchor, AnchorType, LightEstimate, TrackingConfiguration, Transform,
    };
    use std::sync::Arc;

    const SURFACE: SurfaceHandle = SurfaceHandle(7);
    const IDENTITY: Transform = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    fn capable_session() -> (Session, Arc<FakeEngine>) {
        let engine = Arc::new(FakeEngine::new());
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let session = Session::new(engine.clone(), DeviceProfile::physical("ios", 2018), rx);
        (session, engine)
    }

    fn full_frame() -> FrameSnapshot {
        FrameSnapshot {
            anchors: Some(vec![Anchor {
                id: "plane-1".into(),
                kind: AnchorType::Plane,
                transform: IDENTITY,
                payload: serde_json::Value::Null,
            }]),
            raw_feature_points: Some(Vec::new()),
            light_estimation: Some(LightEstimate {
                ambient_intensity: 1000.0,
                ambient_color_temperature: 6500.0,
            }),
            captured_depth_data: None,
        }
    }

    #[tokio::test]
    async fn empty_attribute_request_yields_empty_snapshot() {
        let (session, engine) = capable_session();
        engine.set_frame(full_frame());
        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();

        let snapshot = session.current_frame(&[]);
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn snapshot_contains_only_requested_attributes() {
        let (session, engine) = capable_session();
        engine.set_frame(full_frame());
        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();

        let snapshot = session.current_frame(&[FrameAttribute::Anchors]);
        assert!(snapshot.anchors.is_some());
        assert!(snapshot.raw_feature_points.is_none());
        assert!(snapshot.light_estimation.is_none());
        assert!(snapshot.captured_depth_data.is_none());
    }

    #[tokio::test]
    async fn snapshot_is_empty_when_not_running() {
        let (session, engine) = capable_session();
        engine.set_frame(full_frame());

        // Stopped: empty, not an error.
        assert!(session.current_frame(&[FrameAttribute::Anchors]).is_empty());

        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();
        session.pause().unwrap();
        assert!(session.current_frame(&[FrameAttribute::Anchors]).is_empty());
    }

    #[tokio::test]
    async fn hit_test_misses_produce_an_empty_list() {
        let (session, _engine) = capable_session();
        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();

        let results = session.hit_test(
            Point { x: 0.5, y: 0.5 },
            &[HitTestResultType::ExistingPlane],
        );
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn hit_test_filters_by_requested_types() {
        let (session, engine) = capable_session();
        engine.set_hit_results(vec![
            HitTestResult {
                result_type: HitTestResultType::FeaturePoint,
                transform: IDENTITY,
                distance: 0.4,
                anchor_id: None,
            },
            HitTestResult {
                result_type: HitTestResultType::ExistingPlane,
                transform: IDENTITY,
                distance: 1.2,
                anchor_id: Some("plane-1".into()),
            },
        ]);
        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();

        let results = session.hit_test(
            Point { x: 0.5, y: 0.5 },
            &[HitTestResultType::ExistingPlane],
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].anchor_id.as_deref(), Some("plane-1"));
    }

    #[tokio::test]
    async fn camera_texture_requires_running_and_survives_neither_pause_nor_resume() {
        let (session, _engine) = capable_session();
        assert!(matches!(
            session.camera_texture().unwrap_err(),
            Error::InvalidStateTransition {
                operation: "camera_texture",
                ..
            }
        ));

        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();
        let texture = session.camera_texture().unwrap();
        assert!(session.texture_valid(&texture));

        session.pause().unwrap();
        assert!(!session.texture_valid(&texture));
        session.resume().unwrap();
        // A new epoch began; the old handle stays invalid.
        assert!(!session.texture_valid(&texture));
        let fresh = session.camera_texture().unwrap();
        assert!(session.texture_valid(&fresh));
    }

    #[tokio::test]
    async fn ar_matrices_require_running() {
        let (session, _engine) = capable_session();
        assert!(session.ar_matrices(0.01, 100.0).is_err());

        session
            .start(SURFACE, TrackingConfiguration::World)
            .await
            .unwrap();
        let matrices = session.ar_matrices(0.01, 100.0).unwrap();
        assert_ne!(matrices.projection_matrix, [0.0; 16]);
    }

    #[tokio::test]
    async fn detection_images_reach_the_engine_on_acknowledgement() {
        let (session, engine) = capable_session();
        let images = vec![DetectionImage {
            name: "poster".into(),
            uri: "asset://poster.png".into(),
            physical_width: 0.3,
        }];
        session.set_detection_images(images).await.unwrap();
        assert_eq!(engine.detection_images().len(), 1);
        assert_eq!(engine.detection_images()[0].name, "poster");
    }

    #[tokio::test]
    async fn rejected_detection_images_are_not_recorded() {
        let (session, engine) = capable_session();
        engine.fail_next(3, "too many images");
        let err = session
            .set_detection_images(vec![DetectionImage {
                name: "poster".into(),
                uri: "asset://poster.png".into(),
                physical_width: 0.3,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EngineRejected { code: 3, .. }));
        assert!(engine.detection_images().is_empty());
    }
}
