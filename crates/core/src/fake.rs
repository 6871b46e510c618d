//! Fake engine for unit testing session control without a device.
//!
//! Provides an in-memory [`Engine`] whose acknowledgements, capability
//! flags, and pull-query payloads are scripted by the test. The same value
//! doubles as the controller: hold it in an `Arc`, hand a clone to
//! [`crate::Session::new`], and drive it from the test body.
//!
//! # Example
//!
//! ```ignore
//! let engine = Arc::new(FakeEngine::new());
//! let (events, rx) = tokio::sync::mpsc::unbounded_channel();
//! let session = Session::new(engine.clone(), DeviceProfile::physical("ios", 2018), rx);
//!
//! engine.fail_next(5, "camera unavailable");
//! assert!(session.start(surface, TrackingConfiguration::World).await.is_err());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use arbridge_protocol::{
    ArMatrices, DetectionImage, EngineFault, FrameAttribute, FrameSnapshot, HitTestResult,
    HitTestResultType, PlaneDetection, Point, TextureHandle, TrackingConfiguration, Transform,
    VideoFormat, WorldAlignment,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::engine::{Engine, EngineCapabilities, SurfaceHandle};
use crate::error::Result;

struct FakeState {
    capabilities: EngineCapabilities,
    world_formats: Vec<VideoFormat>,
    orientation_formats: Vec<VideoFormat>,
    face_formats: Vec<VideoFormat>,
    fail_next: VecDeque<EngineFault>,
    calls: Vec<String>,
    frame: FrameSnapshot,
    hit_results: Vec<HitTestResult>,
    detection_images: Vec<DetectionImage>,
    provides_audio_data: bool,
    light_estimation_enabled: bool,
    auto_focus_enabled: bool,
    world_alignment: WorldAlignment,
    plane_detection: PlaneDetection,
    texture: TextureHandle,
}

fn default_format(width: u32, height: u32) -> VideoFormat {
    VideoFormat {
        image_width: width,
        image_height: height,
        frames_per_second: 60,
        format_type: "YUV420".into(),
    }
}

/// Scriptable in-memory engine.
pub struct FakeEngine {
    state: Mutex<FakeState>,
    hold: AtomicBool,
    release: Notify,
}

impl FakeEngine {
    /// A rear-camera-capable engine: world and orientation tracking
    /// available, face tracking off.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                capabilities: EngineCapabilities {
                    tracking_supported: true,
                    has_start_entrypoint: true,
                    version: "2.0".into(),
                    world_tracking: true,
                    orientation_tracking: true,
                    face_tracking: false,
                },
                world_formats: vec![default_format(1920, 1440), default_format(1280, 720)],
                orientation_formats: vec![default_format(1920, 1440)],
                face_formats: Vec::new(),
                fail_next: VecDeque::new(),
                calls: Vec::new(),
                frame: FrameSnapshot::default(),
                hit_results: Vec::new(),
                detection_images: Vec::new(),
                provides_audio_data: false,
                light_estimation_enabled: false,
                auto_focus_enabled: false,
                world_alignment: WorldAlignment::Gravity,
                plane_detection: PlaneDetection::None,
                texture: TextureHandle(1),
            }),
            hold: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    // --- controller surface ------------------------------------------------

    /// Every engine call made so far, in order, rendered as
    /// `name(args)`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Queue a rejection for the next request/response operation.
    pub fn fail_next(&self, code: i32, message: &str) {
        self.state.lock().fail_next.push_back(EngineFault {
            code,
            message: message.into(),
        });
    }

    /// Park request/response operations on an ack barrier until
    /// [`release_ack`](Self::release_ack) is called, one call per release.
    pub fn hold_acks(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Release one parked request/response operation.
    pub fn release_ack(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn set_capabilities(&self, capabilities: EngineCapabilities) {
        self.state.lock().capabilities = capabilities;
    }

    /// Flip face tracking on or off, installing a front-camera format
    /// list to match.
    pub fn set_face_tracking(&self, available: bool) {
        let mut state = self.state.lock();
        state.capabilities.face_tracking = available;
        state.face_formats = if available {
            vec![default_format(1280, 720)]
        } else {
            Vec::new()
        };
    }

    /// Install the full snapshot `current_frame` filters from.
    pub fn set_frame(&self, frame: FrameSnapshot) {
        self.state.lock().frame = frame;
    }

    /// Install canned hit-test results (already ordered
    /// nearest-to-farthest).
    pub fn set_hit_results(&self, results: Vec<HitTestResult>) {
        self.state.lock().hit_results = results;
    }

    /// Reference images accepted so far.
    pub fn detection_images(&self) -> Vec<DetectionImage> {
        self.state.lock().detection_images.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().calls.push(call.into());
    }

    async fn ack(&self, call: String) -> Result<()> {
        self.record(call);
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        match self.state.lock().fail_next.pop_front() {
            Some(fault) => Err(fault.into()),
            None => Ok(()),
        }
    }
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn capabilities(&self) -> EngineCapabilities {
        self.state.lock().capabilities.clone()
    }

    fn supported_video_formats(&self, configuration: TrackingConfiguration) -> Vec<VideoFormat> {
        let state = self.state.lock();
        match configuration {
            TrackingConfiguration::World => state.world_formats.clone(),
            TrackingConfiguration::Orientation => state.orientation_formats.clone(),
            TrackingConfiguration::Face => state.face_formats.clone(),
        }
    }

    async fn start(
        &self,
        _surface: SurfaceHandle,
        configuration: TrackingConfiguration,
    ) -> Result<()> {
        self.ack(format!("start({configuration})")).await
    }

    async fn stop(&self) -> Result<()> {
        self.ack("stop".into()).await
    }

    async fn set_configuration(&self, configuration: TrackingConfiguration) -> Result<()> {
        self.ack(format!("set_configuration({configuration})")).await
    }

    async fn set_detection_images(&self, images: Vec<DetectionImage>) -> Result<()> {
        let result = self.ack(format!("set_detection_images({})", images.len())).await;
        if result.is_ok() {
            self.state.lock().detection_images = images;
        }
        result
    }

    async fn set_world_origin(&self, _transform: Transform) -> Result<()> {
        self.ack("set_world_origin".into()).await
    }

    fn pause(&self) {
        self.record("pause");
    }

    fn resume(&self) {
        self.record("resume");
    }

    fn reset(&self) {
        self.record("reset");
    }

    fn provides_audio_data(&self) -> bool {
        self.state.lock().provides_audio_data
    }

    fn set_provides_audio_data(&self, value: bool) {
        self.record(format!("set_provides_audio_data({value})"));
        self.state.lock().provides_audio_data = value;
    }

    fn light_estimation_enabled(&self) -> bool {
        self.state.lock().light_estimation_enabled
    }

    fn set_light_estimation_enabled(&self, value: bool) {
        self.record(format!("set_light_estimation_enabled({value})"));
        self.state.lock().light_estimation_enabled = value;
    }

    fn auto_focus_enabled(&self) -> bool {
        self.state.lock().auto_focus_enabled
    }

    fn set_auto_focus_enabled(&self, value: bool) {
        self.record(format!("set_auto_focus_enabled({value})"));
        self.state.lock().auto_focus_enabled = value;
    }

    fn world_alignment(&self) -> WorldAlignment {
        self.state.lock().world_alignment
    }

    fn set_world_alignment(&self, value: WorldAlignment) {
        self.record(format!("set_world_alignment({value})"));
        self.state.lock().world_alignment = value;
    }

    fn plane_detection(&self) -> PlaneDetection {
        self.state.lock().plane_detection
    }

    fn set_plane_detection(&self, value: PlaneDetection) {
        self.record(format!("set_plane_detection({value})"));
        self.state.lock().plane_detection = value;
    }

    fn current_frame(&self, attributes: &[FrameAttribute]) -> FrameSnapshot {
        let state = self.state.lock();
        let mut snapshot = FrameSnapshot::default();
        for attribute in attributes {
            match attribute {
                FrameAttribute::Anchors => snapshot.anchors = state.frame.anchors.clone(),
                FrameAttribute::RawFeaturePoints => {
                    snapshot.raw_feature_points = state.frame.raw_feature_points.clone();
                }
                FrameAttribute::LightEstimation => {
                    snapshot.light_estimation = state.frame.light_estimation;
                }
                FrameAttribute::CapturedDepthData => {
                    snapshot.captured_depth_data = state.frame.captured_depth_data;
                }
            }
        }
        snapshot
    }

    fn hit_test(&self, _point: Point, types: &[HitTestResultType]) -> Vec<HitTestResult> {
        self.state
            .lock()
            .hit_results
            .iter()
            .filter(|r| types.contains(&r.result_type))
            .cloned()
            .collect()
    }

    fn camera_texture(&self) -> TextureHandle {
        self.state.lock().texture
    }

    fn ar_matrices(&self, near: f32, far: f32) -> ArMatrices {
        // Orthographic-ish placeholder keyed on the clip planes so tests
        // can tell calls apart.
        let mut projection: Transform = [0.0; 16];
        projection[0] = 1.0;
        projection[5] = 1.0;
        projection[10] = -2.0 / (far - near);
        projection[15] = 1.0;
        let mut view: Transform = [0.0; 16];
        view[0] = 1.0;
        view[5] = 1.0;
        view[10] = 1.0;
        view[15] = 1.0;
        ArMatrices {
            view_matrix: view,
            projection_matrix: projection,
        }
    }
}
