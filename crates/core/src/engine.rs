//! The engine boundary.
//!
//! All tracking computation lives in the external native engine; this
//! trait is the full surface the core needs from it. The engine is
//! injected at session construction, which keeps sessions independent and
//! lets tests substitute [`crate::fake::FakeEngine`].
//!
//! Call categories mirror the native module:
//! * request/response (`async fn`, err = engine rejection) — `start`,
//!   `stop`, `set_configuration`, `set_detection_images`,
//!   `set_world_origin`
//! * fire-and-forget (sync, failures surface later as `didFailWithError`
//!   events) — `pause`, `resume`, `reset`, toggle setters
//! * synchronous pull queries — frames, hit tests, matrices, textures
//!
//! Life-cycle events do not come through this trait; the engine side
//! pushes them into the `UnboundedReceiver<SessionEvent>` handed to
//! [`crate::Session::new`].

use arbridge_protocol::{
    ArMatrices, DetectionImage, FrameAttribute, FrameSnapshot, HitTestResult,
    HitTestResultType, PlaneDetection, Point, TextureHandle, TrackingConfiguration, Transform,
    VideoFormat, WorldAlignment,
};
use async_trait::async_trait;

use crate::error::Result;

/// Opaque handle to the render surface the engine draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle(pub u64);

/// Engine capability flags, queried on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCapabilities {
    /// The engine build includes tracking support at all.
    pub tracking_supported: bool,
    /// The engine exposes the start entrypoint (older builds do not).
    pub has_start_entrypoint: bool,
    /// Engine version string, e.g. `"2.0"`.
    pub version: String,
    pub world_tracking: bool,
    pub orientation_tracking: bool,
    pub face_tracking: bool,
}

impl EngineCapabilities {
    /// Whether the engine can run the given configuration. One arm per
    /// configuration kind; a new kind will not compile until mapped.
    pub fn configuration_available(&self, configuration: TrackingConfiguration) -> bool {
        match configuration {
            TrackingConfiguration::World => self.world_tracking,
            TrackingConfiguration::Orientation => self.orientation_tracking,
            TrackingConfiguration::Face => self.face_tracking,
        }
    }
}

/// External AR capability provider.
///
/// Implementations must be safe to call from any thread; the core never
/// calls overlapping request/response operations on the same session.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Current capability flags. Re-read by the gate on every gated call.
    fn capabilities(&self) -> EngineCapabilities;

    /// Formats the engine can capture under `configuration`. Empty when
    /// the configuration is unsupported; never an error.
    fn supported_video_formats(&self, configuration: TrackingConfiguration) -> Vec<VideoFormat>;

    /// Begin producing frames into `surface` under `configuration`.
    async fn start(
        &self,
        surface: SurfaceHandle,
        configuration: TrackingConfiguration,
    ) -> Result<()>;

    /// Tear down session resources.
    async fn stop(&self) -> Result<()>;

    /// Swap the active configuration. Atomic from the engine's
    /// perspective: no frame is delivered under a mixed configuration.
    async fn set_configuration(&self, configuration: TrackingConfiguration) -> Result<()>;

    /// Register reference images for image-anchor detection, effective
    /// from the next frame after acceptance.
    async fn set_detection_images(&self, images: Vec<DetectionImage>) -> Result<()>;

    /// Rebind the session coordinate origin.
    async fn set_world_origin(&self, transform: Transform) -> Result<()>;

    /// Suspend frame production without releasing resources.
    fn pause(&self);

    /// Resume frame production after a pause.
    fn resume(&self);

    /// Clear tracking state (anchors, world origin) in place.
    fn reset(&self);

    fn provides_audio_data(&self) -> bool;
    fn set_provides_audio_data(&self, value: bool);

    fn light_estimation_enabled(&self) -> bool;
    fn set_light_estimation_enabled(&self, value: bool);

    fn auto_focus_enabled(&self) -> bool;
    fn set_auto_focus_enabled(&self, value: bool);

    fn world_alignment(&self) -> WorldAlignment;
    fn set_world_alignment(&self, value: WorldAlignment);

    fn plane_detection(&self) -> PlaneDetection;
    fn set_plane_detection(&self, value: PlaneDetection);

    /// Snapshot of the current frame, restricted to the requested
    /// attributes.
    fn current_frame(&self, attributes: &[FrameAttribute]) -> FrameSnapshot;

    /// Intersect a screen-space point against tracked and estimated
    /// geometry. Results arrive nearest-to-farthest; empty on miss.
    fn hit_test(&self, point: Point, types: &[HitTestResultType]) -> Vec<HitTestResult>;

    /// Raw handle to the engine's camera texture.
    fn camera_texture(&self) -> TextureHandle;

    /// View and projection matrices for the given clip planes.
    fn ar_matrices(&self, near: f32, far: f32) -> ArMatrices;
}
