//! Session life-cycle control.
//!
//! A [`Session`] owns a reference to an injected [`Engine`] collaborator
//! and drives the Stopped/Running/Paused state machine over it. Events
//! flow from the engine through the receiver handed to [`Session::new`]
//! and are relayed to subscribers by [`Session::run`], which the embedding
//! application spawns once, exactly like a connection message loop.
//!
//! Every mutating operation evaluates the capability gate first and fails
//! with [`Error::CapabilityUnavailable`] before anything reaches the
//! engine. Request/response operations additionally hold the single
//! pending-request slot; overlapping calls are rejected with
//! [`Error::OperationPending`], never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arbridge_protocol::{
    EventKind, PlaneDetection, SessionEvent, TrackingConfiguration, Transform, VideoFormat,
    WorldAlignment,
};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::capability::{self, DeviceProfile, UnavailabilityReason};
use crate::engine::{Engine, SurfaceHandle};
use crate::error::{Error, Result};
use crate::events::{EventBus, Subscription};

/// Resolve a verbatim configuration identifier against the catalog.
///
/// Applications that receive configuration names over a script or bridge
/// boundary funnel them through here; an identifier outside the catalog is
/// [`Error::UnknownConfiguration`], never a silent fallback.
pub fn parse_configuration(identifier: &str) -> Result<TrackingConfiguration> {
    identifier
        .parse()
        .map_err(|_| Error::UnknownConfiguration(identifier.to_string()))
}

/// Session life-cycle state. Transitions happen only through [`Session`]
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Running,
    Paused,
}

struct StateData {
    state: SessionState,
    configuration: Option<TrackingConfiguration>,
}

pub(crate) struct SessionInner {
    pub(crate) engine: Arc<dyn Engine>,
    profile: DeviceProfile,
    bus: EventBus,
    state: Mutex<StateData>,
    /// Single request/response slot; see [`Session::claim_pending`].
    pending: AtomicBool,
    /// Bumped on pause/resume/stop to invalidate camera texture handles.
    pub(crate) texture_epoch: AtomicU64,
    event_rx: tokio::sync::Mutex<Option<UnboundedReceiver<SessionEvent>>>,
}

/// Application-facing handle to one AR session.
///
/// Cheap to clone; all clones share the same state and event bus.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

/// Releases the pending-request slot when the engine call resolves,
/// whichever way it resolves.
pub(crate) struct PendingGuard<'a> {
    pending: &'a AtomicBool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}

impl Session {
    /// Create a session over an injected engine.
    ///
    /// `events` is the engine's end of the life-cycle event channel; the
    /// engine side keeps the sender. The session starts Stopped.
    pub fn new(
        engine: Arc<dyn Engine>,
        profile: DeviceProfile,
        events: UnboundedReceiver<SessionEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                engine,
                profile,
                bus: EventBus::new(),
                state: Mutex::new(StateData {
                    state: SessionState::Stopped,
                    configuration: None,
                }),
                pending: AtomicBool::new(false),
                texture_epoch: AtomicU64::new(0),
                event_rx: tokio::sync::Mutex::new(Some(events)),
            }),
        }
    }

    /// Run the event dispatch loop.
    ///
    /// Consumes engine events and relays each to its channel's listeners.
    /// All delivery happens on this loop, so listener invocations never
    /// overlap. Spawn it in a background task; it ends when the engine
    /// drops its sender.
    pub async fn run(&self) {
        // Take the receiver out of the Option (can only be called once)
        let mut event_rx = self
            .inner
            .event_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once");

        while let Some(event) = event_rx.recv().await {
            tracing::trace!(target: "arbridge.session", channel = %event.kind(), "engine event");
            self.inner.bus.dispatch(&event);
        }

        tracing::debug!(target: "arbridge.session", "event loop ended (engine channel closed)");
    }

    // --- capability gate ---------------------------------------------------

    /// True iff every availability predicate passes. Pure; re-evaluated on
    /// every call against fresh engine flags.
    pub fn is_available(&self) -> bool {
        self.availability().is_ok()
    }

    /// The first failing availability predicate, or `None` when available.
    pub fn unavailability_reason(&self) -> Option<UnavailabilityReason> {
        self.availability().err()
    }

    fn availability(&self) -> std::result::Result<(), UnavailabilityReason> {
        capability::availability(&self.inner.profile, &self.inner.engine.capabilities())
    }

    pub(crate) fn ensure_available(&self) -> Result<()> {
        self.availability().map_err(Error::CapabilityUnavailable)
    }

    // --- pure capability queries -------------------------------------------

    /// Whether the engine can run `configuration`. Independent of session
    /// state.
    pub fn is_configuration_supported(&self, configuration: TrackingConfiguration) -> bool {
        self.inner
            .engine
            .capabilities()
            .configuration_available(configuration)
    }

    /// Capture formats available under `configuration`. Empty for an
    /// unsupported configuration, never an error.
    pub fn supported_video_formats(
        &self,
        configuration: TrackingConfiguration,
    ) -> Vec<VideoFormat> {
        self.inner.engine.supported_video_formats(configuration)
    }

    /// Engine version string.
    pub fn engine_version(&self) -> String {
        self.inner.engine.capabilities().version
    }

    /// Whether face tracking (front camera) is available.
    pub fn is_front_camera_available(&self) -> bool {
        self.is_configuration_supported(TrackingConfiguration::Face)
    }

    /// Whether world tracking (rear camera) is available.
    pub fn is_rear_camera_available(&self) -> bool {
        self.is_configuration_supported(TrackingConfiguration::World)
    }

    // --- state -------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.inner.state.lock().state
    }

    /// The configuration the session currently runs under, if any.
    pub fn configuration(&self) -> Option<TrackingConfiguration> {
        self.inner.state.lock().configuration
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub(crate) fn invalid_transition(&self, operation: &'static str) -> Error {
        Error::InvalidStateTransition {
            operation,
            state: self.state(),
        }
    }

    pub(crate) fn claim_pending(&self, operation: &'static str) -> Result<PendingGuard<'_>> {
        if self.inner.pending.swap(true, Ordering::SeqCst) {
            return Err(Error::OperationPending(operation));
        }
        Ok(PendingGuard {
            pending: &self.inner.pending,
        })
    }

    fn bump_texture_epoch(&self) {
        self.inner.texture_epoch.fetch_add(1, Ordering::SeqCst);
    }

    // --- life-cycle --------------------------------------------------------

    /// Start producing frames into `surface` under `configuration`.
    ///
    /// Valid only from Stopped. Transitions to Running only once the
    /// engine acknowledges; on rejection the session stays Stopped and the
    /// error is returned here.
    pub async fn start(
        &self,
        surface: SurfaceHandle,
        configuration: TrackingConfiguration,
    ) -> Result<()> {
        self.ensure_available()?;
        let _guard = self.claim_pending("start")?;
        if self.state() != SessionState::Stopped {
            return Err(self.invalid_transition("start"));
        }
        tracing::debug!(target: "arbridge.session", configuration = %configuration, "starting session");
        self.inner.engine.start(surface, configuration).await?;
        let mut state = self.inner.state.lock();
        state.state = SessionState::Running;
        state.configuration = Some(configuration);
        Ok(())
    }

    /// Tear down engine resources and return to Stopped.
    ///
    /// Idempotent: calling from Stopped is an Ok no-op that never reaches
    /// the engine.
    pub async fn stop(&self) -> Result<()> {
        self.ensure_available()?;
        let _guard = self.claim_pending("stop")?;
        if self.state() == SessionState::Stopped {
            return Ok(());
        }
        tracing::debug!(target: "arbridge.session", "stopping session");
        self.inner.engine.stop().await?;
        let mut state = self.inner.state.lock();
        state.state = SessionState::Stopped;
        state.configuration = None;
        drop(state);
        self.bump_texture_epoch();
        Ok(())
    }

    /// Suspend frame production without releasing resources. Running only.
    ///
    /// Fire-and-forget: engine-side failure surfaces later as a
    /// `didFailWithError` event. Invalidates camera texture handles.
    pub fn pause(&self) -> Result<()> {
        self.ensure_available()?;
        {
            let mut state = self.inner.state.lock();
            if state.state != SessionState::Running {
                return Err(Error::InvalidStateTransition {
                    operation: "pause",
                    state: state.state,
                });
            }
            state.state = SessionState::Paused;
        }
        self.inner.engine.pause();
        self.bump_texture_epoch();
        Ok(())
    }

    /// Resume frame production after a pause. Paused only; the
    /// configuration is unchanged. Invalidates camera texture handles.
    pub fn resume(&self) -> Result<()> {
        self.ensure_available()?;
        {
            let mut state = self.inner.state.lock();
            if state.state != SessionState::Paused {
                return Err(Error::InvalidStateTransition {
                    operation: "resume",
                    state: state.state,
                });
            }
            state.state = SessionState::Running;
        }
        self.inner.engine.resume();
        self.bump_texture_epoch();
        Ok(())
    }

    /// Clear tracking state (anchors, world origin) in place. Running
    /// only; the session stays Running.
    pub fn reset(&self) -> Result<()> {
        self.ensure_available()?;
        if !self.is_running() {
            return Err(self.invalid_transition("reset"));
        }
        self.inner.engine.reset();
        Ok(())
    }

    /// Swap the active configuration. Valid while Running or Paused.
    ///
    /// The swap is atomic from the engine's perspective: a single engine
    /// call, and no frame is delivered under a mixed configuration. The
    /// stored configuration changes only on acknowledgement.
    pub async fn reconfigure(&self, configuration: TrackingConfiguration) -> Result<()> {
        self.ensure_available()?;
        let _guard = self.claim_pending("reconfigure")?;
        let state = self.state();
        if !matches!(state, SessionState::Running | SessionState::Paused) {
            return Err(Error::InvalidStateTransition {
                operation: "reconfigure",
                state,
            });
        }
        tracing::debug!(target: "arbridge.session", configuration = %configuration, "reconfiguring");
        self.inner.engine.set_configuration(configuration).await?;
        self.inner.state.lock().configuration = Some(configuration);
        Ok(())
    }

    /// Rebind the session coordinate origin. Running only.
    pub async fn set_world_origin(&self, transform: Transform) -> Result<()> {
        self.ensure_available()?;
        let _guard = self.claim_pending("set_world_origin")?;
        if !self.is_running() {
            return Err(self.invalid_transition("set_world_origin"));
        }
        self.inner.engine.set_world_origin(transform).await?;
        Ok(())
    }

    // --- engine setting proxies --------------------------------------------
    //
    // Setters gate on capability, then proxy the engine in every session
    // state: with no session active the engine records the value as the
    // default for the next run. Getters read the engine's current value
    // directly.

    /// Whether the engine captures audio alongside frames.
    pub fn provides_audio_data(&self) -> bool {
        self.inner.engine.provides_audio_data()
    }

    /// Enable or disable audio capture. With no active session the
    /// engine keeps the value as the default for the next run.
    pub fn set_provides_audio_data(&self, value: bool) -> Result<()> {
        self.ensure_available()?;
        self.inner.engine.set_provides_audio_data(value);
        Ok(())
    }

    /// Whether the engine estimates scene lighting per frame.
    pub fn light_estimation_enabled(&self) -> bool {
        self.inner.engine.light_estimation_enabled()
    }

    /// Enable or disable light estimation. With no active session the
    /// engine keeps the value as the default for the next run.
    pub fn set_light_estimation_enabled(&self, value: bool) -> Result<()> {
        self.ensure_available()?;
        self.inner.engine.set_light_estimation_enabled(value);
        Ok(())
    }

    /// Whether the rear camera autofocuses.
    pub fn auto_focus_enabled(&self) -> bool {
        self.inner.engine.auto_focus_enabled()
    }

    /// Enable or disable autofocus. With no active session the engine
    /// keeps the value as the default for the next run.
    pub fn set_auto_focus_enabled(&self, value: bool) -> Result<()> {
        self.ensure_available()?;
        self.inner.engine.set_auto_focus_enabled(value);
        Ok(())
    }

    /// How the session coordinate system is anchored to the world.
    pub fn world_alignment(&self) -> WorldAlignment {
        self.inner.engine.world_alignment()
    }

    /// Set the world alignment mode. With no active session the engine
    /// keeps the value as the default for the next run.
    pub fn set_world_alignment(&self, value: WorldAlignment) -> Result<()> {
        self.ensure_available()?;
        self.inner.engine.set_world_alignment(value);
        Ok(())
    }

    /// Which plane classes the engine currently detects.
    pub fn plane_detection(&self) -> PlaneDetection {
        self.inner.engine.plane_detection()
    }

    /// Set the plane detection mode. With no active session the engine
    /// keeps the value as the default for the next run.
    pub fn set_plane_detection(&self, value: PlaneDetection) -> Result<()> {
        self.ensure_available()?;
        self.inner.engine.set_plane_detection(value);
        Ok(())
    }

    // --- events ------------------------------------------------------------

    /// The session's event bus.
    pub fn events(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn on_frame_did_update(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.bus.subscribe(EventKind::FrameDidUpdate, listener)
    }

    pub fn on_did_fail_with_error(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .bus
            .subscribe(EventKind::DidFailWithError, listener)
    }

    pub fn on_anchors_did_update(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .bus
            .subscribe(EventKind::AnchorsDidUpdate, listener)
    }

    pub fn on_camera_did_change_tracking_state(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .bus
            .subscribe(EventKind::CameraDidChangeTrackingState, listener)
    }

    pub fn on_session_was_interrupted(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .bus
            .subscribe(EventKind::SessionWasInterrupted, listener)
    }

    pub fn on_session_interruption_ended(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .bus
            .subscribe(EventKind::SessionInterruptionEnded, listener)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("configuration", &self.configuration())
            .finish()
    }
}
