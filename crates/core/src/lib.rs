// arbridge: application-facing facade over a native AR tracking engine.
//
// The engine itself (tracking, anchor detection, hit testing) is an external
// collaborator injected behind the `Engine` trait; this crate only gates
// feature availability, drives the session life-cycle, and relays events.

pub use arbridge_protocol as protocol;

pub mod capability;
pub mod engine;
pub mod error;
pub mod events;
pub mod fake;
pub mod frame;
pub mod session;

/// Oldest device year class the engine's chip requirement admits.
pub const MIN_DEVICE_YEAR_CLASS: u16 = 2015;

/// Platform family the engine ships on.
pub const SUPPORTED_PLATFORM: &str = "ios";

pub use capability::{DeviceProfile, UnavailabilityReason};
pub use engine::{Engine, EngineCapabilities, SurfaceHandle};
pub use error::{Error, Result};
pub use events::{EventBus, Subscription};
pub use frame::CameraTexture;
pub use session::{Session, SessionState, parse_configuration};
