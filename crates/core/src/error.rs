//! Error types for session control.
//!
//! One policy throughout the crate: capability failures are returned as
//! typed errors, never swallowed into no-ops, so the "gate fails" path is
//! as testable as the "gate passes" path. Engine rejections surface through
//! the async result of the call that caused them, never synchronously.

use arbridge_protocol::EngineFault;
use thiserror::Error;

use crate::capability::UnavailabilityReason;
use crate::session::SessionState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The capability gate failed; nothing reached the engine.
    #[error("AR is unavailable on this device: {0}")]
    CapabilityUnavailable(UnavailabilityReason),

    /// The operation is not allowed from the current session state.
    /// Always rejected synchronously.
    #[error("cannot {operation} from the {state:?} state")]
    InvalidStateTransition {
        operation: &'static str,
        state: SessionState,
    },

    /// An asynchronous engine call returned failure.
    #[error("engine rejected the request (code {code}): {message}")]
    EngineRejected { code: i32, message: String },

    /// The caller passed a configuration identifier the catalog does not
    /// contain.
    #[error("unknown configuration identifier: {0:?}")]
    UnknownConfiguration(String),

    /// A second request/response operation was issued while one is still
    /// awaiting engine acknowledgement. Overlapping calls are a usage
    /// error; they are rejected, never queued or merged.
    #[error("cannot {0} while another engine request is pending")]
    OperationPending(&'static str),
}

impl From<EngineFault> for Error {
    fn from(fault: EngineFault) -> Self {
        Error::EngineRejected {
            code: fault.code,
            message: fault.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_fault_converts_to_engine_rejected() {
        let fault = EngineFault {
            code: 102,
            message: "camera permission denied".into(),
        };
        match Error::from(fault) {
            Error::EngineRejected { code, message } => {
                assert_eq!(code, 102);
                assert_eq!(message, "camera permission denied");
            }
            other => panic!("expected EngineRejected, got {other:?}"),
        }
    }

    #[test]
    fn messages_name_the_operation_and_state() {
        let err = Error::InvalidStateTransition {
            operation: "pause",
            state: SessionState::Stopped,
        };
        assert_eq!(err.to_string(), "cannot pause from the Stopped state");

        let err = Error::OperationPending("reconfigure");
        assert!(err.to_string().contains("reconfigure"));
    }
}
