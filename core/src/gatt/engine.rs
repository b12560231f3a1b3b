//! Execution engine: issue one request, block on its completion.
//!
//! ```text
//!   caller ──execute──▶ GattRadio::issue ──▶ binding (async)
//!      │                                        │
//!      └── wait(timeout) ◀── Completion::complete ◀┘  (callback thread)
//! ```

use std::thread;
use tracing::{debug, error};

use super::operation::{GattRequest, Operation, OperationState, Outcome};
use super::signal::Completion;
use crate::config::EngineConfig;
use crate::error::{ConfigError, OperationError, RadioError};

/// Radio binding boundary.
///
/// `issue` must not block on the hardware: it starts the request and returns.
/// The binding later calls [`Completion::complete`] from whatever thread its
/// stack uses. The binding supports one outstanding request at a time;
/// serializing requests is the caller's job.
pub trait GattRadio: Send + Sync {
    fn issue(&self, request: &GattRequest, completion: Completion) -> Result<(), RadioError>;
}

impl<R: GattRadio + ?Sized> GattRadio for &R {
    fn issue(&self, request: &GattRequest, completion: Completion) -> Result<(), RadioError> {
        (**self).issue(request, completion)
    }
}

impl<R: GattRadio + ?Sized> GattRadio for std::sync::Arc<R> {
    fn issue(&self, request: &GattRequest, completion: Completion) -> Result<(), RadioError> {
        (**self).issue(request, completion)
    }
}

/// Drives operations to a terminal outcome with bounded blocking
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Issue `operation` on `radio` and block until it completes, times out,
    /// or is interrupted.
    ///
    /// Timeout and interruption are `Ok` outcomes. `Err` means the request
    /// never reached the hardware, or the operation was already used.
    pub fn execute<R>(&self, operation: &mut Operation, radio: &R) -> Result<Outcome, OperationError>
    where
        R: GattRadio + ?Sized,
    {
        if operation.state() != OperationState::Pending {
            return Err(OperationError::AlreadyExecuted(operation.state()));
        }

        let kind = operation.kind();
        let target = operation.target();
        let timeout = operation
            .configured_timeout()
            .unwrap_or_else(|| self.config.timeout_for(kind));

        debug!("Issuing GATT {} for {} (timeout {:?})", kind, target, timeout);
        let completion = operation.completion(self.config.mismatch_policy);
        if let Err(reason) = radio.issue(operation.request(), completion) {
            error!("GATT {} for {} rejected: {}", kind, target, reason);
            operation.mark_rejected();
            return Err(OperationError::Rejected {
                target: target.to_string(),
                reason,
            });
        }

        let result = operation.wait(timeout);
        let outcome = operation.settle(&result);

        match &outcome {
            Outcome::Success(value) => {
                let grace = self.config.grace_delay();
                if !grace.is_zero() {
                    // Lets the binding's callback thread unwind before we continue.
                    thread::sleep(grace);
                }
                debug!("GATT {} for {} completed ({} bytes)", kind, target, value.len());
            }
            Outcome::Timeout => {
                error!("Timeout waiting for GATT {} on {} to complete", kind, target);
            }
            Outcome::Interrupted => {
                error!("Interrupted while waiting for GATT {} on {} to complete", kind, target);
            }
        }

        Ok(outcome)
    }
}
