// PumpLink Core — blocking GATT operations for pump communication
//
// The radio stack answers GATT requests on its own thread. Everything here
// exists to turn that into one call that returns success, timeout, or
// interruption, and never hangs.

pub mod config;
pub mod error;
pub mod gatt;

pub use config::{EngineConfig, MismatchPolicy};
pub use error::{ConfigError, OperationError, RadioError};
pub use gatt::{
    AttributeId, CallbackRouter, Completion, Delivery, ExecutionEngine, GattRadio, GattRequest,
    Interrupter, Operation, OperationKind, OperationState, Outcome,
};
