//! Blocking GATT operations over an asynchronous radio binding.
//!
//! - **attribute**: validated characteristic/descriptor identifiers
//! - **signal**: the completion semaphore shared with the callback thread
//! - **operation**: one read or write and its terminal state
//! - **engine**: issue, wait with timeout, report the outcome
//! - **router**: dispatch from a single platform callback object

pub mod attribute;
pub mod engine;
pub mod operation;
pub mod router;
pub mod signal;

pub use attribute::{AttributeId, BLUETOOTH_BASE_UUID, CLIENT_CHARACTERISTIC_CONFIG};
pub use engine::{ExecutionEngine, GattRadio};
pub use operation::{
    GattRequest, Operation, OperationKind, OperationState, Outcome, ENABLE_NOTIFICATION_VALUE,
    MAX_ATTRIBUTE_LEN,
};
pub use router::CallbackRouter;
pub use signal::{Completion, Delivery, Interrupter};
