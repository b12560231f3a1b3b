//! A single GATT operation and its terminal state.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::attribute::{AttributeId, CLIENT_CHARACTERISTIC_CONFIG};
use super::signal::{Completion, Interrupter, SignalShared, WaitResult};
use crate::config::MismatchPolicy;
use crate::error::OperationError;

/// Maximum length of an attribute value (ATT protocol limit)
pub const MAX_ATTRIBUTE_LEN: usize = 512;

/// CCCD value enabling notifications
pub const ENABLE_NOTIFICATION_VALUE: [u8; 2] = [0x01, 0x00];

/// Kind of GATT action, used to select the default timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
    DescriptorWrite,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::DescriptorWrite => write!(f, "descriptor write"),
        }
    }
}

/// Request handed to the radio binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattRequest {
    ReadCharacteristic {
        characteristic: AttributeId,
    },
    WriteCharacteristic {
        characteristic: AttributeId,
        value: Vec<u8>,
    },
    WriteDescriptor {
        characteristic: AttributeId,
        descriptor: AttributeId,
        value: Vec<u8>,
    },
}

impl GattRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::ReadCharacteristic { .. } => OperationKind::Read,
            Self::WriteCharacteristic { .. } => OperationKind::Write,
            Self::WriteDescriptor { .. } => OperationKind::DescriptorWrite,
        }
    }

    /// Attribute the completion callback is expected to name
    pub fn target(&self) -> AttributeId {
        match self {
            Self::ReadCharacteristic { characteristic }
            | Self::WriteCharacteristic { characteristic, .. } => *characteristic,
            Self::WriteDescriptor { descriptor, .. } => *descriptor,
        }
    }
}

/// Lifecycle of an operation. Every state except `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Completed,
    TimedOut,
    Interrupted,
    /// The radio refused to issue the request.
    Rejected,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Completed => write!(f, "Completed"),
            Self::TimedOut => write!(f, "TimedOut"),
            Self::Interrupted => write!(f, "Interrupted"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Terminal outcome returned by [`ExecutionEngine::execute`](super::ExecutionEngine::execute)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Completion arrived; carries the value delivered by the callback.
    Success(Vec<u8>),
    Timeout,
    Interrupted,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The delivered value, if the outcome is a success
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// One GATT read or write, from construction until its single execution.
///
/// The operation is never reused. A second `execute` fails with
/// [`OperationError::AlreadyExecuted`].
#[derive(Debug)]
pub struct Operation {
    request: GattRequest,
    signal: Arc<SignalShared>,
    state: OperationState,
    timeout: Option<Duration>,
    value: Option<Vec<u8>>,
    received_id: Option<Uuid>,
}

impl Operation {
    /// Read when `payload` is `None`, write otherwise.
    pub fn new(target: Uuid, payload: Option<Vec<u8>>) -> Result<Self, OperationError> {
        match payload {
            None => Self::read(target),
            Some(payload) => Self::write(target, payload),
        }
    }

    pub fn read(characteristic: Uuid) -> Result<Self, OperationError> {
        let characteristic = AttributeId::new(characteristic)?;
        Ok(Self::from_request(GattRequest::ReadCharacteristic { characteristic }))
    }

    pub fn write(characteristic: Uuid, value: Vec<u8>) -> Result<Self, OperationError> {
        let characteristic = AttributeId::new(characteristic)?;
        check_len(&value)?;
        Ok(Self::from_request(GattRequest::WriteCharacteristic {
            characteristic,
            value,
        }))
    }

    pub fn descriptor_write(
        characteristic: Uuid,
        descriptor: Uuid,
        value: Vec<u8>,
    ) -> Result<Self, OperationError> {
        let characteristic = AttributeId::new(characteristic)?;
        let descriptor = AttributeId::new(descriptor)?;
        check_len(&value)?;
        Ok(Self::from_request(GattRequest::WriteDescriptor {
            characteristic,
            descriptor,
            value,
        }))
    }

    /// Write the CCCD of `characteristic` to turn notifications on
    pub fn enable_notifications(characteristic: Uuid) -> Result<Self, OperationError> {
        Self::descriptor_write(
            characteristic,
            CLIENT_CHARACTERISTIC_CONFIG.uuid(),
            ENABLE_NOTIFICATION_VALUE.to_vec(),
        )
    }

    fn from_request(request: GattRequest) -> Self {
        Self {
            signal: SignalShared::new(request.target()),
            request,
            state: OperationState::Pending,
            timeout: None,
            value: None,
            received_id: None,
        }
    }

    /// Override the per-kind default timeout for this operation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn request(&self) -> &GattRequest {
        &self.request
    }

    pub fn kind(&self) -> OperationKind {
        self.request.kind()
    }

    pub fn target(&self) -> AttributeId {
        self.request.target()
    }

    /// Per-operation override, if any
    pub fn configured_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn timed_out(&self) -> bool {
        self.state == OperationState::TimedOut
    }

    pub fn interrupted(&self) -> bool {
        self.state == OperationState::Interrupted
    }

    /// Value delivered by the completing callback. `None` unless completed.
    pub fn value(&self) -> Option<&[u8]> {
        match self.state {
            OperationState::Completed => self.value.as_deref(),
            _ => None,
        }
    }

    /// Identifier the completing callback carried, for callers that want to
    /// re-validate a tolerated mismatch.
    pub fn received_id(&self) -> Option<Uuid> {
        self.received_id
    }

    /// Handle for the radio binding; clone freely.
    pub fn completion(&self, policy: MismatchPolicy) -> Completion {
        Completion::new(self.signal.clone(), policy)
    }

    /// Handle another thread can use to cancel the wait
    pub fn interrupter(&self) -> Interrupter {
        Interrupter::new(self.signal.clone())
    }

    /// Completion callbacks delivered so far, late ones included
    pub fn callback_count(&self) -> usize {
        self.signal.callback_count()
    }

    pub(crate) fn wait(&self, timeout: Duration) -> WaitResult {
        self.signal.wait(timeout)
    }

    pub(crate) fn settle(&mut self, result: &WaitResult) -> Outcome {
        match result {
            WaitResult::Acquired { value, received_id } => {
                self.state = OperationState::Completed;
                self.value = Some(value.clone());
                self.received_id = *received_id;
                Outcome::Success(value.clone())
            }
            WaitResult::TimedOut => {
                self.state = OperationState::TimedOut;
                Outcome::Timeout
            }
            WaitResult::Interrupted => {
                self.state = OperationState::Interrupted;
                Outcome::Interrupted
            }
        }
    }

    pub(crate) fn mark_rejected(&mut self) {
        self.state = OperationState::Rejected;
    }
}

fn check_len(value: &[u8]) -> Result<(), OperationError> {
    if value.len() > MAX_ATTRIBUTE_LEN {
        return Err(OperationError::PayloadTooLarge {
            len: value.len(),
            max: MAX_ATTRIBUTE_LEN,
        });
    }
    Ok(())
}
