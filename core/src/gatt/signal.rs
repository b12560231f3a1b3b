//! Completion signal shared between the waiting thread and the radio callback.
//!
//! A counting semaphore guarded by a `parking_lot` mutex and condvar. The
//! callback stores the received value and adds a permit under the same lock,
//! so a waiter that observes the permit always observes the value with it.
//!
//! Three handles point at one shared signal:
//!
//! - the owning [`Operation`](super::Operation), which waits;
//! - [`Completion`], handed to the radio binding;
//! - [`Interrupter`], handed to whoever may cancel the wait.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::attribute::AttributeId;
use crate::config::MismatchPolicy;

/// What happened to a single callback invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Identifier matched; permit released.
    Matched,
    /// Identifier differed; permit released anyway.
    Mismatched,
    /// Identifier differed and the policy is strict; nothing released.
    Ignored,
}

impl Delivery {
    /// True if the callback released a permit
    pub fn released(&self) -> bool {
        !matches!(self, Delivery::Ignored)
    }
}

/// Result of one timed wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WaitResult {
    Acquired { value: Vec<u8>, received_id: Option<Uuid> },
    TimedOut,
    Interrupted,
}

#[derive(Debug, Default)]
struct SignalState {
    permits: usize,
    value: Vec<u8>,
    received_id: Option<Uuid>,
    interrupt_requested: bool,
    settled: bool,
    callbacks: usize,
}

#[derive(Debug)]
pub(crate) struct SignalShared {
    target: AttributeId,
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl SignalShared {
    pub(crate) fn new(target: AttributeId) -> Arc<Self> {
        Arc::new(Self {
            target,
            state: Mutex::new(SignalState::default()),
            cond: Condvar::new(),
        })
    }

    /// Block until a permit, an interrupt, or `timeout` elapses.
    ///
    /// An interrupt that is already pending wins over an available permit.
    pub(crate) fn wait(&self, timeout: Duration) -> WaitResult {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        let result = loop {
            if state.interrupt_requested {
                state.interrupt_requested = false;
                break WaitResult::Interrupted;
            }
            if state.permits > 0 {
                state.permits -= 1;
                break WaitResult::Acquired {
                    value: state.value.clone(),
                    received_id: state.received_id,
                };
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        break WaitResult::TimedOut;
                    }
                    self.cond.wait_until(&mut state, deadline);
                }
                None => self.cond.wait(&mut state),
            }
        };

        state.settled = true;
        result
    }

    /// Permits not yet consumed by a waiter
    #[cfg(test)]
    pub(crate) fn surplus_permits(&self) -> usize {
        self.state.lock().permits
    }

    pub(crate) fn callback_count(&self) -> usize {
        self.state.lock().callbacks
    }

    fn complete(&self, received: Uuid, value: Vec<u8>, policy: MismatchPolicy) -> Delivery {
        let delivery = if self.target.matches(&received) {
            Delivery::Matched
        } else {
            match policy {
                MismatchPolicy::Tolerate => Delivery::Mismatched,
                MismatchPolicy::Strict => Delivery::Ignored,
            }
        };

        let mut state = self.state.lock();
        state.callbacks += 1;

        match delivery {
            Delivery::Mismatched => warn!(
                "GATT callback for {} completed operation on {}",
                received, self.target
            ),
            Delivery::Ignored => {
                warn!(
                    "Ignoring GATT callback for {} while waiting on {}",
                    received, self.target
                );
                return delivery;
            }
            Delivery::Matched => {}
        }

        if state.settled {
            debug!("Late GATT callback for {} absorbed", self.target);
        }

        state.value = value;
        state.received_id = Some(received);
        state.permits += 1;
        drop(state);

        self.cond.notify_one();
        delivery
    }

    fn interrupt(&self) {
        let mut state = self.state.lock();
        if state.settled {
            return;
        }
        state.interrupt_requested = true;
        drop(state);
        self.cond.notify_all();
    }
}

/// Callback-side handle: the radio binding calls [`Completion::complete`]
/// when the hardware reports the operation finished.
#[derive(Debug, Clone)]
pub struct Completion {
    shared: Arc<SignalShared>,
    policy: MismatchPolicy,
}

impl Completion {
    pub(crate) fn new(shared: Arc<SignalShared>, policy: MismatchPolicy) -> Self {
        Self { shared, policy }
    }

    /// Deliver a hardware completion. Safe from any thread, any number of
    /// times, before or after the waiter gave up.
    pub fn complete(&self, received: Uuid, value: Vec<u8>) -> Delivery {
        self.shared.complete(received, value, self.policy)
    }

    /// Identifier of the operation this handle completes
    pub fn target(&self) -> AttributeId {
        self.shared.target
    }
}

/// Cancellation handle for a waiting [`Operation`](super::Operation).
///
/// Interrupting only unblocks the waiter. The hardware request stays issued
/// and its eventual callback is absorbed.
#[derive(Debug, Clone)]
pub struct Interrupter {
    shared: Arc<SignalShared>,
}

impl Interrupter {
    pub(crate) fn new(shared: Arc<SignalShared>) -> Self {
        Self { shared }
    }

    /// Request the waiting thread to stop waiting. No effect once the
    /// operation has settled.
    pub fn interrupt(&self) {
        self.shared.interrupt();
    }
}
