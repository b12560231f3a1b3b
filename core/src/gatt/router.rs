//! Callback routing for bindings with one process-wide GATT callback object.
//!
//! Platform stacks deliver every characteristic/descriptor completion to a
//! single callback object with no reference to the request that caused it.
//! The binding arms the router with the [`Completion`] it got from `issue`,
//! and forwards each platform callback through it.
//!
//! The armed completion stays in place until the next `arm`, so a late
//! callback lands on the operation that has already settled and is absorbed
//! there.

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::signal::{Completion, Delivery};

/// Single-slot dispatcher from platform callbacks to the current operation
#[derive(Debug, Default)]
pub struct CallbackRouter {
    current: Mutex<Option<Completion>>,
}

impl CallbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `completion` the receiver of subsequent callbacks.
    /// Returns the previously armed completion.
    pub fn arm(&self, completion: Completion) -> Option<Completion> {
        self.current.lock().replace(completion)
    }

    /// Drop the armed completion; later callbacks are discarded.
    pub fn disarm(&self) -> Option<Completion> {
        self.current.lock().take()
    }

    pub fn is_armed(&self) -> bool {
        self.current.lock().is_some()
    }

    pub fn on_characteristic_read(&self, characteristic: Uuid, value: Vec<u8>) -> Option<Delivery> {
        self.dispatch("characteristic read", characteristic, value)
    }

    pub fn on_characteristic_write(&self, characteristic: Uuid, value: Vec<u8>) -> Option<Delivery> {
        self.dispatch("characteristic write", characteristic, value)
    }

    pub fn on_descriptor_write(&self, descriptor: Uuid, value: Vec<u8>) -> Option<Delivery> {
        self.dispatch("descriptor write", descriptor, value)
    }

    /// `None` when nothing is armed
    fn dispatch(&self, event: &str, id: Uuid, value: Vec<u8>) -> Option<Delivery> {
        // Clone out so the completion runs without holding the slot lock.
        let completion = self.current.lock().clone();
        match completion {
            Some(completion) => Some(completion.complete(id, value)),
            None => {
                debug!("Dropping {} callback for {}: no operation armed", event, id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MismatchPolicy;
    use crate::gatt::attribute::AttributeId;
    use crate::gatt::Operation;

    #[test]
    fn test_unarmed_router_drops_callbacks() {
        let router = CallbackRouter::new();
        assert!(!router.is_armed());
        assert_eq!(
            router.on_characteristic_read(AttributeId::from_short(0x2A19).uuid(), vec![1]),
            None
        );
    }

    #[test]
    fn test_arm_replaces_previous() {
        let router = CallbackRouter::new();
        let first = Operation::read(AttributeId::from_short(0x2A19).uuid()).unwrap();
        let second = Operation::read(AttributeId::from_short(0x2A00).uuid()).unwrap();

        assert!(router.arm(first.completion(MismatchPolicy::Tolerate)).is_none());
        let previous = router
            .arm(second.completion(MismatchPolicy::Tolerate))
            .expect("first completion returned");
        assert_eq!(previous.target(), first.target());

        router.on_characteristic_read(second.target().uuid(), vec![2]);
        assert_eq!(first.callback_count(), 0);
        assert_eq!(second.callback_count(), 1);
    }

    #[test]
    fn test_disarm() {
        let router = CallbackRouter::new();
        let op = Operation::write(AttributeId::from_short(0x2A19).uuid(), vec![1]).unwrap();
        router.arm(op.completion(MismatchPolicy::Tolerate));

        assert!(router.disarm().is_some());
        assert_eq!(
            router.on_characteristic_write(op.target().uuid(), vec![]),
            None
        );
        assert_eq!(op.callback_count(), 0);
    }
}
