// In-process loopback radio for exercising the engine without hardware
//
// Every request is answered from a freshly spawned thread after a fixed
// latency, which is how a platform stack's callback thread behaves from the
// engine's point of view.

use parking_lot::Mutex;
use pumplink_core::gatt::{AttributeId, Completion, GattRadio, GattRequest};
use pumplink_core::RadioError;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// How the loopback answers
#[derive(Debug, Clone, Default)]
pub struct LoopbackBehavior {
    /// Delay before the callback fires
    pub latency: Duration,
    /// Never call back
    pub drop_callbacks: bool,
    /// Call back twice
    pub duplicate: bool,
    /// Report this identifier instead of the request's target
    pub reply_id: Option<Uuid>,
}

pub struct LoopbackRadio {
    behavior: LoopbackBehavior,
    attributes: Mutex<HashMap<AttributeId, Vec<u8>>>,
}

impl LoopbackRadio {
    pub fn new(behavior: LoopbackBehavior) -> Self {
        Self {
            behavior,
            attributes: Mutex::new(HashMap::new()),
        }
    }

    /// Seed the value a read of `id` returns
    pub fn set_value(&self, id: AttributeId, value: Vec<u8>) {
        self.attributes.lock().insert(id, value);
    }
}

impl GattRadio for LoopbackRadio {
    fn issue(&self, request: &GattRequest, completion: Completion) -> Result<(), RadioError> {
        let value = match request {
            GattRequest::ReadCharacteristic { characteristic } => {
                self.attributes.lock().get(characteristic).cloned().unwrap_or_default()
            }
            GattRequest::WriteCharacteristic {
                characteristic,
                value,
            } => {
                self.attributes.lock().insert(*characteristic, value.clone());
                value.clone()
            }
            GattRequest::WriteDescriptor {
                descriptor, value, ..
            } => {
                self.attributes.lock().insert(*descriptor, value.clone());
                value.clone()
            }
        };

        if self.behavior.drop_callbacks {
            debug!("Loopback dropping callback for {}", request.target());
            return Ok(());
        }

        let id = self.behavior.reply_id.unwrap_or_else(|| request.target().uuid());
        let latency = self.behavior.latency;
        let repeats = if self.behavior.duplicate { 2 } else { 1 };

        thread::Builder::new()
            .name("loopback-callback".to_string())
            .spawn(move || {
                thread::sleep(latency);
                for _ in 0..repeats {
                    let delivery = completion.complete(id, value.clone());
                    debug!("Loopback callback for {}: {:?}", id, delivery);
                }
            })
            .map_err(|e| RadioError::Refused(format!("callback thread: {}", e)))?;

        Ok(())
    }
}
