// Integration test for bindings that own a single platform callback object
//
// FakeStack mimics a platform BLE stack: requests go onto a channel, a
// dedicated callback thread services them and reports through the
// CallbackRouter without knowing which operation is waiting.

use pumplink_core::gatt::{
    AttributeId, CallbackRouter, Completion, ExecutionEngine, GattRadio, GattRequest, Operation,
    Outcome,
};
use pumplink_core::{EngineConfig, RadioError};
use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use parking_lot::Mutex;

enum StackEvent {
    Request(GattRequest),
    /// Replay the last callback, as some stacks do on reconnect
    Duplicate,
    Shutdown,
}

struct FakeStack {
    router: Arc<CallbackRouter>,
    tx: Mutex<Sender<StackEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl FakeStack {
    fn new(values: HashMap<AttributeId, Vec<u8>>, latency: Duration) -> Self {
        let router = Arc::new(CallbackRouter::new());
        let (tx, rx) = mpsc::channel::<StackEvent>();
        let callback_router = router.clone();

        let worker = thread::spawn(move || {
            let mut values = values;
            let mut last: Option<(GattRequest, Vec<u8>)> = None;
            while let Ok(event) = rx.recv() {
                match event {
                    StackEvent::Request(request) => {
                        thread::sleep(latency);
                        let value = match &request {
                            GattRequest::ReadCharacteristic { characteristic } => {
                                values.get(characteristic).cloned().unwrap_or_default()
                            }
                            GattRequest::WriteCharacteristic { characteristic, value } => {
                                values.insert(*characteristic, value.clone());
                                value.clone()
                            }
                            GattRequest::WriteDescriptor { value, .. } => value.clone(),
                        };
                        deliver(&callback_router, &request, value.clone());
                        last = Some((request, value));
                    }
                    StackEvent::Duplicate => {
                        if let Some((request, value)) = &last {
                            deliver(&callback_router, request, value.clone());
                        }
                    }
                    StackEvent::Shutdown => break,
                }
            }
        });

        Self {
            router,
            tx: Mutex::new(tx),
            worker: Some(worker),
        }
    }

    fn replay_last(&self) {
        self.tx.lock().send(StackEvent::Duplicate).unwrap();
    }
}

fn deliver(router: &CallbackRouter, request: &GattRequest, value: Vec<u8>) {
    let id = request.target().uuid();
    match request {
        GattRequest::ReadCharacteristic { .. } => router.on_characteristic_read(id, value),
        GattRequest::WriteCharacteristic { .. } => router.on_characteristic_write(id, value),
        GattRequest::WriteDescriptor { .. } => router.on_descriptor_write(id, value),
    };
}

impl GattRadio for FakeStack {
    fn issue(&self, request: &GattRequest, completion: Completion) -> Result<(), RadioError> {
        self.router.arm(completion);
        self.tx
            .lock()
            .send(StackEvent::Request(request.clone()))
            .map_err(|_| RadioError::NotConnected)
    }
}

impl Drop for FakeStack {
    fn drop(&mut self) {
        let _ = self.tx.lock().send(StackEvent::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn engine() -> ExecutionEngine {
    ExecutionEngine::new(EngineConfig {
        read_timeout_ms: 2_000,
        write_timeout_ms: 2_000,
        descriptor_write_timeout_ms: 2_000,
        grace_delay_ms: 1,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_sequential_operations_through_router() {
    let reservoir = AttributeId::from_short(0x2A19);
    let mut values = HashMap::new();
    values.insert(reservoir, vec![0x64]);
    let stack = FakeStack::new(values, Duration::from_millis(2));
    let engine = engine();

    let mut read = Operation::read(reservoir.uuid()).unwrap();
    assert_eq!(
        engine.execute(&mut read, &stack).unwrap(),
        Outcome::Success(vec![0x64])
    );

    let mut write = Operation::write(reservoir.uuid(), vec![0x32]).unwrap();
    assert!(engine.execute(&mut write, &stack).unwrap().is_success());

    let mut reread = Operation::read(reservoir.uuid()).unwrap();
    assert_eq!(
        engine.execute(&mut reread, &stack).unwrap(),
        Outcome::Success(vec![0x32])
    );

    let mut notify = Operation::enable_notifications(reservoir.uuid()).unwrap();
    assert_eq!(
        engine.execute(&mut notify, &stack).unwrap(),
        Outcome::Success(vec![0x01, 0x00])
    );
}

#[test]
fn test_replayed_callback_lands_on_settled_operation() {
    let status = AttributeId::from_short(0x2A00);
    let mut values = HashMap::new();
    values.insert(status, vec![0x01]);
    let stack = FakeStack::new(values, Duration::ZERO);
    let engine = engine();

    let mut first = Operation::read(status.uuid()).unwrap();
    assert!(engine.execute(&mut first, &stack).unwrap().is_success());

    stack.replay_last();
    // Give the callback thread time to process the replay.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(first.callback_count(), 2);
    assert_eq!(first.value(), Some(&[0x01][..]));

    let mut second = Operation::read(status.uuid()).unwrap();
    assert_eq!(
        engine.execute(&mut second, &stack).unwrap(),
        Outcome::Success(vec![0x01])
    );
    assert_eq!(second.callback_count(), 1);
}
