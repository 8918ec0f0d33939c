//! Application hooks and the queue feeding them

use heapless::Vec;

use super::state::{JoinState, SendState};
use crate::config::device::DeviceClass;
use crate::lorawan::mac::MAX_APP_PAYLOAD;

/// Capacity of the event queue drained by `process()`
pub const EVENT_QUEUE_LEN: usize = 8;

/// Callback resolving an asynchronous join
pub type JoinCallback = fn(JoinState);

/// Callback resolving an asynchronous send
pub type SendCallback = fn(SendState);

/// Network-originated notifications
///
/// Every method defaults to a no-op, so a handler only overrides what it
/// cares about. Methods run inside `Session::process`, never from an
/// interrupt.
pub trait EventHandler {
    /// Application data received on `port`
    fn on_data_reception(&mut self, _port: u8, _data: &[u8]) {}

    /// A join completed successfully
    fn on_join_success(&mut self) {}

    /// The network confirmed a device class change
    fn on_confirm_class(&mut self, _class: DeviceClass) {}

    /// The network wants an uplink soon (MAC answers, pending data or an ACK)
    fn on_tx_needed(&mut self) {}

    /// The last confirmed uplink was acknowledged
    fn on_uplink_ack_confirmed(&mut self) {}
}

/// Handler ignoring every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

/// Queued work for the end of `process()`
#[derive(Debug, Clone)]
pub(crate) enum Event {
    JoinCompleted(JoinCallback, JoinState),
    SendCompleted(SendCallback, SendState),
    DataReceived {
        port: u8,
        payload: Vec<u8, MAX_APP_PAYLOAD>,
    },
    JoinSuccess,
    ClassConfirmed(DeviceClass),
    TxNeeded,
    UplinkAckConfirmed,
}

impl Event {
    pub(crate) fn dispatch<H: EventHandler>(self, handler: &mut H) {
        match self {
            Event::JoinCompleted(callback, state) => callback(state),
            Event::SendCompleted(callback, state) => callback(state),
            Event::DataReceived { port, payload } => handler.on_data_reception(port, &payload),
            Event::JoinSuccess => handler.on_join_success(),
            Event::ClassConfirmed(class) => handler.on_confirm_class(class),
            Event::TxNeeded => handler.on_tx_needed(),
            Event::UplinkAckConfirmed => handler.on_uplink_ack_confirmed(),
        }
    }
}
