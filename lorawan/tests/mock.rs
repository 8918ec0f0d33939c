#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use embedded_hal::blocking::delay::DelayUs;
use heapless::Vec;
use lorawan::clock::TickClock;
use lorawan::config::DeviceClass;
use lorawan::lorawan::mac::{Downlink, JoinRequest, Mac, MacEvent, Uplink};
use lorawan::lorawan::region::RegionParams;
use lorawan::radio::traits::{Radio, RxConfig, TxConfig};
use lorawan::session::{EventHandler, JoinState, SendState};

/// Mock error type
#[derive(Debug, PartialEq, Eq)]
pub enum MockError {
    /// Generic error
    Error,
}

/// Mock radio for testing
pub struct MockRadio {
    pub transmitted: std::vec::Vec<Vec<u8, 256>>,
    pub rx_frames: VecDeque<Vec<u8, 256>>,
    pub last_tx: Option<TxConfig>,
    pub last_rx: Option<RxConfig>,
    pub sleeping: bool,
    pub rssi: i16,
    pub snr: i8,
}

impl MockRadio {
    /// Create new mock radio
    pub fn new() -> Self {
        Self {
            transmitted: std::vec::Vec::new(),
            rx_frames: VecDeque::new(),
            last_tx: None,
            last_rx: None,
            sleeping: true,
            rssi: -50,
            snr: 10,
        }
    }

    /// Queue a frame returned by a later receive call
    pub fn push_rx(&mut self, data: &[u8]) {
        let mut frame = Vec::new();
        frame.extend_from_slice(data).unwrap();
        self.rx_frames.push_back(frame);
    }

    /// Get last transmitted data
    pub fn get_last_tx(&self) -> Option<&[u8]> {
        self.transmitted.last().map(|v| v.as_slice())
    }
}

impl Radio for MockRadio {
    type Error = MockError;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn configure_tx(&mut self, config: TxConfig) -> Result<(), Self::Error> {
        self.last_tx = Some(config);
        Ok(())
    }

    fn configure_rx(&mut self, config: RxConfig) -> Result<(), Self::Error> {
        self.last_rx = Some(config);
        self.sleeping = false;
        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let mut tx_data = Vec::new();
        tx_data.extend_from_slice(data).unwrap();
        self.transmitted.push(tx_data);
        self.sleeping = false;
        Ok(())
    }

    fn is_transmitting(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error> {
        if self.sleeping {
            return Err(nb::Error::WouldBlock);
        }
        match self.rx_frames.pop_front() {
            Some(frame) => {
                buffer[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn get_rssi(&mut self) -> Result<i16, Self::Error> {
        Ok(self.rssi)
    }

    fn get_snr(&mut self) -> Result<i8, Self::Error> {
        Ok(self.snr)
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        self.sleeping = true;
        Ok(())
    }
}

/// What the network does after a scripted transmission
pub enum Outcome {
    /// Join accept in the first window
    JoinAccept,
    /// Both windows close empty
    Silence,
    /// Empty downlink acknowledging the uplink
    Ack,
    /// Arbitrary downlink
    Downlink(Downlink),
    /// Frame goes out, windows never close
    Hang,
}

/// Uplink as seen by the mock MAC
#[derive(Debug, Clone)]
pub struct SentFrame {
    pub fcnt: u32,
    pub port: u8,
    pub payload: std::vec::Vec<u8>,
    pub confirmed: bool,
    pub channel: u8,
    pub data_rate: u8,
    pub tx_power_dbm: i8,
}

/// Scripted MAC for session tests
pub struct MockMac {
    pub outcomes: VecDeque<Outcome>,
    pub pending: VecDeque<MacEvent>,
    pub joins: std::vec::Vec<JoinRequest>,
    pub uplinks: std::vec::Vec<SentFrame>,
    pub classes: std::vec::Vec<DeviceClass>,
    pub time_on_air_us: u64,
    pub fail_init: bool,
    pub reject_requests: bool,
    pub fail_set_class: bool,
    pub initialized: bool,
}

impl MockMac {
    pub fn new() -> Self {
        Self {
            outcomes: VecDeque::new(),
            pending: VecDeque::new(),
            joins: std::vec::Vec::new(),
            uplinks: std::vec::Vec::new(),
            classes: std::vec::Vec::new(),
            time_on_air_us: 50_000,
            fail_init: false,
            reject_requests: false,
            fail_set_class: false,
            initialized: false,
        }
    }

    pub fn script(&mut self, outcome: Outcome) {
        self.outcomes.push_back(outcome);
    }

    fn schedule(&mut self) {
        self.pending.push_back(MacEvent::TxDone {
            time_on_air_us: self.time_on_air_us,
        });
        match self.outcomes.pop_front().unwrap_or(Outcome::Silence) {
            Outcome::JoinAccept => self.pending.push_back(MacEvent::JoinAccepted),
            Outcome::Silence => self.pending.push_back(MacEvent::RxWindowsClosed),
            Outcome::Ack => {
                let mut ack = downlink(None, &[]);
                ack.ack = true;
                self.pending.push_back(MacEvent::Downlink(ack));
            }
            Outcome::Downlink(d) => self.pending.push_back(MacEvent::Downlink(d)),
            Outcome::Hang => {}
        }
    }
}

impl Mac for MockMac {
    type Error = MockError;

    fn init(&mut self, _region: &'static RegionParams) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(MockError::Error);
        }
        self.initialized = true;
        self.pending.clear();
        Ok(())
    }

    fn join(&mut self, request: &JoinRequest, _now_us: u64) -> Result<(), Self::Error> {
        if self.reject_requests {
            return Err(MockError::Error);
        }
        self.joins.push(*request);
        self.schedule();
        Ok(())
    }

    fn send(&mut self, uplink: &Uplink<'_>, _now_us: u64) -> Result<(), Self::Error> {
        if self.reject_requests {
            return Err(MockError::Error);
        }
        self.uplinks.push(SentFrame {
            fcnt: uplink.fcnt,
            port: uplink.port,
            payload: uplink.payload.to_vec(),
            confirmed: uplink.confirmed,
            channel: uplink.channel.id,
            data_rate: uplink.data_rate,
            tx_power_dbm: uplink.tx_power_dbm,
        });
        self.schedule();
        Ok(())
    }

    fn set_class(&mut self, class: DeviceClass) -> Result<(), Self::Error> {
        if self.fail_set_class {
            return Err(MockError::Error);
        }
        self.classes.push(class);
        Ok(())
    }

    fn poll(&mut self, _now_us: u64) -> nb::Result<MacEvent, Self::Error> {
        self.pending.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

/// Downlink with neutral flags
pub fn downlink(port: Option<u8>, payload: &[u8]) -> Downlink {
    let mut data = Vec::new();
    data.extend_from_slice(payload).unwrap();
    Downlink {
        port,
        payload: data,
        ack: false,
        frame_pending: false,
        rssi: -87,
        snr: 7,
        class_confirmed: None,
        tx_needed: false,
    }
}

/// Delay that advances a shared clock instead of sleeping
pub struct MockDelay<'a> {
    clock: &'a TickClock,
    pub calls: u32,
}

impl<'a> MockDelay<'a> {
    pub fn new(clock: &'a TickClock) -> Self {
        Self { clock, calls: 0 }
    }
}

impl DelayUs<u32> for MockDelay<'_> {
    fn delay_us(&mut self, us: u32) {
        self.calls += 1;
        self.clock.advance(us as u64);
    }
}

/// Handler recording every hook invocation
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub data: std::vec::Vec<(u8, std::vec::Vec<u8>)>,
    pub joins: u32,
    pub classes: std::vec::Vec<DeviceClass>,
    pub tx_needed: u32,
    pub acks: u32,
}

impl EventHandler for RecordingHandler {
    fn on_data_reception(&mut self, port: u8, data: &[u8]) {
        self.data.push((port, data.to_vec()));
    }

    fn on_join_success(&mut self) {
        self.joins += 1;
    }

    fn on_confirm_class(&mut self, class: DeviceClass) {
        self.classes.push(class);
    }

    fn on_tx_needed(&mut self) {
        self.tx_needed += 1;
    }

    fn on_uplink_ack_confirmed(&mut self) {
        self.acks += 1;
    }
}

thread_local! {
    static JOIN_RESULTS: RefCell<std::vec::Vec<JoinState>> = RefCell::new(std::vec::Vec::new());
    static SEND_RESULTS: RefCell<std::vec::Vec<SendState>> = RefCell::new(std::vec::Vec::new());
}

/// Join callback recording into a per-thread log
pub fn record_join(state: JoinState) {
    JOIN_RESULTS.with(|r| r.borrow_mut().push(state));
}

/// Send callback recording into a per-thread log
pub fn record_send(state: SendState) {
    SEND_RESULTS.with(|r| r.borrow_mut().push(state));
}

pub fn join_results() -> std::vec::Vec<JoinState> {
    JOIN_RESULTS.with(|r| r.borrow().clone())
}

pub fn send_results() -> std::vec::Vec<SendState> {
    SEND_RESULTS.with(|r| r.borrow().clone())
}
