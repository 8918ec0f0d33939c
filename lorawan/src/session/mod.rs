//! LoRaWAN session layer
//!
//! [`Session`] owns everything an application needs between the MAC and its
//! own main loop: the channel plan selected at setup, join and send
//! lifecycles, frame counters, signal quality of the last downlink, transmit
//! settings and per-band duty-cycle accounting.
//!
//! The model is single-threaded and cooperative. State only changes inside
//! [`Session::process`] (or inside the synchronous variants, which pump it),
//! and every callback or [`EventHandler`] hook runs from that call stack.
//!
//! Policies:
//! - a join while another join is outstanding is rejected with
//!   [`SessionError::JoinInProgress`]; a join while a send is in flight with
//!   [`SessionError::Busy`]
//! - a send while another send is queued or running returns
//!   [`SendState::Failed`] and leaves the in-flight transaction alone
//! - a send accepted while the receive windows of a previous uplink are still
//!   open stays [`SendState::Queued`] until they close
//! - confirmed retransmissions reuse the frame counter of the first
//!   transmission and wait for band availability
//! - every join attempt and every transmission of a send gets its own
//!   deadline, which starts running once a band has airtime for it
//!
//! There is no cancel operation. A transaction ends on acknowledgement, retry
//! exhaustion or its deadline, and only while the host keeps calling
//! `process()`.

pub mod duty_cycle;
pub mod events;
pub mod state;

use embedded_hal::blocking::delay::DelayUs;
use heapless::{Deque, Vec};

pub use duty_cycle::DutyCycle;
pub use events::{EventHandler, JoinCallback, NoopHandler, SendCallback};
pub use state::{
    Confirmation, FrameCounters, JoinState, RadioConfig, RssiSnr, SendState, SetupStatus,
};

use crate::clock::Clock;
use crate::config::device::DeviceClass;
use crate::config::session::SessionConfig;
use crate::lorawan::mac::{Downlink, JoinRequest, Mac, MacEvent, Uplink, MAX_APP_PAYLOAD};
use crate::lorawan::region::{Channel, ChannelPlan, Region, RegionParams, TX_POWER_LEVELS};
use events::{Event, EVENT_QUEUE_LEN};

/// MAC events handled per `process()` call
const MAX_MAC_EVENTS_PER_STEP: usize = 8;

/// Highest application port
const MAX_APP_PORT: u8 = 223;

/// Session error type
#[derive(Debug)]
pub enum SessionError<E> {
    /// `setup` has not succeeded yet
    NotInitialized,
    /// A join is already outstanding
    JoinInProgress,
    /// A send is in flight
    Busy,
    /// MAC layer error
    Mac(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the MAC and a band with airtime left
    Waiting,
    /// Handed to the MAC, not on air yet
    Transmitting,
    /// Transmitted, receive windows open
    Listening,
}

struct JoinTransaction {
    attempts_left: u8,
    deadline_us: u64,
    callback: Option<JoinCallback>,
    phase: Phase,
}

struct SendTransaction {
    payload: Vec<u8, MAX_APP_PAYLOAD>,
    port: u8,
    data_rate: u8,
    confirmed: bool,
    retries_left: u8,
    attempt: u8,
    fcnt: u32,
    deadline_us: u64,
    callback: Option<SendCallback>,
    phase: Phase,
}

/// LoRaWAN session over a [`Mac`] implementation
pub struct Session<M: Mac, C: Clock, H: EventHandler = NoopHandler> {
    mac: M,
    clock: C,
    handler: H,
    config: SessionConfig,
    region: Option<&'static RegionParams>,
    plan: Option<ChannelPlan>,
    duty_cycle: DutyCycle,
    join_state: JoinState,
    send_state: SendState,
    class: DeviceClass,
    counters: FrameCounters,
    radio: RadioConfig,
    rssi_snr: RssiSnr,
    dev_nonce: u16,
    join: Option<JoinTransaction>,
    send: Option<SendTransaction>,
    /// Band of the frame currently handed to the MAC
    tx_band: Option<u8>,
    /// The MAC is transmitting or has receive windows open
    mac_busy: bool,
    events: Deque<Event, EVENT_QUEUE_LEN>,
}

impl<M: Mac, C: Clock, H: EventHandler> Session<M, C, H> {
    /// Create a session; [`Session::setup`] must succeed before joining
    pub fn new(mac: M, clock: C, handler: H, config: SessionConfig) -> Self {
        Self {
            mac,
            clock,
            handler,
            duty_cycle: DutyCycle::new(config.duty_cycle_enforced),
            config,
            region: None,
            plan: None,
            join_state: JoinState::Pending,
            send_state: SendState::Idle,
            class: DeviceClass::A,
            counters: FrameCounters::default(),
            radio: RadioConfig::default(),
            rssi_snr: RssiSnr::Invalid,
            dev_nonce: 0,
            join: None,
            send: None,
            tx_band: None,
            mac_busy: false,
            events: Deque::new(),
        }
    }

    /// Select a region by numeric code and install a channel plan
    ///
    /// An empty `channels` slice selects the region's default plan. A
    /// rejected plan or region code leaves the session untouched. A MAC
    /// initialization failure leaves it uninitialized until the next
    /// successful setup.
    pub fn setup(&mut self, region_code: u16, channels: &[Channel]) -> SetupStatus {
        let Some(params) = Region::from_code(region_code).and_then(Region::params) else {
            error!("unsupported region code {}", region_code);
            return SetupStatus::Failed;
        };

        let plan = match ChannelPlan::new(params, channels) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("channel plan rejected: {}", e);
                return SetupStatus::ChannelFailed;
            }
        };

        self.region = None;
        self.plan = None;
        self.reset();

        if self.mac.init(params).is_err() {
            error!("MAC initialization failed");
            return SetupStatus::Failed;
        }

        self.radio.default_data_rate = self
            .config
            .default_data_rate
            .filter(|dr| plan.supports(*dr))
            .unwrap_or(params.default_data_rate);
        if !params.allows_tx_power(self.radio.tx_power) {
            self.radio.tx_power = 0;
        }
        info!(
            "setup complete: region {}, {} channels",
            params.region,
            plan.channels().len()
        );
        self.region = Some(params);
        self.plan = Some(plan);
        SetupStatus::Success
    }

    fn reset(&mut self) {
        self.join_state = JoinState::Pending;
        self.send_state = SendState::Idle;
        self.class = DeviceClass::A;
        self.counters = FrameCounters::default();
        self.rssi_snr = RssiSnr::Invalid;
        self.join = None;
        self.send = None;
        self.tx_band = None;
        self.mac_busy = false;
        self.events = Deque::new();
        self.duty_cycle.reset();
    }

    /// Start a join and return immediately
    ///
    /// `callback` runs exactly once from [`Session::process`] with the final
    /// state.
    pub fn join_async(&mut self, callback: JoinCallback) -> Result<JoinState, SessionError<M::Error>> {
        self.start_join(Some(callback))
    }

    /// Join and block until the join resolves or times out
    pub fn join_sync<D: DelayUs<u32>>(
        &mut self,
        delay: &mut D,
    ) -> Result<JoinState, SessionError<M::Error>> {
        self.start_join(None)?;
        self.pump(delay, |session| session.join.is_some())?;
        Ok(self.join_state)
    }

    fn start_join(
        &mut self,
        callback: Option<JoinCallback>,
    ) -> Result<JoinState, SessionError<M::Error>> {
        if self.region.is_none() {
            return Err(SessionError::NotInitialized);
        }
        if self.join.is_some() {
            return Err(SessionError::JoinInProgress);
        }
        if self.send.is_some() {
            return Err(SessionError::Busy);
        }

        let now = self.clock.now_us();
        let attempts = self.config.join_attempts.max(1);
        let deadline_us = self.join_deadline(now);
        self.join_state = JoinState::Pending;
        self.join = Some(JoinTransaction {
            attempts_left: attempts,
            deadline_us,
            callback: None,
            phase: Phase::Waiting,
        });
        info!("join started, {} attempts", attempts);

        // A request the MAC rejects outright is reported through the error only
        self.try_transmit(now)?;
        if let Some(join) = self.join.as_mut() {
            join.callback = callback;
        }
        Ok(self.join_state)
    }

    /// Queue an uplink and return immediately
    ///
    /// `data_rate` of `None` uses the default rate. Rejections (`Failed`,
    /// `NotJoined`, `DutyCycleBlocked`) are returned directly and never reach
    /// `callback`; an accepted send returns `Queued` and `callback` later
    /// receives `Sent`, `Acked` or `Failed`.
    pub fn send_async(
        &mut self,
        payload: &[u8],
        port: u8,
        data_rate: Option<u8>,
        confirmation: Confirmation,
        retry: u8,
        callback: SendCallback,
    ) -> Result<SendState, SessionError<M::Error>> {
        self.start_send(payload, port, data_rate, confirmation, retry, Some(callback))
    }

    /// Send an uplink and block until it reaches a terminal state
    pub fn send_sync<D: DelayUs<u32>>(
        &mut self,
        payload: &[u8],
        port: u8,
        data_rate: Option<u8>,
        confirmation: Confirmation,
        retry: u8,
        delay: &mut D,
    ) -> Result<SendState, SessionError<M::Error>> {
        let state = self.start_send(payload, port, data_rate, confirmation, retry, None)?;
        if !state.is_in_flight() {
            return Ok(state);
        }
        self.pump(delay, |session| session.send.is_some())?;
        Ok(self.send_state)
    }

    fn start_send(
        &mut self,
        payload: &[u8],
        port: u8,
        data_rate: Option<u8>,
        confirmation: Confirmation,
        retry: u8,
        callback: Option<SendCallback>,
    ) -> Result<SendState, SessionError<M::Error>> {
        let region = self.region.ok_or(SessionError::NotInitialized)?;
        if self.send.is_some() {
            warn!("send rejected: a transaction is in flight");
            return Ok(SendState::Failed);
        }

        let now = self.clock.now_us();
        let data_rate = data_rate.unwrap_or(self.radio.default_data_rate);
        let state = self.check_send(region, payload.len(), port, data_rate, now);
        if state != SendState::Queued {
            self.send_state = state;
            return Ok(state);
        }

        let mut buffer = Vec::new();
        if buffer.extend_from_slice(payload).is_err() {
            self.send_state = SendState::Failed;
            return Ok(SendState::Failed);
        }

        let confirmed = confirmation == Confirmation::Confirmed;
        let deadline_us = self.send_deadline(data_rate, now);
        self.send = Some(SendTransaction {
            payload: buffer,
            port,
            data_rate,
            confirmed,
            retries_left: if confirmed { retry } else { 0 },
            attempt: 0,
            fcnt: self.counters.uplink,
            deadline_us,
            callback: None,
            phase: Phase::Waiting,
        });
        self.send_state = SendState::Queued;
        debug!(
            "send queued: port {}, {} bytes, DR{}, confirmed {}",
            port,
            payload.len(),
            data_rate,
            confirmed
        );

        self.try_transmit(now)?;
        if let Some(send) = self.send.as_mut() {
            send.callback = callback;
        }
        Ok(self.send_state)
    }

    /// Admission checks, in order: payload/port/data rate, session, airtime
    fn check_send(
        &self,
        region: &RegionParams,
        len: usize,
        port: u8,
        data_rate: u8,
        now: u64,
    ) -> SendState {
        let Some(plan) = self.plan.as_ref() else {
            return SendState::Failed;
        };
        if port == 0 || port > MAX_APP_PORT || !plan.supports(data_rate) {
            return SendState::Failed;
        }
        if len > region.max_payload_size(data_rate) {
            warn!("payload of {} bytes too large for DR{}", len, data_rate);
            return SendState::Failed;
        }
        if self.join_state != JoinState::Success {
            return SendState::NotJoined;
        }
        let airtime_left = plan
            .channels()
            .iter()
            .any(|c| c.supports(data_rate) && self.duty_cycle.is_available(c.band, now));
        if !airtime_left {
            warn!("send blocked by duty cycle");
            return SendState::DutyCycleBlocked;
        }
        SendState::Queued
    }

    /// Earliest time a channel accepting `data_rate` has airtime again
    fn airtime_at(&self, data_rate: u8, now: u64) -> u64 {
        if !self.duty_cycle.is_enforced() {
            return now;
        }
        self.plan
            .as_ref()
            .and_then(|plan| {
                plan.channels()
                    .iter()
                    .filter(|c| c.supports(data_rate))
                    .map(|c| self.duty_cycle.available_at(c.band))
                    .min()
            })
            .map_or(now, |at| at.max(now))
    }

    /// Deadline of the next join attempt; the timeout runs once the band
    /// is free again
    fn join_deadline(&self, now: u64) -> u64 {
        let data_rate = self.region.map_or(0, |r| r.default_data_rate);
        self.airtime_at(data_rate, now)
            .saturating_add(self.config.join_timeout_us)
    }

    /// Deadline of the next send attempt, counted the same way
    fn send_deadline(&self, data_rate: u8, now: u64) -> u64 {
        self.airtime_at(data_rate, now)
            .saturating_add(self.config.send_timeout_us)
    }

    /// Run one cooperative step
    ///
    /// Advances deadlines, drains MAC events, starts pending transmissions
    /// and dispatches callbacks and hooks. Never blocks.
    pub fn process(&mut self) -> Result<(), SessionError<M::Error>> {
        if self.region.is_none() {
            return Err(SessionError::NotInitialized);
        }
        let now = self.clock.now_us();
        let result = self.step(now);
        self.dispatch();
        result
    }

    fn step(&mut self, now: u64) -> Result<(), SessionError<M::Error>> {
        self.check_deadlines(now);

        for _ in 0..MAX_MAC_EVENTS_PER_STEP {
            match self.mac.poll(now) {
                Ok(event) => {
                    self.handle_mac_event(event, now)?;
                    self.dispatch();
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    error!("MAC failure, aborting transactions");
                    self.abort();
                    return Err(SessionError::Mac(e));
                }
            }
        }

        self.try_transmit(now)
    }

    fn pump<D: DelayUs<u32>>(
        &mut self,
        delay: &mut D,
        busy: fn(&Self) -> bool,
    ) -> Result<(), SessionError<M::Error>> {
        loop {
            self.process()?;
            if !busy(self) {
                return Ok(());
            }
            delay.delay_us(self.config.poll_interval_us);
        }
    }

    fn dispatch(&mut self) {
        while let Some(event) = self.events.pop_front() {
            event.dispatch(&mut self.handler);
        }
    }

    fn push_event(&mut self, event: Event) {
        if self.events.push_back(event).is_err() {
            warn!("event queue full, dropping event");
        }
    }

    fn check_deadlines(&mut self, now: u64) {
        if self.join.as_ref().map_or(false, |j| now >= j.deadline_us) {
            warn!("join timed out");
            self.finish_join(JoinState::Failed);
        }
        if self.send.as_ref().map_or(false, |s| now >= s.deadline_us) {
            warn!("send timed out");
            self.finish_send(SendState::Failed);
        }
    }

    fn abort(&mut self) {
        self.mac_busy = false;
        self.tx_band = None;
        if self.join.is_some() {
            self.finish_join(JoinState::Failed);
        }
        if self.send.is_some() {
            self.finish_send(SendState::Failed);
        }
    }

    fn finish_join(&mut self, state: JoinState) {
        let Some(join) = self.join.take() else {
            return;
        };
        self.join_state = state;
        if let Some(callback) = join.callback {
            self.push_event(Event::JoinCompleted(callback, state));
        }
    }

    fn finish_send(&mut self, state: SendState) {
        let Some(send) = self.send.take() else {
            return;
        };
        self.send_state = state;
        debug!("send finished: {}", state);
        if let Some(callback) = send.callback {
            self.push_event(Event::SendCompleted(callback, state));
        }
    }

    /// Hand the waiting transaction to the MAC once it is idle and a band
    /// has airtime left
    fn try_transmit(&mut self, now: u64) -> Result<(), SessionError<M::Error>> {
        if self.mac_busy {
            return Ok(());
        }
        let (Some(region), Some(plan)) = (self.region, self.plan.as_mut()) else {
            return Ok(());
        };
        let duty_cycle = &self.duty_cycle;
        let tx_power_dbm = region.tx_power_dbm(self.radio.tx_power);

        if let Some(join) = self.join.as_mut() {
            if join.phase != Phase::Waiting {
                return Ok(());
            }
            let data_rate = region.default_data_rate;
            let Some(channel) = plan.next_channel(data_rate, |c| duty_cycle.is_available(c.band, now))
            else {
                return Ok(());
            };

            let request = JoinRequest {
                channel,
                data_rate,
                tx_power_dbm,
                dev_nonce: self.dev_nonce,
            };
            info!(
                "join request: channel {}, DevNonce {}",
                channel.id, request.dev_nonce
            );
            return match self.mac.join(&request, now) {
                Ok(()) => {
                    self.dev_nonce = self.dev_nonce.wrapping_add(1);
                    join.attempts_left = join.attempts_left.saturating_sub(1);
                    join.phase = Phase::Transmitting;
                    self.tx_band = Some(channel.band);
                    self.mac_busy = true;
                    Ok(())
                }
                Err(e) => {
                    error!("join request rejected by MAC");
                    self.finish_join(JoinState::Failed);
                    Err(SessionError::Mac(e))
                }
            };
        }

        if let Some(send) = self.send.as_mut() {
            if send.phase != Phase::Waiting {
                return Ok(());
            }
            let Some(channel) =
                plan.next_channel(send.data_rate, |c| duty_cycle.is_available(c.band, now))
            else {
                return Ok(());
            };

            let uplink = Uplink {
                channel,
                data_rate: send.data_rate,
                tx_power_dbm,
                fcnt: send.fcnt,
                port: send.port,
                payload: &send.payload,
                confirmed: send.confirmed,
            };
            send.attempt = send.attempt.saturating_add(1);
            info!(
                "uplink: fcnt {}, port {}, channel {}, attempt {}",
                send.fcnt, send.port, channel.id, send.attempt
            );
            return match self.mac.send(&uplink, now) {
                Ok(()) => {
                    send.phase = Phase::Transmitting;
                    self.tx_band = Some(channel.band);
                    self.mac_busy = true;
                    Ok(())
                }
                Err(e) => {
                    error!("uplink rejected by MAC");
                    self.finish_send(SendState::Failed);
                    Err(SessionError::Mac(e))
                }
            };
        }

        Ok(())
    }

    fn handle_mac_event(&mut self, event: MacEvent, now: u64) -> Result<(), SessionError<M::Error>> {
        match event {
            MacEvent::TxDone { time_on_air_us } => {
                self.on_tx_done(time_on_air_us, now);
                Ok(())
            }
            MacEvent::JoinAccepted => {
                self.on_join_accepted();
                Ok(())
            }
            MacEvent::Downlink(downlink) => self.on_downlink(downlink, now),
            MacEvent::RxWindowsClosed => {
                self.on_windows_closed(now);
                Ok(())
            }
        }
    }

    fn on_tx_done(&mut self, time_on_air_us: u64, now: u64) {
        if let (Some(band), Some(region)) = (self.tx_band.take(), self.region) {
            if let Some(params) = region.bands.get(band as usize) {
                self.duty_cycle.record(band, *params, now, time_on_air_us);
            }
        }

        if let Some(join) = self.join.as_mut() {
            if join.phase == Phase::Transmitting {
                join.phase = Phase::Listening;
            }
        }

        let Some(send) = self.send.as_mut() else {
            return;
        };
        if send.phase != Phase::Transmitting {
            return;
        }
        send.phase = Phase::Listening;
        if send.attempt == 1 {
            self.counters.uplink = self.counters.uplink.wrapping_add(1);
        } else {
            debug!("retransmission {} of fcnt {}", send.attempt - 1, send.fcnt);
        }

        if send.confirmed {
            self.send_state = SendState::Running;
        } else {
            self.finish_send(SendState::Sent);
        }
    }

    fn on_join_accepted(&mut self) {
        self.mac_busy = false;
        self.counters = FrameCounters::default();
        self.class = DeviceClass::A;
        if self.join.is_some() {
            self.finish_join(JoinState::Success);
        } else {
            self.join_state = JoinState::Success;
        }
        info!("joined");
        self.push_event(Event::JoinSuccess);
    }

    fn on_downlink(&mut self, downlink: Downlink, now: u64) -> Result<(), SessionError<M::Error>> {
        let Downlink {
            port,
            payload,
            ack,
            rssi,
            snr,
            class_confirmed,
            tx_needed,
            ..
        } = downlink;

        self.counters.downlink = self.counters.downlink.wrapping_add(1);
        self.rssi_snr = RssiSnr::Valid { rssi, snr };
        debug!("downlink: port {}, rssi {}, snr {}", port, rssi, snr);

        if let Some(port) = port.filter(|p| *p != 0) {
            self.push_event(Event::DataReceived { port, payload });
        }

        let mut class_result = Ok(());
        if let Some(class) = class_confirmed {
            if class != self.class {
                match self.mac.set_class(class) {
                    Ok(()) => {
                        info!("device class now {}", class);
                        self.class = class;
                        self.push_event(Event::ClassConfirmed(class));
                    }
                    Err(e) => {
                        error!("MAC refused class {}", class);
                        class_result = Err(SessionError::Mac(e));
                    }
                }
            } else {
                self.push_event(Event::ClassConfirmed(class));
            }
        }

        if tx_needed {
            self.push_event(Event::TxNeeded);
        }

        let acked = ack
            && self
                .send
                .as_ref()
                .map_or(false, |s| s.confirmed && s.phase == Phase::Listening);
        if acked {
            self.mac_busy = false;
            self.finish_send(SendState::Acked);
            self.push_event(Event::UplinkAckConfirmed);
        } else if self.mac_busy {
            self.on_windows_closed(now);
        }
        class_result
    }

    fn on_windows_closed(&mut self, now: u64) {
        self.mac_busy = false;
        let join_deadline = self.join_deadline(now);
        let send_deadline = self
            .send
            .as_ref()
            .map_or(now, |s| self.send_deadline(s.data_rate, now));

        if let Some(join) = self.join.as_mut() {
            if join.phase == Phase::Listening {
                if join.attempts_left > 0 {
                    info!("no join accept, {} attempts left", join.attempts_left);
                    join.phase = Phase::Waiting;
                    join.deadline_us = join_deadline;
                } else {
                    warn!("join failed");
                    self.finish_join(JoinState::Failed);
                }
            }
        }

        if let Some(send) = self.send.as_mut() {
            if send.phase == Phase::Listening {
                if send.retries_left > 0 {
                    send.retries_left -= 1;
                    send.phase = Phase::Waiting;
                    send.deadline_us = send_deadline;
                } else {
                    warn!("no ACK for fcnt {}", send.fcnt);
                    self.finish_send(SendState::Failed);
                }
            }
        }
    }

    /// Whether a session is established
    pub fn has_joined(&self) -> bool {
        self.join_state == JoinState::Success
    }

    /// Current join state
    pub fn join_state(&self) -> JoinState {
        self.join_state
    }

    /// State of the current or last send
    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    /// Device class confirmed by the network
    pub fn device_class(&self) -> DeviceClass {
        self.class
    }

    /// Region selected at setup
    pub fn region(&self) -> Option<Region> {
        self.region.map(|params| params.region)
    }

    /// Channel plan installed at setup
    pub fn channel_plan(&self) -> Option<&ChannelPlan> {
        self.plan.as_ref()
    }

    /// Signal quality of the last valid downlink
    pub fn last_rssi_snr(&self) -> RssiSnr {
        self.rssi_snr
    }

    /// Set the transmit power level; rejected levels leave it unchanged
    pub fn set_tx_power(&mut self, level: u8) -> bool {
        let allowed = match self.region {
            Some(region) => region.allows_tx_power(level),
            None => level < TX_POWER_LEVELS,
        };
        if !allowed {
            warn!("tx power level {} rejected", level);
            return false;
        }
        self.radio.tx_power = level;
        true
    }

    /// Current transmit power level
    pub fn tx_power(&self) -> u8 {
        self.radio.tx_power
    }

    /// Set the data rate used by sends that name none, from the next send on
    pub fn change_default_rate(&mut self, data_rate: u8) -> bool {
        let valid = match (self.region, self.plan.as_ref()) {
            (Some(region), Some(plan)) => {
                region.data_rate(data_rate).is_some() && plan.supports(data_rate)
            }
            _ => false,
        };
        if valid {
            self.radio.default_data_rate = data_rate;
        }
        valid
    }

    /// Data rate used by sends that name none
    pub fn default_rate(&self) -> u8 {
        self.radio.default_data_rate
    }

    /// Transmit settings
    pub fn radio_config(&self) -> RadioConfig {
        self.radio
    }

    /// Uplink frames transmitted in this session
    pub fn uplink_frame_counter(&self) -> u32 {
        self.counters.uplink
    }

    /// Downlink frames received in this session
    pub fn downlink_frame_counter(&self) -> u32 {
        self.counters.downlink
    }

    /// Both frame counters
    pub fn frame_counters(&self) -> FrameCounters {
        self.counters
    }

    /// DevNonce of the next join request
    pub fn dev_nonce(&self) -> u16 {
        self.dev_nonce
    }

    /// Restore a persisted DevNonce so join requests are not replayed
    pub fn set_dev_nonce(&mut self, dev_nonce: u16) {
        self.dev_nonce = dev_nonce;
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Event handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Event handler, mutably
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// MAC layer
    pub fn mac(&self) -> &M {
        &self.mac
    }

    /// MAC layer, mutably
    pub fn mac_mut(&mut self) -> &mut M {
        &mut self.mac
    }
}
