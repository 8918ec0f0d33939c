use heapless::Vec;

use super::commands::{CommandIter, DownlinkCommand, UplinkCommand, MAX_FOPTS_LEN};
use super::phy::{time_on_air_us, PhyLayer};
use super::region::{Channel, DataRate, RegionParams};
use crate::config::device::{AESKey, Activation, DevAddr, DeviceClass, DeviceConfig};
use crate::crypto::{self, Direction, MAX_PAYLOAD_SIZE, MIC_SIZE};
use crate::radio::Radio;

/// Maximum application payload carried in one frame
pub const MAX_APP_PAYLOAD: usize = 242;

/// Pending MAC answers kept for the next uplink
const MAX_PENDING_ANSWERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum MType {
    JoinRequest = 0x00,
    JoinAccept = 0x20,
    UnconfirmedDataUp = 0x40,
    UnconfirmedDataDown = 0x60,
    ConfirmedDataUp = 0x80,
    ConfirmedDataDown = 0xA0,
}

/// Frame control flags
#[derive(Debug, Clone, Copy, Default)]
struct FCtrl {
    adr: bool,
    ack: bool,
    f_pending: bool,
    f_opts_len: u8,
}

impl FCtrl {
    fn to_byte(self) -> u8 {
        let mut byte = self.f_opts_len & 0x0F;
        if self.adr {
            byte |= 0x80;
        }
        if self.ack {
            byte |= 0x20;
        }
        if self.f_pending {
            byte |= 0x10;
        }
        byte
    }

    fn from_byte(byte: u8) -> Self {
        Self {
            adr: (byte & 0x80) != 0,
            ack: (byte & 0x20) != 0,
            f_pending: (byte & 0x10) != 0,
            f_opts_len: byte & 0x0F,
        }
    }
}

/// MAC layer error
#[derive(Debug)]
pub enum MacError<E> {
    /// Radio error
    Radio(E),
    /// Invalid MIC
    InvalidMic,
    /// Buffer too small
    BufferTooSmall,
    /// Invalid frame
    InvalidFrame,
    /// A transmission or its receive windows are still in progress
    Busy,
    /// No session keys yet
    NotActivated,
    /// `init` has not been called
    NotInitialized,
    /// Data rate undefined in the region
    InvalidDataRate,
}

/// Join request parameters chosen by the session
#[derive(Debug, Clone, Copy)]
pub struct JoinRequest {
    /// Channel to transmit on
    pub channel: Channel,
    /// Data rate index
    pub data_rate: u8,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
    /// DevNonce for this attempt
    pub dev_nonce: u16,
}

/// Uplink parameters chosen by the session
#[derive(Debug, Clone, Copy)]
pub struct Uplink<'a> {
    /// Channel to transmit on
    pub channel: Channel,
    /// Data rate index
    pub data_rate: u8,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
    /// Uplink frame counter, identical across retransmissions
    pub fcnt: u32,
    /// Application port (1-223)
    pub port: u8,
    /// Application payload
    pub payload: &'a [u8],
    /// Request an acknowledgement from the network
    pub confirmed: bool,
}

/// A downlink frame delivered to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    /// Application port, `None` for frames without FRMPayload
    pub port: Option<u8>,
    /// Decrypted application payload (empty on port 0)
    pub payload: Vec<u8, MAX_APP_PAYLOAD>,
    /// The frame acknowledges the last confirmed uplink
    pub ack: bool,
    /// The network has more data queued
    pub frame_pending: bool,
    /// RSSI of the reception in dBm
    pub rssi: i16,
    /// SNR of the reception in dB
    pub snr: i8,
    /// The frame carried a DeviceModeConf
    pub class_confirmed: Option<DeviceClass>,
    /// An uplink is needed soon (MAC answers, ACK or pending data)
    pub tx_needed: bool,
}

/// Events reported by [`Mac::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacEvent {
    /// The last join request or uplink left the antenna
    TxDone {
        /// Airtime of the frame in microseconds
        time_on_air_us: u64,
    },
    /// A valid join accept was received and session keys are in place
    JoinAccepted,
    /// A valid downlink was received
    Downlink(Downlink),
    /// Both receive windows closed without a valid frame
    RxWindowsClosed,
}

/// LoRaWAN MAC seam driven by the session
///
/// The session decides when, where and how often to transmit; an
/// implementation of this trait builds the frames, runs the receive windows
/// and reports what happened through [`Mac::poll`].
pub trait Mac {
    /// Error type for MAC operations
    type Error;

    /// Prepare the stack for a region
    fn init(&mut self, region: &'static RegionParams) -> Result<(), Self::Error>;

    /// Transmit a join request (or activate directly for ABP)
    fn join(&mut self, request: &JoinRequest, now_us: u64) -> Result<(), Self::Error>;

    /// Transmit a data uplink
    fn send(&mut self, uplink: &Uplink<'_>, now_us: u64) -> Result<(), Self::Error>;

    /// Apply a device class confirmed by the network
    fn set_class(&mut self, class: DeviceClass) -> Result<(), Self::Error>;

    /// Advance timers and report the next event, `WouldBlock` when idle
    fn poll(&mut self, now_us: u64) -> nb::Result<MacEvent, Self::Error>;
}

/// Session keys in use
#[derive(Debug, Clone, Copy)]
struct SessionKeys {
    dev_addr: DevAddr,
    nwk_skey: AESKey,
    app_skey: AESKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Rx1,
    Rx2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MacState {
    Idle,
    Transmitting { time_on_air_us: u64 },
    WaitingRx { window: Window, tx_end: u64 },
    Receiving { window: Window, tx_end: u64, closes_at: u64 },
}

/// What the receive windows are listening for
#[derive(Debug, Clone, Copy)]
struct TxContext {
    join_nonce: Option<u16>,
    rx1_frequency: u32,
    rx1_data_rate: u8,
}

/// Built-in MAC implementation on top of a [`Radio`]
pub struct MacLayer<R: Radio> {
    /// PHY layer
    phy: PhyLayer<R>,
    /// Credentials
    device: DeviceConfig,
    /// Region configuration
    region: Option<&'static RegionParams>,
    /// Keys of the active session
    keys: Option<SessionKeys>,
    state: MacState,
    tx: Option<TxContext>,
    class: DeviceClass,
    /// Last accepted network frame counter
    fcnt_down: Option<u32>,
    rx2_frequency: u32,
    rx2_data_rate: u8,
    rx1_dr_offset: u8,
    /// A confirmed downlink awaits its ACK bit
    ack_pending: bool,
    answers: Vec<UplinkCommand, MAX_PENDING_ANSWERS>,
    last_snr: i8,
    pending_event: Option<MacEvent>,
}

impl<R: Radio> MacLayer<R> {
    /// Create a new MAC layer
    pub fn new(radio: R, device: DeviceConfig) -> Self {
        Self {
            phy: PhyLayer::new(radio),
            device,
            region: None,
            keys: None,
            state: MacState::Idle,
            tx: None,
            class: DeviceClass::A,
            fcnt_down: None,
            rx2_frequency: 0,
            rx2_data_rate: 0,
            rx1_dr_offset: 0,
            ack_pending: false,
            answers: Vec::new(),
            last_snr: 0,
            pending_event: None,
        }
    }

    /// Get the radio
    pub fn get_radio(&self) -> &R {
        &self.phy.radio
    }

    /// Get the radio mutably
    pub fn get_radio_mut(&mut self) -> &mut R {
        &mut self.phy.radio
    }

    /// Device address of the active session
    pub fn dev_addr(&self) -> Option<DevAddr> {
        self.keys.map(|k| k.dev_addr)
    }

    /// Whether a transmission or receive window is in progress
    pub fn is_busy(&self) -> bool {
        self.state != MacState::Idle
    }

    /// MAC answers waiting for the next uplink
    pub fn pending_answers(&self) -> &[UplinkCommand] {
        &self.answers
    }

    fn region(&self) -> Result<&'static RegionParams, MacError<R::Error>> {
        self.region.ok_or(MacError::NotInitialized)
    }

    fn data_rate(&self, dr: u8) -> Result<DataRate, MacError<R::Error>> {
        self.region()?.data_rate(dr).ok_or(MacError::InvalidDataRate)
    }

    fn start_tx(
        &mut self,
        frame: &[u8],
        channel: &Channel,
        dr: u8,
        power: i8,
        join_nonce: Option<u16>,
    ) -> Result<(), MacError<R::Error>> {
        let region = self.region()?;
        let data_rate = self.data_rate(dr)?;

        self.phy
            .configure_tx(channel.frequency, data_rate, power)
            .map_err(MacError::Radio)?;
        self.phy.transmit(frame).map_err(MacError::Radio)?;

        self.tx = Some(TxContext {
            join_nonce,
            rx1_frequency: channel.downlink_frequency(),
            rx1_data_rate: region.rx1_data_rate(dr, self.rx1_dr_offset),
        });
        self.state = MacState::Transmitting {
            time_on_air_us: time_on_air_us(data_rate, frame.len()),
        };
        Ok(())
    }

    /// Radio state between transactions: continuous RX2 in class C, asleep
    /// otherwise
    fn enter_idle(&mut self) -> Result<(), MacError<R::Error>> {
        self.state = MacState::Idle;
        if self.class == DeviceClass::C && self.keys.is_some() {
            let data_rate = self.data_rate(self.rx2_data_rate)?;
            self.phy
                .configure_rx(self.rx2_frequency, data_rate, true)
                .map_err(MacError::Radio)
        } else {
            self.phy.sleep().map_err(MacError::Radio)
        }
    }

    fn window_delay(&self, window: Window) -> u64 {
        let timing = &self.phy.timing;
        let join = self.tx.map_or(false, |t| t.join_nonce.is_some());
        match (window, join) {
            (Window::Rx1, false) => timing.rx1_delay_us,
            (Window::Rx2, false) => timing.rx2_delay_us,
            (Window::Rx1, true) => timing.join_accept_delay1_us,
            (Window::Rx2, true) => timing.join_accept_delay2_us,
        }
    }

    fn open_window(&mut self, window: Window) -> Result<(), MacError<R::Error>> {
        let (frequency, dr) = match (window, self.tx) {
            (Window::Rx1, Some(tx)) => (tx.rx1_frequency, tx.rx1_data_rate),
            _ => (self.rx2_frequency, self.rx2_data_rate),
        };
        let data_rate = self.data_rate(dr)?;
        self.phy
            .configure_rx(frequency, data_rate, false)
            .map_err(MacError::Radio)
    }

    /// Decode a received frame; `Ok(None)` means the frame is not for us
    fn handle_frame(&mut self, frame: &[u8]) -> Result<Option<MacEvent>, MacError<R::Error>> {
        let Some(&mhdr) = frame.first() else {
            return Ok(None);
        };
        let result = match mhdr & 0xE0 {
            x if x == MType::JoinAccept as u8 => self.handle_join_accept(frame),
            x if x == MType::UnconfirmedDataDown as u8 || x == MType::ConfirmedDataDown as u8 => {
                self.handle_data_down(frame)
            }
            _ => Err(MacError::InvalidFrame),
        };

        match result {
            Ok(event) => Ok(Some(event)),
            Err(MacError::Radio(e)) => Err(MacError::Radio(e)),
            Err(_) => {
                debug!("dropping undecodable frame, len {}", frame.len());
                Ok(None)
            }
        }
    }

    fn handle_join_accept(&mut self, frame: &[u8]) -> Result<MacEvent, MacError<R::Error>> {
        let dev_nonce = self
            .tx
            .and_then(|t| t.join_nonce)
            .ok_or(MacError::InvalidFrame)?;
        let Activation::Otaa { app_key, .. } = self.device.activation else {
            return Err(MacError::InvalidFrame);
        };
        let encrypted = &frame[1..];
        if encrypted.len() != 16 && encrypted.len() != 32 {
            return Err(MacError::InvalidFrame);
        }

        let decrypted = crypto::decrypt_join_accept(&app_key, encrypted);
        let body_len = decrypted.len() - MIC_SIZE;

        let mut mic_input: Vec<u8, 32> = Vec::new();
        mic_input.push(frame[0]).map_err(|_| MacError::BufferTooSmall)?;
        mic_input
            .extend_from_slice(&decrypted[..body_len])
            .map_err(|_| MacError::BufferTooSmall)?;
        if crypto::compute_join_mic(&app_key, &mic_input) != decrypted[body_len..] {
            return Err(MacError::InvalidMic);
        }

        let mut app_nonce = [0u8; 3];
        app_nonce.copy_from_slice(&decrypted[0..3]);
        let mut net_id = [0u8; 3];
        net_id.copy_from_slice(&decrypted[3..6]);
        let mut dev_addr = [0u8; 4];
        dev_addr.copy_from_slice(&decrypted[6..10]);
        let dl_settings = decrypted[10];
        let rx_delay = decrypted[11];

        let (nwk_skey, app_skey) =
            crypto::derive_session_keys(&app_key, &app_nonce, &net_id, dev_nonce);
        self.keys = Some(SessionKeys {
            dev_addr: DevAddr::new(dev_addr),
            nwk_skey,
            app_skey,
        });
        self.fcnt_down = None;
        self.phy.timing.set_rx_delay_secs(rx_delay);

        let region = self.region()?;
        let rx2_dr = dl_settings & 0x0F;
        if region.data_rate(rx2_dr).is_some() {
            self.rx2_data_rate = rx2_dr;
        }
        let rx1_dr_offset = (dl_settings >> 4) & 0x07;
        self.rx1_dr_offset = if rx1_dr_offset <= region.max_rx1_dr_offset() {
            rx1_dr_offset
        } else {
            0
        };

        info!("join accepted, rx delay {} s", rx_delay);
        Ok(MacEvent::JoinAccepted)
    }

    fn handle_data_down(&mut self, frame: &[u8]) -> Result<MacEvent, MacError<R::Error>> {
        let keys = self.keys.ok_or(MacError::NotActivated)?;
        if frame.len() < 8 + MIC_SIZE {
            return Err(MacError::InvalidFrame);
        }
        if frame[1..5] != keys.dev_addr.as_bytes()[..] {
            return Err(MacError::InvalidFrame);
        }

        let fctrl = FCtrl::from_byte(frame[5]);
        let fcnt16 = u16::from_le_bytes([frame[6], frame[7]]) as u32;
        let fcnt = match self.fcnt_down {
            Some(last) => {
                let mut candidate = (last & 0xFFFF_0000) | fcnt16;
                if candidate <= last {
                    candidate = candidate.wrapping_add(0x1_0000);
                }
                candidate
            }
            None => fcnt16,
        };

        let body_end = frame.len() - MIC_SIZE;
        let mic = crypto::compute_mic(
            &keys.nwk_skey,
            &frame[..body_end],
            keys.dev_addr,
            fcnt,
            Direction::Down,
        );
        if mic != frame[body_end..] {
            return Err(MacError::InvalidMic);
        }

        let fopts_end = 8 + fctrl.f_opts_len as usize;
        if fopts_end > body_end {
            return Err(MacError::InvalidFrame);
        }
        self.fcnt_down = Some(fcnt);

        let mut downlink = Downlink {
            port: None,
            payload: Vec::new(),
            ack: fctrl.ack,
            frame_pending: fctrl.f_pending,
            rssi: self.phy.get_rssi().map_err(MacError::Radio)?,
            snr: self.phy.get_snr().map_err(MacError::Radio)?,
            class_confirmed: None,
            tx_needed: false,
        };
        self.last_snr = downlink.snr;

        let mut commands: Vec<u8, MAX_APP_PAYLOAD> = Vec::new();
        commands
            .extend_from_slice(&frame[8..fopts_end])
            .map_err(|_| MacError::BufferTooSmall)?;

        if fopts_end < body_end {
            let port = frame[fopts_end];
            let key = if port == 0 { &keys.nwk_skey } else { &keys.app_skey };
            let plain = crypto::encrypt_payload(
                key,
                keys.dev_addr,
                fcnt,
                Direction::Down,
                &frame[fopts_end + 1..body_end],
            );
            if port == 0 {
                commands
                    .extend_from_slice(&plain)
                    .map_err(|_| MacError::BufferTooSmall)?;
            } else {
                downlink
                    .payload
                    .extend_from_slice(&plain)
                    .map_err(|_| MacError::BufferTooSmall)?;
            }
            downlink.port = Some(port);
        }

        for command in CommandIter::new(&commands) {
            self.apply_command(command, &mut downlink);
        }

        let confirmed = frame[0] & 0xE0 == MType::ConfirmedDataDown as u8;
        if confirmed {
            self.ack_pending = true;
        }
        downlink.tx_needed = confirmed || fctrl.f_pending || !self.answers.is_empty();

        debug!("downlink fcnt {} port {} ack {}", fcnt, downlink.port, downlink.ack);
        Ok(MacEvent::Downlink(downlink))
    }

    fn queue_answer(&mut self, answer: UplinkCommand) {
        if self.answers.push(answer).is_err() {
            warn!("MAC answer queue full, dropping answer");
        }
    }

    fn apply_command(&mut self, command: DownlinkCommand, downlink: &mut Downlink) {
        match command {
            DownlinkCommand::LinkCheckAns {
                margin,
                gateway_count,
            } => {
                debug!("link check: margin {} dB, {} gateways", margin, gateway_count);
            }
            // ADR is not run by this stack, so every request is refused
            DownlinkCommand::LinkADRReq { .. } => self.queue_answer(UplinkCommand::LinkADRAns {
                power_ack: false,
                data_rate_ack: false,
                channel_mask_ack: false,
            }),
            DownlinkCommand::DutyCycleReq { .. } => self.queue_answer(UplinkCommand::DutyCycleAns),
            DownlinkCommand::RXParamSetupReq {
                rx1_dr_offset,
                rx2_data_rate,
                freq,
            } => {
                let (offset_ok, freq_ok, dr_ok) = match self.region {
                    Some(region) => (
                        rx1_dr_offset <= region.max_rx1_dr_offset(),
                        region.frequency_in_range(freq),
                        region.data_rate(rx2_data_rate).is_some(),
                    ),
                    None => (false, false, false),
                };
                // All three settings apply together or not at all
                if offset_ok && freq_ok && dr_ok {
                    self.rx1_dr_offset = rx1_dr_offset;
                    self.rx2_frequency = freq;
                    self.rx2_data_rate = rx2_data_rate;
                }
                self.queue_answer(UplinkCommand::RXParamSetupAns {
                    rx1_dr_offset_ack: offset_ok,
                    rx2_data_rate_ack: dr_ok,
                    channel_ack: freq_ok,
                });
            }
            DownlinkCommand::DevStatusReq => self.queue_answer(UplinkCommand::DevStatusAns {
                battery: 255,
                margin: self.last_snr.clamp(-32, 31),
            }),
            // The channel plan is fixed at setup
            DownlinkCommand::NewChannelReq { .. } => self.queue_answer(UplinkCommand::NewChannelAns {
                channel_freq_ok: false,
                data_rate_ok: false,
            }),
            DownlinkCommand::RXTimingSetupReq { delay } => {
                self.phy.timing.set_rx_delay_secs(delay);
                self.queue_answer(UplinkCommand::RXTimingSetupAns);
            }
            DownlinkCommand::TxParamSetupReq { .. } | DownlinkCommand::DlChannelReq { .. } => {
                debug!("ignoring unsupported MAC request");
            }
            DownlinkCommand::DeviceModeConf { class } => {
                downlink.class_confirmed = Some(class);
            }
        }
    }

    fn build_uplink(&mut self, uplink: &Uplink<'_>) -> Result<Vec<u8, MAX_PAYLOAD_SIZE>, MacError<R::Error>> {
        let keys = self.keys.ok_or(MacError::NotActivated)?;
        if uplink.payload.len() > MAX_APP_PAYLOAD {
            return Err(MacError::BufferTooSmall);
        }

        let mut fopts: Vec<u8, MAX_FOPTS_LEN> = Vec::new();
        let mut written = 0;
        for answer in self.answers.iter() {
            // Answers are never split across frames
            if fopts.len() + answer.encoded_len() > MAX_FOPTS_LEN {
                break;
            }
            if answer.write(&mut fopts).is_err() {
                break;
            }
            written += 1;
        }

        let mtype = if uplink.confirmed {
            MType::ConfirmedDataUp
        } else {
            MType::UnconfirmedDataUp
        };
        let fctrl = FCtrl {
            adr: false,
            ack: self.ack_pending,
            f_pending: false,
            f_opts_len: fopts.len() as u8,
        };

        let mut buffer: Vec<u8, MAX_PAYLOAD_SIZE> = Vec::new();
        buffer.push(mtype as u8).map_err(|_| MacError::BufferTooSmall)?;
        buffer
            .extend_from_slice(keys.dev_addr.as_bytes())
            .map_err(|_| MacError::BufferTooSmall)?;
        buffer.push(fctrl.to_byte()).map_err(|_| MacError::BufferTooSmall)?;
        buffer
            .extend_from_slice(&(uplink.fcnt as u16).to_le_bytes())
            .map_err(|_| MacError::BufferTooSmall)?;
        buffer
            .extend_from_slice(&fopts)
            .map_err(|_| MacError::BufferTooSmall)?;
        buffer.push(uplink.port).map_err(|_| MacError::BufferTooSmall)?;

        let encrypted = crypto::encrypt_payload(
            &keys.app_skey,
            keys.dev_addr,
            uplink.fcnt,
            Direction::Up,
            uplink.payload,
        );
        buffer
            .extend_from_slice(&encrypted)
            .map_err(|_| MacError::BufferTooSmall)?;

        let mic = crypto::compute_mic(
            &keys.nwk_skey,
            &buffer,
            keys.dev_addr,
            uplink.fcnt,
            Direction::Up,
        );
        buffer
            .extend_from_slice(&mic)
            .map_err(|_| MacError::BufferTooSmall)?;

        // Answers and the ACK bit are consumed by this frame
        let remaining: Vec<UplinkCommand, MAX_PENDING_ANSWERS> =
            self.answers.iter().skip(written).copied().collect();
        self.answers = remaining;
        self.ack_pending = false;

        Ok(buffer)
    }
}

impl<R: Radio> Mac for MacLayer<R> {
    type Error = MacError<R::Error>;

    fn init(&mut self, region: &'static RegionParams) -> Result<(), Self::Error> {
        self.phy.init().map_err(MacError::Radio)?;
        self.region = Some(region);
        self.rx2_frequency = region.rx2_frequency;
        self.rx2_data_rate = region.rx2_data_rate;
        self.keys = None;
        self.fcnt_down = None;
        self.answers.clear();
        self.rx1_dr_offset = 0;
        self.ack_pending = false;
        self.class = DeviceClass::A;
        self.pending_event = None;
        self.enter_idle()
    }

    fn join(&mut self, request: &JoinRequest, _now_us: u64) -> Result<(), Self::Error> {
        self.region()?;
        if self.state != MacState::Idle {
            return Err(MacError::Busy);
        }

        match self.device.activation {
            Activation::Abp {
                dev_addr,
                nwk_skey,
                app_skey,
            } => {
                self.keys = Some(SessionKeys {
                    dev_addr,
                    nwk_skey,
                    app_skey,
                });
                self.fcnt_down = None;
                self.pending_event = Some(MacEvent::JoinAccepted);
                Ok(())
            }
            Activation::Otaa {
                dev_eui,
                app_eui,
                app_key,
            } => {
                let mut buffer: Vec<u8, 23> = Vec::new();
                buffer
                    .push(MType::JoinRequest as u8)
                    .map_err(|_| MacError::BufferTooSmall)?;
                buffer
                    .extend_from_slice(&app_eui)
                    .map_err(|_| MacError::BufferTooSmall)?;
                buffer
                    .extend_from_slice(&dev_eui)
                    .map_err(|_| MacError::BufferTooSmall)?;
                buffer
                    .extend_from_slice(&request.dev_nonce.to_le_bytes())
                    .map_err(|_| MacError::BufferTooSmall)?;
                let mic = crypto::compute_join_mic(&app_key, &buffer);
                buffer
                    .extend_from_slice(&mic)
                    .map_err(|_| MacError::BufferTooSmall)?;

                self.keys = None;
                self.class = DeviceClass::A;
                self.start_tx(
                    &buffer,
                    &request.channel,
                    request.data_rate,
                    request.tx_power_dbm,
                    Some(request.dev_nonce),
                )
            }
        }
    }

    fn send(&mut self, uplink: &Uplink<'_>, _now_us: u64) -> Result<(), Self::Error> {
        self.region()?;
        if self.state != MacState::Idle {
            return Err(MacError::Busy);
        }
        let frame = self.build_uplink(uplink)?;
        self.start_tx(&frame, &uplink.channel, uplink.data_rate, uplink.tx_power_dbm, None)
    }

    fn set_class(&mut self, class: DeviceClass) -> Result<(), Self::Error> {
        self.class = class;
        if self.state == MacState::Idle && self.region.is_some() {
            self.enter_idle()?;
        }
        Ok(())
    }

    fn poll(&mut self, now_us: u64) -> nb::Result<MacEvent, Self::Error> {
        if let Some(event) = self.pending_event.take() {
            return Ok(event);
        }

        match self.state {
            MacState::Idle => {
                if self.class != DeviceClass::C || self.keys.is_none() {
                    return Err(nb::Error::WouldBlock);
                }
                let mut buffer = [0u8; MAX_PAYLOAD_SIZE];
                let len = match self.phy.receive(&mut buffer) {
                    Ok(len) => len,
                    Err(nb::Error::WouldBlock) => return Err(nb::Error::WouldBlock),
                    Err(nb::Error::Other(e)) => return Err(nb::Error::Other(MacError::Radio(e))),
                };
                match self.handle_frame(&buffer[..len])? {
                    Some(event) => Ok(event),
                    None => Err(nb::Error::WouldBlock),
                }
            }
            MacState::Transmitting { time_on_air_us } => {
                if self.phy.is_transmitting().map_err(MacError::Radio)? {
                    return Err(nb::Error::WouldBlock);
                }
                self.phy.sleep().map_err(MacError::Radio)?;
                self.state = MacState::WaitingRx {
                    window: Window::Rx1,
                    tx_end: now_us,
                };
                Ok(MacEvent::TxDone { time_on_air_us })
            }
            MacState::WaitingRx { window, tx_end } => {
                if now_us >= tx_end + self.window_delay(window) {
                    self.open_window(window)?;
                    self.state = MacState::Receiving {
                        window,
                        tx_end,
                        closes_at: now_us + self.phy.timing.rx_window_us,
                    };
                }
                Err(nb::Error::WouldBlock)
            }
            MacState::Receiving {
                window,
                tx_end,
                closes_at,
            } => {
                let mut buffer = [0u8; MAX_PAYLOAD_SIZE];
                match self.phy.receive(&mut buffer) {
                    Ok(len) => {
                        if let Some(event) = self.handle_frame(&buffer[..len])? {
                            self.tx = None;
                            self.enter_idle()?;
                            return Ok(event);
                        }
                    }
                    Err(nb::Error::WouldBlock) => {}
                    Err(nb::Error::Other(e)) => return Err(nb::Error::Other(MacError::Radio(e))),
                }

                if now_us < closes_at {
                    return Err(nb::Error::WouldBlock);
                }
                match window {
                    Window::Rx1 => {
                        self.phy.sleep().map_err(MacError::Radio)?;
                        self.state = MacState::WaitingRx {
                            window: Window::Rx2,
                            tx_end,
                        };
                        Err(nb::Error::WouldBlock)
                    }
                    Window::Rx2 => {
                        self.tx = None;
                        self.enter_idle()?;
                        Ok(MacEvent::RxWindowsClosed)
                    }
                }
            }
        }
    }
}
