//! Status enumerations and plain session data

/// Outcome of [`Session::setup`](super::Session::setup)
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    /// Stack initialized, not joined
    Success,
    /// The channel plan was rejected, nothing changed
    ChannelFailed,
    /// Unknown or unsupported region, or the MAC failed to initialize
    Failed,
}

/// Join lifecycle
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinState {
    /// Not joined yet, or a join is in progress
    #[default]
    Pending,
    /// Session established
    Success,
    /// The last join gave up; a new join may be issued
    Failed,
}

/// Send transaction lifecycle
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    /// No send issued since setup
    #[default]
    Idle,
    /// Accepted, waiting for the radio
    Queued,
    /// Transmitted (terminal for unconfirmed sends)
    Sent,
    /// Acknowledged by the network
    Acked,
    /// Confirmed uplink transmitted, waiting for an acknowledgement
    Running,
    /// Rejected: no session
    NotJoined,
    /// Rejected: no band has airtime left right now
    DutyCycleBlocked,
    /// Rejected, or retries/deadline exhausted
    Failed,
}

impl SendState {
    /// Whether a transaction is still in flight
    pub fn is_in_flight(self) -> bool {
        matches!(self, SendState::Queued | SendState::Running)
    }
}

/// Acknowledgement mode of an uplink
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Fire and forget
    Unconfirmed,
    /// The network must acknowledge the frame
    Confirmed,
}

/// Uplink and downlink frame counters
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCounters {
    /// Uplink frames transmitted (retransmissions excluded)
    pub uplink: u32,
    /// Valid downlink frames received
    pub downlink: u32,
}

/// Transmit settings persisting across sends
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadioConfig {
    /// Transmit power level, 0 = region max EIRP, each step 2 dB lower
    pub tx_power: u8,
    /// Data rate used when a send names none
    pub default_data_rate: u8,
}

/// Signal quality of the most recent valid downlink
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RssiSnr {
    /// At least one downlink was received
    Valid {
        /// RSSI in dBm
        rssi: i16,
        /// SNR in dB
        snr: i8,
    },
    /// Nothing received yet
    #[default]
    Invalid,
}
