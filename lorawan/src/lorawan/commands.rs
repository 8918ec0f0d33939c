use heapless::Vec;

use crate::config::device::DeviceClass;

/// Upper bound on FOpts bytes in a frame header
pub const MAX_FOPTS_LEN: usize = 15;

/// MAC command identifiers (shared by requests and their answers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum CommandIdentifier {
    LinkCheck = 0x02,
    LinkADR = 0x03,
    DutyCycle = 0x04,
    RXParamSetup = 0x05,
    DevStatus = 0x06,
    NewChannel = 0x07,
    RXTimingSetup = 0x08,
    TxParamSetup = 0x09,
    DlChannel = 0x0A,
    DeviceMode = 0x20,
}

/// MAC command received from the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownlinkCommand {
    /// Link check answer
    LinkCheckAns {
        /// Link margin in dB
        margin: u8,
        /// Number of gateways that received the request
        gateway_count: u8,
    },
    /// Link ADR request
    LinkADRReq {
        /// Data rate
        data_rate: u8,
        /// TX power
        tx_power: u8,
        /// Channel mask
        ch_mask: u16,
        /// Channel mask control
        ch_mask_cntl: u8,
        /// Number of transmissions
        nb_trans: u8,
    },
    /// Duty cycle request
    DutyCycleReq {
        /// Maximum duty cycle
        max_duty_cycle: u8,
    },
    /// RX parameter setup request
    RXParamSetupReq {
        /// RX1 data rate offset
        rx1_dr_offset: u8,
        /// RX2 data rate
        rx2_data_rate: u8,
        /// RX2 frequency in Hz
        freq: u32,
    },
    /// Device status request
    DevStatusReq,
    /// New channel request
    NewChannelReq {
        /// Channel index
        ch_index: u8,
        /// Frequency in Hz
        freq: u32,
        /// Maximum data rate
        max_dr: u8,
        /// Minimum data rate
        min_dr: u8,
    },
    /// RX timing setup request
    RXTimingSetupReq {
        /// Delay in seconds (0-15)
        delay: u8,
    },
    /// TX parameter setup request
    TxParamSetupReq {
        /// Raw EIRP/dwell-time settings
        settings: u8,
    },
    /// Downlink channel request
    DlChannelReq {
        /// Channel index
        ch_index: u8,
        /// Frequency in Hz
        freq: u32,
    },
    /// Device mode (class) change confirmation
    DeviceModeConf {
        /// Class now in effect
        class: DeviceClass,
    },
}

/// MAC command answered by the device on the next uplink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkCommand {
    /// Link ADR answer
    LinkADRAns {
        /// Power ACK
        power_ack: bool,
        /// Data rate ACK
        data_rate_ack: bool,
        /// Channel mask ACK
        channel_mask_ack: bool,
    },
    /// Duty cycle answer
    DutyCycleAns,
    /// RX parameter setup answer
    RXParamSetupAns {
        /// RX1 data rate offset ACK
        rx1_dr_offset_ack: bool,
        /// RX2 data rate ACK
        rx2_data_rate_ack: bool,
        /// Channel ACK
        channel_ack: bool,
    },
    /// Device status answer
    DevStatusAns {
        /// Battery level (0 = external power, 1-254 = level, 255 = unknown)
        battery: u8,
        /// Demodulation margin in dB
        margin: i8,
    },
    /// New channel answer
    NewChannelAns {
        /// Channel frequency OK
        channel_freq_ok: bool,
        /// Data rate OK
        data_rate_ok: bool,
    },
    /// RX timing setup answer
    RXTimingSetupAns,
}

/// The FOpts buffer has no room left for an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FOptsFull;

impl CommandIdentifier {
    fn from_u8(cid: u8) -> Option<Self> {
        Some(match cid {
            0x02 => CommandIdentifier::LinkCheck,
            0x03 => CommandIdentifier::LinkADR,
            0x04 => CommandIdentifier::DutyCycle,
            0x05 => CommandIdentifier::RXParamSetup,
            0x06 => CommandIdentifier::DevStatus,
            0x07 => CommandIdentifier::NewChannel,
            0x08 => CommandIdentifier::RXTimingSetup,
            0x09 => CommandIdentifier::TxParamSetup,
            0x0A => CommandIdentifier::DlChannel,
            0x20 => CommandIdentifier::DeviceMode,
            _ => return None,
        })
    }
}

/// Frequencies travel as 24-bit little-endian multiples of 100 Hz
fn freq_from_bytes(b0: u8, b1: u8, b2: u8) -> u32 {
    u32::from_le_bytes([b0, b1, b2, 0]) * 100
}

impl DownlinkCommand {
    /// Parse one command, returning it with the number of bytes consumed
    pub fn parse(bytes: &[u8]) -> Option<(Self, usize)> {
        let (&cid, payload) = bytes.split_first()?;
        let (command, len) = match (CommandIdentifier::from_u8(cid)?, payload) {
            (CommandIdentifier::LinkCheck, &[margin, gateway_count, ..]) => (
                DownlinkCommand::LinkCheckAns {
                    margin,
                    gateway_count,
                },
                2,
            ),
            (CommandIdentifier::LinkADR, &[dr_power, mask0, mask1, redundancy, ..]) => (
                DownlinkCommand::LinkADRReq {
                    data_rate: dr_power >> 4,
                    tx_power: dr_power & 0x0F,
                    ch_mask: u16::from_le_bytes([mask0, mask1]),
                    ch_mask_cntl: (redundancy >> 4) & 0x07,
                    nb_trans: redundancy & 0x0F,
                },
                4,
            ),
            (CommandIdentifier::DutyCycle, &[max_duty_cycle, ..]) => (
                DownlinkCommand::DutyCycleReq {
                    max_duty_cycle: max_duty_cycle & 0x0F,
                },
                1,
            ),
            (CommandIdentifier::RXParamSetup, &[dl_settings, f0, f1, f2, ..]) => (
                DownlinkCommand::RXParamSetupReq {
                    rx1_dr_offset: (dl_settings >> 4) & 0x07,
                    rx2_data_rate: dl_settings & 0x0F,
                    freq: freq_from_bytes(f0, f1, f2),
                },
                4,
            ),
            (CommandIdentifier::DevStatus, _) => (DownlinkCommand::DevStatusReq, 0),
            (CommandIdentifier::NewChannel, &[ch_index, f0, f1, f2, dr_range, ..]) => (
                DownlinkCommand::NewChannelReq {
                    ch_index,
                    freq: freq_from_bytes(f0, f1, f2),
                    max_dr: dr_range >> 4,
                    min_dr: dr_range & 0x0F,
                },
                5,
            ),
            (CommandIdentifier::RXTimingSetup, &[settings, ..]) => (
                DownlinkCommand::RXTimingSetupReq {
                    delay: settings & 0x0F,
                },
                1,
            ),
            (CommandIdentifier::TxParamSetup, &[settings, ..]) => {
                (DownlinkCommand::TxParamSetupReq { settings }, 1)
            }
            (CommandIdentifier::DlChannel, &[ch_index, f0, f1, f2, ..]) => (
                DownlinkCommand::DlChannelReq {
                    ch_index,
                    freq: freq_from_bytes(f0, f1, f2),
                },
                4,
            ),
            (CommandIdentifier::DeviceMode, &[class, ..]) => (
                DownlinkCommand::DeviceModeConf {
                    class: DeviceClass::from_u8(class)?,
                },
                1,
            ),
            _ => return None,
        };
        Some((command, len + 1))
    }
}

/// Iterator over the MAC commands of an FOpts field or port-0 payload
///
/// Stops at the first unknown or truncated command, since the length of
/// anything after it cannot be known.
pub struct CommandIter<'a> {
    bytes: &'a [u8],
}

impl<'a> CommandIter<'a> {
    /// Iterate over raw command bytes
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl Iterator for CommandIter<'_> {
    type Item = DownlinkCommand;

    fn next(&mut self) -> Option<Self::Item> {
        match DownlinkCommand::parse(self.bytes) {
            Some((command, used)) => {
                self.bytes = &self.bytes[used..];
                Some(command)
            }
            None => {
                self.bytes = &[];
                None
            }
        }
    }
}

impl UplinkCommand {
    /// Serialized length including the CID
    pub fn encoded_len(&self) -> usize {
        match self {
            UplinkCommand::DevStatusAns { .. } => 3,
            UplinkCommand::DutyCycleAns | UplinkCommand::RXTimingSetupAns => 1,
            _ => 2,
        }
    }

    /// Append the command to an FOpts buffer
    pub fn write<const N: usize>(&self, out: &mut Vec<u8, N>) -> Result<(), FOptsFull> {
        match *self {
            UplinkCommand::LinkADRAns {
                power_ack,
                data_rate_ack,
                channel_mask_ack,
            } => {
                out.push(CommandIdentifier::LinkADR as u8).map_err(|_| FOptsFull)?;
                out.push(flags(power_ack, data_rate_ack, channel_mask_ack))
                    .map_err(|_| FOptsFull)
            }
            UplinkCommand::DutyCycleAns => out.push(CommandIdentifier::DutyCycle as u8).map_err(|_| FOptsFull),
            UplinkCommand::RXParamSetupAns {
                rx1_dr_offset_ack,
                rx2_data_rate_ack,
                channel_ack,
            } => {
                out.push(CommandIdentifier::RXParamSetup as u8).map_err(|_| FOptsFull)?;
                out.push(flags(rx1_dr_offset_ack, rx2_data_rate_ack, channel_ack))
                    .map_err(|_| FOptsFull)
            }
            UplinkCommand::DevStatusAns { battery, margin } => {
                out.push(CommandIdentifier::DevStatus as u8).map_err(|_| FOptsFull)?;
                out.push(battery).map_err(|_| FOptsFull)?;
                out.push((margin as u8) & 0x3F).map_err(|_| FOptsFull)
            }
            UplinkCommand::NewChannelAns {
                channel_freq_ok,
                data_rate_ok,
            } => {
                out.push(CommandIdentifier::NewChannel as u8).map_err(|_| FOptsFull)?;
                out.push(flags(false, data_rate_ok, channel_freq_ok))
                    .map_err(|_| FOptsFull)
            }
            UplinkCommand::RXTimingSetupAns => out.push(CommandIdentifier::RXTimingSetup as u8).map_err(|_| FOptsFull),
        }
    }
}

fn flags(bit2: bool, bit1: bool, bit0: bool) -> u8 {
    ((bit2 as u8) << 2) | ((bit1 as u8) << 1) | bit0 as u8
}
