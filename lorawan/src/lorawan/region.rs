use heapless::Vec;

/// Upper bound on channels in any supported plan (US915/AU915: 64 + 8)
pub const MAX_CHANNELS: usize = 72;

/// Number of discrete transmit power levels exposed to applications
pub const TX_POWER_LEVELS: u8 = 16;

/// Regulatory region
///
/// The numeric codes follow the usual LoRaMac region numbering.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Asia 923 MHz
    AS923,
    /// Australia 915 MHz
    AU915,
    /// China 470 MHz
    CN470,
    /// China 779 MHz
    CN779,
    /// Europe 433 MHz
    EU433,
    /// Europe 868 MHz
    EU868,
    /// South Korea 920 MHz
    KR920,
    /// India 865 MHz
    IN865,
    /// North America 915 MHz
    US915,
}

impl Region {
    /// Decode a numeric region code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Region::AS923),
            1 => Some(Region::AU915),
            2 => Some(Region::CN470),
            3 => Some(Region::CN779),
            4 => Some(Region::EU433),
            5 => Some(Region::EU868),
            6 => Some(Region::KR920),
            7 => Some(Region::IN865),
            8 => Some(Region::US915),
            _ => None,
        }
    }

    /// Numeric region code
    pub fn code(self) -> u16 {
        match self {
            Region::AS923 => 0,
            Region::AU915 => 1,
            Region::CN470 => 2,
            Region::CN779 => 3,
            Region::EU433 => 4,
            Region::EU868 => 5,
            Region::KR920 => 6,
            Region::IN865 => 7,
            Region::US915 => 8,
        }
    }

    /// Regional parameters, `None` when the region is not supported
    pub fn params(self) -> Option<&'static RegionParams> {
        match self {
            Region::AS923 => Some(&AS923_PARAMS),
            Region::AU915 => Some(&AU915_PARAMS),
            Region::EU433 => Some(&EU433_PARAMS),
            Region::EU868 => Some(&EU868_PARAMS),
            Region::KR920 => Some(&KR920_PARAMS),
            Region::IN865 => Some(&IN865_PARAMS),
            Region::US915 => Some(&US915_PARAMS),
            Region::CN470 | Region::CN779 => None,
        }
    }
}

/// LoRa bandwidth
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    /// 125 kHz
    BW125,
    /// 250 kHz
    BW250,
    /// 500 kHz
    BW500,
}

impl Bandwidth {
    /// Bandwidth in Hz
    pub fn hz(self) -> u32 {
        match self {
            Bandwidth::BW125 => 125_000,
            Bandwidth::BW250 => 250_000,
            Bandwidth::BW500 => 500_000,
        }
    }
}

/// Modulation behind a data rate index
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRate {
    /// Spreading factor (7-12)
    pub spreading_factor: u8,
    /// Bandwidth
    pub bandwidth: Bandwidth,
}

impl DataRate {
    const fn lora(spreading_factor: u8, bandwidth: Bandwidth) -> Option<Self> {
        Some(Self {
            spreading_factor,
            bandwidth,
        })
    }

    /// Get spreading factor
    pub fn spreading_factor(&self) -> u8 {
        self.spreading_factor
    }

    /// Get bandwidth in Hz
    pub fn bandwidth(&self) -> u32 {
        self.bandwidth.hz()
    }
}

/// One entry of a channel plan
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// Channel index within the plan
    pub id: u8,
    /// Uplink frequency in Hz
    pub frequency: u32,
    /// Downlink (RX1) frequency in Hz, 0 when identical to the uplink
    pub rx_frequency: u32,
    /// Minimum data rate index
    pub min_dr: u8,
    /// Maximum data rate index
    pub max_dr: u8,
    /// Duty-cycle band index
    pub band: u8,
}

impl Channel {
    /// Create a channel whose downlink uses the uplink frequency
    pub const fn new(id: u8, frequency: u32, min_dr: u8, max_dr: u8, band: u8) -> Self {
        Self {
            id,
            frequency,
            rx_frequency: 0,
            min_dr,
            max_dr,
            band,
        }
    }

    /// Frequency of the RX1 window following an uplink on this channel
    pub fn downlink_frequency(&self) -> u32 {
        if self.rx_frequency == 0 {
            self.frequency
        } else {
            self.rx_frequency
        }
    }

    /// Whether the channel accepts the data rate
    pub fn supports(&self, dr: u8) -> bool {
        dr >= self.min_dr && dr <= self.max_dr
    }
}

/// Duty-cycle sub-band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Inverse duty cycle: 100 for 1 %, 1000 for 0.1 %, 1 for unrestricted
    pub duty_cycle_divisor: u32,
}

/// How the RX1 data rate follows the uplink data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rx1Mapping {
    /// RX1 uses the uplink data rate
    SameAsUplink,
    /// Fixed-plan mapping onto the 500 kHz downlink rates starting at `base`
    Offset { base: u8, max: u8 },
}

/// Static regional parameters
#[derive(Debug)]
pub struct RegionParams {
    /// Region these parameters describe
    pub region: Region,
    /// Lowest legal channel frequency in Hz
    pub min_frequency: u32,
    /// Highest legal channel frequency in Hz
    pub max_frequency: u32,
    /// Channel slots available in the plan
    pub max_channels: u8,
    /// Plan used when setup receives no channels
    pub default_channels: &'static [Channel],
    /// Modulation per data rate index
    pub data_rates: &'static [Option<DataRate>; 16],
    /// Maximum application payload per data rate index
    pub max_payload: &'static [u8; 16],
    /// Data rate used for joins and when nothing else is configured
    pub default_data_rate: u8,
    /// Highest allowed transmit power level (0 = max EIRP)
    pub max_tx_power: u8,
    /// EIRP at power level 0, in dBm
    pub max_eirp_dbm: i8,
    /// Duty-cycle bands referenced by `Channel::band`
    pub bands: &'static [Band],
    /// RX2 frequency in Hz
    pub rx2_frequency: u32,
    /// RX2 data rate index
    pub rx2_data_rate: u8,
    rx1_mapping: Rx1Mapping,
}

impl RegionParams {
    /// Modulation for a data rate index
    pub fn data_rate(&self, dr: u8) -> Option<DataRate> {
        self.data_rates.get(dr as usize).copied().flatten()
    }

    /// Maximum application payload at a data rate, 0 if undefined
    pub fn max_payload_size(&self, dr: u8) -> usize {
        match self.data_rate(dr) {
            Some(_) => self.max_payload[dr as usize] as usize,
            None => 0,
        }
    }

    /// RX1 data rate for an uplink data rate and an RX1 data rate offset
    pub fn rx1_data_rate(&self, uplink_dr: u8, offset: u8) -> u8 {
        match self.rx1_mapping {
            Rx1Mapping::SameAsUplink => uplink_dr.saturating_sub(offset),
            Rx1Mapping::Offset { base, max } => base
                .saturating_add(uplink_dr)
                .min(max)
                .saturating_sub(offset)
                .max(base),
        }
    }

    /// Largest RX1 data rate offset accepted from RXParamSetupReq or a join
    /// accept
    pub fn max_rx1_dr_offset(&self) -> u8 {
        match self.rx1_mapping {
            Rx1Mapping::SameAsUplink => 5,
            Rx1Mapping::Offset { base, max } => max - base,
        }
    }

    /// EIRP for a power level
    pub fn tx_power_dbm(&self, level: u8) -> i8 {
        self.max_eirp_dbm.saturating_sub((level as i8).saturating_mul(2))
    }

    /// Whether a power level is allowed in this region
    pub fn allows_tx_power(&self, level: u8) -> bool {
        level < TX_POWER_LEVELS && level <= self.max_tx_power
    }

    /// Whether a frequency is inside the region's band
    pub fn frequency_in_range(&self, frequency: u32) -> bool {
        frequency >= self.min_frequency && frequency <= self.max_frequency
    }
}

/// Channel plan validation failures
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPlanError {
    /// Two channels share an id
    DuplicateId(u8),
    /// Channel id beyond the region's channel slots
    InvalidId(u8),
    /// Uplink or downlink frequency outside the region's band
    FrequencyOutOfRange(u8),
    /// Data rate bounds undefined in the region or inverted
    InvalidDataRate(u8),
    /// Band index not defined for the region
    InvalidBand(u8),
    /// More channels than the plan can hold
    TooManyChannels,
}

/// Validated, immutable set of channels for a session
#[derive(Debug, Clone)]
pub struct ChannelPlan {
    channels: Vec<Channel, MAX_CHANNELS>,
    next: usize,
}

impl ChannelPlan {
    /// Build a plan from caller-supplied channels; empty input selects the
    /// region default plan
    pub fn new(params: &RegionParams, channels: &[Channel]) -> Result<Self, ChannelPlanError> {
        let source = if channels.is_empty() {
            params.default_channels
        } else {
            validate_channels(params, channels)?;
            channels
        };

        let mut plan: Vec<Channel, MAX_CHANNELS> = Vec::new();
        plan.extend_from_slice(source)
            .map_err(|_| ChannelPlanError::TooManyChannels)?;
        Ok(Self {
            channels: plan,
            next: 0,
        })
    }

    /// All channels in plan order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Whether any channel in the plan accepts the data rate
    pub fn supports(&self, dr: u8) -> bool {
        self.channels.iter().any(|c| c.supports(dr))
    }

    /// Round-robin to the next channel accepting `dr` for which `available`
    /// holds
    pub fn next_channel<F>(&mut self, dr: u8, mut available: F) -> Option<Channel>
    where
        F: FnMut(&Channel) -> bool,
    {
        let count = self.channels.len();
        for offset in 0..count {
            let index = (self.next + offset) % count;
            let channel = self.channels[index];
            if channel.supports(dr) && available(&channel) {
                self.next = (index + 1) % count;
                return Some(channel);
            }
        }
        None
    }
}

/// Check a caller-supplied plan against the region
pub fn validate_channels(params: &RegionParams, channels: &[Channel]) -> Result<(), ChannelPlanError> {
    if channels.len() > params.max_channels as usize {
        return Err(ChannelPlanError::TooManyChannels);
    }

    for (i, channel) in channels.iter().enumerate() {
        if channels[..i].iter().any(|c| c.id == channel.id) {
            return Err(ChannelPlanError::DuplicateId(channel.id));
        }
        if channel.id >= params.max_channels {
            return Err(ChannelPlanError::InvalidId(channel.id));
        }
        if !params.frequency_in_range(channel.frequency)
            || !params.frequency_in_range(channel.downlink_frequency())
        {
            return Err(ChannelPlanError::FrequencyOutOfRange(channel.id));
        }
        if channel.min_dr > channel.max_dr
            || params.data_rate(channel.min_dr).is_none()
            || params.data_rate(channel.max_dr).is_none()
        {
            return Err(ChannelPlanError::InvalidDataRate(channel.id));
        }
        if channel.band as usize >= params.bands.len() {
            return Err(ChannelPlanError::InvalidBand(channel.id));
        }
    }

    Ok(())
}

// Data rate tables

const EU_DATA_RATES: [Option<DataRate>; 16] = [
    DataRate::lora(12, Bandwidth::BW125),
    DataRate::lora(11, Bandwidth::BW125),
    DataRate::lora(10, Bandwidth::BW125),
    DataRate::lora(9, Bandwidth::BW125),
    DataRate::lora(8, Bandwidth::BW125),
    DataRate::lora(7, Bandwidth::BW125),
    DataRate::lora(7, Bandwidth::BW250),
    None, None, None, None, None, None, None, None, None,
];

// DR6 (250 kHz) is not available in KR920 and IN865
const EU_DATA_RATES_125: [Option<DataRate>; 16] = [
    DataRate::lora(12, Bandwidth::BW125),
    DataRate::lora(11, Bandwidth::BW125),
    DataRate::lora(10, Bandwidth::BW125),
    DataRate::lora(9, Bandwidth::BW125),
    DataRate::lora(8, Bandwidth::BW125),
    DataRate::lora(7, Bandwidth::BW125),
    None, None, None, None, None, None, None, None, None, None,
];

const US915_DATA_RATES: [Option<DataRate>; 16] = [
    DataRate::lora(10, Bandwidth::BW125),
    DataRate::lora(9, Bandwidth::BW125),
    DataRate::lora(8, Bandwidth::BW125),
    DataRate::lora(7, Bandwidth::BW125),
    DataRate::lora(8, Bandwidth::BW500),
    None, None, None,
    DataRate::lora(12, Bandwidth::BW500),
    DataRate::lora(11, Bandwidth::BW500),
    DataRate::lora(10, Bandwidth::BW500),
    DataRate::lora(9, Bandwidth::BW500),
    DataRate::lora(8, Bandwidth::BW500),
    DataRate::lora(7, Bandwidth::BW500),
    None, None,
];

const AU915_DATA_RATES: [Option<DataRate>; 16] = [
    DataRate::lora(12, Bandwidth::BW125),
    DataRate::lora(11, Bandwidth::BW125),
    DataRate::lora(10, Bandwidth::BW125),
    DataRate::lora(9, Bandwidth::BW125),
    DataRate::lora(8, Bandwidth::BW125),
    DataRate::lora(7, Bandwidth::BW125),
    DataRate::lora(8, Bandwidth::BW500),
    None,
    DataRate::lora(12, Bandwidth::BW500),
    DataRate::lora(11, Bandwidth::BW500),
    DataRate::lora(10, Bandwidth::BW500),
    DataRate::lora(9, Bandwidth::BW500),
    DataRate::lora(8, Bandwidth::BW500),
    DataRate::lora(7, Bandwidth::BW500),
    None, None,
];

const EU_MAX_PAYLOAD: [u8; 16] = [51, 51, 51, 115, 222, 222, 222, 0, 0, 0, 0, 0, 0, 0, 0, 0];
const AS923_MAX_PAYLOAD: [u8; 16] = [59, 59, 59, 123, 230, 230, 230, 0, 0, 0, 0, 0, 0, 0, 0, 0];
const KR_IN_MAX_PAYLOAD: [u8; 16] = [51, 51, 51, 115, 242, 242, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
const US915_MAX_PAYLOAD: [u8; 16] = [11, 53, 125, 242, 242, 0, 0, 0, 53, 129, 242, 242, 242, 242, 0, 0];
const AU915_MAX_PAYLOAD: [u8; 16] = [51, 51, 51, 115, 242, 242, 242, 0, 53, 129, 242, 242, 242, 242, 0, 0];

// Duty-cycle bands

const UNRESTRICTED: [Band; 1] = [Band { duty_cycle_divisor: 1 }];
const ONE_PERCENT: [Band; 1] = [Band { duty_cycle_divisor: 100 }];

// EU868 sub-bands: g1 868.0-868.6 (default channels), g 865-868, g2 868.7-869.2,
// g3 869.4-869.65, g4 869.7-870.0, g 863-865
const EU868_BANDS: [Band; 6] = [
    Band { duty_cycle_divisor: 100 },
    Band { duty_cycle_divisor: 100 },
    Band { duty_cycle_divisor: 1000 },
    Band { duty_cycle_divisor: 10 },
    Band { duty_cycle_divisor: 100 },
    Band { duty_cycle_divisor: 1000 },
];

// Default channel plans

const EU868_CHANNELS: [Channel; 3] = [
    Channel::new(0, 868_100_000, 0, 5, 0),
    Channel::new(1, 868_300_000, 0, 5, 0),
    Channel::new(2, 868_500_000, 0, 5, 0),
];

const EU433_CHANNELS: [Channel; 3] = [
    Channel::new(0, 433_175_000, 0, 5, 0),
    Channel::new(1, 433_375_000, 0, 5, 0),
    Channel::new(2, 433_575_000, 0, 5, 0),
];

const IN865_CHANNELS: [Channel; 3] = [
    Channel::new(0, 865_062_500, 0, 5, 0),
    Channel::new(1, 865_402_500, 0, 5, 0),
    Channel::new(2, 865_985_000, 0, 5, 0),
];

const AS923_CHANNELS: [Channel; 2] = [
    Channel::new(0, 923_200_000, 0, 5, 0),
    Channel::new(1, 923_400_000, 0, 5, 0),
];

const KR920_CHANNELS: [Channel; 3] = [
    Channel::new(0, 922_100_000, 0, 5, 0),
    Channel::new(1, 922_300_000, 0, 5, 0),
    Channel::new(2, 922_500_000, 0, 5, 0),
];

/// 64 narrow channels plus 8 wide channels with the RX1 downlink frequency
/// derived from the channel index modulo 8
const fn fixed_plan(
    base_125: u32,
    base_500: u32,
    dr_125: (u8, u8),
    dr_500: u8,
    rx1_base: u32,
) -> [Channel; MAX_CHANNELS] {
    let mut channels = [Channel::new(0, 0, 0, 0, 0); MAX_CHANNELS];
    let mut i = 0;
    while i < MAX_CHANNELS {
        let (frequency, min_dr, max_dr) = if i < 64 {
            (base_125 + i as u32 * 200_000, dr_125.0, dr_125.1)
        } else {
            (base_500 + (i as u32 - 64) * 1_600_000, dr_500, dr_500)
        };
        channels[i] = Channel {
            id: i as u8,
            frequency,
            rx_frequency: rx1_base + (i as u32 % 8) * 600_000,
            min_dr,
            max_dr,
            band: 0,
        };
        i += 1;
    }
    channels
}

static US915_CHANNELS: [Channel; MAX_CHANNELS] =
    fixed_plan(902_300_000, 903_000_000, (0, 3), 4, 923_300_000);

static AU915_CHANNELS: [Channel; MAX_CHANNELS] =
    fixed_plan(915_200_000, 915_900_000, (0, 5), 6, 923_300_000);

// Region parameter sets

static EU868_PARAMS: RegionParams = RegionParams {
    region: Region::EU868,
    min_frequency: 863_000_000,
    max_frequency: 870_000_000,
    max_channels: 16,
    default_channels: &EU868_CHANNELS,
    data_rates: &EU_DATA_RATES,
    max_payload: &EU_MAX_PAYLOAD,
    default_data_rate: 0,
    max_tx_power: 7,
    max_eirp_dbm: 16,
    bands: &EU868_BANDS,
    rx2_frequency: 869_525_000,
    rx2_data_rate: 0,
    rx1_mapping: Rx1Mapping::SameAsUplink,
};

static EU433_PARAMS: RegionParams = RegionParams {
    region: Region::EU433,
    min_frequency: 433_175_000,
    max_frequency: 434_665_000,
    max_channels: 16,
    default_channels: &EU433_CHANNELS,
    data_rates: &EU_DATA_RATES,
    max_payload: &EU_MAX_PAYLOAD,
    default_data_rate: 0,
    max_tx_power: 5,
    max_eirp_dbm: 12,
    bands: &ONE_PERCENT,
    rx2_frequency: 434_665_000,
    rx2_data_rate: 0,
    rx1_mapping: Rx1Mapping::SameAsUplink,
};

static IN865_PARAMS: RegionParams = RegionParams {
    region: Region::IN865,
    min_frequency: 865_000_000,
    max_frequency: 867_000_000,
    max_channels: 16,
    default_channels: &IN865_CHANNELS,
    data_rates: &EU_DATA_RATES_125,
    max_payload: &KR_IN_MAX_PAYLOAD,
    default_data_rate: 0,
    max_tx_power: 10,
    max_eirp_dbm: 30,
    bands: &UNRESTRICTED,
    rx2_frequency: 866_550_000,
    rx2_data_rate: 2,
    rx1_mapping: Rx1Mapping::SameAsUplink,
};

static AS923_PARAMS: RegionParams = RegionParams {
    region: Region::AS923,
    min_frequency: 915_000_000,
    max_frequency: 928_000_000,
    max_channels: 16,
    default_channels: &AS923_CHANNELS,
    data_rates: &EU_DATA_RATES,
    max_payload: &AS923_MAX_PAYLOAD,
    default_data_rate: 2,
    max_tx_power: 7,
    max_eirp_dbm: 16,
    bands: &ONE_PERCENT,
    rx2_frequency: 923_200_000,
    rx2_data_rate: 2,
    rx1_mapping: Rx1Mapping::SameAsUplink,
};

static KR920_PARAMS: RegionParams = RegionParams {
    region: Region::KR920,
    min_frequency: 920_900_000,
    max_frequency: 923_300_000,
    max_channels: 16,
    default_channels: &KR920_CHANNELS,
    data_rates: &EU_DATA_RATES_125,
    max_payload: &KR_IN_MAX_PAYLOAD,
    default_data_rate: 0,
    max_tx_power: 7,
    max_eirp_dbm: 14,
    bands: &UNRESTRICTED,
    rx2_frequency: 921_900_000,
    rx2_data_rate: 0,
    rx1_mapping: Rx1Mapping::SameAsUplink,
};

static US915_PARAMS: RegionParams = RegionParams {
    region: Region::US915,
    min_frequency: 902_000_000,
    max_frequency: 928_000_000,
    max_channels: 72,
    default_channels: &US915_CHANNELS,
    data_rates: &US915_DATA_RATES,
    max_payload: &US915_MAX_PAYLOAD,
    default_data_rate: 0,
    max_tx_power: 14,
    max_eirp_dbm: 30,
    bands: &UNRESTRICTED,
    rx2_frequency: 923_300_000,
    rx2_data_rate: 8,
    rx1_mapping: Rx1Mapping::Offset { base: 10, max: 13 },
};

static AU915_PARAMS: RegionParams = RegionParams {
    region: Region::AU915,
    min_frequency: 915_000_000,
    max_frequency: 928_000_000,
    max_channels: 72,
    default_channels: &AU915_CHANNELS,
    data_rates: &AU915_DATA_RATES,
    max_payload: &AU915_MAX_PAYLOAD,
    default_data_rate: 2,
    max_tx_power: 14,
    max_eirp_dbm: 30,
    bands: &UNRESTRICTED,
    rx2_frequency: 923_300_000,
    rx2_data_rate: 8,
    rx1_mapping: Rx1Mapping::Offset { base: 8, max: 13 },
};

#[cfg(test)]
mod tests {
    use super::*;

    fn eu868() -> &'static RegionParams {
        Region::EU868.params().unwrap()
    }

    #[test]
    fn test_region_codes() {
        assert_eq!(Region::from_code(5), Some(Region::EU868));
        assert_eq!(Region::EU868.code(), 5);
        assert_eq!(Region::from_code(8), Some(Region::US915));
        assert_eq!(Region::from_code(42), None);
        assert!(Region::CN470.params().is_none());
    }

    #[test]
    fn test_empty_plan_uses_region_default() {
        let plan = ChannelPlan::new(eu868(), &[]).unwrap();
        assert_eq!(plan.channels().len(), 3);
        assert_eq!(plan.channels()[0].frequency, 868_100_000);

        let plan = ChannelPlan::new(Region::US915.params().unwrap(), &[]).unwrap();
        assert_eq!(plan.channels().len(), 72);
        assert_eq!(plan.channels()[65].frequency, 904_600_000);
        assert_eq!(plan.channels()[9].downlink_frequency(), 923_900_000);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let channels = [
            Channel::new(3, 867_100_000, 0, 5, 1),
            Channel::new(3, 867_300_000, 0, 5, 1),
        ];
        assert_eq!(
            ChannelPlan::new(eu868(), &channels).unwrap_err(),
            ChannelPlanError::DuplicateId(3)
        );
    }

    #[test]
    fn test_plan_bounds_rejected() {
        let out_of_band = [Channel::new(0, 915_000_000, 0, 5, 0)];
        assert_eq!(
            validate_channels(eu868(), &out_of_band),
            Err(ChannelPlanError::FrequencyOutOfRange(0))
        );

        let inverted = [Channel::new(0, 868_100_000, 5, 0, 0)];
        assert_eq!(
            validate_channels(eu868(), &inverted),
            Err(ChannelPlanError::InvalidDataRate(0))
        );

        let undefined_dr = [Channel::new(0, 868_100_000, 0, 9, 0)];
        assert_eq!(
            validate_channels(eu868(), &undefined_dr),
            Err(ChannelPlanError::InvalidDataRate(0))
        );

        let bad_band = [Channel::new(0, 868_100_000, 0, 5, 9)];
        assert_eq!(
            validate_channels(eu868(), &bad_band),
            Err(ChannelPlanError::InvalidBand(0))
        );

        let bad_id = [Channel::new(16, 868_100_000, 0, 5, 0)];
        assert_eq!(
            validate_channels(eu868(), &bad_id),
            Err(ChannelPlanError::InvalidId(16))
        );
    }

    #[test]
    fn test_round_robin_selection() {
        let mut plan = ChannelPlan::new(eu868(), &[]).unwrap();
        let first = plan.next_channel(0, |_| true).unwrap();
        let second = plan.next_channel(0, |_| true).unwrap();
        let third = plan.next_channel(0, |_| true).unwrap();
        let fourth = plan.next_channel(0, |_| true).unwrap();
        assert_eq!((first.id, second.id, third.id, fourth.id), (0, 1, 2, 0));

        // Skips unavailable channels, gives up when none is left
        assert_eq!(plan.next_channel(0, |c| c.id == 2).unwrap().id, 2);
        assert!(plan.next_channel(0, |_| false).is_none());
        assert!(plan.next_channel(6, |_| true).is_none());
    }

    #[test]
    fn test_payload_and_power_limits() {
        let eu = eu868();
        assert_eq!(eu.max_payload_size(0), 51);
        assert_eq!(eu.max_payload_size(5), 222);
        assert_eq!(eu.max_payload_size(7), 0);
        assert!(eu.allows_tx_power(7));
        assert!(!eu.allows_tx_power(8));
        assert!(!eu.allows_tx_power(20));
        assert_eq!(eu.tx_power_dbm(0), 16);
        assert_eq!(eu.tx_power_dbm(3), 10);

        let us = Region::US915.params().unwrap();
        assert_eq!(us.max_payload_size(0), 11);
        assert_eq!(us.rx1_data_rate(0, 0), 10);
        assert_eq!(us.rx1_data_rate(4, 0), 13);
        assert!(us.allows_tx_power(14));
        assert!(!us.allows_tx_power(15));
    }

    #[test]
    fn test_rx1_data_rate_offset() {
        let eu = eu868();
        assert_eq!(eu.rx1_data_rate(5, 2), 3);
        assert_eq!(eu.rx1_data_rate(1, 3), 0);
        assert_eq!(eu.max_rx1_dr_offset(), 5);

        // US915 RX1 stays within DR10..DR13
        let us = Region::US915.params().unwrap();
        assert_eq!(us.rx1_data_rate(3, 1), 12);
        assert_eq!(us.rx1_data_rate(0, 3), 10);
        assert_eq!(us.max_rx1_dr_offset(), 3);
    }
}
