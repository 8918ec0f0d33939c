use super::region::DataRate;
use crate::radio::traits::{ModulationParams, Radio, RxConfig, TxConfig};

/// Coding rate used for every LoRaWAN frame (4/5)
pub const CODING_RATE: u8 = 1;

/// Preamble length in symbols
const PREAMBLE_SYMBOLS: u64 = 8;

/// PHY layer timing parameters, all in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingParams {
    /// Delay from end of uplink to RX1 opening
    pub rx1_delay_us: u64,
    /// Delay from end of uplink to RX2 opening
    pub rx2_delay_us: u64,
    /// Delay from end of join request to the first join-accept window
    pub join_accept_delay1_us: u64,
    /// Delay from end of join request to the second join-accept window
    pub join_accept_delay2_us: u64,
    /// How long a receive window stays open
    pub rx_window_us: u64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            rx1_delay_us: 1_000_000,
            rx2_delay_us: 2_000_000,
            join_accept_delay1_us: 5_000_000,
            join_accept_delay2_us: 6_000_000,
            rx_window_us: 500_000,
        }
    }
}

impl TimingParams {
    /// Apply an RX1 delay in seconds as carried by join accepts and
    /// RXTimingSetupReq (0 is treated as 1)
    pub fn set_rx_delay_secs(&mut self, delay: u8) {
        let secs = (delay & 0x0F).max(1) as u64;
        self.rx1_delay_us = secs * 1_000_000;
        self.rx2_delay_us = (secs + 1) * 1_000_000;
    }
}

/// Time on air of a LoRa frame in microseconds
///
/// Explicit header, CRC on, coding rate 4/5, low data rate optimisation for
/// SF11/SF12 at 125 kHz.
pub fn time_on_air_us(data_rate: DataRate, payload_len: usize) -> u64 {
    let sf = data_rate.spreading_factor as i64;
    let bw = data_rate.bandwidth() as u64;
    let t_sym = ((1u64 << sf) * 1_000_000) / bw;
    let de = if sf >= 11 && bw == 125_000 { 1 } else { 0 };

    let numerator = 8 * payload_len as i64 - 4 * sf + 28 + 16;
    let denominator = 4 * (sf - 2 * de);
    let blocks = if numerator > 0 {
        (numerator + denominator - 1) / denominator
    } else {
        0
    };
    let payload_symbols = 8 + blocks as u64 * (CODING_RATE as u64 + 4);

    // Preamble lasts n + 4.25 symbols
    let preamble_us = (PREAMBLE_SYMBOLS * 4 + 17) * t_sym / 4;
    preamble_us + payload_symbols * t_sym
}

/// PHY layer
pub struct PhyLayer<R: Radio> {
    /// Radio driver
    pub radio: R,
    /// Receive window timing
    pub timing: TimingParams,
}

impl<R: Radio> PhyLayer<R> {
    /// Create new PHY layer
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            timing: TimingParams::default(),
        }
    }

    /// Initialize radio
    pub fn init(&mut self) -> Result<(), R::Error> {
        self.radio.init()
    }

    /// Configure radio for transmission
    pub fn configure_tx(
        &mut self,
        frequency: u32,
        data_rate: DataRate,
        power: i8,
    ) -> Result<(), R::Error> {
        let config = TxConfig {
            frequency,
            power,
            modulation: modulation(data_rate),
        };
        self.radio.configure_tx(config)
    }

    /// Configure radio for reception
    pub fn configure_rx(
        &mut self,
        frequency: u32,
        data_rate: DataRate,
        continuous: bool,
    ) -> Result<(), R::Error> {
        let config = RxConfig {
            frequency,
            modulation: modulation(data_rate),
            continuous,
        };
        self.radio.configure_rx(config)
    }

    /// Transmit data
    pub fn transmit(&mut self, data: &[u8]) -> Result<(), R::Error> {
        self.radio.transmit(data)
    }

    /// Receive data
    pub fn receive(&mut self, buffer: &mut [u8]) -> nb::Result<usize, R::Error> {
        self.radio.receive(buffer)
    }

    /// Get RSSI
    pub fn get_rssi(&mut self) -> Result<i16, R::Error> {
        self.radio.get_rssi()
    }

    /// Get SNR
    pub fn get_snr(&mut self) -> Result<i8, R::Error> {
        self.radio.get_snr()
    }

    /// Check if transmitting
    pub fn is_transmitting(&mut self) -> Result<bool, R::Error> {
        self.radio.is_transmitting()
    }

    /// Put the radio to sleep between windows
    pub fn sleep(&mut self) -> Result<(), R::Error> {
        self.radio.sleep()
    }
}

fn modulation(data_rate: DataRate) -> ModulationParams {
    ModulationParams {
        spreading_factor: data_rate.spreading_factor(),
        bandwidth: data_rate.bandwidth(),
        coding_rate: CODING_RATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lorawan::region::Bandwidth;

    fn dr(spreading_factor: u8, bandwidth: Bandwidth) -> DataRate {
        DataRate {
            spreading_factor,
            bandwidth,
        }
    }

    #[test]
    fn test_time_on_air_sf7_125k() {
        // 13-byte empty uplink at SF7/125 kHz is 46.336 ms
        assert_eq!(time_on_air_us(dr(7, Bandwidth::BW125), 13), 46_336);
    }

    #[test]
    fn test_time_on_air_grows_with_sf_and_payload() {
        let sf7 = time_on_air_us(dr(7, Bandwidth::BW125), 20);
        let sf12 = time_on_air_us(dr(12, Bandwidth::BW125), 20);
        assert!(sf12 > sf7 * 20);

        let short = time_on_air_us(dr(9, Bandwidth::BW125), 10);
        let long = time_on_air_us(dr(9, Bandwidth::BW125), 60);
        assert!(long > short);
    }

    #[test]
    fn test_rx_delay_from_join_accept() {
        let mut timing = TimingParams::default();
        timing.set_rx_delay_secs(0);
        assert_eq!(timing.rx1_delay_us, 1_000_000);
        timing.set_rx_delay_secs(3);
        assert_eq!(timing.rx1_delay_us, 3_000_000);
        assert_eq!(timing.rx2_delay_us, 4_000_000);
    }
}
