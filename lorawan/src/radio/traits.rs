/// Radio modulation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulationParams {
    /// Spreading factor (SF7-SF12)
    pub spreading_factor: u8,
    /// Bandwidth in Hz
    pub bandwidth: u32,
    /// Coding rate denominator offset (1 = 4/5 ... 4 = 4/8)
    pub coding_rate: u8,
}

/// Radio transmission parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfig {
    /// Transmission power in dBm
    pub power: i8,
    /// Frequency in Hz
    pub frequency: u32,
    /// Modulation parameters
    pub modulation: ModulationParams,
}

/// Radio receive parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxConfig {
    /// Frequency in Hz
    pub frequency: u32,
    /// Modulation parameters
    pub modulation: ModulationParams,
    /// Receive in continuous mode (class C) rather than a single window
    pub continuous: bool,
}

/// Generic radio interface trait
///
/// Drivers for concrete transceivers implement this trait; the MAC layer
/// only ever talks to the radio through it.
pub trait Radio {
    /// Error type for radio operations
    type Error;

    /// Initialize the radio
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Configure the radio for transmission
    fn configure_tx(&mut self, config: TxConfig) -> Result<(), Self::Error>;

    /// Configure the radio for reception and start listening
    fn configure_rx(&mut self, config: RxConfig) -> Result<(), Self::Error>;

    /// Start transmitting a frame
    fn transmit(&mut self, buffer: &[u8]) -> Result<(), Self::Error>;

    /// Check if the radio is still transmitting
    fn is_transmitting(&mut self) -> Result<bool, Self::Error>;

    /// Fetch a received frame into `buffer`
    ///
    /// Returns `WouldBlock` while nothing has been received.
    fn receive(&mut self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error>;

    /// Get the last packet's RSSI (Received Signal Strength Indicator)
    fn get_rssi(&mut self) -> Result<i16, Self::Error>;

    /// Get the last packet's SNR (Signal to Noise Ratio)
    fn get_snr(&mut self) -> Result<i8, Self::Error>;

    /// Put the radio into sleep mode
    fn sleep(&mut self) -> Result<(), Self::Error>;
}
