/// EUI-64 (8 bytes, LSB first as transmitted)
pub type EUI64 = [u8; 8];

/// AES-128 key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AESKey([u8; 16]);

impl AESKey {
    /// Wrap raw key bytes
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// Keys never show up in debug output
impl core::fmt::Debug for AESKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AESKey(..)")
    }
}

/// Device address
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DevAddr([u8; 4]);

impl DevAddr {
    /// Wrap address bytes (LSB first)
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Address bytes (LSB first)
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// LoRaWAN device class
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    /// Class A: Uplink followed by two receive windows
    #[default]
    A,
    /// Class B: Scheduled receive slots (beaconing)
    B,
    /// Class C: Continuously listening except when transmitting
    C,
}

impl DeviceClass {
    /// Decode the class field of a DeviceModeConf command
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DeviceClass::A),
            1 => Some(DeviceClass::B),
            2 => Some(DeviceClass::C),
            _ => None,
        }
    }
}

/// How the device obtains its session keys
#[derive(Debug, Clone, Copy)]
pub enum Activation {
    /// Over-the-air activation with a join request/accept exchange
    Otaa {
        /// Device EUI (unique device identifier)
        dev_eui: EUI64,
        /// Application EUI (JoinEUI)
        app_eui: EUI64,
        /// Application root key
        app_key: AESKey,
    },
    /// Activation by personalisation, keys provisioned in advance
    Abp {
        /// Device address
        dev_addr: DevAddr,
        /// Network session key
        nwk_skey: AESKey,
        /// Application session key
        app_skey: AESKey,
    },
}

/// Device configuration for both OTAA and ABP activation
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Activation method and credentials
    pub activation: Activation,
}

impl DeviceConfig {
    /// Create a new OTAA device configuration
    pub fn new_otaa(dev_eui: EUI64, app_eui: EUI64, app_key: AESKey) -> Self {
        Self {
            activation: Activation::Otaa {
                dev_eui,
                app_eui,
                app_key,
            },
        }
    }

    /// Create a new ABP device configuration
    pub fn new_abp(dev_addr: DevAddr, nwk_skey: AESKey, app_skey: AESKey) -> Self {
        Self {
            activation: Activation::Abp {
                dev_addr,
                nwk_skey,
                app_skey,
            },
        }
    }

    /// Whether the device joins over the air
    pub fn is_otaa(&self) -> bool {
        matches!(self.activation, Activation::Otaa { .. })
    }
}
