//! Device and session configuration
//!
//! This module contains the types used to configure a LoRaWAN session:
//! - Device credentials (DevEUI, AppEUI, keys) for OTAA and ABP
//! - Session tuning (timeouts, join attempts, duty-cycle enforcement)

/// Device credentials and activation
pub mod device;

/// Session tuning parameters
pub mod session;

pub use device::{AESKey, Activation, DevAddr, DeviceClass, DeviceConfig, EUI64};
pub use session::SessionConfig;
