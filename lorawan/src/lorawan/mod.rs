//! LoRaWAN protocol implementation
//!
//! This module contains the protocol machinery underneath the session:
//! - MAC seam and the built-in MAC layer
//! - PHY layer operations and time on air
//! - Regional parameters and channel plans
//! - MAC command handling

/// MAC command handling
pub mod commands;

/// MAC layer implementation
pub mod mac;

/// PHY layer operations
pub mod phy;

/// Regional parameters and configurations
pub mod region;

pub use mac::{Mac, MacError, MacEvent, MacLayer};
pub use phy::{PhyLayer, TimingParams};
pub use region::{Channel, ChannelPlan, Region};
