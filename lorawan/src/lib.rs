//! LoRaWAN session layer in Rust
//!
//! This crate provides a vendor-agnostic LoRaWAN 1.0.x end-device stack for
//! `no_std` targets. A [`Session`](session::Session) sits on top of a
//! [`Mac`](lorawan::Mac) implementation and exposes region setup, OTAA/ABP
//! join, synchronous and asynchronous sends and a cooperative processing
//! loop.
//!
//! # Features
//! - Region selection by numeric code with validated channel plans
//! - Join and send lifecycles with callbacks or blocking variants
//! - Per-band duty-cycle enforcement
//! - Built-in MAC layer over any [`Radio`](radio::Radio) driver
//! - Optional `defmt` logging
//! - No heap, no unsafe code
//!
//! # Example
//! ```no_run
//! use lorawan::{
//!     clock::TickClock,
//!     config::{AESKey, DeviceConfig, SessionConfig},
//!     lorawan::MacLayer,
//!     session::{Confirmation, NoopHandler, SendState, Session, SetupStatus},
//! };
//! # use lorawan::radio::traits::{Radio, RxConfig, TxConfig};
//! # struct Sx;
//! # impl Radio for Sx {
//! #     type Error = ();
//! #     fn init(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn configure_tx(&mut self, _: TxConfig) -> Result<(), ()> { Ok(()) }
//! #     fn configure_rx(&mut self, _: RxConfig) -> Result<(), ()> { Ok(()) }
//! #     fn transmit(&mut self, _: &[u8]) -> Result<(), ()> { Ok(()) }
//! #     fn is_transmitting(&mut self) -> Result<bool, ()> { Ok(false) }
//! #     fn receive(&mut self, _: &mut [u8]) -> nb::Result<usize, ()> { Err(nb::Error::WouldBlock) }
//! #     fn get_rssi(&mut self) -> Result<i16, ()> { Ok(0) }
//! #     fn get_snr(&mut self) -> Result<i8, ()> { Ok(0) }
//! #     fn sleep(&mut self) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Delay;
//! # impl embedded_hal::blocking::delay::DelayUs<u32> for Delay {
//! #     fn delay_us(&mut self, _: u32) {}
//! # }
//! # let (radio, mut delay) = (Sx, Delay);
//! // Advanced by the 1 ms systick interrupt
//! let clock = TickClock::new();
//!
//! let device = DeviceConfig::new_otaa(
//!     [0x00; 8],               // DevEUI
//!     [0x00; 8],               // AppEUI
//!     AESKey::new([0x00; 16]), // AppKey
//! );
//! let mac = MacLayer::new(radio, device);
//! let mut session = Session::new(mac, &clock, NoopHandler, SessionConfig::default());
//!
//! // EU868 with the region default channels
//! assert_eq!(session.setup(5, &[]), SetupStatus::Success);
//!
//! if session.join_sync(&mut delay).is_ok() && session.has_joined() {
//!     let state = session
//!         .send_sync(b"hello", 1, None, Confirmation::Unconfirmed, 0, &mut delay)
//!         .ok();
//!     assert_eq!(state, Some(SendState::Sent));
//! }
//! ```

#![warn(missing_docs)]
#![no_std]

#[macro_use]
mod fmt;

/// Monotonic time source
pub mod clock;

/// Device and session configuration
pub mod config;

/// Cryptographic functions
pub mod crypto;

/// LoRaWAN protocol implementation
pub mod lorawan;

/// Radio hardware abstraction layer
pub mod radio;

/// Session state machine and processing loop
pub mod session;

pub use session::{Session, SessionError};
