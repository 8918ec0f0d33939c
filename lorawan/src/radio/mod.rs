//! Radio hardware abstraction

/// Radio driver interface
pub mod traits;

pub use traits::Radio;
