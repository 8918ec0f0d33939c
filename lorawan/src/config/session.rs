use crate::clock::DEFAULT_TICK_US;

/// Session tuning parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Join requests issued per join operation before giving up
    pub join_attempts: u8,
    /// Ceiling for each join attempt in microseconds, counted from the moment
    /// a band has airtime for it
    pub join_timeout_us: u64,
    /// Ceiling for each transmission of a send in microseconds, counted like
    /// `join_timeout_us`
    pub send_timeout_us: u64,
    /// Enforce regulatory duty-cycle off-time per band
    pub duty_cycle_enforced: bool,
    /// Data rate used when a send does not name one (`None` = region default)
    pub default_data_rate: Option<u8>,
    /// Pause between loop iterations in the synchronous variants
    pub poll_interval_us: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_attempts: 3,
            join_timeout_us: 60_000_000,
            send_timeout_us: 60_000_000,
            duty_cycle_enforced: true,
            default_data_rate: None,
            poll_interval_us: DEFAULT_TICK_US as u32,
        }
    }
}
