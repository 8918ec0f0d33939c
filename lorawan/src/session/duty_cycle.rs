use crate::lorawan::region::Band;

/// Largest number of duty-cycle bands in any region table
pub const MAX_BANDS: usize = 8;

/// Per-band transmit off-time tracker
///
/// After a frame of airtime `T` on a band with divisor `D`, the band stays
/// closed until `tx_end + T * (D - 1)`, which keeps the on-air fraction at
/// `1 / D`.
#[derive(Debug, Clone)]
pub struct DutyCycle {
    blocked_until: [u64; MAX_BANDS],
    enforced: bool,
}

impl DutyCycle {
    /// Create a tracker; a disabled tracker reports every band as available
    pub fn new(enforced: bool) -> Self {
        Self {
            blocked_until: [0; MAX_BANDS],
            enforced,
        }
    }

    /// Whether off-time is enforced
    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    /// Whether `band` may transmit at `now_us`
    pub fn is_available(&self, band: u8, now_us: u64) -> bool {
        !self.enforced || now_us >= self.available_at(band)
    }

    /// Earliest time `band` may transmit again
    pub fn available_at(&self, band: u8) -> u64 {
        self.blocked_until
            .get(band as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Account for a transmission that ended at `tx_end_us`
    pub fn record(&mut self, band_index: u8, band: Band, tx_end_us: u64, time_on_air_us: u64) {
        let off_time = time_on_air_us.saturating_mul(band.duty_cycle_divisor.saturating_sub(1) as u64);
        if let Some(slot) = self.blocked_until.get_mut(band_index as usize) {
            *slot = (*slot).max(tx_end_us.saturating_add(off_time));
        }
    }

    /// Forget all recorded transmissions
    pub fn reset(&mut self) {
        self.blocked_until = [0; MAX_BANDS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PERCENT: Band = Band {
        duty_cycle_divisor: 100,
    };

    #[test]
    fn test_one_percent_off_time() {
        let mut dc = DutyCycle::new(true);
        dc.record(0, ONE_PERCENT, 1_000_000, 50_000);

        // 50 ms on air at 1 % closes the band for 4.95 s
        assert_eq!(dc.available_at(0), 5_950_000);
        assert!(!dc.is_available(0, 5_949_999));
        assert!(dc.is_available(0, 5_950_000));
        assert!(dc.is_available(1, 1_000_000));
    }

    #[test]
    fn test_unrestricted_band_and_disabled_tracker() {
        let mut dc = DutyCycle::new(true);
        dc.record(2, Band { duty_cycle_divisor: 1 }, 10, 1_000);
        assert!(dc.is_available(2, 10));

        let mut off = DutyCycle::new(false);
        off.record(0, ONE_PERCENT, 0, 1_000_000);
        assert!(off.is_available(0, 1));
    }

    #[test]
    fn test_out_of_range_band_is_ignored() {
        let mut dc = DutyCycle::new(true);
        dc.record(MAX_BANDS as u8, ONE_PERCENT, 0, 1_000);
        assert!(dc.is_available(MAX_BANDS as u8, 0));

        dc.record(0, ONE_PERCENT, 0, 1_000);
        dc.reset();
        assert!(dc.is_available(0, 0));
    }
}
