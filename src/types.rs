//! Channel selection and engine configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    BSC0_OFFSET, BSC1_OFFSET, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, PERIPHERAL_BASE,
};

/// One of the two BSC controller instances exposed by the SoC.
///
/// The channel determines both the physical register base used by the
/// mapped-register backend and the `/dev/i2c-N` path used by the kernel
/// backend. It is fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// BSC0, exposed by the kernel as `/dev/i2c-0`.
    Bus0,
    /// BSC1, exposed by the kernel as `/dev/i2c-1`.
    Bus1,
}

impl Channel {
    /// Both channels, in index order.
    pub const ALL: [Channel; 2] = [Channel::Bus0, Channel::Bus1];

    /// The channel's numeric index (0 or 1).
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Self::Bus0 => 0,
            Self::Bus1 => 1,
        }
    }

    /// Physical address of this channel's register block for the given
    /// peripheral base.
    pub fn register_base(self, peripheral_base: usize) -> usize {
        let offset = match self {
            Self::Bus0 => BSC0_OFFSET,
            Self::Bus1 => BSC1_OFFSET,
        };
        peripheral_base + offset
    }

    /// Path of the kernel character device for this channel.
    pub fn device_path(self) -> PathBuf {
        PathBuf::from(format!("/dev/i2c-{}", self.index()))
    }
}

/// Tunable parameters for the register-mapped engine.
///
/// The defaults match the controller's expected behavior on a low-speed
/// bus: transactions normally complete within a few milliseconds, so the
/// completion wait polls every millisecond with a 60 poll budget. Tests
/// and callers on unusual bus speeds can shrink or stretch both knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Physical base of the SoC peripheral block.
    ///
    /// 0x2000_0000 on the BCM2835; 0x3F00_0000 on the BCM2836/7.
    pub peripheral_base: usize,
    /// Interval between completion-wait status polls.
    pub poll_interval: Duration,
    /// Number of completion-wait status polls before a transaction is
    /// declared hung.
    pub poll_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peripheral_base: PERIPHERAL_BASE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_indices() {
        assert_eq!(Channel::Bus0.index(), 0);
        assert_eq!(Channel::Bus1.index(), 1);
    }

    #[test]
    fn channel_register_bases() {
        assert_eq!(Channel::Bus0.register_base(0x2000_0000), 0x2020_5000);
        assert_eq!(Channel::Bus1.register_base(0x2000_0000), 0x2080_4000);
        assert_eq!(Channel::Bus1.register_base(0x3F00_0000), 0x3F80_4000);
    }

    #[test]
    fn channel_device_paths() {
        assert_eq!(Channel::Bus0.device_path(), PathBuf::from("/dev/i2c-0"));
        assert_eq!(Channel::Bus1.device_path(), PathBuf::from("/dev/i2c-1"));
    }

    #[test]
    fn default_config_matches_poll_budget() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.poll_attempts, 60);
    }
}
