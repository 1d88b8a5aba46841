//! The two-channel bus registry.
//!
//! The SoC exposes exactly two BSC controller instances. [`Buses`] holds
//! one pre-constructed engine per channel behind the [`Wire`] trait,
//! built once at startup by the caller and passed around by reference.
//! There is no hidden global state, and each channel can be driven (or
//! mocked) independently. The backend is chosen at construction and is
//! never mixed per channel afterwards.

use crate::bsc::Bsc;
use crate::error::Result;
use crate::i2cdev::I2cDev;
use crate::types::{Channel, Config};
use crate::wire::Wire;

/// One bus instance per channel, all on the same backend.
///
/// # Example
///
/// ```no_run
/// use rpi_wire::{Buses, Channel, Wire};
///
/// let mut buses = Buses::mapped();
/// let bus = buses.channel_mut(Channel::Bus1);
/// bus.begin()?;
/// bus.request_from(0x51, 2)?;
/// # Ok::<(), rpi_wire::Error>(())
/// ```
pub struct Buses {
    channels: [Box<dyn Wire>; 2],
}

impl Buses {
    /// Both channels on the mapped-register backend, default configuration.
    ///
    /// Construction touches no hardware; each channel maps its registers
    /// when `begin` is called on it.
    pub fn mapped() -> Self {
        Self::mapped_with_config(Config::default())
    }

    /// Both channels on the mapped-register backend with a shared
    /// configuration.
    pub fn mapped_with_config(config: Config) -> Self {
        Self {
            channels: [
                Box::new(Bsc::with_config(Channel::Bus0, config)),
                Box::new(Bsc::with_config(Channel::Bus1, config)),
            ],
        }
    }

    /// Both channels on the kernel `/dev/i2c-N` backend.
    pub fn kernel() -> Self {
        Self {
            channels: [
                Box::new(I2cDev::new(Channel::Bus0)),
                Box::new(I2cDev::new(Channel::Bus1)),
            ],
        }
    }

    /// The bus instance for `channel`.
    pub fn channel_mut(&mut self, channel: Channel) -> &mut dyn Wire {
        self.channels[channel.index() as usize].as_mut()
    }

    /// Release both channels.
    pub fn stop_all(&mut self) -> Result<()> {
        for bus in &mut self.channels {
            bus.stop()?;
        }
        Ok(())
    }
}
