//! `embedded-hal` 1.0 trait implementations.
//!
//! This module lets either backend drive any `embedded-hal` I2C device
//! driver. Enable the `embedded-hal` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rpi-wire = { version = "0.1", features = ["embedded-hal"] }
//! ```
//!
//! One departure from the `I2c::transaction` contract: the BSC controller
//! cannot chain operations under a repeated START, so each operation in a
//! transaction runs as an independent START..STOP bus transaction. Most
//! register-style device drivers only issue single-operation transactions
//! (or a write followed by a read), which both work here.

use crate::error::Error;
use crate::wire::Wire;

/// Embedded-hal error kind mapping for bus errors.
///
/// The controller's return path does not distinguish a NACK from other
/// failures, so everything maps to `Other`; the raw error remains
/// available through the error type itself.
impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::Other
    }
}

/// Wrapper that implements `embedded_hal::i2c::I2c` for any [`Wire`] bus.
///
/// # Example
///
/// ```no_run
/// use rpi_wire::{hal::WireI2c, Bsc, Channel};
///
/// let mut bus = Bsc::new(Channel::Bus1);
/// bus.begin()?;
/// let mut i2c = WireI2c::new(bus);
///
/// // Use with any embedded-hal I2C driver:
/// use embedded_hal::i2c::I2c;
/// let mut buf = [0u8; 2];
/// i2c.write_read(0x48, &[0x00], &mut buf)?;
/// # Ok::<(), rpi_wire::Error>(())
/// ```
pub struct WireI2c<W> {
    bus: W,
}

impl<W: Wire> WireI2c<W> {
    /// Wrap an already-acquired bus.
    pub fn new(bus: W) -> Self {
        Self { bus }
    }

    /// Borrow the underlying bus.
    pub fn bus(&self) -> &W {
        &self.bus
    }

    /// Mutably borrow the underlying bus.
    pub fn bus_mut(&mut self) -> &mut W {
        &mut self.bus
    }

    /// Decompose into the underlying bus.
    pub fn into_inner(self) -> W {
        self.bus
    }
}

impl<W: Wire> embedded_hal::i2c::ErrorType for WireI2c<W> {
    type Error = Error;
}

impl<W: Wire> embedded_hal::i2c::I2c for WireI2c<W> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        use embedded_hal::i2c::Operation;

        for op in operations.iter_mut() {
            match op {
                Operation::Write(buf) => {
                    self.bus.begin_transmission(address.into())?;
                    let accepted = self.bus.write_bytes(buf)?;
                    if accepted < buf.len() {
                        // The FIFO refused part of the payload; committing
                        // a truncated write would corrupt the device state.
                        return Err(Error::InvalidArgument(
                            "write exceeds the transmit FIFO capacity",
                        ));
                    }
                    self.bus.end_transmission()?;
                }
                Operation::Read(buf) => {
                    self.bus.request_from(address.into(), buf.len())?;
                    for slot in buf.iter_mut() {
                        *slot = self.bus.read()?;
                    }
                }
            }
        }
        Ok(())
    }
}
