//! The shared contract implemented by both bus backends.
//!
//! [`Wire`] captures the full master-mode API: lifecycle (`begin`/`stop`),
//! the write path (`begin_transmission`/`write`/`end_transmission`), and
//! the read path (`request_from`/`available`/`read`). The two
//! implementations are [`Bsc`](crate::Bsc), which drives the controller
//! registers directly, and [`I2cDev`](crate::I2cDev), which delegates to
//! the kernel's i2c-dev driver. A channel uses exactly one backend,
//! chosen at construction time.

use crate::error::Result;

/// Master-mode access to one I2C bus channel.
pub trait Wire {
    /// Acquire the bus: map the register window or open the character
    /// device. Must be called once before any other operation.
    fn begin(&mut self) -> Result<()>;

    /// Release the bus. A no-op when the bus was never acquired.
    fn stop(&mut self) -> Result<()>;

    /// Open a transmission to the slave at `address` (masked to 11 bits).
    ///
    /// Queue bytes with [`write`](Self::write), then commit them with
    /// [`end_transmission`](Self::end_transmission). Calling this again
    /// with a transmission already open restarts it, discarding the
    /// queued bytes.
    fn begin_transmission(&mut self, address: u16) -> Result<()>;

    /// Queue one byte on the open transmission.
    ///
    /// Returns `Ok(true)` when the byte was accepted, `Ok(false)` when
    /// the transmit FIFO has no room. A full FIFO is backpressure, not a
    /// fault; the caller decides whether to commit or give up.
    fn write(&mut self, byte: u8) -> Result<bool>;

    /// Queue a sequence of bytes, stopping at the first one refused.
    ///
    /// Returns the number of bytes actually accepted, which may be less
    /// than `bytes.len()`. Not atomic: partial acceptance is an expected
    /// outcome the caller must handle.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut accepted = 0;
        for &byte in bytes {
            if !self.write(byte)? {
                break;
            }
            accepted += 1;
        }
        Ok(accepted)
    }

    /// Commit the open transmission to the wire.
    ///
    /// Returns the number of bytes handed to the hardware (the accepted
    /// count, not the requested one).
    fn end_transmission(&mut self) -> Result<usize>;

    /// Request `len` bytes from the slave at `address`.
    ///
    /// The bytes are then retrieved one at a time with
    /// [`available`](Self::available) and [`read`](Self::read). Returns
    /// the requested length.
    fn request_from(&mut self, address: u16, len: usize) -> Result<usize>;

    /// Whether at least one received byte is waiting to be read.
    fn available(&mut self) -> Result<bool>;

    /// Pop one received byte.
    ///
    /// Fails with [`Error::FifoEmpty`](crate::Error::FifoEmpty) when no
    /// byte is waiting; check [`available`](Self::available) first.
    fn read(&mut self) -> Result<u8>;

    /// Flush any buffered state. Neither backend buffers outside an open
    /// transmission, so this is a no-op kept for interface parity.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
