//! Kernel character-device backend.
//!
//! [`I2cDev`] drives the same bus as [`Bsc`](crate::Bsc) but through the
//! kernel's i2c-dev driver: open `/dev/i2c-N`, point it at a slave with
//! the set-slave-address ioctl, then move bytes with plain reads and
//! writes on the descriptor. The kernel owns the controller state
//! machine, so this backend has no completion polling of its own.
//!
//! Unlike the register engine, the kernel imposes no sixteen byte FIFO
//! limit; `write` always accepts and `request_from` takes any length.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write as IoWrite};
use std::os::unix::io::AsRawFd;

use crate::constants::{ADDRESS_MASK, I2C_SLAVE};
use crate::error::{Error, Result};
use crate::types::Channel;
use crate::wire::Wire;

/// Master-mode access to one bus channel via `/dev/i2c-N`.
///
/// # Example
///
/// ```no_run
/// use rpi_wire::{Channel, I2cDev};
///
/// let mut bus = I2cDev::new(Channel::Bus1);
/// bus.begin()?;
/// bus.begin_transmission(0x51)?;
/// bus.write(0x02)?;
/// bus.end_transmission()?;
/// # Ok::<(), rpi_wire::Error>(())
/// ```
#[derive(Debug)]
pub struct I2cDev {
    channel: Channel,
    dev: Option<File>,
    /// Outgoing bytes queued since `begin_transmission`; `None` while no
    /// transmission is open.
    tx: Option<Vec<u8>>,
    /// Bytes still expected from the last `request_from`.
    rx_remaining: usize,
}

impl I2cDev {
    /// Create a backend for `channel`. The device is not opened until
    /// [`begin`](Self::begin).
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            dev: None,
            tx: None,
            rx_remaining: 0,
        }
    }

    /// The channel this backend is bound to.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Whether the character device is currently open.
    pub fn is_open(&self) -> bool {
        self.dev.is_some()
    }

    fn dev_mut(&mut self) -> Result<&mut File> {
        self.dev.as_mut().ok_or(Error::NotOpen)
    }

    /// Issue the set-slave-address ioctl.
    fn set_slave(&mut self, address: u16) -> Result<()> {
        let addr = libc::c_ulong::from(address & ADDRESS_MASK);
        let fd = self.dev_mut()?.as_raw_fd();
        let rc = unsafe { libc::ioctl(fd, I2C_SLAVE, addr) };
        if rc < 0 {
            return Err(Error::Ioctl {
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    /// Open this channel's `/dev/i2c-N` device.
    pub fn begin(&mut self) -> Result<()> {
        if self.dev.is_some() {
            return Err(Error::AlreadyOpen);
        }
        let path = self.channel.device_path();
        let dev = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(dev) => dev,
            Err(source) => return Err(Error::DeviceOpen { path, source }),
        };
        log::debug!("opened {} for channel {}", path.display(), self.channel.index());
        self.dev = Some(dev);
        self.tx = None;
        self.rx_remaining = 0;
        Ok(())
    }

    /// Close the device. A no-op when it was never opened.
    pub fn stop(&mut self) -> Result<()> {
        self.dev = None;
        self.tx = None;
        self.rx_remaining = 0;
        Ok(())
    }

    /// Open a transmission to the slave at `address`.
    ///
    /// Points the descriptor at the slave immediately; bytes queued with
    /// [`write`](Self::write) are held back until
    /// [`end_transmission`](Self::end_transmission) commits them in a
    /// single descriptor write, so the kernel performs one I2C
    /// transaction for the whole batch.
    pub fn begin_transmission(&mut self, address: u16) -> Result<()> {
        self.set_slave(address)?;
        self.tx = Some(Vec::new());
        Ok(())
    }

    /// Queue one byte on the open transmission. Always accepted; the
    /// kernel has no FIFO limit for this backend to signal.
    pub fn write(&mut self, byte: u8) -> Result<bool> {
        if self.dev.is_none() {
            return Err(Error::NotOpen);
        }
        match self.tx.as_mut() {
            Some(tx) => {
                tx.push(byte);
                Ok(true)
            }
            None => Err(Error::NoTransmission),
        }
    }

    /// Commit the queued bytes as one descriptor write.
    ///
    /// Returns the committed byte count. An empty batch performs no
    /// descriptor write at all.
    pub fn end_transmission(&mut self) -> Result<usize> {
        if self.dev.is_none() {
            return Err(Error::NotOpen);
        }
        let tx = self.tx.take().ok_or(Error::NoTransmission)?;
        if !tx.is_empty() {
            self.dev_mut()?.write_all(&tx)?;
        }
        Ok(tx.len())
    }

    /// Request `len` bytes from the slave at `address`.
    ///
    /// Only records the expectation; the actual descriptor reads happen
    /// byte by byte in [`read`](Self::read).
    pub fn request_from(&mut self, address: u16, len: usize) -> Result<usize> {
        if self.tx.is_some() {
            return Err(Error::TransmissionPending);
        }
        self.set_slave(address)?;
        self.rx_remaining = len;
        Ok(len)
    }

    /// Whether bytes from the last request are still outstanding.
    pub fn available(&mut self) -> Result<bool> {
        if self.dev.is_none() {
            return Err(Error::NotOpen);
        }
        Ok(self.rx_remaining > 0)
    }

    /// Read one requested byte from the descriptor.
    pub fn read(&mut self) -> Result<u8> {
        if self.rx_remaining == 0 {
            // Match the register engine's contract for reading past the
            // end of a request.
            self.dev_mut()?;
            return Err(Error::FifoEmpty);
        }
        let mut buf = [0u8; 1];
        self.dev_mut()?.read_exact(&mut buf)?;
        self.rx_remaining -= 1;
        Ok(buf[0])
    }
}

impl Wire for I2cDev {
    fn begin(&mut self) -> Result<()> {
        self.begin()
    }

    fn stop(&mut self) -> Result<()> {
        self.stop()
    }

    fn begin_transmission(&mut self, address: u16) -> Result<()> {
        self.begin_transmission(address)
    }

    fn write(&mut self, byte: u8) -> Result<bool> {
        self.write(byte)
    }

    fn end_transmission(&mut self) -> Result<usize> {
        self.end_transmission()
    }

    fn request_from(&mut self, address: u16, len: usize) -> Result<usize> {
        self.request_from(address, len)
    }

    fn available(&mut self) -> Result<bool> {
        self.available()
    }

    fn read(&mut self) -> Result<u8> {
        self.read()
    }
}
