//! Error types for the rpi-wire crate.

use std::io;
use std::path::PathBuf;

/// The error type for I2C bus operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mapping the controller's register window into the process failed.
    ///
    /// The usual cause is insufficient privilege: `/dev/mem` access
    /// requires root (or `CAP_SYS_RAWIO`).
    #[error("cannot map BSC registers at {base:#x}: {source}")]
    Map {
        /// Physical base address that was being mapped.
        base: usize,
        /// The underlying OS error.
        source: io::Error,
    },

    /// `begin` was called while the register window is already mapped.
    #[error("register window is already mapped; call stop() first")]
    AlreadyMapped,

    /// A bus operation was attempted before `begin` mapped the registers.
    #[error("register window is not mapped; call begin() first")]
    NotMapped,

    /// `write` or `end_transmission` was called with no transmission open.
    #[error("no transmission in progress; call begin_transmission() first")]
    NoTransmission,

    /// `request_from` was called while a transmission is still open.
    #[error("transmission in progress; finish it with end_transmission() first")]
    TransmissionPending,

    /// The completion wait exhausted its poll budget without the
    /// controller reporting DONE.
    ///
    /// Usually a hung bus, a missing or unresponsive slave, or a wrong
    /// address. The engine is left idle; the caller may retry.
    #[error("transaction did not complete after {polls} status polls")]
    Timeout {
        /// Number of status polls performed before giving up.
        polls: u32,
    },

    /// `read` was called while the receive FIFO is empty.
    #[error("receive FIFO is empty")]
    FifoEmpty,

    /// `request_from` asked for more bytes than the hardware FIFO holds.
    #[error("read length {requested} exceeds the hardware FIFO depth")]
    ReadTooLong {
        /// The requested read length.
        requested: usize,
    },

    /// Invalid argument(s) were provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A bus operation was attempted before `begin` opened the character
    /// device.
    #[error("device is not open; call begin() first")]
    NotOpen,

    /// `begin` was called while the character device is already open.
    #[error("device is already open; call stop() first")]
    AlreadyOpen,

    /// The kernel I2C character device could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    DeviceOpen {
        /// The device path, e.g. `/dev/i2c-1`.
        path: PathBuf,
        /// The underlying OS error.
        source: io::Error,
    },

    /// The set-slave-address ioctl on the character device failed.
    #[error("cannot set slave address: {source}")]
    Ioctl {
        /// The underlying OS error.
        source: io::Error,
    },

    /// A read or write on the character device failed.
    #[error("I2C device I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for I2C bus operations.
pub type Result<T> = std::result::Result<T, Error>;
