//! Master-mode I2C driver for the Raspberry Pi's BSC controllers.
//!
//! This crate drives the SoC's two Broadcom Serial Controller (BSC)
//! instances from userspace, either by mapping their registers through
//! `/dev/mem` and running the transaction state machine in-process
//! ([`Bsc`]), or by delegating to the kernel's i2c-dev driver through
//! `/dev/i2c-N` ([`I2cDev`]). Both backends implement the same [`Wire`]
//! trait, so device code is written once and the backend is picked at
//! construction time.
//!
//! # Quick Start
//!
//! ```no_run
//! use rpi_wire::{Bsc, Channel};
//!
//! // Requires root: /dev/mem access.
//! let mut bus = Bsc::new(Channel::Bus1);
//! bus.begin()?;
//!
//! // Write two bytes to the device at address 0x51.
//! bus.begin_transmission(0x51)?;
//! bus.write_bytes(&[0x02, 0x00])?;
//! bus.end_transmission()?;
//!
//! // Read three bytes back.
//! bus.request_from(0x51, 3)?;
//! while bus.available()? {
//!     println!("{:#04x}", bus.read()?);
//! }
//!
//! bus.stop()?;
//! # Ok::<(), rpi_wire::Error>(())
//! ```
//!
//! # Features
//!
//! - **Two backends, one API**: the mapped-register engine and the
//!   kernel i2c-dev passthrough, both behind [`Wire`].
//! - **Explicit lifecycle**: `begin` maps (or opens), `stop` unmaps (or
//!   closes); every operation on an unacquired bus fails fast instead of
//!   touching dangling pointers.
//! - **Backpressure, not truncation**: `write` reports FIFO-full as a
//!   refused byte; `end_transmission` commits exactly what was accepted.
//! - **Bounded completion wait**: the polling budget is a [`Config`]
//!   knob, and its exhaustion is a recoverable [`Error::Timeout`].
//! - **Diagnostics**: [`BusStatus`] decodes the status register into its
//!   flags and renders the classic one-line dump.
//! - **`embedded-hal`**: optional `embedded_hal::i2c::I2c` impl for both
//!   backends ([`hal`], feature = `embedded-hal`).
//!
//! # Concurrency
//!
//! The two channels are fully independent and may live on different
//! threads. A single channel's engine is strictly single-threaded: the
//! bus types are deliberately not `Sync`, and the mapped-register types
//! are not `Send` either.

pub mod bsc;
pub mod constants;
pub mod error;
#[cfg(feature = "embedded-hal")]
pub mod hal;
pub mod i2cdev;
mod mem;
pub mod registers;
pub mod registry;
pub mod status;
pub mod types;
pub mod wire;

// ---- Convenience re-exports ----

pub use bsc::{Bsc, BscEngine};
pub use constants::{FIFO_DEPTH, PERIPHERAL_BASE};
pub use error::{Error, Result};
pub use i2cdev::I2cDev;
pub use registers::{MappedRegisters, Reg, RegisterBlock};
pub use registry::Buses;
pub use status::BusStatus;
pub use types::{Channel, Config};
pub use wire::Wire;
