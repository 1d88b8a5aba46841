//! Decoded view of the BSC status register.

use std::fmt;

use crate::constants::*;

/// A snapshot of the controller's status register.
///
/// Wraps the raw 32-bit word and exposes one predicate per flag. The
/// engine drives its flow control off [`done`](Self::done),
/// [`tx_has_room`](Self::tx_has_room) and [`rx_has_data`](Self::rx_has_data);
/// the remaining flags are diagnostic.
///
/// The `Display` impl renders the one-line dump used for bus debugging:
///
/// ```text
/// CLKT=0  ERR=0  RXF=0  TXE=1  RXD=0  TXD=1  RXR=0  TXW=0  DONE=1  TA=0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusStatus(u32);

impl BusStatus {
    /// Wrap a raw status word.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw status word.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The slave held the clock low past the stretch timeout.
    #[inline]
    pub fn clock_timeout(self) -> bool {
        self.0 & S_CLKT != 0
    }

    /// The slave failed to acknowledge an address or data byte.
    #[inline]
    pub fn bus_error(self) -> bool {
        self.0 & S_ERR != 0
    }

    /// The receive FIFO is full.
    #[inline]
    pub fn rx_full(self) -> bool {
        self.0 & S_RXF != 0
    }

    /// The transmit FIFO is empty.
    #[inline]
    pub fn tx_empty(self) -> bool {
        self.0 & S_TXE != 0
    }

    /// The receive FIFO holds at least one byte.
    #[inline]
    pub fn rx_has_data(self) -> bool {
        self.0 & S_RXD != 0
    }

    /// The transmit FIFO can accept at least one byte.
    #[inline]
    pub fn tx_has_room(self) -> bool {
        self.0 & S_TXD != 0
    }

    /// The receive FIFO is past its watermark and needs reading.
    #[inline]
    pub fn rx_needs_reading(self) -> bool {
        self.0 & S_RXR != 0
    }

    /// The transmit FIFO is below its watermark and needs writing.
    #[inline]
    pub fn tx_needs_writing(self) -> bool {
        self.0 & S_TXW != 0
    }

    /// The transfer has completed.
    #[inline]
    pub fn done(self) -> bool {
        self.0 & S_DONE != 0
    }

    /// A transfer is currently active on the wire.
    #[inline]
    pub fn transfer_active(self) -> bool {
        self.0 & S_TA != 0
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CLKT={}  ERR={}  RXF={}  TXE={}  RXD={}  TXD={}  RXR={}  TXW={}  DONE={}  TA={}",
            self.clock_timeout() as u8,
            self.bus_error() as u8,
            self.rx_full() as u8,
            self.tx_empty() as u8,
            self.rx_has_data() as u8,
            self.tx_has_room() as u8,
            self.rx_needs_reading() as u8,
            self.tx_needs_writing() as u8,
            self.done() as u8,
            self.transfer_active() as u8,
        )
    }
}
