//! The memory-mapped register transaction engine.
//!
//! This is the core of the crate: a state machine that performs one I2C
//! master transaction by programming the controller's registers in the
//! required order and then polling the status register for completion.
//!
//! A write transaction runs as: slave address and a zeroed length into
//! A/DLEN, data bytes pushed into the FIFO register one at a time (each
//! gated on the TXD room flag), then the accepted count into DLEN, the
//! clearable status bits written back, and finally the start-write
//! control word. A read transaction programs A/DLEN/S and the start-read
//! control word in one step, after which the received bytes sit in the
//! FIFO. Both paths finish with the completion wait: poll the DONE flag
//! at a fixed interval until it rises or the poll budget runs out.
//!
//! # Example
//!
//! ```no_run
//! use rpi_wire::{Bsc, Channel};
//!
//! let mut bus = Bsc::new(Channel::Bus1);
//! bus.begin()?;
//!
//! // Set the PCF8563 register pointer, then read the seconds register.
//! bus.begin_transmission(0x51)?;
//! bus.write(0x02)?;
//! bus.end_transmission()?;
//!
//! bus.request_from(0x51, 1)?;
//! while bus.available()? {
//!     println!("seconds: {:#04x}", bus.read()?);
//! }
//!
//! bus.stop()?;
//! # Ok::<(), rpi_wire::Error>(())
//! ```

use std::thread;

use crate::constants::{ADDRESS_MASK, CLEAR_STATUS, FIFO_DEPTH, START_READ, START_WRITE};
use crate::error::{Error, Result};
use crate::registers::{MappedRegisters, Reg, RegisterBlock};
use crate::status::BusStatus;
use crate::types::{Channel, Config};
use crate::wire::Wire;

/// The register transaction engine, generic over its register transport.
///
/// `BscEngine<MappedRegisters>` (aliased as [`Bsc`]) is the production
/// form; tests attach a simulated [`RegisterBlock`] instead. The engine
/// itself never maps or unmaps anything: a register block is attached
/// with [`attach`](Self::attach) and released with
/// [`detach`](Self::detach), and every bus operation fails fast with
/// [`Error::NotMapped`] while none is attached.
#[derive(Debug)]
pub struct BscEngine<R> {
    channel: Channel,
    config: Config,
    regs: Option<R>,
    /// Bytes pushed into the transmit FIFO since `begin_transmission`.
    tx_queued: usize,
    /// Whether a transmission is currently open.
    transmitting: bool,
}

/// The production engine: [`BscEngine`] over the mapped hardware registers.
pub type Bsc = BscEngine<MappedRegisters>;

impl<R: RegisterBlock> BscEngine<R> {
    /// Create an engine for `channel` with no register block attached.
    pub fn with_config(channel: Channel, config: Config) -> Self {
        Self {
            channel,
            config,
            regs: None,
            tx_queued: 0,
            transmitting: false,
        }
    }

    /// The channel this engine is bound to.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The engine's configuration.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Whether a register block is currently attached.
    pub fn is_mapped(&self) -> bool {
        self.regs.is_some()
    }

    /// Attach a register block, entering the idle state.
    ///
    /// Fails with [`Error::AlreadyMapped`] when one is already attached;
    /// release it with [`detach`](Self::detach) (or `stop`) first.
    pub fn attach(&mut self, regs: R) -> Result<()> {
        if self.regs.is_some() {
            return Err(Error::AlreadyMapped);
        }
        self.regs = Some(regs);
        self.tx_queued = 0;
        self.transmitting = false;
        Ok(())
    }

    /// Detach and return the register block, if any was attached.
    ///
    /// Any open transmission is discarded.
    pub fn detach(&mut self) -> Option<R> {
        self.tx_queued = 0;
        self.transmitting = false;
        self.regs.take()
    }

    fn regs_mut(&mut self) -> Result<&mut R> {
        self.regs.as_mut().ok_or(Error::NotMapped)
    }

    /// Read and decode the status register.
    pub fn status(&mut self) -> Result<BusStatus> {
        let raw = self.regs_mut()?.read(Reg::Status);
        Ok(BusStatus::from_raw(raw))
    }

    /// Open a transmission to the slave at `address` (masked to 11 bits).
    ///
    /// Programs the slave address, zeroes the data length, and resets the
    /// queued-byte count. Re-entrant: calling it with a transmission
    /// already open restarts the batch, discarding the queued bytes.
    pub fn begin_transmission(&mut self, address: u16) -> Result<()> {
        let addr = u32::from(address & ADDRESS_MASK);
        let regs = self.regs_mut()?;
        regs.write(Reg::SlaveAddress, addr);
        regs.write(Reg::DataLength, 0);
        self.tx_queued = 0;
        self.transmitting = true;
        Ok(())
    }

    /// Queue one byte on the open transmission.
    ///
    /// The byte goes straight into the hardware FIFO register; nothing is
    /// staged in software. `Ok(false)` means the FIFO had no room (the
    /// TXD flag was clear, or sixteen bytes are already queued) and the
    /// byte was dropped. That is a backpressure signal, not a fault.
    pub fn write(&mut self, byte: u8) -> Result<bool> {
        let status = self.status()?;
        if !self.transmitting {
            return Err(Error::NoTransmission);
        }
        if self.tx_queued >= FIFO_DEPTH || !status.tx_has_room() {
            return Ok(false);
        }
        self.regs_mut()?.write(Reg::Fifo, u32::from(byte));
        self.tx_queued += 1;
        Ok(true)
    }

    /// Queue a sequence of bytes, stopping at the first one refused.
    ///
    /// Returns the number of bytes accepted.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut accepted = 0;
        for &byte in bytes {
            if !self.write(byte)? {
                break;
            }
            accepted += 1;
        }
        Ok(accepted)
    }

    /// Commit the open transmission and wait for it to complete.
    ///
    /// Programs the data length with the accepted byte count (not the
    /// caller's requested count), clears the latched status bits, and
    /// writes the start-write control word. The engine returns to idle
    /// before the completion wait runs, so a timeout leaves it ready for
    /// the caller to retry. Returns the committed byte count.
    pub fn end_transmission(&mut self) -> Result<usize> {
        if self.regs.is_none() {
            return Err(Error::NotMapped);
        }
        if !self.transmitting {
            return Err(Error::NoTransmission);
        }
        let queued = self.tx_queued;
        self.transmitting = false;
        self.tx_queued = 0;

        let regs = self.regs_mut()?;
        regs.write(Reg::DataLength, queued as u32);
        regs.write(Reg::Status, CLEAR_STATUS);
        regs.write(Reg::Control, START_WRITE);

        self.wait_done()?;
        Ok(queued)
    }

    /// Request `len` bytes from the slave at `address` and wait for the
    /// transfer to complete.
    ///
    /// `len` is capped by the hardware FIFO depth; longer requests fail
    /// with [`Error::ReadTooLong`] before touching the bus. The received
    /// bytes are popped with [`available`](Self::available) and
    /// [`read`](Self::read).
    pub fn request_from(&mut self, address: u16, len: usize) -> Result<usize> {
        if len > FIFO_DEPTH {
            return Err(Error::ReadTooLong { requested: len });
        }
        if self.transmitting {
            return Err(Error::TransmissionPending);
        }
        let addr = u32::from(address & ADDRESS_MASK);
        let regs = self.regs_mut()?;
        regs.write(Reg::SlaveAddress, addr);
        regs.write(Reg::DataLength, len as u32);
        regs.write(Reg::Status, CLEAR_STATUS);
        regs.write(Reg::Control, START_READ);

        self.wait_done()?;
        Ok(len)
    }

    /// Whether the receive FIFO holds at least one byte.
    pub fn available(&mut self) -> Result<bool> {
        Ok(self.status()?.rx_has_data())
    }

    /// Pop one byte from the receive FIFO.
    ///
    /// Fails with [`Error::FifoEmpty`] when the RXD flag is clear instead
    /// of returning whatever the FIFO register happens to produce.
    pub fn read(&mut self) -> Result<u8> {
        if !self.status()?.rx_has_data() {
            return Err(Error::FifoEmpty);
        }
        let byte = self.regs_mut()?.read(Reg::Fifo);
        Ok((byte & 0xFF) as u8)
    }

    /// The completion wait: poll the DONE flag until it rises or the poll
    /// budget is exhausted.
    ///
    /// Polls `config.poll_attempts` times, sleeping `config.poll_interval`
    /// between unsuccessful polls. The budget is deliberately fixed; a
    /// low-speed bus finishes its transactions within a few milliseconds,
    /// so there is nothing to adapt to.
    fn wait_done(&mut self) -> Result<()> {
        let attempts = self.config.poll_attempts;
        for poll in 1..=attempts {
            if self.status()?.done() {
                return Ok(());
            }
            if poll < attempts {
                thread::sleep(self.config.poll_interval);
            }
        }
        log::warn!(
            "i2c channel {}: transaction did not complete after {} status polls",
            self.channel.index(),
            attempts
        );
        Err(Error::Timeout { polls: attempts })
    }
}

impl Bsc {
    /// Create an engine for `channel` with the default configuration.
    ///
    /// No hardware is touched until [`begin`](Self::begin).
    pub fn new(channel: Channel) -> Self {
        Self::with_config(channel, Config::default())
    }

    /// Map this channel's register window and enter the idle state.
    ///
    /// Selects the physical base from the channel and the configured
    /// peripheral base. Fails with [`Error::Map`] when `/dev/mem` is not
    /// accessible and with [`Error::AlreadyMapped`] when called twice
    /// without an intervening [`stop`](Self::stop).
    pub fn begin(&mut self) -> Result<()> {
        if self.is_mapped() {
            return Err(Error::AlreadyMapped);
        }
        let base = self.channel().register_base(self.config().peripheral_base);
        let regs = MappedRegisters::map(base)?;
        self.attach(regs)
    }

    /// Unmap the register window.
    ///
    /// A no-op when nothing is mapped, so `begin`/`stop` pairs can be
    /// retried freely.
    pub fn stop(&mut self) -> Result<()> {
        self.detach();
        Ok(())
    }
}

impl Wire for Bsc {
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

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        self.write_bytes(bytes)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{S_DONE, S_RXD, S_TXD};
    use std::time::Duration;

    /// Minimal register fake: scripted status words, recorded writes.
    struct ScriptedRegs {
        status: Vec<u32>,
        status_reads: usize,
        writes: Vec<(Reg, u32)>,
        fifo_reads: Vec<u32>,
    }

    impl ScriptedRegs {
        fn new(status: Vec<u32>) -> Self {
            Self {
                status,
                status_reads: 0,
                writes: Vec::new(),
                fifo_reads: Vec::new(),
            }
        }
    }

    impl RegisterBlock for ScriptedRegs {
        fn read(&mut self, reg: Reg) -> u32 {
            match reg {
                Reg::Status => {
                    let value = self
                        .status
                        .get(self.status_reads)
                        .or(self.status.last())
                        .copied()
                        .unwrap_or(0);
                    self.status_reads += 1;
                    value
                }
                Reg::Fifo => self.fifo_reads.pop().unwrap_or(0),
                _ => 0,
            }
        }

        fn write(&mut self, reg: Reg, value: u32) {
            self.writes.push((reg, value));
        }
    }

    fn test_config() -> Config {
        Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        }
    }

    fn engine(status: Vec<u32>) -> BscEngine<ScriptedRegs> {
        let mut engine = BscEngine::with_config(Channel::Bus0, test_config());
        engine.attach(ScriptedRegs::new(status)).unwrap();
        engine
    }

    #[test]
    fn operations_fail_fast_while_unmapped() {
        let mut engine: BscEngine<ScriptedRegs> =
            BscEngine::with_config(Channel::Bus0, test_config());
        assert!(matches!(
            engine.begin_transmission(0x42),
            Err(Error::NotMapped)
        ));
        assert!(matches!(engine.write(0xAA), Err(Error::NotMapped)));
        assert!(matches!(engine.end_transmission(), Err(Error::NotMapped)));
        assert!(matches!(engine.request_from(0x42, 1), Err(Error::NotMapped)));
        assert!(matches!(engine.available(), Err(Error::NotMapped)));
        assert!(matches!(engine.read(), Err(Error::NotMapped)));
    }

    #[test]
    fn attach_twice_is_rejected() {
        let mut engine = engine(vec![]);
        assert!(matches!(
            engine.attach(ScriptedRegs::new(vec![])),
            Err(Error::AlreadyMapped)
        ));
    }

    #[test]
    fn write_outside_transmission_is_rejected() {
        let mut engine = engine(vec![S_TXD]);
        assert!(matches!(engine.write(0x01), Err(Error::NoTransmission)));
        assert!(matches!(
            engine.end_transmission(),
            Err(Error::NoTransmission)
        ));
    }

    #[test]
    fn begin_transmission_masks_address_and_zeroes_length() {
        let mut engine = engine(vec![]);
        engine.begin_transmission(0xFFFF).unwrap();
        let regs = engine.detach().unwrap();
        assert_eq!(
            regs.writes,
            vec![(Reg::SlaveAddress, 0x7FF), (Reg::DataLength, 0)]
        );
    }

    #[test]
    fn write_respects_txd_flag() {
        // Room for one byte, then the FIFO reports full.
        let mut engine = engine(vec![S_TXD, 0]);
        engine.begin_transmission(0x10).unwrap();
        assert!(engine.write(0xAA).unwrap());
        assert!(!engine.write(0xBB).unwrap());

        let regs = engine.detach().unwrap();
        let fifo_writes: Vec<u32> = regs
            .writes
            .iter()
            .filter(|(reg, _)| *reg == Reg::Fifo)
            .map(|&(_, value)| value)
            .collect();
        assert_eq!(fifo_writes, vec![0xAA]);
    }

    #[test]
    fn seventeenth_write_is_refused_even_with_room() {
        // Status always reports room; the local depth guard must refuse
        // the byte that would overflow the hardware FIFO.
        let mut engine = engine(vec![S_TXD]);
        engine.begin_transmission(0x10).unwrap();
        for i in 0..FIFO_DEPTH {
            assert!(engine.write(i as u8).unwrap(), "byte {i} refused");
        }
        assert!(!engine.write(0xFF).unwrap());
    }

    #[test]
    fn end_transmission_programs_accepted_count_and_start_word() {
        let mut engine = engine(vec![S_TXD, S_TXD, S_TXD, S_DONE]);
        engine.begin_transmission(0x21).unwrap();
        assert_eq!(engine.write_bytes(&[1, 2, 3]).unwrap(), 3);
        assert_eq!(engine.end_transmission().unwrap(), 3);

        let regs = engine.detach().unwrap();
        // The tail of the write sequence commits the transaction:
        // DLEN = accepted count, clearable status bits, start-write.
        let tail = &regs.writes[regs.writes.len() - 3..];
        assert_eq!(
            tail,
            &[
                (Reg::DataLength, 3),
                (Reg::Status, CLEAR_STATUS),
                (Reg::Control, START_WRITE),
            ]
        );
    }

    #[test]
    fn request_from_programs_read_sequence() {
        let mut engine = engine(vec![S_DONE]);
        engine.request_from(0x68, 4).unwrap();

        let regs = engine.detach().unwrap();
        assert_eq!(
            regs.writes,
            vec![
                (Reg::SlaveAddress, 0x68),
                (Reg::DataLength, 4),
                (Reg::Status, CLEAR_STATUS),
                (Reg::Control, START_READ),
            ]
        );
    }

    #[test]
    fn request_from_rejects_oversized_reads() {
        let mut engine = engine(vec![S_DONE]);
        assert!(matches!(
            engine.request_from(0x68, FIFO_DEPTH + 1),
            Err(Error::ReadTooLong { requested: 17 })
        ));
        // Nothing must have reached the registers.
        assert!(engine.detach().unwrap().writes.is_empty());
    }

    #[test]
    fn request_from_rejects_open_transmission() {
        let mut engine = engine(vec![S_TXD]);
        engine.begin_transmission(0x10).unwrap();
        assert!(matches!(
            engine.request_from(0x68, 1),
            Err(Error::TransmissionPending)
        ));
    }

    #[test]
    fn read_pops_fifo_only_when_data_waits() {
        let mut engine = engine(vec![S_RXD, S_RXD, 0]);
        engine.regs_mut().unwrap().fifo_reads = vec![0xBB, 0xAA];
        assert!(engine.available().unwrap());
        assert_eq!(engine.read().unwrap(), 0xAA);
        assert!(matches!(engine.read(), Err(Error::FifoEmpty)));
    }

    #[test]
    fn read_masks_fifo_word_to_byte() {
        let mut engine = engine(vec![S_RXD]);
        engine.regs_mut().unwrap().fifo_reads = vec![0xDEAD_BEEF];
        assert_eq!(engine.read().unwrap(), 0xEF);
    }

    #[test]
    fn timeout_reports_after_exact_poll_budget() {
        // DONE never rises; the engine polls exactly `poll_attempts`
        // times, then reports the timeout.
        let mut engine = engine(vec![S_TXD, 0]);
        engine.begin_transmission(0x3C).unwrap();
        engine.write(0x00).unwrap();
        match engine.end_transmission() {
            Err(Error::Timeout { polls: 60 }) => {}
            other => panic!("expected timeout after 60 polls, got {other:?}"),
        }
        // A timeout leaves the engine idle.
        assert!(matches!(engine.write(0x00), Err(Error::NoTransmission)));

        // 1 TXD read for the first write, 60 completion polls, 1 read
        // for the post-timeout write attempt.
        assert_eq!(engine.detach().unwrap().status_reads, 62);
    }

    #[test]
    fn completion_wait_exits_early_on_done() {
        // DONE rises on the 30th poll of a 60 poll budget.
        let mut status = vec![0; 29];
        status.push(S_DONE);
        let mut engine = engine(status);
        engine.begin_transmission(0x3C).unwrap();
        assert_eq!(engine.end_transmission().unwrap(), 0);
        assert_eq!(engine.detach().unwrap().status_reads, 30);
    }

    #[test]
    fn restarting_transmission_resets_queued_count() {
        let mut engine = engine(vec![S_TXD]);
        engine.begin_transmission(0x10).unwrap();
        assert_eq!(engine.write_bytes(&[1, 2, 3]).unwrap(), 3);

        // Restart: queued count is discarded, fresh address programmed.
        engine.begin_transmission(0x20).unwrap();
        assert_eq!(engine.tx_queued, 0);

        let mut status = vec![S_TXD; 2];
        status.push(S_DONE);
        engine.detach();
        engine.attach(ScriptedRegs::new(status)).unwrap();
        engine.begin_transmission(0x20).unwrap();
        engine.write_bytes(&[9, 8]).unwrap();
        assert_eq!(engine.end_transmission().unwrap(), 2);
    }
}
