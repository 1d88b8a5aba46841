//! A behavioral simulation of the BSC register block, shared by the
//! integration tests.

use std::collections::VecDeque;
use std::time::Duration;

use rpi_wire::constants::{
    C_CLEAR, C_READ, C_ST, FIFO_DEPTH, S_DONE, S_RXD, S_RXF, S_TA, S_TXD, S_TXE,
};
use rpi_wire::{BscEngine, Channel, Config, Reg, RegisterBlock};

/// Simulated controller: a sixteen byte FIFO in each direction, a slave
/// that answers reads from `response`, and a wire that captures committed
/// write bytes.
#[derive(Debug, Default)]
pub struct SimBus {
    /// Last value written to the slave address register.
    pub addr: u32,
    /// Last value written to the data length register.
    pub dlen: u32,
    /// The transmit FIFO.
    pub tx_fifo: VecDeque<u8>,
    /// The receive FIFO.
    pub rx_fifo: VecDeque<u8>,
    /// Bytes the simulated slave will answer a read transfer with.
    pub response: VecDeque<u8>,
    /// Bytes committed to the wire by write transfers, in order.
    pub wire: Vec<u8>,
    /// Status polls after a transfer start before DONE rises.
    pub done_after_polls: u32,
    /// When set, DONE never rises (a hung bus or absent slave).
    pub hang: bool,
    /// Status reads observed since the last transfer start.
    pub polls_since_start: u32,
    /// Every value written to the control register, in order.
    pub control_writes: Vec<u32>,
    transfer: Option<u32>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(response: &[u8]) -> Self {
        Self {
            response: response.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl RegisterBlock for SimBus {
    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::Status => {
                let mut status = 0;
                if self.tx_fifo.len() < FIFO_DEPTH {
                    status |= S_TXD;
                }
                if self.tx_fifo.is_empty() {
                    status |= S_TXE;
                }
                if !self.rx_fifo.is_empty() {
                    status |= S_RXD;
                }
                if self.rx_fifo.len() >= FIFO_DEPTH {
                    status |= S_RXF;
                }
                if let Some(polls_left) = self.transfer.as_mut() {
                    self.polls_since_start += 1;
                    if self.hang {
                        status |= S_TA;
                    } else if *polls_left == 0 {
                        status |= S_DONE;
                    } else {
                        *polls_left -= 1;
                        status |= S_TA;
                    }
                }
                status
            }
            Reg::Fifo => self.rx_fifo.pop_front().map(u32::from).unwrap_or(0),
            Reg::DataLength => self.dlen,
            Reg::SlaveAddress => self.addr,
            Reg::Control => 0,
        }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::Control => {
                self.control_writes.push(value);
                if value & C_CLEAR != 0 {
                    self.tx_fifo.clear();
                    self.rx_fifo.clear();
                }
                if value & C_ST != 0 {
                    if value & C_READ != 0 {
                        // The slave answers with up to DLEN bytes.
                        for _ in 0..self.dlen {
                            match self.response.pop_front() {
                                Some(byte) => self.rx_fifo.push_back(byte),
                                None => break,
                            }
                        }
                    } else {
                        // The controller shifts out DLEN bytes from the FIFO.
                        for _ in 0..self.dlen {
                            match self.tx_fifo.pop_front() {
                                Some(byte) => self.wire.push(byte),
                                None => break,
                            }
                        }
                    }
                    self.transfer = Some(self.done_after_polls);
                    self.polls_since_start = 0;
                }
            }
            Reg::Status => {
                // Write-one-to-clear bits; the sim latches nothing.
            }
            Reg::DataLength => self.dlen = value,
            Reg::SlaveAddress => self.addr = value,
            Reg::Fifo => {
                if self.tx_fifo.len() < FIFO_DEPTH {
                    self.tx_fifo.push_back(value as u8);
                }
            }
        }
    }
}

/// Engine configuration for simulated runs: the default 60 poll budget
/// with no sleeping between polls.
pub fn sim_config() -> Config {
    Config {
        poll_interval: Duration::ZERO,
        ..Config::default()
    }
}

/// An engine with a simulated register block attached.
pub fn sim_engine(sim: SimBus) -> BscEngine<SimBus> {
    let mut engine = BscEngine::with_config(Channel::Bus0, sim_config());
    engine.attach(sim).expect("fresh engine must attach");
    engine
}
