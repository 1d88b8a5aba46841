//! PCF8563 real-time clock demo.
//!
//! Reads the time-of-day registers from a PCF8563 RTC on channel 1
//! using the mapped-register backend.
//!
//! # Usage
//!
//! ```sh
//! sudo cargo run --example rtc
//! ```
//!
//! Requires root: the register backend maps `/dev/mem`.

use rpi_wire::{Bsc, Channel};

/// PCF8563 slave address.
const PCF8563_ADDR: u16 = 0x51;

/// First time-of-day register (VL_seconds).
const REG_SECONDS: u8 = 0x02;

/// Decode a BCD register value, masking the non-digit bits.
fn bcd(value: u8, mask: u8) -> u8 {
    let value = value & mask;
    (value >> 4) * 10 + (value & 0x0F)
}

fn main() -> Result<(), rpi_wire::Error> {
    env_logger::init();

    let mut bus = Bsc::new(Channel::Bus1);
    bus.begin()?;

    // Point the register pointer at the seconds register, then read
    // seconds, minutes and hours in one transfer.
    bus.begin_transmission(PCF8563_ADDR)?;
    bus.write(REG_SECONDS)?;
    bus.end_transmission()?;

    bus.request_from(PCF8563_ADDR, 3)?;
    let mut time = [0u8; 3];
    for slot in time.iter_mut() {
        if !bus.available()? {
            break;
        }
        *slot = bus.read()?;
    }

    println!(
        "time: {:02}:{:02}:{:02}",
        bcd(time[2], 0x3F),
        bcd(time[1], 0x7F),
        bcd(time[0], 0x7F),
    );
    println!("status: {}", bus.status()?);

    bus.stop()?;
    Ok(())
}
