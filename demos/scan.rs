//! Scan a bus channel for responding slave devices.
//!
//! Probes every valid 7-bit address on channel 1 through the kernel
//! backend, the same way `i2cdetect` does in read mode.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example scan
//! ```
//!
//! Needs access to `/dev/i2c-1` (the `i2c` group, or root).

use rpi_wire::{Channel, I2cDev};

fn main() -> Result<(), rpi_wire::Error> {
    env_logger::init();

    let channel = Channel::Bus1;
    let mut bus = I2cDev::new(channel);
    bus.begin()?;

    println!("scanning {}...", channel.device_path().display());
    let mut found = 0;
    for address in 0x03..=0x77u16 {
        // Addresses claimed by a kernel driver refuse the ioctl; absent
        // devices fail the read. Either way, move on.
        if bus.request_from(address, 1).is_err() {
            continue;
        }
        if bus.read().is_ok() {
            println!("  device at {address:#04x}");
            found += 1;
        }
    }
    println!("{found} device(s) responded");

    bus.stop()?;
    Ok(())
}
