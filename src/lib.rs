#![no_std]
//! Driver for HD44780-compatible character LCDs wired in 4-bit parallel mode, bit-banged over
//! six GPIO lines (RS, E and D4..D7, with R/W tied to ground). It requires output pins
//! implementing [`embedded_hal::digital::OutputPin`] and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`].
//!
//! The panel is write-only: busy-flag polling is impossible, so every transfer is followed by a
//! fixed settle delay taken from [`Timing`].
//!
//! Usage:
//! ```ignore
//! let mut bus = lcd_hd44780_parallel::bus::ParallelBus::new(rs, en, d4, d5, d6, d7);
//! let mut delay = hal::Delay::new();
//!
//! let mut lcd = lcd_hd44780_parallel::sync_lcd::Lcd::new(&mut bus, &mut delay)
//!     .init()?;
//! lcd.write_str("Temp (F): ")?;
//! lcd.write_ufix(723)?; // "72.3 "
//! ```
//!
//! The two nibble pulses of every transfer run inside [`critical_section::with`], so the final
//! binary must link a critical-section implementation (usually provided by the HAL).
//!
//! [`mailbox`] and [`temperature`] provide the sampling side of a thermometer built on the driver.

use embedded_hal::digital::ErrorKind;

pub mod bus;
pub mod mailbox;
pub mod render;
pub mod sync_lcd;
pub mod temperature;

/// Failure reported by the GPIO layer.
///
/// The panel itself cannot report anything, mistimed transfers only show up as garbage on the
/// glass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Driving one of the bus lines failed.
    Pin(ErrorKind),
}

impl Error {
    pub(crate) fn pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Mode {
    EntrySet = 0x04,
    DisplayControl = 0x08,
    CursorShift = 0x10,
    FunctionSet = 0x20,
    DDRAMAddr = 0x80,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Commands {
    Clear = 0x01,
    ReturnHome = 0x02,
}

enum BitMode {
    Bit4 = 0x0 << 4,
    Bit8 = 0x1 << 4,
}

enum Lines {
    Two = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum CursorMoveDir {
    Increment = 0x02,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum DisplayShift {
    Off = 0x00,
}

enum DisplayControl {
    Off = 0x00,
    CursorBlink = 0x01,
    CursorOn = 0x02,
    DisplayOn = 0x04,
}

/// Delay budget of the panel. All values are minimums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Setup and hold time around each edge of the enable strobe.
    pub pulse_us: u32,
    /// Settle time after most commands.
    pub command_us: u32,
    /// Settle time after clear display and return home.
    pub clear_us: u32,
    /// Settle time after a character write. This panel needs far more than a command.
    pub data_us: u32,
    /// Wait after power is applied, before the first wake command.
    pub power_on_ms: u32,
    /// Wait after the first wake command.
    pub wake_ms: u32,
    /// Wait after the second and third wake commands.
    pub wake_short_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pulse_us: 6,
            command_us: 40,
            clear_us: 1_600,
            data_us: 1_600,
            power_on_ms: 15,
            wake_ms: 5,
            wake_short_us: 160,
        }
    }
}

impl Timing {
    /// Settle time the controller needs after `command`.
    pub fn command_settle_us(&self, command: u8) -> u32 {
        // 0x02 and 0x03 both decode as return home.
        if command == Commands::Clear as u8 || command & 0xfe == Commands::ReturnHome as u8 {
            self.clear_us
        } else {
            self.command_us
        }
    }
}
