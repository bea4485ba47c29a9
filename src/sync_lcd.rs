use embedded_hal::delay::DelayNs;

use ufmt::{uDisplay, Formatter};
use ufmt_write::uWrite;

use crate::bus::{Bus, Nibble, RegisterSelect};
use crate::render::{Digits, Hex, Tenths};
use crate::{
    BitMode, Commands, CursorMoveDir, DisplayControl, DisplayShift, Error, Lines, Mode, Timing,
};

/// API to write to the LCD.
pub struct Lcd<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    bus: &'a mut B,
    delay: &'a mut D,
    timing: Timing,
    display_on: bool,
}

impl<'a, B, D> Lcd<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    /// Create new instance with only the bus and delay instance.
    pub fn new(bus: &'a mut B, delay: &'a mut D) -> Self {
        Self {
            bus,
            delay,
            timing: Timing::default(),
            display_on: false,
        }
    }

    /// Override the panel delays, e.g. for a slower controller clone.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Switch the display on as the last init step. Off by default, some panels
    /// come up with the display already enabled.
    pub fn with_display_on(mut self, on: bool) -> Self {
        self.display_on = on;
        self
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Initializes the hardware.
    ///
    /// Without the busy flag the controller's interface width after power-up is unknown. Three
    /// 8-bit function set commands with mandated pauses force it into a known state before it
    /// is switched to 4-bit mode. The order of the steps cannot change.
    pub fn init(mut self) -> Result<Self, Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("lcd: init, waiting for power-on");

        self.bus.set_lines(RegisterSelect::Data, false)?;
        self.delay.delay_ms(self.timing.power_on_ms);

        let wake = Mode::FunctionSet as u8 | BitMode::Bit8 as u8;
        self.write_command(wake)?;
        self.delay.delay_ms(self.timing.wake_ms);
        self.write_command(wake)?;
        self.delay.delay_us(self.timing.wake_short_us);
        self.write_command(wake)?;
        self.delay.delay_us(self.timing.wake_short_us);

        self.write_command(Mode::FunctionSet as u8 | BitMode::Bit4 as u8 | Lines::Two as u8)?;
        self.clear()?;
        self.write_command(Mode::CursorShift as u8)?;
        self.write_command(
            Mode::EntrySet as u8 | CursorMoveDir::Increment as u8 | DisplayShift::Off as u8,
        )?;

        if self.display_on {
            self.display(true, false, false)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd: init done");
        Ok(self)
    }

    /// Two nibble strobes, high half first. Interrupts are masked for the strobes only, the
    /// settle delay that follows runs with interrupts enabled.
    fn send(&mut self, data: u8, rs: RegisterSelect) -> Result<(), Error> {
        let bus = &mut *self.bus;
        let delay = &mut *self.delay;
        let width = self.timing.pulse_us;
        critical_section::with(|_| {
            bus.set_lines(rs, false)?;
            bus.write_nibble(Nibble::high(data))?;
            bus.pulse(delay, width)?;
            bus.write_nibble(Nibble::low(data))?;
            bus.pulse(delay, width)
        })
    }

    /// Send an instruction byte and wait until the controller has executed it.
    pub fn write_command(&mut self, command: u8) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("lcd: cmd {=u8:#x}", command);

        self.send(command, RegisterSelect::Command)?;
        self.delay.delay_us(self.timing.command_settle_us(command));
        Ok(())
    }

    /// Write one character code at the cursor, which then advances.
    pub fn write_data(&mut self, data: u8) -> Result<(), Error> {
        self.send(data, RegisterSelect::Data)?;
        self.delay.delay_us(self.timing.data_us);
        Ok(())
    }

    /// Write string to display, up to the end or a NUL.
    ///
    /// Characters outside ASCII have no glyph in the controller ROM and show as `?`.
    pub fn write_str(&mut self, data: &str) -> Result<(), Error> {
        for c in data.chars().take_while(|&c| c != '\0') {
            let code = if c.is_ascii() { c as u8 } else { b'?' };
            self.write_data(code)?;
        }
        Ok(())
    }

    /// Unsigned decimal, 1 to 10 digits, no padding.
    pub fn write_udec(&mut self, n: u32) -> Result<(), Error> {
        for digit in Digits::decimal(n) {
            self.write_data(digit)?;
        }
        Ok(())
    }

    /// Unsigned uppercase hexadecimal, 1 to 8 digits, no padding.
    pub fn write_uhex(&mut self, n: u32) -> Result<(), Error> {
        Hex(n).fmt(&mut Formatter::new(self))
    }

    /// Tenths as `"<int>.<frac> "`, or `"***.* "` above 9999.
    pub fn write_ufix(&mut self, n: u32) -> Result<(), Error> {
        Tenths(n).fmt(&mut Formatter::new(self))
    }

    /// Clear the display and put the cursor on the first cell.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.write_command(Commands::Clear as u8)?;
        self.set_cursor(0)
    }

    /// Return cursor to the first cell and undo any display shift.
    pub fn return_home(&mut self) -> Result<(), Error> {
        self.write_command(Commands::ReturnHome as u8)
    }

    /// Move the cursor to `col` of the single addressable row.
    pub fn set_cursor(&mut self, col: u8) -> Result<(), Error> {
        self.write_command(Mode::DDRAMAddr as u8 | (col & 0x7f))
    }

    /// Display on, with optional cursor and blink.
    pub fn display_on(&mut self, cursor: bool, blink: bool) -> Result<(), Error> {
        self.display(true, cursor, blink)
    }

    pub fn display_off(&mut self) -> Result<(), Error> {
        self.display(false, false, false)
    }

    fn display(&mut self, on: bool, cursor: bool, blink: bool) -> Result<(), Error> {
        let mut ctrl = DisplayControl::Off as u8;
        if on {
            ctrl |= DisplayControl::DisplayOn as u8;
        }
        if cursor {
            ctrl |= DisplayControl::CursorOn as u8;
        }
        if blink {
            ctrl |= DisplayControl::CursorBlink as u8;
        }
        self.write_command(Mode::DisplayControl as u8 | ctrl)
    }

    /// Busy-wait on the driver's delay, for callers pacing display refreshes.
    pub fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

impl<'a, B, D> uWrite for Lcd<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    type Error = Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}
