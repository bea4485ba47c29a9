use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::Error;

/// Level of the register-select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterSelect {
    /// RS low, the byte is an instruction.
    Command,
    /// RS high, the byte is written to display RAM.
    Data,
}

/// Four bits destined for D4..D7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Nibble(u8);

impl Nibble {
    pub fn new(bits: u8) -> Self {
        Nibble(bits & 0x0f)
    }

    /// Upper half of `byte`, sent first.
    pub fn high(byte: u8) -> Self {
        Nibble(byte >> 4)
    }

    /// Lower half of `byte`, sent second.
    pub fn low(byte: u8) -> Self {
        Nibble(byte & 0x0f)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    fn bit(self, n: u8) -> PinState {
        PinState::from(self.0 & (1 << n) != 0)
    }
}

/// Transport underneath [`crate::sync_lcd::Lcd`]: framing lines, data lines and the strobe.
pub trait Bus {
    /// Drive RS and E. RS never changes while E is high.
    fn set_lines(&mut self, rs: RegisterSelect, enable: bool) -> Result<(), Error>;

    /// Put a nibble on the data lines.
    fn write_nibble(&mut self, nibble: Nibble) -> Result<(), Error>;

    /// One enable strobe: E low, wait, E high, wait, E low.
    ///
    /// The controller latches the data lines on the falling edge.
    fn pulse<D: DelayNs>(&mut self, delay: &mut D, width_us: u32) -> Result<(), Error>;
}

/// Six GPIO lines of a write-only 4-bit HD44780 interface.
pub struct ParallelBus<RS, EN, D4, D5, D6, D7> {
    rs_pin: RS,
    en_pin: EN,
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
    rs: RegisterSelect,
    enable: bool,
}

impl<RS, EN, D4, D5, D6, D7> ParallelBus<RS, EN, D4, D5, D6, D7>
where
    RS: OutputPin,
    EN: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
{
    /// Takes ownership of the pins. Nothing is driven until the first transfer.
    pub fn new(rs_pin: RS, en_pin: EN, d4: D4, d5: D5, d6: D6, d7: D7) -> Self {
        Self {
            rs_pin,
            en_pin,
            d4,
            d5,
            d6,
            d7,
            rs: RegisterSelect::Data,
            enable: false,
        }
    }

    /// Last register-select level written.
    pub fn rs(&self) -> RegisterSelect {
        self.rs
    }

    /// Last enable level written.
    pub fn enable(&self) -> bool {
        self.enable
    }

    /// Give the pins back.
    pub fn release(self) -> (RS, EN, D4, D5, D6, D7) {
        (self.rs_pin, self.en_pin, self.d4, self.d5, self.d6, self.d7)
    }

    fn drive_rs(&mut self) -> Result<(), Error> {
        let state = PinState::from(self.rs == RegisterSelect::Data);
        self.rs_pin.set_state(state).map_err(Error::pin)
    }

    fn drive_enable(&mut self) -> Result<(), Error> {
        self.en_pin
            .set_state(PinState::from(self.enable))
            .map_err(Error::pin)
    }
}

impl<RS, EN, D4, D5, D6, D7> Bus for ParallelBus<RS, EN, D4, D5, D6, D7>
where
    RS: OutputPin,
    EN: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
{
    fn set_lines(&mut self, rs: RegisterSelect, enable: bool) -> Result<(), Error> {
        self.rs = rs;
        self.enable = enable;
        if enable {
            self.drive_rs()?;
            self.drive_enable()
        } else {
            self.drive_enable()?;
            self.drive_rs()
        }
    }

    fn write_nibble(&mut self, nibble: Nibble) -> Result<(), Error> {
        self.d4.set_state(nibble.bit(0)).map_err(Error::pin)?;
        self.d5.set_state(nibble.bit(1)).map_err(Error::pin)?;
        self.d6.set_state(nibble.bit(2)).map_err(Error::pin)?;
        self.d7.set_state(nibble.bit(3)).map_err(Error::pin)
    }

    fn pulse<D: DelayNs>(&mut self, delay: &mut D, width_us: u32) -> Result<(), Error> {
        let rs = self.rs;
        self.set_lines(rs, false)?;
        delay.delay_us(width_us);
        self.set_lines(rs, true)?;
        delay.delay_us(width_us);
        self.set_lines(rs, false)
    }
}
