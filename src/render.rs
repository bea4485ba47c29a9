//! Number rendering for the character stream.
//!
//! Everything here produces ASCII bytes most significant digit first without buffering, so a
//! value can be streamed straight into [`crate::sync_lcd::Lcd::write_data`].

use ufmt::{uDisplay, uWrite, Formatter};

/// Largest value [`Tenths`] renders as a number, `999.9`.
pub const FIXED_MAX: u32 = 9_999;

/// Shown by [`Tenths`] in place of values above [`FIXED_MAX`].
pub const FIXED_OVERFLOW: &str = "***.* ";

/// ASCII digits of a number in base 10 or 16, most significant first.
///
/// Clone it before iterating to render the same value again.
#[derive(Debug, Clone)]
pub struct Digits {
    value: u32,
    radix: u32,
    place: u32,
}

impl Digits {
    /// 1 to 10 decimal digits.
    pub fn decimal(value: u32) -> Self {
        Self::new(value, 10)
    }

    /// 1 to 8 uppercase hex digits.
    pub fn hex(value: u32) -> Self {
        Self::new(value, 16)
    }

    fn new(value: u32, radix: u32) -> Self {
        let mut place = 1;
        while value / place >= radix {
            place *= radix;
        }
        Self {
            value,
            radix,
            place,
        }
    }
}

impl Iterator for Digits {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.place == 0 {
            return None;
        }
        let digit = (self.value / self.place) % self.radix;
        self.place /= self.radix;
        Some(ascii_digit(digit))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let mut left = 0;
        let mut place = self.place;
        while place > 0 {
            left += 1;
            place /= self.radix;
        }
        (left, Some(left))
    }
}

impl ExactSizeIterator for Digits {}

fn ascii_digit(digit: u32) -> u8 {
    match digit {
        0..=9 => b'0' + digit as u8,
        _ => b'A' + (digit - 10) as u8,
    }
}

fn write_digits<W: uWrite + ?Sized>(
    f: &mut Formatter<'_, W>,
    digits: Digits,
) -> Result<(), W::Error> {
    for d in digits {
        f.write_char(d as char)?;
    }
    Ok(())
}

/// Renders its value in uppercase hexadecimal, no prefix, no padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hex(pub u32);

impl uDisplay for Hex {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        write_digits(f, Digits::hex(self.0))
    }
}

/// Fixed-point value in tenths, rendered as `"<int>.<frac> "`.
///
/// `Tenths(723)` shows `72.3 `. The trailing space wipes the last cell of a longer previous
/// reading. Values above [`FIXED_MAX`] show [`FIXED_OVERFLOW`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenths(pub u32);

impl Tenths {
    pub fn is_overflow(self) -> bool {
        self.0 > FIXED_MAX
    }
}

impl uDisplay for Tenths {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        if self.is_overflow() {
            return f.write_str(FIXED_OVERFLOW);
        }
        write_digits(f, Digits::decimal(self.0 / 10))?;
        f.write_char('.')?;
        f.write_char(ascii_digit(self.0 % 10) as char)?;
        f.write_char(' ')
    }
}
