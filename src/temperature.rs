//! Thermometer readout: analog sensor samples shown in Fahrenheit on a one-line panel.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::bus::Bus;
use crate::mailbox::Mailbox;
use crate::sync_lcd::Lcd;
use crate::Error;

/// Full scale of the 12-bit converter.
pub const ADC_MAX: u32 = 4_095;

/// Static text written once, left of the reading.
pub const LABEL: &str = "Temp (F): ";

/// First cell after [`LABEL`].
pub const VALUE_COLUMN: u8 = LABEL.len() as u8;

/// Pause between refreshes.
pub const REFRESH_MS: u32 = 1_000;

/// Tenths of a degree Fahrenheit for a raw sample.
///
/// The sensor spans 0..=594 °F over the converter range, offset by 32. Whole degrees are
/// computed first, so the tenths digit is always zero. Samples above [`ADC_MAX`] are clamped.
pub fn adc_to_fahrenheit_tenths(raw: u32) -> u32 {
    let raw = raw.min(ADC_MAX);
    ((raw * 594) / ADC_MAX + 32) * 10
}

/// Drives the panel for the readout: label once, then the value in place.
pub struct Thermometer<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    lcd: Lcd<'a, B, D>,
}

impl<'a, B, D> Thermometer<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    /// Takes an initialized display.
    pub fn new(lcd: Lcd<'a, B, D>) -> Self {
        Self { lcd }
    }

    pub fn show_label(&mut self) -> Result<(), Error> {
        self.lcd.write_str(LABEL)
    }

    /// Overwrite the reading with the temperature for `raw`.
    pub fn update(&mut self, raw: u32) -> Result<(), Error> {
        let tenths = adc_to_fahrenheit_tenths(raw);

        #[cfg(feature = "defmt")]
        defmt::debug!("thermometer: raw={=u32} tenths={=u32}", raw, tenths);

        self.lcd.set_cursor(VALUE_COLUMN)?;
        self.lcd.write_ufix(tenths)
    }

    /// Show the newest sample if one arrived since the last call. Returns whether it did.
    pub fn refresh(&mut self, mailbox: &Mailbox) -> Result<bool, Error> {
        match mailbox.take() {
            Some(raw) => {
                self.update(raw)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Label the panel, then refresh once per [`REFRESH_MS`] forever.
    ///
    /// Does not block waiting for a sample: a period without one leaves the last reading on the
    /// panel and just waits for the next tick. Only a pin error ends the loop.
    pub fn run(mut self, mailbox: &Mailbox) -> Result<Infallible, Error> {
        self.show_label()?;
        loop {
            self.refresh(mailbox)?;
            self.lcd.wait_ms(REFRESH_MS);
        }
    }

    pub fn into_inner(self) -> Lcd<'a, B, D> {
        self.lcd
    }
}
