//! Single-slot hand-off of sensor samples from the sampling interrupt to the main loop.

use core::cell::Cell;

use critical_section::Mutex;

/// Latest-value-wins cell for one producer (interrupt) and one consumer (main loop).
///
/// A sample posted before the previous one was taken replaces it. Nothing is queued.
///
/// ```ignore
/// static SAMPLES: Mailbox = Mailbox::new();
///
/// #[interrupt]
/// fn SysTick() {
///     SAMPLES.post(adc.read());
/// }
/// ```
pub struct Mailbox {
    slot: Mutex<Cell<Option<u32>>>,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Store a sample, overwriting one that was not read yet.
    pub fn post(&self, sample: u32) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(sample)));
    }

    /// Take the pending sample, if any. Each posted sample is returned at most once.
    pub fn take(&self) -> Option<u32> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }

    pub fn has_new_sample(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).get().is_some())
    }

    /// Like [`Mailbox::take`], with `0` standing in for "nothing new".
    pub fn read_sample(&self) -> u32 {
        self.take().unwrap_or(0)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
