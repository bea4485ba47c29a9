//! Bus trace recorder: pins and delay that log into one shared timeline, plus a decoder that
//! turns the timeline back into the transfers the panel would latch.

#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use lcd_hd44780_parallel::bus::ParallelBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Rs,
    En,
    D4,
    D5,
    D6,
    D7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Set(Line, bool),
    WaitNs(u64),
}

pub type Trace = Rc<RefCell<Vec<Event>>>;

pub struct TracePin {
    line: Line,
    trace: Trace,
}

impl ErrorType for TracePin {
    type Error = Infallible;
}

impl OutputPin for TracePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.trace.borrow_mut().push(Event::Set(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.trace.borrow_mut().push(Event::Set(self.line, true));
        Ok(())
    }
}

/// Output pin whose every write fails.
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = ErrorKind;
}

impl OutputPin for BrokenPin {
    fn set_low(&mut self) -> Result<(), ErrorKind> {
        Err(ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), ErrorKind> {
        Err(ErrorKind::Other)
    }
}

pub struct TraceDelay {
    trace: Trace,
}

impl DelayNs for TraceDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().push(Event::WaitNs(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.trace.borrow_mut().push(Event::WaitNs(us as u64 * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.borrow_mut().push(Event::WaitNs(ms as u64 * 1_000_000));
    }
}

/// Delay that notes, for every wait in microseconds, whether a critical section was held.
///
/// A helper thread tries to enter a critical section. If it cannot get in within 200 ms, the
/// calling thread is inside one.
#[derive(Default)]
pub struct SectionDelay {
    pub waits: Vec<(u32, bool)>,
}

impl SectionDelay {
    fn section_held() -> bool {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            critical_section::with(|_| {
                let _ = tx.send(());
            });
        });
        rx.recv_timeout(Duration::from_millis(200)).is_err()
    }
}

impl DelayNs for SectionDelay {
    fn delay_ns(&mut self, ns: u32) {
        let held = Self::section_held();
        self.waits.push((ns / 1_000, held));
    }
}

pub type TraceBus = ParallelBus<TracePin, TracePin, TracePin, TracePin, TracePin, TracePin>;

pub fn harness() -> (TraceBus, TraceDelay, Trace) {
    let trace: Trace = Rc::new(RefCell::new(Vec::new()));
    let pin = |line| TracePin {
        line,
        trace: trace.clone(),
    };
    let bus = ParallelBus::new(
        pin(Line::Rs),
        pin(Line::En),
        pin(Line::D4),
        pin(Line::D5),
        pin(Line::D6),
        pin(Line::D7),
    );
    let delay = TraceDelay {
        trace: trace.clone(),
    };
    (bus, delay, trace)
}

/// One nibble latched on a falling edge of E.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latch {
    pub rs: bool,
    pub nibble: u8,
    /// Time E was high.
    pub high_ns: u64,
    /// Time between the previous falling edge (or the start) and the rising edge.
    pub before_ns: u64,
}

/// A full byte: two latches with the same RS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub rs: bool,
    pub byte: u8,
    /// Idle time from the low nibble's falling edge to the next rising edge, or to the end of
    /// the trace for the last transfer.
    pub settle_ns: u64,
}

/// Replays the trace, asserting that RS never moves while E is high.
pub fn latches(trace: &Trace) -> (Vec<Latch>, u64) {
    let mut rs = false;
    let mut en = false;
    let mut data = [false; 4];
    let mut since_edge = 0u64;
    let mut before = 0u64;
    let mut out = Vec::new();

    for event in trace.borrow().iter() {
        match *event {
            Event::WaitNs(ns) => since_edge += ns,
            Event::Set(Line::Rs, level) => {
                assert!(!(en && level != rs), "RS changed while E was high");
                rs = level;
            }
            Event::Set(Line::En, level) => {
                if level && !en {
                    before = since_edge;
                    since_edge = 0;
                } else if !level && en {
                    let nibble = data
                        .iter()
                        .enumerate()
                        .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i));
                    out.push(Latch {
                        rs,
                        nibble,
                        high_ns: since_edge,
                        before_ns: before,
                    });
                    since_edge = 0;
                }
                en = level;
            }
            Event::Set(line, level) => {
                let index = match line {
                    Line::D4 => 0,
                    Line::D5 => 1,
                    Line::D6 => 2,
                    _ => 3,
                };
                assert!(!en, "data line changed while E was high");
                data[index] = level;
            }
        }
    }
    (out, since_edge)
}

/// Pairs latches into bytes, high nibble first.
pub fn transfers(trace: &Trace) -> Vec<Transfer> {
    let (latches, tail) = latches(trace);
    assert_eq!(latches.len() % 2, 0, "odd number of nibbles on the bus");
    let mut out: Vec<Transfer> = Vec::new();
    for pair in latches.chunks(2) {
        assert_eq!(pair[0].rs, pair[1].rs, "RS differs within one byte");
        if let Some(prev) = out.last_mut() {
            prev.settle_ns = pair[0].before_ns;
        }
        out.push(Transfer {
            rs: pair[0].rs,
            byte: (pair[0].nibble << 4) | pair[1].nibble,
            settle_ns: 0,
        });
    }
    if let Some(last) = out.last_mut() {
        last.settle_ns = tail;
    }
    out
}

pub fn commands(transfers: &[Transfer]) -> Vec<u8> {
    transfers.iter().filter(|t| !t.rs).map(|t| t.byte).collect()
}

pub fn text(transfers: &[Transfer]) -> String {
    transfers
        .iter()
        .filter(|t| t.rs)
        .map(|t| t.byte as char)
        .collect()
}
