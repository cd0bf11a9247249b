//! Device boundary. The harness only sees `DeviceIf` plus edge triggers;
//! `CounterDut` is the in-process model of the device under test.

use std::cell::RefCell;

use crate::sim;
use crate::trigger::{EdgeKind, Trigger};

/// Signal-level interface to the device under test.
///
/// `force_counter` is the privileged back-door path: it bypasses the normal
/// stimulus pins and overwrites internal state directly. Test-only; used by
/// sequences to reach rare boundary conditions without simulating millions
/// of cycles.
pub trait DeviceIf {
    /// Drives the clock pin. Returns the edge this transition produced, if
    /// any; sequential logic evaluates on the rising edge before returning.
    fn set_clk(&mut self, level: bool) -> Option<EdgeKind>;
    fn set_reset(&mut self, level: bool);
    fn reset(&self) -> bool;
    fn led(&self) -> u8;
    fn counter(&self) -> u32;
    fn force_counter(&mut self, value: u32);
}

/// The blinky device: a free-running W-bit counter with synchronous reset,
/// led driven combinationally from the counter's top bit.
pub struct CounterDut {
    width: u32,
    mask: u32,
    clk: bool,
    rst: bool,
    counter: u32,
}

impl CounterDut {
    pub fn new(width: u32) -> Self {
        assert!(
            (2..=31).contains(&width),
            "counter width {} outside supported range 2..=31",
            width
        );
        CounterDut {
            width,
            mask: (1u32 << width) - 1,
            clk: false,
            rst: false,
            counter: 0,
        }
    }
}

impl DeviceIf for CounterDut {
    fn set_clk(&mut self, level: bool) -> Option<EdgeKind> {
        if level && !self.clk {
            self.clk = true;
            self.counter = if self.rst {
                0
            } else {
                (self.counter + 1) & self.mask
            };
            Some(EdgeKind::Rising)
        } else if !level && self.clk {
            self.clk = false;
            Some(EdgeKind::Falling)
        } else {
            None
        }
    }
    fn set_reset(&mut self, level: bool) {
        self.rst = level;
    }
    fn reset(&self) -> bool {
        self.rst
    }
    fn led(&self) -> u8 {
        ((self.counter >> (self.width - 1)) & 1) as u8
    }
    fn counter(&self) -> u32 {
        self.counter
    }
    fn force_counter(&mut self, value: u32) {
        if value > self.mask {
            panic!(
                "back-door value 0x{:x} exceeds {}-bit counter range",
                value, self.width
            );
        }
        self.counter = value;
    }
}

thread_local! {
    static DEVICE: RefCell<Option<Box<dyn DeviceIf>>> = RefCell::new(None);
}

pub(crate) fn install(device: Box<dyn DeviceIf>) {
    DEVICE.with(|d| *d.borrow_mut() = Some(device));
}

pub(crate) fn uninstall() {
    DEVICE.with(|d| *d.borrow_mut() = None);
}

fn with_device<R>(f: impl FnOnce(&mut dyn DeviceIf) -> R) -> R {
    DEVICE.with(|d| {
        let mut slot = d.borrow_mut();
        let device = slot
            .as_deref_mut()
            .expect("device access with no device installed");
        f(device)
    })
}

/// Typed handle to the installed device. Copy, so every component can carry
/// one; all access is serialized by the cooperative scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Dut;

impl Dut {
    /// Drives the clock pin and fires the edge triggers the transition
    /// produced. Only the clock generator task calls this.
    pub fn set_clk(&self, level: bool) {
        if let Some(edge) = with_device(|d| d.set_clk(level)) {
            crate::trigger::react_edge(edge);
        }
    }
    pub fn set_reset(&self, level: bool) {
        with_device(|d| d.set_reset(level));
    }
    pub fn reset(&self) -> bool {
        with_device(|d| d.reset())
    }
    pub fn led(&self) -> u8 {
        with_device(|d| d.led())
    }
    pub fn counter(&self) -> u32 {
        with_device(|d| d.counter())
    }
    /// Back-door write, distinct from the stimulus path. Logged so runs
    /// show where state was forced.
    pub fn force_counter(&self, value: u32) {
        sim::log(&format!("back-door: counter forced to 0x{:07x}", value));
        with_device(|d| d.force_counter(value));
    }
    pub fn rising_edge(&self) -> Trigger {
        Trigger::rising_edge()
    }
    pub fn falling_edge(&self) -> Trigger {
        Trigger::falling_edge()
    }
}
