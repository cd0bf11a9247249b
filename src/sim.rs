//! Simulation timeline: integer picosecond steps, the discrete event loop,
//! and the time-prefixed log sink every component reports through.

use std::cell::Cell;

use crate::executor;
use crate::trigger;

thread_local! {
    static SIM_TIME_PS: Cell<u64> = Cell::new(0);
}

/// One simulation step is one picosecond.
pub fn steps(time: u64, unit: &str) -> u64 {
    let factor = match unit {
        "ps" => 1,
        "ns" => 1_000,
        "us" => 1_000_000,
        "ms" => 1_000_000_000,
        _ => panic!("unknown time unit '{}'", unit),
    };
    time * factor
}

pub fn now_steps() -> u64 {
    SIM_TIME_PS.with(|t| t.get())
}

pub fn now_ns() -> u64 {
    now_steps() / 1_000
}

pub(crate) fn set_time(t: u64) {
    SIM_TIME_PS.with(|time| time.set(t));
}

pub(crate) fn reset_time() {
    set_time(0);
}

pub fn log(msg: &str) {
    println!("[{:>8} ns] {}", now_ns(), msg);
}

/// Drives the event loop: run everything that is ready, then advance to the
/// next timer event, until no events remain. Returns false if the watchdog
/// deadline (absolute steps) would be crossed; pending events are left in
/// place for the caller to tear down.
pub(crate) fn run_sim_loop(deadline: Option<u64>) -> bool {
    executor::run_once();
    loop {
        let Some(t) = trigger::next_timer_step() else {
            return true;
        };
        if let Some(d) = deadline {
            if t > d {
                return false;
            }
        }
        set_time(t);
        trigger::react_time(t);
    }
}
