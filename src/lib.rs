//! Transaction-level verification harness for a free-running counter
//! device: sequences feed a rendezvous sequencer, a driver applies stimulus
//! in lock-step with the clock, a monitor samples every cycle and
//! broadcasts to a scoreboard that predicts, checks and accounts coverage.
//! Everything runs as cooperatively scheduled tasks over one discrete
//! event queue.

pub mod config;
pub mod device;
pub mod driver;
pub mod env;
pub mod executor;
pub mod item;
mod junit;
pub mod monitor;
pub mod prelude;
pub mod scoreboard;
pub mod sequence;
pub mod sequencer;
pub mod sim;
pub mod tb_obj;
pub mod test;
pub mod trigger;
pub mod utils;
pub mod value;

use num_format::{Locale, ToFormattedString};
use once_cell::sync::OnceCell;
use prettytable::{Cell, Row, Table};
use std::time::Instant;

use config::TbConfig;
use device::{CounterDut, DeviceIf, Dut};
use executor::Task;
use tb_obj::TbObjSafe;
use test::{Test, TestOutcome, Tests};
use trigger::Trigger;
use value::Val;

pub type TbResult = Result<Val, Val>;

/// Suite name for the JUnit report; set once by `run_with_model!`.
pub static CRATE_NAME: OnceCell<String> = OnceCell::new();

/// Runs the given tests, in order, against a fresh `CounterDut` built from
/// the configuration.
pub fn run_tests(tests: Tests, cfg: TbConfig) -> Vec<TestOutcome> {
    cfg.validate();
    run_tests_on(Box::new(CounterDut::new(cfg.counter_width)), tests, cfg)
}

/// Runs the given tests against a caller-supplied device. Device state
/// persists across the tests of one run, as it would on real hardware.
pub fn run_tests_on(device: Box<dyn DeviceIf>, tests: Tests, cfg: TbConfig) -> Vec<TestOutcome> {
    cfg.validate();
    TbConfig::set_current(cfg.clone());
    device::install(device);
    let wall_start = Instant::now();

    let outcomes: Vec<TestOutcome> = tests.into_iter().map(|t| run_one_test(t, &cfg)).collect();

    summary(&outcomes, wall_start.elapsed().as_secs_f64());
    if let Some(path) = &cfg.junit_path {
        junit::write_junit_xml(&outcomes, path);
    }
    device::uninstall();
    sim::reset_time();
    outcomes
}

fn run_one_test(t: Test, cfg: &TbConfig) -> TestOutcome {
    sim::log(&format!("TEST {}: starting", t.name));
    test::reset();

    let result_slot: TbObjSafe<Option<TbResult>> = TbObjSafe::new(None);
    let slot = result_slot.clone();
    let run_cfg = cfg.clone();
    let generator = t.generator;
    let wall_start = Instant::now();
    let sim_start_ns = sim::now_ns();

    let _ = Task::fork(async move {
        let dut = Dut;
        let _ = Task::fork(utils::clock(dut, run_cfg.clk_period_ns));

        // warm-up: hold reset, release, settle, then hand over to the test
        dut.set_reset(true);
        Trigger::timer(run_cfg.warmup_ns, "ns").await;
        dut.set_reset(false);
        Trigger::timer(run_cfg.post_reset_ns, "ns").await;

        let result = (generator)(dut).await;
        test::all_dropped().await;
        slot.with_mut(|mut s| *s = Some(result));
        teardown();
        Ok(Val::None)
    });

    let deadline = cfg
        .timeout_ns
        .map(|t_ns| sim::now_steps() + sim::steps(t_ns, "ns"));
    let completed_in_time = sim::run_sim_loop(deadline);
    if !completed_in_time {
        teardown();
    }

    let result = result_slot.with_mut(|mut s| s.take()).unwrap_or_else(|| {
        if completed_in_time {
            Err(Val::String(
                "event queue drained before test completion".to_string(),
            ))
        } else {
            Err(Val::String(format!(
                "watchdog: test exceeded its {} ns budget",
                cfg.timeout_ns.unwrap_or(0)
            )))
        }
    });

    let outcome = TestOutcome {
        name: t.name,
        result,
        wall_secs: wall_start.elapsed().as_secs_f64(),
        sim_time_ns: sim::now_ns() - sim_start_ns,
    };
    sim::log(&format!(
        "TEST {}: {}",
        outcome.name,
        if outcome.passed() { "passed" } else { "failed" }
    ));
    outcome
}

/// Cancels every trigger and queued task. Run between tests and after a
/// watchdog trip; an emptied event queue is what ends the event loop.
fn teardown() {
    trigger::cancel_all();
    executor::clear_ready_queue();
}

fn summary(outcomes: &[TestOutcome], wall_secs: f64) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("test"),
        Cell::new("result"),
        Cell::new("sim time [ns]"),
        Cell::new("wall [s]"),
        Cell::new("speed [ns/s]"),
    ]));
    let mut total_sim_ns = 0u64;
    for o in outcomes {
        total_sim_ns += o.sim_time_ns;
        let speed = if o.wall_secs > 0.0 {
            o.sim_time_ns as f64 / o.wall_secs
        } else {
            0.0
        };
        table.add_row(Row::new(vec![
            Cell::new(&o.name),
            Cell::new(if o.passed() { "passed" } else { "failed" }),
            Cell::new(&o.sim_time_ns.to_formatted_string(&Locale::en)),
            Cell::new(&format!("{:.3}", o.wall_secs)),
            Cell::new(&format!("{:.0}", speed)),
        ]));
    }
    table.printstd();
    sim::log(&format!(
        "total simulation time: {} ns",
        total_sim_ns.to_formatted_string(&Locale::en)
    ));
    sim::log(&format!("total real time: {:.3} s", wall_secs));
}

/// Declares the binary entry point: builds the test list, runs it against
/// the in-process device model, and exits nonzero on failure.
#[macro_export]
macro_rules! run_with_model {
    ($( $t:ident ),+ $(,)?) => {
        fn main() {
            let _ = $crate::CRATE_NAME.set(std::module_path!().to_string());
            let mut tests = $crate::test::Tests::new();
            $(tests.push($crate::test::Test::new(stringify!($t), |dut| $t(dut).boxed()));)+
            let mut cfg = $crate::config::TbConfig::default();
            cfg.junit_path = Some("results.xml".to_string());
            let outcomes = $crate::run_tests(tests, cfg);
            if outcomes.iter().any(|o| !o.passed()) {
                std::process::exit(1);
            }
        }
    };
}
