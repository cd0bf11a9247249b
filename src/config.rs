use std::cell::RefCell;

use crate::scoreboard::ModelConfig;

/// Run configuration. Defaults mirror the target board: a 125 MHz clock
/// and a 27-bit counter.
#[derive(Debug, Clone)]
pub struct TbConfig {
    pub clk_period_ns: u64,
    /// Reset held this long at the very start of the run, before any test
    /// logic executes.
    pub warmup_ns: u64,
    /// Settle time between reset release and the test body.
    pub post_reset_ns: u64,
    /// Drain period after the last sequence completes, before the
    /// objection is dropped.
    pub drain_ns: u64,
    pub counter_width: u32,
    /// Watchdog: a test whose events would advance simulated time past
    /// this budget is failed and torn down. None disables it.
    pub timeout_ns: Option<u64>,
    /// JUnit XML output path; None skips the file.
    pub junit_path: Option<String>,
}

impl Default for TbConfig {
    fn default() -> Self {
        TbConfig {
            clk_period_ns: 8,
            warmup_ns: 100,
            post_reset_ns: 20,
            drain_ns: 100,
            counter_width: 27,
            timeout_ns: Some(1_000_000),
            junit_path: None,
        }
    }
}

thread_local! {
    static CURRENT: RefCell<TbConfig> = RefCell::new(TbConfig::default());
}

impl TbConfig {
    /// Configuration of the run in progress, visible to test bodies and
    /// sequences.
    pub fn current() -> TbConfig {
        CURRENT.with(|c| c.borrow().clone())
    }

    pub(crate) fn set_current(cfg: TbConfig) {
        CURRENT.with(|c| *c.borrow_mut() = cfg);
    }

    pub fn model(&self) -> ModelConfig {
        ModelConfig {
            counter_width: self.counter_width,
        }
    }

    pub fn validate(&self) {
        assert!(
            (2..=31).contains(&self.counter_width),
            "counter width {} outside supported range 2..=31",
            self.counter_width
        );
        assert!(self.clk_period_ns > 0, "clock period must be nonzero");
    }
}
