//! Static composition of the pipeline: no name registry, each parent owns
//! its children as fields.

use crate::config::TbConfig;
use crate::device::Dut;
use crate::driver::Driver;
use crate::executor::Task;
use crate::item::Item;
use crate::monitor::Monitor;
use crate::scoreboard::Scoreboard;
use crate::sequencer::Sequencer;
use crate::tb_obj::TbObj;

/// Sequencer + driver + monitor. Exposes the sequencer so tests can start
/// sequences on it.
pub struct Agent {
    pub seqr: Sequencer,
    pub monitor: Monitor,
    driver: Driver,
}

impl Agent {
    pub fn new(dut: Dut) -> Self {
        let seqr = Sequencer::new();
        Agent {
            driver: Driver::new(dut, seqr.clone()),
            monitor: Monitor::new(dut),
            seqr,
        }
    }

    /// Forks the driver and monitor loops; they run for the life of the
    /// test and are cancelled at teardown.
    pub fn start(&self) {
        let _ = Task::fork(self.driver.clone().run());
        let _ = Task::fork(self.monitor.clone().run());
    }
}

/// Agent + scoreboard, with the monitor's analysis port connected to the
/// scoreboard's intake.
pub struct Env {
    pub agent: Agent,
    pub scoreboard: TbObj<Scoreboard>,
}

impl Env {
    pub fn new(dut: Dut, cfg: &TbConfig) -> Self {
        let agent = Agent::new(dut);
        let scoreboard = TbObj::new(Scoreboard::new(cfg.model()));
        let sb = scoreboard.clone();
        agent
            .monitor
            .port()
            .connect(move |item: Item| sb.get_mut().check(&item));
        Env { agent, scoreboard }
    }

    pub fn start(&self) {
        self.agent.start();
    }
}
