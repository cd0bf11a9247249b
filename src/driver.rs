use crate::device::Dut;
use crate::sequencer::Sequencer;
use crate::TbResult;

/// Applies stimulus items to the device in lock-step with the clock: one
/// rising edge elapses per item.
#[derive(Clone)]
pub struct Driver {
    dut: Dut,
    seqr: Sequencer,
}

impl Driver {
    pub fn new(dut: Dut, seqr: Sequencer) -> Self {
        Driver { dut, seqr }
    }

    pub async fn run(self) -> TbResult {
        loop {
            let item = self.seqr.get_next().await;
            self.dut.set_reset(item.reset);
            self.dut.rising_edge().await;
            self.seqr.item_done();
        }
    }
}
