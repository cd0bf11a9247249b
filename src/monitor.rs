use crate::device::Dut;
use crate::item::Item;
use crate::tb_obj::TbObj;
use crate::TbResult;

/// Broadcast channel from the monitor to any number of subscribers.
/// Delivery is synchronous, in registration order; no buffering, no drop.
pub struct AnalysisPort<T: Clone>(TbObj<Vec<Box<dyn FnMut(T)>>>);

impl<T: Clone> AnalysisPort<T> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        AnalysisPort(TbObj::new(Vec::new()))
    }

    pub fn connect(&self, subscriber: impl FnMut(T) + 'static) {
        self.0.get_mut().push(Box::new(subscriber));
    }

    pub fn write(&self, item: T) {
        for subscriber in self.0.get_mut().iter_mut() {
            subscriber(item.clone());
        }
    }
}

impl<T: Clone> Clone for AnalysisPort<T> {
    fn clone(&self) -> Self {
        AnalysisPort(self.0.clone())
    }
}

/// Passive observer: samples the device on every rising clock edge and
/// broadcasts the observation. Never drives device state.
#[derive(Clone)]
pub struct Monitor {
    dut: Dut,
    ap: AnalysisPort<Item>,
}

impl Monitor {
    pub fn new(dut: Dut) -> Self {
        Monitor {
            dut,
            ap: AnalysisPort::new(),
        }
    }

    pub fn port(&self) -> AnalysisPort<Item> {
        self.ap.clone()
    }

    pub async fn run(self) -> TbResult {
        loop {
            self.dut.rising_edge().await;
            // all three fields sampled in one task step, so every
            // subscriber sees a consistent view of this cycle
            let item = Item::observed(self.dut.reset(), self.dut.led(), self.dut.counter());
            self.ap.write(item);
        }
    }
}
