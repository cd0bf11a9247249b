pub use crate::config::TbConfig;
pub use crate::device::{CounterDut, DeviceIf, Dut};
pub use crate::driver::Driver;
pub use crate::env::{Agent, Env};
pub use crate::executor::{JoinHandle, Task};
pub use crate::item::Item;
pub use crate::monitor::{AnalysisPort, Monitor};
pub use crate::scoreboard::{Mismatch, ModelConfig, Report, Scoreboard};
pub use crate::sequence;
pub use crate::sequencer::Sequencer;
pub use crate::sim;
pub use crate::tb_obj::{TbObj, TbObjSafe};
pub use crate::test::{Objection, Test, TestOutcome, Tests};
pub use crate::trigger::{EdgeKind, Trigger};
pub use crate::utils;
pub use crate::value::Val;
pub use crate::{run_tests, run_tests_on, TbResult, CRATE_NAME};
pub use futures::future::FutureExt;
