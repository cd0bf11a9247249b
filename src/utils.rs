use rand as rnd;

use crate::device::Dut;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::TbResult;

/// Free-running clock generator; forked once per test. Half periods are
/// exact in picosecond steps, so odd periods need no rounding.
pub async fn clock(dut: Dut, period_ns: u64) -> TbResult {
    let half_ps = period_ns * 1_000 / 2;
    loop {
        dut.set_clk(false);
        Trigger::timer_steps(half_ps).await;
        dut.set_clk(true);
        Trigger::timer_steps(half_ps).await;
    }
}

pub async fn clock_cycles(dut: Dut, n_cycles: u32) -> TbResult {
    for _ in 0..n_cycles {
        dut.rising_edge().await;
    }
    Ok(Val::None)
}

#[inline]
pub fn rand_int(ceil: u32) -> u32 {
    rnd::random::<u32>() % ceil
}
