//! Scripted stimulus. Sequences feed the sequencer one item at a time; the
//! run sequence additionally uses the back-door path to position the
//! counter just short of the toggle and overflow boundaries instead of
//! free-running millions of cycles.

use crate::config::TbConfig;
use crate::device::Dut;
use crate::item::Item;
use crate::sequencer::Sequencer;
use crate::sim;
use crate::utils;
use crate::value::Val;
use crate::TbResult;

/// Asserts reset, holds it across several cycles, then releases it.
pub async fn reset_sequence(seqr: Sequencer) -> TbResult {
    sim::log("reset sequence: asserting reset");
    let item = Item::stimulus(true);
    seqr.put(item).await;
    for _ in 0..5 {
        seqr.put(item).await;
    }
    seqr.put(Item::stimulus(false)).await;
    sim::log("reset sequence: reset released");
    Ok(Val::None)
}

/// Lets the device free-run, then forces the counter two cycles short of
/// the led toggle boundary and of the overflow boundary, stepping a few
/// cycles across each.
pub async fn run_sequence(dut: Dut, seqr: Sequencer) -> TbResult {
    let model = TbConfig::current().model();

    seqr.put(Item::stimulus(false)).await;
    utils::clock_cycles(dut, 32).await?;

    dut.force_counter((1u32 << model.led_bit()) - 2);
    utils::clock_cycles(dut, 4).await?;

    dut.force_counter(model.max_count() - 1);
    utils::clock_cycles(dut, 4).await?;
    Ok(Val::None)
}

/// Constrained-random reset stimulus: n items with a coin-flipped reset.
pub async fn random_sequence(seqr: Sequencer, n: usize) -> TbResult {
    sim::log(&format!("random sequence: {} items", n));
    for _ in 0..n {
        seqr.put(Item::random()).await;
    }
    Ok(Val::None)
}
