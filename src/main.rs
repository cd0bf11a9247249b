use blinktb::prelude::*;

/// Directed test: reset sequence, then the run sequence that walks the
/// counter across the led toggle and overflow boundaries.
async fn blinky_test(dut: Dut) -> TbResult {
    let cfg = TbConfig::current();
    let env = Env::new(dut, &cfg);
    env.start();

    let objection = Objection::raise("blinky_test");

    sim::log("running reset sequence");
    sequence::reset_sequence(env.agent.seqr.clone()).await?;

    sim::log("running run sequence");
    sequence::run_sequence(dut, env.agent.seqr.clone()).await?;

    Trigger::timer(cfg.drain_ns, "ns").await;
    objection.drop_objection();

    env.scoreboard.get().report();
    let result = env.scoreboard.get().result();
    result
}

/// Constrained-random test: arbitrary reset interleavings; the reference
/// model must match the device on every cycle regardless.
async fn random_stimulus_test(dut: Dut) -> TbResult {
    let cfg = TbConfig::current();
    let env = Env::new(dut, &cfg);
    env.start();

    let objection = Objection::raise("random_stimulus_test");

    sequence::random_sequence(env.agent.seqr.clone(), 200).await?;

    Trigger::timer(cfg.drain_ns, "ns").await;
    objection.drop_objection();

    env.scoreboard.get().report();
    let result = env.scoreboard.get().result();
    result
}

blinktb::run_with_model!(blinky_test, random_stimulus_test);
