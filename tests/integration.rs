//! End-to-end tests for the Caravel test harness
//!
//! These tests run registered tests against the simulated DUT and verify
//! the sequencing, the timeout behavior and the reports.

use std::path::PathBuf;

use caravel_tb::common::config::SimulationConfig;
use caravel_tb::sim::{FirmwareOp, SimEvent};
use caravel_tb::testing::ram_word::{
    write_and_read, MSG_COMPLETED, MSG_PROCESSING, MSG_START, RAM_WORD_TIMEOUT_CYCLES,
};
use caravel_tb::testing::{TestContext, TestReport};
use caravel_tb::{test_configure, Dut, Environment, FirmwareProgram, Level, Result, TestRegistry};
use futures_util::future::{BoxFuture, FutureExt};

fn fixture(name: &str) -> FirmwareProgram {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    FirmwareProgram::load(&path).expect("Failed to load fixture")
}

fn dut(program: FirmwareProgram) -> Dut {
    Dut::new(program, SimulationConfig::default())
}

async fn run_ram_word(program: FirmwareProgram, timeout: Option<u64>) -> (TestReport, Vec<SimEvent>) {
    let dut = dut(program);
    let probe = dut.probe();
    let report = TestRegistry::builtin()
        .run("ram_word", dut, timeout)
        .await
        .expect("ram_word is registered");
    (report, probe.events())
}

fn messages(report: &TestReport) -> Vec<&str> {
    report.log.iter().map(|e| e.message.as_str()).collect()
}

fn position(events: &[SimEvent], pred: impl Fn(&SimEvent) -> bool) -> usize {
    events.iter().position(pred).expect("event not found")
}

#[tokio::test]
async fn test_ram_word_passes() {
    let (report, events) = run_ram_word(FirmwareProgram::ram_word(), None).await;

    assert!(report.passed, "unexpected failure: {:?}", report.error);
    assert_eq!(messages(&report), vec![MSG_START, MSG_PROCESSING, MSG_COMPLETED]);
    assert!(report.cycles < RAM_WORD_TIMEOUT_CYCLES);
    assert_eq!(report.sim_time_ns, report.cycles * 25);

    let high = position(&events, |e| {
        matches!(e, SimEvent::MgmtGpio { level: Level::High, .. })
    });
    let csb = position(&events, |e| matches!(e, SimEvent::CsbReleased { .. }));
    let low = position(&events, |e| {
        matches!(e, SimEvent::MgmtGpio { level: Level::Low, .. })
    });
    assert!(high < csb && csb < low);
}

#[tokio::test]
async fn test_ram_word_reads_back_programmed_byte() {
    let (_, events) = run_ram_word(FirmwareProgram::ram_word(), None).await;

    let reads: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::WbRead { data, .. } => Some(*data),
            _ => None,
        })
        .collect();
    assert_eq!(reads, vec![0xFF, 0xFF, 0xFF]);
}

#[tokio::test]
async fn test_gpio_never_rising_fails_at_timeout() {
    let silent = FirmwareProgram::new("silent", vec![FirmwareOp::MgmtGpioOutputEnable]);
    let (report, _) = run_ram_word(silent, None).await;

    assert!(!report.passed);
    assert_eq!(
        report.error.as_deref(),
        Some("Simulation timed out after 500000 cycles waiting for mgmt_gpio == 1")
    );
    assert_eq!(report.cycles, RAM_WORD_TIMEOUT_CYCLES);
    assert!(report.log.is_empty());
}

#[tokio::test]
async fn test_timeout_override_is_applied() {
    let (report, _) = run_ram_word(FirmwareProgram::ram_word(), Some(1_000)).await;

    assert!(!report.passed);
    assert_eq!(report.cycles, 1_000);
    assert!(report.error.unwrap().contains("mgmt_gpio == 1"));
}

#[tokio::test]
async fn test_identical_runs_are_identical() {
    let (first, first_events) = run_ram_word(FirmwareProgram::ram_word(), None).await;
    let (second, second_events) = run_ram_word(FirmwareProgram::ram_word(), None).await;

    assert_eq!(first.log, second.log);
    assert_eq!(first.cycles, second.cycles);
    assert_eq!(first_events, second_events);
}

#[tokio::test]
async fn test_gated_firmware_waits_for_csb_release() {
    let (report, events) = run_ram_word(fixture("ram_word_gated.yaml"), None).await;

    assert!(report.passed, "unexpected failure: {:?}", report.error);

    let csb = position(&events, |e| matches!(e, SimEvent::CsbReleased { .. }));
    let first_write = position(&events, |e| matches!(e, SimEvent::WbWrite { .. }));
    assert!(csb < first_write);
}

fn wait_without_release(ctx: TestContext) -> BoxFuture<'static, Result<()>> {
    async move {
        let timeout_cycles = ctx.timeout_cycles(20_000);
        let mut env = test_configure(ctx.dut, timeout_cycles).await?;
        env.wait_mgmt_gpio(Level::High).await?;
        ctx.log.info("ready");
        env.wait_mgmt_gpio(Level::Low).await?;
        ctx.log.info("done");
        Ok(())
    }
    .boxed()
}

#[tokio::test]
async fn test_gated_firmware_hangs_without_release() {
    let mut registry = TestRegistry::new();
    registry.register("no_release", FirmwareProgram::ram_word, wait_without_release);

    let report = registry
        .run("no_release", dut(fixture("ram_word_gated.yaml")), None)
        .await
        .unwrap();

    assert!(!report.passed);
    assert_eq!(messages(&report), vec!["ready"]);
    assert!(report.error.unwrap().contains("mgmt_gpio == 0"));
}

#[tokio::test]
async fn test_missing_user_interface_times_out_after_processing() {
    let (report, _) = run_ram_word(fixture("no_user_interface.yaml"), Some(10_000)).await;

    assert!(!report.passed);
    assert_eq!(messages(&report), vec![MSG_START, MSG_PROCESSING]);
    assert!(report.error.unwrap().contains("mgmt_gpio == 0"));
}

#[tokio::test]
async fn test_sequencer_against_environment_directly() {
    let mut env = test_configure(Dut::ram_word(), RAM_WORD_TIMEOUT_CYCLES)
        .await
        .unwrap();
    let log = caravel_tb::testing::TestLog::new("direct");

    write_and_read(&mut env, &log).await.unwrap();

    assert!(env.cycle() > 4_000);
    assert_eq!(log.messages().len(), 3);
}

#[tokio::test]
async fn test_unknown_test_name() {
    let err = TestRegistry::builtin()
        .run("ram_byte", Dut::ram_word(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ram_word"));
}
