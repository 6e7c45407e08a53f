mod args;

use args::{Args, TestKind};
use clap::Parser;
use load_test::LoadTester;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let tester = LoadTester::new(format!("{}:{}", args.host, args.port));

    let mut reports = vec![];
    if args.test.includes(TestKind::Single) {
        reports.push(tester.single());
    }
    if args.test.includes(TestKind::Concurrent) {
        reports.push(tester.concurrent(args.requests, args.workers));
    }
    if args.test.includes(TestKind::Sustained) {
        reports.push(tester.sustained(Duration::from_secs(args.duration), args.rps));
    }
    if args.test.includes(TestKind::Health) {
        reports.push(tester.health());
    }
    for report in &reports {
        report.log();
    }
    let failed: Vec<_> = reports
        .iter()
        .filter(|report| !report.is_success())
        .map(|report| report.name)
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("tests with failures against {}: {}", tester.addr(), failed.join(", "));
    }
    Ok(())
}
