use anyhow::Context;
use colored::*;
use sonar_common::config::Config;
use sonar_common::models::{ProbeResult, ProbeTarget};
use sonar_common::network::target::{self, SystemLookup, Target};
use sonar_common::success;
use sonar_core::network;
use sonar_core::scanner::{SweepEngine, SweepReport, SweepStatus};
use tracing::Instrument;

use crate::commands::SweepArgs;
use crate::sprint;
use crate::terminal::input::{InputHandle, Key};
use crate::terminal::progress::SweepProgress;
use crate::terminal::{colors, format, print};

pub async fn sweep(args: SweepArgs, cfg: &Config) -> anyhow::Result<()> {
    let targets: Vec<ProbeTarget> = load_targets(&args, cfg)?;

    print::section("sweeping", cfg.quiet);
    let engine = SweepEngine::from_config(cfg, network::default_prober());
    let session = engine.session(targets, args.aggression)?;
    let cancel = session.cancel_token();

    let mut progress = SweepProgress::new(session.len());
    let span = progress.span();

    let mut input = InputHandle::new();
    input.start();

    let run = session.run(&mut progress).instrument(span);
    tokio::pin!(run);
    let report: SweepReport = loop {
        tokio::select! {
            report = &mut run => break report,
            key = input.next_key() => {
                if key == Key::Quit {
                    cancel.cancel();
                }
            }
        }
    };
    drop(input);

    print_report(&report, &args, cfg);
    Ok(())
}

fn load_targets(args: &SweepArgs, cfg: &Config) -> anyhow::Result<Vec<ProbeTarget>> {
    let mut items: Vec<Target> = Vec::new();
    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading target list {}", path.display()))?;
        items.push(target::parse_list(&text)?);
    }
    if let Some(spec) = &args.target {
        items.push(spec.parse()?);
    }
    let combined = match items.len() {
        1 => items.remove(0),
        _ => Target::Multi { targets: items },
    };
    Ok(target::expand(&combined, &SystemLookup, cfg.max_hosts)?)
}

fn print_report(report: &SweepReport, args: &SweepArgs, cfg: &Config) {
    let mut shown: Vec<&ProbeResult> = if args.alive {
        report.reachable().collect()
    } else {
        report.results.iter().collect()
    };
    shown.sort_by_key(|result| result.address());

    if report.alive_count() == 0 && args.alive {
        print::section("sweep results", cfg.quiet);
        print::nothing_found("no hosts responded");
    } else {
        print::section("sweep results", cfg.quiet);
        for (idx, result) in shown.iter().enumerate() {
            print_result(idx, result, cfg);
        }
    }

    print_summary(report, cfg);
}

fn print_result(idx: usize, result: &ProbeResult, cfg: &Config) {
    if cfg.quiet >= 2 {
        sprint!(&result.to_string());
        return;
    }
    let name = match (result.is_reachable(), result.resolved_name()) {
        (true, Some(name)) => name.to_string(),
        (true, None) => "No hostname".to_string(),
        (false, _) => "No response".to_string(),
    };
    print::host_heading(idx, &name);
    print::tree(&format::result_details(result));
}

fn print_summary(report: &SweepReport, cfg: &Config) {
    let alive: ColoredString = format!("{} of {} hosts", report.alive_count(), report.total)
        .bold()
        .green();
    let took: ColoredString = format::elapsed(report.elapsed);
    let verb: &str = match &report.status {
        SweepStatus::Completed => "Sweep Complete",
        SweepStatus::Cancelled => "Sweep Cancelled",
        SweepStatus::Failed { .. } => "Sweep Failed",
    };
    let output: String = format!("{verb}: {alive} responded in {took}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match cfg.quiet {
        0 => {
            print::rule();
            print::centered(&output);
        }
        _ => {
            sprint!();
            success!("{}", output)
        }
    }

    if let SweepStatus::Failed { reason } = &report.status {
        sonar_common::error!("{reason}");
    }
}
